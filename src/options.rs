use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ExtractError;
use crate::pages::{PageSet, parse_page_spec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Text-layout first, geometry when it yields nothing.
    #[default]
    Auto,
    TextLayout,
    Geometry,
}

impl FromStr for Method {
    type Err = ExtractError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "text-layout" | "text" | "tabula" => Ok(Self::TextLayout),
            "geometry" | "camelot" => Ok(Self::Geometry),
            other => Err(ExtractError::InvalidOption(format!(
                "unknown method '{other}', expected auto, text-layout or geometry"
            ))),
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::TextLayout => "text-layout",
            Self::Geometry => "geometry",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flavor {
    #[default]
    Stream,
    Lattice,
}

impl FromStr for Flavor {
    type Err = ExtractError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stream" => Ok(Self::Stream),
            "lattice" => Ok(Self::Lattice),
            other => Err(ExtractError::InvalidOption(format!(
                "unknown flavor '{other}', expected stream or lattice"
            ))),
        }
    }
}

impl Display for Flavor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Stream => "stream",
            Self::Lattice => "lattice",
        })
    }
}

/// Tolerances used by the geometry back-end, in PDF points.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySettings {
    /// Baselines closer than this belong to the same row (stream).
    pub row_tol: f64,
    /// Extra overlap slack when placing a fragment in a column (stream).
    pub column_tol: f64,
    /// Parallel ruling lines closer than this are aligned (lattice).
    pub snap_tolerance: f64,
    /// Collinear ruling segments with gaps up to this are merged (lattice).
    pub join_tolerance: f64,
    /// Ruling segments shorter than this are ignored (lattice).
    pub edge_min_length: f64,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            row_tol: 2.0,
            column_tol: 0.0,
            snap_tolerance: 3.0,
            join_tolerance: 3.0,
            edge_min_length: 3.0,
        }
    }
}

impl GeometrySettings {
    #[cfg(feature = "geometry")]
    pub(crate) fn validate(&self) -> Result<(), ExtractError> {
        let values = [
            ("row_tol", self.row_tol),
            ("column_tol", self.column_tol),
            ("snap_tolerance", self.snap_tolerance),
            ("join_tolerance", self.join_tolerance),
            ("edge_min_length", self.edge_min_length),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ExtractError::InvalidOption(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub document: PathBuf,
    pub pages: PageSet,
    pub method: Method,
    pub flavor: Flavor,
    /// Explicit geometry runs try both flavors and keep the wider result.
    pub compare_flavors: bool,
    pub preview: bool,
    pub geometry: GeometrySettings,
}

impl ExtractionConfig {
    #[must_use]
    pub fn new(document: impl AsRef<Path>) -> Self {
        Self {
            document: document.as_ref().to_path_buf(),
            pages: PageSet::All,
            method: Method::Auto,
            flavor: Flavor::Stream,
            compare_flavors: false,
            preview: false,
            geometry: GeometrySettings::default(),
        }
    }

    #[must_use]
    pub fn with_pages(mut self, pages: PageSet) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_page_spec(self, spec: Option<&str>) -> Result<Self, ExtractError> {
        let pages = parse_page_spec(spec)?;
        Ok(self.with_pages(pages))
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    #[must_use]
    pub fn with_compare_flavors(mut self, compare: bool) -> Self {
        self.compare_flavors = compare;
        self
    }

    #[must_use]
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: GeometrySettings) -> Self {
        self.geometry = geometry;
        self
    }
}
