use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::attempt::BackendAttempt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    TextLayout,
    Geometry,
}

impl BackendKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TextLayout => "text-layout",
            Self::Geometry => "geometry",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A cell value as reported by a back-end, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Text(String),
    Number(f64),
    /// The back-end's marker for a grid slot without content.
    Missing,
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<String>> for RawCell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Missing, Self::Text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub page: u32,
    pub rows: Vec<Vec<RawCell>>,
    /// Grid width promised by grid-based back-ends. When set, every row must
    /// have exactly this many cells.
    pub grid_width: Option<usize>,
}

impl RawTable {
    #[must_use]
    pub fn new(page: u32, rows: Vec<Vec<RawCell>>) -> Self {
        Self {
            page,
            rows,
            grid_width: None,
        }
    }

    #[must_use]
    pub fn with_grid_width(mut self, width: usize) -> Self {
        self.grid_width = Some(width);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    /// Width of the widest row. Shorter rows are not padded.
    pub columns: usize,
    pub page: u32,
    /// Position at which the producing back-end reported this table, counted
    /// over everything it returned. Tables dropped as empty leave gaps, so
    /// indices are not always contiguous.
    pub index: usize,
    pub origin: BackendKind,
}

impl Table {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub tables: Vec<Table>,
    pub backend: Option<BackendKind>,
    pub attempts: Vec<BackendAttempt>,
}

impl ExtractionResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.tables.is_empty()
    }

    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(Table::row_count).sum()
    }

    #[must_use]
    pub fn max_columns(&self) -> usize {
        self.tables
            .iter()
            .map(|table| table.columns)
            .max()
            .unwrap_or(0)
    }
}
