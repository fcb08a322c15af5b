//! Back-end selection and fallback.

use tracing::{debug, info, warn};

use crate::attempt::BackendAttempt;
use crate::backend::{GeometryBackend, TableBackend, TextLayoutBackend};
use crate::error::ExtractError;
use crate::model::{BackendKind, ExtractionResult, Table};
use crate::normalize::normalize;
use crate::options::{ExtractionConfig, Flavor, GeometrySettings, Method};

/// A stream result whose widest table has at most this many columns is
/// compared against a lattice run.
const SPARSE_COLUMNS: usize = 2;

/// Outcome of one back-end call after normalization.
struct Run {
    backend: BackendKind,
    tables: Vec<Table>,
}

impl Run {
    fn max_columns(&self) -> usize {
        self.tables
            .iter()
            .map(|table| table.columns)
            .max()
            .unwrap_or(0)
    }
}

/// Runs one extraction per call against a text-layout and a geometry
/// back-end. Holds no state between runs.
#[derive(Debug, Clone)]
pub struct Orchestrator<T, G> {
    text_layout: T,
    geometry: G,
}

impl Orchestrator<TextLayoutBackend, GeometryBackend> {
    #[must_use]
    pub fn with_builtin(settings: GeometrySettings) -> Self {
        Self::new(TextLayoutBackend::new(), GeometryBackend::new(settings))
    }
}

impl<T: TableBackend, G: TableBackend> Orchestrator<T, G> {
    pub fn new(text_layout: T, geometry: G) -> Self {
        Self {
            text_layout,
            geometry,
        }
    }

    pub fn run(&self, config: &ExtractionConfig) -> Result<ExtractionResult, ExtractError> {
        let mut attempts = Vec::new();
        let run = match config.method {
            Method::Auto => self.run_auto(config, &mut attempts)?,
            Method::TextLayout => Some(invoke(&self.text_layout, config, None, &mut attempts)?),
            Method::Geometry => Some(self.run_geometry(config, &mut attempts)?),
        };

        let (backend, mut tables) = match run {
            Some(run) if !run.tables.is_empty() => (Some(run.backend), run.tables),
            _ => (None, Vec::new()),
        };
        tables.sort_by_key(|table| (table.page, table.index));

        match backend {
            Some(backend) => info!(
                %backend,
                tables = tables.len(),
                document = %config.document.display(),
                "extraction finished"
            ),
            None => info!(
                document = %config.document.display(),
                "no tables found"
            ),
        }

        Ok(ExtractionResult {
            tables,
            backend,
            attempts,
        })
    }

    /// Text-layout first; geometry only when text-layout failed or found
    /// nothing. Returns `None` when both ran cleanly or one errored after
    /// the other ran cleanly, without producing tables.
    fn run_auto(
        &self,
        config: &ExtractionConfig,
        attempts: &mut Vec<BackendAttempt>,
    ) -> Result<Option<Run>, ExtractError> {
        let primary_errored = match invoke(&self.text_layout, config, None, attempts) {
            Ok(run) if !run.tables.is_empty() => return Ok(Some(run)),
            Ok(_) => {
                info!("text-layout found no tables, trying geometry");
                false
            }
            Err(error) if error.is_fallback_eligible() => {
                warn!(%error, "text-layout back-end failed, trying geometry");
                true
            }
            Err(error) => return Err(error),
        };

        match invoke(&self.geometry, config, Some(config.flavor), attempts) {
            Ok(run) => Ok(Some(run)),
            Err(error) if error.is_fallback_eligible() && !primary_errored => {
                warn!(%error, "geometry back-end failed after an empty text-layout run");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn run_geometry(
        &self,
        config: &ExtractionConfig,
        attempts: &mut Vec<BackendAttempt>,
    ) -> Result<Run, ExtractError> {
        if config.compare_flavors {
            return self.compare_flavors(config, attempts);
        }

        let first = invoke(&self.geometry, config, Some(config.flavor), attempts)?;
        let sparse = config.flavor == Flavor::Stream
            && !first.tables.is_empty()
            && first.max_columns() <= SPARSE_COLUMNS;
        if !sparse {
            return Ok(first);
        }

        info!(
            columns = first.max_columns(),
            "stream found few columns, trying lattice"
        );
        match invoke(&self.geometry, config, Some(Flavor::Lattice), attempts) {
            Ok(lattice) if lattice.max_columns() > first.max_columns() => {
                info!(columns = lattice.max_columns(), "using lattice results");
                Ok(lattice)
            }
            Ok(_) => Ok(first),
            Err(error) if error.is_fallback_eligible() => {
                warn!(%error, "lattice refinement failed, keeping stream results");
                Ok(first)
            }
            Err(error) => Err(error),
        }
    }

    fn compare_flavors(
        &self,
        config: &ExtractionConfig,
        attempts: &mut Vec<BackendAttempt>,
    ) -> Result<Run, ExtractError> {
        let stream = invoke(&self.geometry, config, Some(Flavor::Stream), attempts);
        let lattice = invoke(&self.geometry, config, Some(Flavor::Lattice), attempts);

        match (stream, lattice) {
            (Ok(stream), Ok(lattice)) => {
                debug!(
                    stream = stream.max_columns(),
                    lattice = lattice.max_columns(),
                    "comparing flavor column counts"
                );
                if stream.max_columns() >= lattice.max_columns() {
                    Ok(stream)
                } else {
                    Ok(lattice)
                }
            }
            (Ok(run), Err(error)) | (Err(error), Ok(run)) if error.is_fallback_eligible() => {
                warn!(%error, "one flavor failed, using the other");
                Ok(run)
            }
            (Err(error), _) | (_, Err(error)) => Err(error),
        }
    }
}

fn invoke<B: TableBackend>(
    backend: &B,
    config: &ExtractionConfig,
    flavor: Option<Flavor>,
    attempts: &mut Vec<BackendAttempt>,
) -> Result<Run, ExtractError> {
    let kind = backend.kind();
    debug!(
        backend = %kind,
        ?flavor,
        all_pages = config.pages.is_all(),
        "invoking back-end"
    );

    let raw_tables = match backend.detect(&config.document, &config.pages, flavor) {
        Ok(raw_tables) => raw_tables,
        Err(error) => {
            attempts.push(BackendAttempt::from_error(kind, &error).with_flavor(flavor));
            return Err(error);
        }
    };

    let mut tables = Vec::with_capacity(raw_tables.len());
    for (index, raw) in raw_tables.into_iter().enumerate() {
        if let Some(table) = normalize(raw, kind, index)? {
            tables.push(table);
        }
    }

    attempts.push(BackendAttempt::from_count(kind, tables.len()).with_flavor(flavor));
    Ok(Run {
        backend: kind,
        tables,
    })
}
