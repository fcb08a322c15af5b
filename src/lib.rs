mod attempt;
pub mod backend;
mod csv_out;
mod error;
#[cfg(feature = "geometry")]
mod lattice;
mod model;
mod normalize;
mod options;
mod orchestrator;
#[cfg(feature = "geometry")]
mod page_objects;
mod pages;
#[cfg(feature = "text-layout")]
mod pdf_reader;
mod preview;
#[cfg(feature = "geometry")]
mod stream;
#[cfg(feature = "text-layout")]
mod table_parse;
#[cfg(any(feature = "text-layout", feature = "geometry"))]
mod text_decode;

use tracing::debug;

pub use attempt::{AttemptOutcome, BackendAttempt};
pub use backend::{GeometryBackend, TableBackend, TextLayoutBackend};
pub use csv_out::{Naming, WriteOptions, output_file_names, write, write_with_options};
pub use error::ExtractError;
pub use model::{BackendKind, ExtractionResult, RawCell, RawTable, Table};
pub use normalize::normalize;
pub use options::{ExtractionConfig, Flavor, GeometrySettings, Method};
pub use orchestrator::Orchestrator;
pub use pages::{PageSet, parse_page_spec};
pub use preview::{DEFAULT_PREVIEW_ROWS, TableSummary, render};

/// Extracts the tables of `config.document` with the built-in back-ends.
///
/// Finding no tables is not an error: the returned result then reports
/// `is_success() == false`.
pub fn extract(config: &ExtractionConfig) -> Result<ExtractionResult, ExtractError> {
    if !config.document.is_file() {
        return Err(ExtractError::DocumentNotFound(config.document.clone()));
    }

    debug!(
        document = %config.document.display(),
        method = %config.method,
        "starting extraction"
    );
    Orchestrator::with_builtin(config.geometry.clone()).run(config)
}
