//! Table-detection back-ends and the capability they share.

#[cfg(any(feature = "text-layout", feature = "geometry"))]
mod document;
pub mod geometry;
pub mod text_layout;

use std::path::Path;

use crate::error::ExtractError;
use crate::model::{BackendKind, RawTable};
use crate::options::Flavor;
use crate::pages::PageSet;

#[cfg(any(feature = "text-layout", feature = "geometry"))]
pub(crate) use document::{LoadedDocument, guard, load_document, selected_pages};
pub use geometry::GeometryBackend;
pub use text_layout::TextLayoutBackend;

/// A table-detection back-end.
///
/// `detect` blocks for the whole parse. Finding nothing is `Ok(vec![])`;
/// errors are reserved for a missing runtime (`BackendUnavailable`) or a
/// document the back-end could not process (`BackendExtraction`).
pub trait TableBackend {
    fn kind(&self) -> BackendKind;

    fn detect(
        &self,
        document: &Path,
        pages: &PageSet,
        flavor: Option<Flavor>,
    ) -> Result<Vec<RawTable>, ExtractError>;
}

impl<B: TableBackend + ?Sized> TableBackend for &B {
    fn kind(&self) -> BackendKind {
        (**self).kind()
    }

    fn detect(
        &self,
        document: &Path,
        pages: &PageSet,
        flavor: Option<Flavor>,
    ) -> Result<Vec<RawTable>, ExtractError> {
        (**self).detect(document, pages, flavor)
    }
}
