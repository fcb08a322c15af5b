use std::path::Path;

use tracing::debug;

use crate::error::ExtractError;
use crate::model::{BackendKind, RawTable};
use crate::options::{Flavor, GeometrySettings};
use crate::pages::PageSet;

use super::TableBackend;

/// Finds tables from page geometry: ruling lines for `lattice`, text
/// alignment for `stream`.
#[derive(Debug, Clone, Default)]
pub struct GeometryBackend {
    #[cfg_attr(not(feature = "geometry"), allow(dead_code))]
    settings: GeometrySettings,
}

impl GeometryBackend {
    #[must_use]
    pub fn new(settings: GeometrySettings) -> Self {
        Self { settings }
    }
}

#[cfg(feature = "geometry")]
fn into_raw(page: u32, table: crate::page_objects::GridTable) -> RawTable {
    let rows = table
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(Into::into).collect())
        .collect();
    RawTable::new(page, rows).with_grid_width(table.width)
}

impl TableBackend for GeometryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Geometry
    }

    #[cfg(feature = "geometry")]
    fn detect(
        &self,
        document: &Path,
        pages: &PageSet,
        flavor: Option<Flavor>,
    ) -> Result<Vec<RawTable>, ExtractError> {
        use super::{guard, load_document, selected_pages};
        use crate::page_objects::read_page_objects;
        use crate::{lattice, stream};

        self.settings.validate()?;
        let flavor = flavor.unwrap_or_default();
        let loaded = load_document(document, self.kind())?;
        let selected = selected_pages(&loaded.document, pages, self.kind())?;

        let mut tables = Vec::new();
        for (page_no, page_id) in selected {
            let objects = guard(self.kind(), "content stream reader", || {
                read_page_objects(&loaded.document, page_id)
            })?
            .ok_or_else(|| {
                ExtractError::extraction(
                    self.kind(),
                    format!("content stream of page {page_no} could not be decoded"),
                )
            })?;

            let found = match flavor {
                Flavor::Stream => stream::find_tables(&objects, &self.settings),
                Flavor::Lattice => lattice::find_tables(&objects, &self.settings),
            };
            debug!(
                page = page_no,
                %flavor,
                fragments = objects.fragments.len(),
                edges = objects.edges.len(),
                tables = found.len(),
                "geometry page scanned"
            );
            tables.extend(found.into_iter().map(|table| into_raw(page_no, table)));
        }
        Ok(tables)
    }

    #[cfg(not(feature = "geometry"))]
    fn detect(
        &self,
        _document: &Path,
        _pages: &PageSet,
        _flavor: Option<Flavor>,
    ) -> Result<Vec<RawTable>, ExtractError> {
        debug!("geometry back-end requested but not compiled in");
        Err(ExtractError::BackendUnavailable {
            backend: self.kind(),
            reason: "built without the `geometry` feature".to_string(),
        })
    }
}
