use std::path::Path;

use tracing::debug;

use crate::error::ExtractError;
use crate::model::{BackendKind, RawTable};
use crate::options::Flavor;
use crate::pages::PageSet;

use super::TableBackend;

#[cfg(feature = "text-layout")]
const MIN_COLS: usize = 2;
#[cfg(feature = "text-layout")]
const MIN_ROWS: usize = 2;

/// Finds tables in the reading-order text of each page: consecutive lines
/// that split into at least two cells form a table.
#[derive(Debug, Clone, Default)]
pub struct TextLayoutBackend;

impl TextLayoutBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "text-layout")]
pub(crate) fn detect_tables_in_text(page_number: u32, text: &str) -> Vec<RawTable> {
    use crate::model::RawCell;
    use crate::table_parse::row_cells;

    let mut tables = Vec::new();
    let mut block: Vec<Vec<String>> = Vec::new();
    let mut close_block = |block: &mut Vec<Vec<String>>| {
        let rows = std::mem::take(block);
        if rows.len() >= MIN_ROWS {
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(RawCell::from).collect())
                .collect();
            tables.push(RawTable::new(page_number, rows));
        }
    };

    for line in text.lines() {
        match row_cells(line, MIN_COLS) {
            Some(cells) => block.push(cells),
            None => close_block(&mut block),
        }
    }
    close_block(&mut block);

    tables
}

impl TableBackend for TextLayoutBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::TextLayout
    }

    #[cfg(feature = "text-layout")]
    fn detect(
        &self,
        document: &Path,
        pages: &PageSet,
        _flavor: Option<Flavor>,
    ) -> Result<Vec<RawTable>, ExtractError> {
        use super::{load_document, selected_pages};
        use crate::pdf_reader::read_page_texts;

        let loaded = load_document(document, self.kind())?;
        let selected = selected_pages(&loaded.document, pages, self.kind())?;
        let page_texts = read_page_texts(&loaded, &selected)?;

        let mut tables = Vec::new();
        for page in &page_texts {
            let found = detect_tables_in_text(page.page_number, &page.text);
            debug!(page = page.page_number, tables = found.len(), "text-layout page scanned");
            tables.extend(found);
        }
        Ok(tables)
    }

    #[cfg(not(feature = "text-layout"))]
    fn detect(
        &self,
        _document: &Path,
        _pages: &PageSet,
        _flavor: Option<Flavor>,
    ) -> Result<Vec<RawTable>, ExtractError> {
        debug!("text-layout back-end requested but not compiled in");
        Err(ExtractError::BackendUnavailable {
            backend: self.kind(),
            reason: "built without the `text-layout` feature".to_string(),
        })
    }
}

#[cfg(all(test, feature = "text-layout"))]
mod tests {
    use pretty_assertions::assert_eq;

    use super::detect_tables_in_text;
    use crate::model::RawCell;

    #[test]
    fn groups_consecutive_multi_cell_lines() {
        let text = "Quarterly figures follow.\nCity  Pop  Rank\nA  10  1\nB  20  2\n\n\
                    Notes follow here.";
        let tables = detect_tables_in_text(3, text);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, 3);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(
            tables[0].rows[1],
            vec![RawCell::from("A"), RawCell::from("10"), RawCell::from("1")]
        );
        assert_eq!(tables[0].grid_width, None);
    }

    #[test]
    fn separate_blocks_become_separate_tables() {
        let text = "A  B\n1  2\nInterlude.\nC  D\n3  4";
        let tables = detect_tables_in_text(1, text);
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn single_rows_are_not_tables() {
        let text = "Name  Age\nThis is prose.";
        assert!(detect_tables_in_text(1, text).is_empty());
    }
}
