use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::model::{BackendKind, ExtractionResult};

pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Shape and leading rows of one table, for display without writing files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    /// 1-based position in the result.
    pub number: usize,
    pub page: u32,
    pub origin: BackendKind,
    pub rows: usize,
    pub columns: usize,
    pub sample: Vec<Vec<String>>,
    pub remaining_rows: usize,
}

impl Display for TableSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- Table {} Preview ---", self.number)?;
        writeln!(
            f,
            "Page {} via {}, shape: ({}, {})",
            self.page, self.origin, self.rows, self.columns
        )?;
        for row in &self.sample {
            writeln!(f, "  {}", row.join(" | "))?;
        }
        if self.remaining_rows > 0 {
            writeln!(f, "... ({} more rows)", self.remaining_rows)?;
        }
        Ok(())
    }
}

/// Summarizes every table of `result`, keeping at most `max_rows` rows each.
#[must_use]
pub fn render(result: &ExtractionResult, max_rows: usize) -> Vec<TableSummary> {
    result
        .tables
        .iter()
        .enumerate()
        .map(|(position, table)| TableSummary {
            number: position + 1,
            page: table.page,
            origin: table.origin,
            rows: table.row_count(),
            columns: table.columns,
            sample: table.rows.iter().take(max_rows).cloned().collect(),
            remaining_rows: table.row_count().saturating_sub(max_rows),
        })
        .collect()
}
