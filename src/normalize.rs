use crate::error::ExtractError;
use crate::model::{BackendKind, RawCell, RawTable, Table};

fn cell_text(cell: RawCell) -> String {
    match cell {
        RawCell::Text(text) => text.trim().to_string(),
        RawCell::Number(value) => format_number(value),
        RawCell::Missing => String::new(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Converts a back-end table into a `Table`.
///
/// Returns `Ok(None)` for an empty detection. Fails only when the raw table
/// breaks the back-end's own contract.
pub fn normalize(
    raw: RawTable,
    origin: BackendKind,
    index: usize,
) -> Result<Option<Table>, ExtractError> {
    if raw.page == 0 {
        return Err(ExtractError::MalformedRawTable {
            backend: origin,
            page: 0,
            reason: "page numbers are 1-based".to_string(),
        });
    }

    if let Some(width) = raw.grid_width {
        if let Some((row_index, row)) = raw
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != width)
        {
            return Err(ExtractError::MalformedRawTable {
                backend: origin,
                page: raw.page,
                reason: format!(
                    "row {row_index} has {} cells but the grid is {width} wide",
                    row.len()
                ),
            });
        }
    }

    let rows = raw
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.is_empty() || columns == 0 {
        return Ok(None);
    }

    Ok(Some(Table {
        rows,
        columns,
        page: raw.page,
        index,
        origin,
    }))
}
