//! Borderless table detection from text alignment.

use crate::options::GeometrySettings;
use crate::page_objects::{BBox, GridTable, PageObjects, TextFragment, sort_tables};

/// Fragments on one line closer than this fraction of the font size are
/// parts of the same cell.
const MERGE_GAP: f64 = 0.3;
const MIN_COLS: usize = 2;
const MIN_ROWS: usize = 2;

#[derive(Debug, Clone)]
struct Line {
    y: f64,
    fragments: Vec<TextFragment>,
}

fn group_lines(fragments: &[TextFragment], row_tol: f64) -> Vec<Line> {
    let mut sorted = fragments
        .iter()
        .filter(|fragment| !fragment.text.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then_with(|| a.x.total_cmp(&b.x)));

    let mut lines: Vec<Line> = Vec::new();
    for fragment in sorted {
        match lines.last_mut() {
            Some(line) if (line.y - fragment.y).abs() <= row_tol => line.fragments.push(fragment),
            _ => lines.push(Line {
                y: fragment.y,
                fragments: vec![fragment],
            }),
        }
    }

    for line in &mut lines {
        line.fragments.sort_by(|a, b| a.x.total_cmp(&b.x));
        line.fragments = merge_adjacent(std::mem::take(&mut line.fragments));
    }
    lines
}

fn merge_adjacent(fragments: Vec<TextFragment>) -> Vec<TextFragment> {
    let mut merged: Vec<TextFragment> = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        if let Some(previous) = merged.last_mut() {
            let gap = fragment.x - (previous.x + previous.width);
            if gap < previous.size * MERGE_GAP {
                if gap > previous.size * 0.1 {
                    previous.text.push(' ');
                }
                previous.text.push_str(&fragment.text);
                previous.width = (fragment.x + fragment.width) - previous.x;
                continue;
            }
        }
        merged.push(fragment);
    }
    merged
}

/// Horizontal extent of a column, grown by every fragment placed in it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    x0: f64,
    x1: f64,
}

impl Span {
    fn of(fragment: &TextFragment) -> Self {
        Self {
            x0: fragment.x,
            x1: fragment.x + fragment.width,
        }
    }

    /// Shared width with `other` after widening `self` by `slack` on both
    /// sides. Negative values are the gap between the two.
    fn overlap(&self, other: &Self, slack: f64) -> f64 {
        (self.x1 + slack).min(other.x1) - (self.x0 - slack).max(other.x0)
    }

    fn extend(&mut self, other: &Self) {
        self.x0 = self.x0.min(other.x0);
        self.x1 = self.x1.max(other.x1);
    }
}

fn column_for(span: &Span, columns: &[Span], column_tol: f64) -> usize {
    columns
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.overlap(span, column_tol)
                .total_cmp(&b.overlap(span, column_tol))
        })
        .map_or(0, |(index, _)| index)
}

fn layout_block(block: &[Line], column_tol: f64) -> Option<GridTable> {
    let widest = block.iter().max_by(|a, b| {
        a.fragments
            .len()
            .cmp(&b.fragments.len())
            .then_with(|| a.y.total_cmp(&b.y))
    })?;
    let mut columns = widest.fragments.iter().map(Span::of).collect::<Vec<_>>();
    let width = columns.len();

    let mut bbox: Option<BBox> = None;
    let mut rows = Vec::with_capacity(block.len());
    for line in block {
        let mut row: Vec<Option<String>> = vec![None; width];
        for fragment in &line.fragments {
            let span = Span::of(fragment);
            let column = column_for(&span, &columns, column_tol);
            columns[column].extend(&span);

            let slot = &mut row[column];
            let text = fragment.text.trim();
            *slot = Some(match slot.take() {
                Some(existing) => format!("{existing} {text}"),
                None => text.to_string(),
            });

            let fragment_box = BBox {
                x0: fragment.x,
                y0: fragment.y,
                x1: fragment.x + fragment.width,
                y1: fragment.y + fragment.size,
            };
            bbox = Some(bbox.map_or(fragment_box, |acc| acc.union(&fragment_box)));
        }
        rows.push(row);
    }

    Some(GridTable {
        bbox: bbox?,
        width,
        rows,
    })
}

/// Finds borderless tables on one page: runs of consecutive lines holding at
/// least two separated text runs. The widest line seeds the columns and each
/// fragment joins the column it overlaps most.
pub(crate) fn find_tables(objects: &PageObjects, settings: &GeometrySettings) -> Vec<GridTable> {
    let lines = group_lines(&objects.fragments, settings.row_tol);

    let mut tables = Vec::new();
    let mut block: Vec<Line> = Vec::new();
    let mut flush = |block: &mut Vec<Line>| {
        if block.len() >= MIN_ROWS {
            tables.extend(layout_block(block, settings.column_tol));
        }
        block.clear();
    };

    for line in lines {
        if line.fragments.len() >= MIN_COLS {
            block.push(line);
        } else {
            flush(&mut block);
        }
    }
    flush(&mut block);

    sort_tables(&mut tables);
    tables
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Span, column_for, find_tables, group_lines};
    use crate::options::GeometrySettings;
    use crate::page_objects::{PageObjects, TextFragment};

    fn text(x: f64, y: f64, value: &str) -> TextFragment {
        #[allow(clippy::cast_precision_loss)]
        let width = value.len() as f64 * 6.0;
        TextFragment {
            x,
            y,
            width,
            size: 12.0,
            text: value.to_string(),
        }
    }

    #[test]
    fn groups_fragments_by_baseline() {
        let lines = group_lines(
            &[
                text(50.0, 700.0, "Name"),
                text(200.0, 701.0, "Age"),
                text(50.0, 680.0, "Alice"),
            ],
            2.0,
        );
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].fragments.len(), 2);
    }

    #[test]
    fn merges_touching_fragments() {
        let lines = group_lines(&[text(50.0, 700.0, "New"), text(70.0, 700.0, "York")], 2.0);
        assert_eq!(lines[0].fragments.len(), 1);
        assert_eq!(lines[0].fragments[0].text, "New York");
    }

    #[test]
    fn assigns_columns_by_overlap() {
        let columns = [
            Span { x0: 50.0, x1: 80.0 },
            Span { x0: 200.0, x1: 230.0 },
            Span { x0: 350.0, x1: 380.0 },
        ];
        assert_eq!(column_for(&Span { x0: 10.0, x1: 20.0 }, &columns, 0.0), 0);
        assert_eq!(column_for(&Span { x0: 190.0, x1: 210.0 }, &columns, 0.0), 1);
        assert_eq!(column_for(&Span { x0: 290.0, x1: 330.0 }, &columns, 0.0), 2);
        assert_eq!(column_for(&Span { x0: 236.0, x1: 240.0 }, &columns, 0.0), 1);
    }

    #[test]
    fn right_aligned_numbers_stay_in_their_column() {
        let objects = PageObjects {
            fragments: vec![
                text(50.0, 700.0, "Item"),
                text(310.0, 700.0, "Amount"),
                text(50.0, 684.0, "Pen"),
                text(335.0, 684.0, "5"),
                text(50.0, 668.0, "Book"),
                text(290.0, 668.0, "12345.00"),
            ],
            edges: Vec::new(),
        };

        let tables = find_tables(&objects, &GeometrySettings::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].rows,
            vec![
                vec![Some("Item".to_string()), Some("Amount".to_string())],
                vec![Some("Pen".to_string()), Some("5".to_string())],
                vec![Some("Book".to_string()), Some("12345.00".to_string())],
            ]
        );
    }

    #[test]
    fn builds_table_from_aligned_text() {
        let objects = PageObjects {
            fragments: vec![
                text(50.0, 760.0, "Inventory."),
                text(50.0, 700.0, "Name"),
                text(200.0, 700.0, "Age"),
                text(350.0, 700.0, "Score"),
                text(50.0, 684.0, "Alice"),
                text(200.0, 684.0, "30"),
                text(350.0, 684.0, "98"),
                text(50.0, 668.0, "Bob"),
                text(350.0, 668.0, "87"),
            ],
            edges: Vec::new(),
        };

        let tables = find_tables(&objects, &GeometrySettings::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].width, 3);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(
            tables[0].rows[2],
            vec![Some("Bob".to_string()), None, Some("87".to_string())]
        );
    }
}
