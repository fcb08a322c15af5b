use std::sync::LazyLock;

use regex::Regex;

static CELL_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t|\s{2,}").expect("cell gap pattern should compile"));

/// Lines with more single-spaced words than this only count as rows when one
/// of the words holds a digit.
const MAX_PLAIN_WORDS: usize = 6;

fn squeeze(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cells separated by a tab or a run of two or more spaces.
pub(crate) fn gap_cells(line: &str) -> Vec<String> {
    CELL_GAP
        .split(line.trim())
        .map(squeeze)
        .filter(|cell| !cell.is_empty())
        .collect()
}

pub(crate) fn word_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn reads_as_sentence(line: &str) -> bool {
    line.trim_end().ends_with(['.', '!', '?'])
}

/// Splits one line of page text into a table row.
///
/// Gap-separated cells win. A line without wide gaps still counts when its
/// words look like short labels or numbers rather than prose.
pub(crate) fn row_cells(line: &str, min_cols: usize) -> Option<Vec<String>> {
    let cells = gap_cells(line);
    if cells.len() >= min_cols {
        return Some(cells);
    }
    if reads_as_sentence(line) {
        return None;
    }

    let words = word_cells(line);
    let numeric = words.iter().any(|word| word.bytes().any(|b| b.is_ascii_digit()));
    (words.len() >= min_cols && (numeric || words.len() <= MAX_PLAIN_WORDS)).then_some(words)
}
