use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::ExtractError;
use crate::model::{ExtractionResult, Table};

/// How output files are named.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Naming {
    /// `<base>.csv` for a single table, `<base>_table_<i>.csv` otherwise.
    #[default]
    Plain,
    /// `<base>--<suffix>_table<i>.csv` for every table.
    Suffixed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub delimiter: u8,
    pub naming: Naming,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            naming: Naming::Plain,
        }
    }
}

/// File names for `count` tables, in result order.
#[must_use]
pub fn output_file_names(count: usize, base: &str, naming: &Naming) -> Vec<String> {
    match naming {
        Naming::Plain if count == 1 => vec![format!("{base}.csv")],
        Naming::Plain => (1..=count)
            .map(|number| format!("{base}_table_{number}.csv"))
            .collect(),
        Naming::Suffixed(suffix) => (1..=count)
            .map(|number| format!("{base}--{suffix}_table{number}.csv"))
            .collect(),
    }
}

#[cfg(test)]
fn write_table_to_string(table: &Table, delimiter: u8) -> Result<String, ExtractError> {
    let bytes = serialize_table(table, delimiter)?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

fn serialize_table(table: &Table, delimiter: u8) -> Result<Vec<u8>, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(Vec::<u8>::new());
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))
}

/// Writes the whole table or nothing: the rows go to a temporary file in
/// the destination directory, which then replaces `path`.
fn write_table(path: &Path, table: &Table, delimiter: u8) -> Result<(), ExtractError> {
    let bytes = serialize_table(table, delimiter)?;
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(directory)?;
    staged.write_all(&bytes)?;
    staged.flush()?;
    staged.persist(path).map_err(|error| error.error)?;
    Ok(())
}

pub fn write(
    result: &ExtractionResult,
    base_name: &str,
    destination: &Path,
) -> Result<Vec<PathBuf>, ExtractError> {
    write_with_options(result, base_name, destination, &WriteOptions::default())
}

/// Writes each table of `result` into `destination` and returns the written
/// paths in table order. An unsuccessful result writes nothing.
pub fn write_with_options(
    result: &ExtractionResult,
    base_name: &str,
    destination: &Path,
    options: &WriteOptions,
) -> Result<Vec<PathBuf>, ExtractError> {
    if base_name.trim().is_empty() {
        return Err(ExtractError::InvalidOption(
            "output base name cannot be empty".to_string(),
        ));
    }
    if !result.is_success() {
        return Ok(Vec::new());
    }

    let names = output_file_names(result.tables.len(), base_name, &options.naming);
    let mut written = Vec::with_capacity(names.len());
    for (table, name) in result.tables.iter().zip(names) {
        let path = destination.join(name);
        write_table(&path, table, options.delimiter)?;
        info!(path = %path.display(), rows = table.row_count(), "table written");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::{Naming, output_file_names, write, write_table_to_string};
    use crate::model::{BackendKind, ExtractionResult, Table};

    fn table(page: u32, index: usize, rows: &[&[&str]]) -> Table {
        Table {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
            columns: rows.iter().map(|row| row.len()).max().unwrap_or(0),
            page,
            index,
            origin: BackendKind::TextLayout,
        }
    }

    #[test]
    fn single_table_uses_bare_base_name() {
        assert_eq!(output_file_names(1, "report", &Naming::Plain), vec!["report.csv"]);
    }

    #[test]
    fn multiple_tables_are_numbered_from_one() {
        assert_eq!(
            output_file_names(3, "report", &Naming::Plain),
            vec![
                "report_table_1.csv",
                "report_table_2.csv",
                "report_table_3.csv"
            ]
        );
        assert_eq!(
            output_file_names(12, "r", &Naming::Plain)[11],
            "r_table_12.csv"
        );
    }

    #[test]
    fn suffixed_naming_numbers_every_table() {
        let naming = Naming::Suffixed("appropriations-donations".to_string());
        assert_eq!(
            output_file_names(1, "coa-2023", &naming),
            vec!["coa-2023--appropriations-donations_table1.csv"]
        );
    }

    #[test]
    fn serializes_ragged_rows_and_quotes_delimiters() {
        let table = Table {
            rows: vec![
                vec!["Name".to_string(), "Amount".to_string()],
                vec!["Acme, Inc.".to_string(), "1,200".to_string()],
                vec!["Total".to_string()],
            ],
            columns: 2,
            page: 1,
            index: 0,
            origin: BackendKind::TextLayout,
        };

        let csv = write_table_to_string(&table, b',').expect("csv should serialize");
        assert_eq!(csv, "Name,Amount\n\"Acme, Inc.\",\"1,200\"\nTotal\n");
    }

    #[test]
    fn writes_each_table_to_its_own_file_in_order() {
        let dir = tempdir().expect("tempdir should be created");
        let result = ExtractionResult {
            tables: vec![
                table(1, 0, &[&["City", "Pop"], &["A", "10"], &["B", "20"]]),
                table(1, 1, &[&["Product", "Qty"], &["Pen", "3"]]),
                table(2, 0, &[&["Fund", "Amount"], &["General", "1,200"]]),
            ],
            backend: Some(BackendKind::TextLayout),
            attempts: Vec::new(),
        };

        let written = write(&result, "report", dir.path()).expect("write should succeed");
        assert_eq!(
            written,
            vec![
                dir.path().join("report_table_1.csv"),
                dir.path().join("report_table_2.csv"),
                dir.path().join("report_table_3.csv"),
            ]
        );

        let contents = written
            .iter()
            .map(|path| std::fs::read_to_string(path).expect("CSV should be readable"))
            .collect::<Vec<_>>();
        assert_eq!(
            contents,
            vec![
                "City,Pop\nA,10\nB,20\n",
                "Product,Qty\nPen,3\n",
                "Fund,Amount\nGeneral,\"1,200\"\n",
            ]
        );

        let mut entries = std::fs::read_dir(dir.path())
            .expect("tempdir should be readable")
            .map(|entry| entry.expect("entry").file_name().into_string().expect("utf-8"))
            .collect::<Vec<_>>();
        entries.sort();
        assert_eq!(
            entries,
            vec!["report_table_1.csv", "report_table_2.csv", "report_table_3.csv"]
        );
    }

    #[test]
    fn unsuccessful_result_writes_nothing() {
        let dir = tempdir().expect("tempdir should be created");
        let result = ExtractionResult {
            tables: Vec::new(),
            backend: None,
            attempts: Vec::new(),
        };

        let written = write(&result, "report", dir.path()).expect("write should succeed");
        assert!(written.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).expect("readable").count(), 0);
    }
}
