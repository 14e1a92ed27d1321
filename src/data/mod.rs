//! Tabular row data.
//!
//! The batch generator only needs column names and cell lookups, so any
//! source (CSV, spreadsheet, database) plugs in through [`DataSource`].

pub mod csv;

pub use self::csv::{load_csv, parse_csv};

/// Read-only access to tabular data.
///
/// Missing, empty and NA cells all surface as `None`.
pub trait DataSource {
    fn columns(&self) -> &[String];

    fn row_count(&self) -> usize;

    fn cell(&self, row: usize, column: &str) -> Option<&str>;

    fn has_column(&self, column: &str) -> bool {
        self.columns().iter().any(|c| c == column)
    }

    /// Value of the first column, used as a last-resort file label.
    fn first_cell(&self, row: usize) -> Option<&str> {
        let first = self.columns().first()?;
        self.cell(row, first)
    }
}

/// In-memory table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with missing cells, long rows truncated.
    pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        cells.resize(self.columns.len(), None);
        self.rows.push(cells);
    }

    /// Build a table from string literals; blank strings become missing cells.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(
                row.iter()
                    .map(|v| Some(v.trim()).filter(|v| !v.is_empty()).map(str::to_string))
                    .collect(),
            );
        }
        table
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

impl DataSource for Table {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }
}
