//! CSV loading.

use super::Table;
use crate::error::{Result, SelloError};
use std::io::Read;
use std::path::Path;

/// Cell spellings treated as "no value", matching what spreadsheet tooling
/// usually writes for blanks.
const NA_TOKENS: &[&str] = &[
    "", "NaN", "nan", "NA", "N/A", "n/a", "null", "NULL", "None", "#N/A", "<NA>",
];

fn normalize_cell(raw: &str) -> Option<String> {
    let value = raw.trim();
    if NA_TOKENS.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn load_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)
        .map_err(|e| SelloError::Data(format!("{}: {}", path.display(), e)))?;
    parse_csv(file).map_err(|e| match e {
        SelloError::Data(msg) => SelloError::Data(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse CSV with a header row. Ragged rows are accepted.
pub fn parse_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .trim(::csv::Trim::Headers)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| SelloError::Data(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        return Err(SelloError::Data("no header row".into()));
    }

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record.map_err(|e| SelloError::Data(e.to_string()))?;
        table.push_row(record.iter().map(normalize_cell).collect());
    }
    log::debug!(
        "Loaded {} rows x {} columns",
        super::DataSource::row_count(&table),
        super::DataSource::columns(&table).len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataSource;

    #[test]
    fn test_parse_with_na_tokens() {
        let input = "Name, Email ,UID\n  Ada Lovelace ,ada@example.com,X1\nNaN,n/a,\n#N/A,None,<NA>\n";
        let table = parse_csv(input.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Name", "Email", "UID"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(0, "Name"), Some("Ada Lovelace"));
        assert_eq!(table.cell(0, "UID"), Some("X1"));
        for row in 1..3 {
            for col in ["Name", "Email", "UID"] {
                assert_eq!(table.cell(row, col), None, "row {} col {}", row, col);
            }
        }
    }

    #[test]
    fn test_ragged_rows() {
        let table = parse_csv("a,b,c\n1\n1,2,3,4\n".as_bytes()).unwrap();
        assert_eq!(table.cell(0, "a"), Some("1"));
        assert_eq!(table.cell(0, "c"), None);
        assert_eq!(table.cell(1, "c"), Some("3"));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_csv("".as_bytes()), Err(SelloError::Data(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_csv(Path::new("/nonexistent/people.csv")).unwrap_err();
        assert!(err.to_string().contains("people.csv"));
    }
}
