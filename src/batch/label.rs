//! Output file naming.

use crate::data::DataSource;
use crate::render::ResolvedRow;

pub const MAX_LABEL_CHARS: usize = 50;

/// Keep letters, digits, spaces and underscores; spaces become underscores;
/// cut to [`MAX_LABEL_CHARS`].
pub fn sanitize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_LABEL_CHARS)
        .collect()
}

/// Label for a row: its Name fields joined by `_`, or the first column's value
/// when the job has no Name field.
pub fn row_label(row: &ResolvedRow<'_>, data: &dyn DataSource) -> String {
    let names: Vec<&str> = row.name_values().collect();
    let base = if names.is_empty() {
        data.first_cell(row.index).unwrap_or_default().to_string()
    } else {
        names.join("_")
    };
    sanitize_label(&base)
}

/// `<label>_<row number>.pdf`, row numbers starting at 1.
pub fn file_name(label: &str, index: usize) -> String {
    format!("{}_{}.pdf", label, index + 1)
}
