//! Table shaping shared by the browser UI and the CLI.
//!
//! Preview tables derive their columns from the first row's `raw_data` keys
//! and assume every other row has the same shape. Cells are looked up by key,
//! so a row missing a column renders an empty cell instead of shifting.

use serde_json::Value;

use crate::{Instrument, PreviewRow};

/// Trailing header of every preview table.
pub const ERRORS_HEADER: &str = "Errors";

/// Inline style of rows that carry at least one validation error.
pub const ERROR_ROW_STYLE: &str = "background-color: #fdecea";

/// Fixed headers of the legacy instrument table.
pub const LEGACY_HEADERS: [&str; 7] = ["ID", "PD", "LGD", "EAD", "Raw PD", "Raw LGD", "Raw EAD"];

/// Column keys taken from the first row, in its `raw_data` order.
#[must_use]
pub fn column_keys(rows: &[PreviewRow]) -> Vec<String> {
    rows.first()
        .map(|row| row.raw_data.keys().cloned().collect())
        .unwrap_or_default()
}

/// Header labels: the column keys followed by [`ERRORS_HEADER`]. Empty when
/// there are no rows.
#[must_use]
pub fn header_labels(rows: &[PreviewRow]) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }
    let mut labels = column_keys(rows);
    labels.push(ERRORS_HEADER.to_owned());
    labels
}

/// Display text for one cell. `null` and missing values render empty.
#[must_use]
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Data cells of `row` aligned to `keys`, without the errors cell.
#[must_use]
pub fn row_cells(row: &PreviewRow, keys: &[String]) -> Vec<String> {
    keys.iter().map(|key| cell_text(row.raw_data.get(key))).collect()
}

/// Inline style for a preview row.
#[must_use]
pub fn row_style(row: &PreviewRow) -> &'static str {
    if row.has_errors() { ERROR_ROW_STYLE } else { "" }
}

impl Instrument {
    /// Cells in [`LEGACY_HEADERS`] order.
    #[must_use]
    pub fn cells(&self) -> [String; 7] {
        [
            self.id.to_string(),
            self.pd.to_string(),
            self.lgd.to_string(),
            self.ead.to_string(),
            self.raw_pd.clone(),
            self.raw_lgd.clone(),
            self.raw_ead.clone(),
        ]
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
