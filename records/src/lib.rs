//! Shared wire records for the instrument upload API.
//!
//! This crate owns the JSON shapes exchanged between `server`, `client`, and
//! `cli`. Row payloads stay flexible (`raw_data` is a JSON object whose key
//! order follows the uploaded file's columns) because the backend, not the
//! viewers, decides which columns exist.

pub mod table;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Column name → scalar cell value, in upload column order.
pub type RawData = Map<String, Value>;

/// A single parsed record from an uploaded file, annotated with any
/// validation errors found.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    /// Storage id; present on listed rows, absent on fresh upload previews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// 1-based position of the record among the file's data rows.
    pub row_number: i64,
    pub raw_data: RawData,
    /// Validation messages in the order they were found. `null` and a missing
    /// field both decode as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<String>,
}

impl PreviewRow {
    #[must_use]
    pub fn new(row_number: i64, raw_data: RawData) -> Self {
        Self { id: None, row_number, raw_data, errors: Vec::new() }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors rendered for a single table cell.
    #[must_use]
    pub fn joined_errors(&self) -> String {
        self.errors.join("; ")
    }
}

/// Legacy instrument record: parsed risk values next to the raw text they
/// were read from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: i64,
    pub pd: f64,
    pub lgd: f64,
    pub ead: f64,
    pub raw_pd: String,
    pub raw_lgd: String,
    pub raw_ead: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Response body of `POST /upload_instruments`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub upload_id: i64,
    pub filename: String,
    pub checksum: String,
    pub total_rows: i64,
    pub valid_rows: i64,
    pub invalid_rows: i64,
    pub preview: Vec<PreviewRow>,
}

/// One row of `GET /upload-history`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadHistoryEntry {
    pub upload_id: i64,
    pub filename: String,
    pub checksum: String,
    pub uploaded_by: Option<String>,
    /// RFC 3339 timestamp.
    pub upload_timestamp: String,
    pub schema_version: String,
    pub total_rows: i64,
    pub valid_rows: i64,
    pub invalid_rows: i64,
}

/// Response body of the legacy `POST /upload`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyUploadResult {
    pub inserted: u64,
}

/// One row of `GET /legacy/upload-history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyUploadHistoryEntry {
    pub id: i64,
    pub filename: String,
    pub inserted: i64,
    /// RFC 3339 timestamp.
    pub uploaded_at: String,
}

/// Error body of the legacy endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }
}

/// Query filters accepted by `GET /instruments`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentFilter {
    /// `Some(true)` keeps rows with errors, `Some(false)` rows without.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_balance_flag: Option<bool>,
}

impl InstrumentFilter {
    /// Filter used by the "Show only rows with errors" toggle.
    #[must_use]
    pub fn errors_only() -> Self {
        Self { error: Some(true), ..Self::default() }
    }

    /// Query parameters in a stable order, omitting unset filters.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(error) = self.error {
            pairs.push(("error", error.to_string()));
        }
        if let Some(asset_class) = &self.asset_class {
            pairs.push(("asset_class", asset_class.clone()));
        }
        if let Some(category) = &self.classification_category {
            pairs.push(("classification_category", category.clone()));
        }
        if let Some(flag) = self.off_balance_flag {
            pairs.push(("off_balance_flag", flag.to_string()));
        }
        pairs
    }
}

/// `skip`/`limit` paging shared by the history and legacy listing endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_LIMIT: i64 = 1000;

fn default_page_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: DEFAULT_PAGE_LIMIT }
    }
}

impl Page {
    /// Clamp to a non-negative offset and a limit within `1..=MAX_PAGE_LIMIT`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self { skip: self.skip.max(0), limit: self.limit.clamp(1, MAX_PAGE_LIMIT) }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
