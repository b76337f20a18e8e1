//! Legacy PD/LGD/EAD upload: whole-file validation, then bulk insert.
//!
//! ERROR HANDLING
//! ==============
//! The first failing check rejects the whole file and nothing is stored. Each
//! [`LegacyError`] displays as the `detail` text returned to the caller.

use records::RawData;
use serde_json::Value;

use super::ErrorCode;
use super::ingest::{self, FileKind, IngestError};
use crate::db::{InstrumentStore, LegacyRow, StoreError};

pub const LEGACY_COLUMNS: [&str; 3] = ["PD", "LGD", "EAD"];
const ACCEPTED_KINDS: [FileKind; 3] = [FileKind::Csv, FileKind::Xlsx, FileKind::Xls];

#[derive(Debug, thiserror::Error)]
pub enum LegacyError {
    #[error("Unsupported file type; must be CSV or Excel")]
    UnsupportedFileType,
    #[error("Could not read file: {0}")]
    Unreadable(IngestError),
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
    #[error("Null values found in required columns")]
    NullValues,
    #[error("PD, LGD, and EAD values must be numeric")]
    NotNumeric,
    #[error("PD must be between 0 and 1, got {0:?}")]
    PdOutOfRange(f64),
    #[error("LGD must be between 0 and 1, got {0:?}")]
    LgdOutOfRange(f64),
    #[error("EAD must be non-negative, got {0:?}")]
    NegativeEad(f64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for LegacyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFileType => "E_UNSUPPORTED_FILE_TYPE",
            Self::Unreadable(_) => "E_UNREADABLE_FILE",
            Self::MissingColumns(_) => "E_MISSING_COLUMNS",
            Self::NullValues => "E_NULL_VALUES",
            Self::NotNumeric => "E_NOT_NUMERIC",
            Self::PdOutOfRange(_) | Self::LgdOutOfRange(_) | Self::NegativeEad(_) => "E_OUT_OF_RANGE",
            Self::Store(_) => "E_DATABASE",
        }
    }
}

impl From<IngestError> for LegacyError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UnsupportedFileType => Self::UnsupportedFileType,
            other => Self::Unreadable(other),
        }
    }
}

/// Parse and range-check a legacy upload.
///
/// # Errors
///
/// Returns the first [`LegacyError`] found; see the variants for the checks.
pub fn parse_legacy(filename: &str, bytes: &[u8]) -> Result<Vec<LegacyRow>, LegacyError> {
    let table = ingest::read_upload(filename, bytes, &ACCEPTED_KINDS)?;

    let missing: Vec<&'static str> = LEGACY_COLUMNS
        .into_iter()
        .filter(|column| !table.headers.iter().any(|header| header == column))
        .collect();
    if !missing.is_empty() {
        return Err(LegacyError::MissingColumns(missing));
    }

    let has_nulls = table
        .rows
        .iter()
        .any(|row| LEGACY_COLUMNS.iter().any(|column| raw_text(row, column).is_none()));
    if has_nulls {
        return Err(LegacyError::NullValues);
    }

    table.rows.iter().map(legacy_row).collect()
}

/// Parse, validate, and store a legacy upload; returns the inserted count.
///
/// # Errors
///
/// Any [`LegacyError`] from [`parse_legacy`], or [`LegacyError::Store`].
pub async fn ingest_legacy(store: &dyn InstrumentStore, filename: &str, bytes: &[u8]) -> Result<u64, LegacyError> {
    let rows = parse_legacy(filename, bytes)?;
    let inserted = store.save_legacy_upload(filename, &rows).await?;
    tracing::info!(%filename, inserted, "legacy upload stored");
    Ok(inserted)
}

fn raw_text(row: &RawData, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn numeric(text: &str) -> Result<f64, LegacyError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(LegacyError::NotNumeric)
}

fn legacy_row(row: &RawData) -> Result<LegacyRow, LegacyError> {
    let raw_pd = raw_text(row, "PD").ok_or(LegacyError::NullValues)?;
    let raw_lgd = raw_text(row, "LGD").ok_or(LegacyError::NullValues)?;
    let raw_ead = raw_text(row, "EAD").ok_or(LegacyError::NullValues)?;

    let pd = numeric(&raw_pd)?;
    let lgd = numeric(&raw_lgd)?;
    let ead = numeric(&raw_ead)?;

    if !(0.0..=1.0).contains(&pd) {
        return Err(LegacyError::PdOutOfRange(pd));
    }
    if !(0.0..=1.0).contains(&lgd) {
        return Err(LegacyError::LgdOutOfRange(lgd));
    }
    if ead < 0.0 {
        return Err(LegacyError::NegativeEad(ead));
    }

    Ok(LegacyRow { raw_pd, raw_lgd, raw_ead, pd, lgd, ead })
}

#[cfg(test)]
#[path = "legacy_test.rs"]
mod tests;
