//! Typed instrument upload: ingest, validate, persist, summarize.
//!
//! SYSTEM CONTEXT
//! ==============
//! Called by `POST /upload_instruments`. Validation problems never fail the
//! request; they are attached to the returned preview rows. Only unreadable
//! files and storage failures are errors.

use records::UploadSummary;

use super::ErrorCode;
use super::ingest::{self, FileKind, IngestError};
use super::validation::{self, RowValidator};
use crate::db::{InstrumentStore, NewUpload, StoreError};

const ACCEPTED_KINDS: [FileKind; 2] = [FileKind::Csv, FileKind::Xlsx];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Ingest(err) => err.error_code(),
            Self::Store(_) => "E_DATABASE",
        }
    }
}

/// One uploaded file plus who sent it.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub filename: &'a str,
    pub bytes: &'a [u8],
    pub uploaded_by: Option<&'a str>,
    pub schema_version: &'a str,
}

/// Parse, validate, and persist an upload.
///
/// # Errors
///
/// [`UploadError::Ingest`] when the file cannot be read as CSV/XLSX,
/// [`UploadError::Store`] when persistence fails.
pub async fn process_upload(store: &dyn InstrumentStore, request: UploadRequest<'_>) -> Result<UploadSummary, UploadError> {
    let table = ingest::read_upload(request.filename, request.bytes, &ACCEPTED_KINDS)?;

    let candidate_ids = validation::instrument_ids(&table.rows);
    let existing = store.existing_instrument_ids(&candidate_ids).await?;

    let mut validator = RowValidator::new(&existing);
    let mut rows = Vec::with_capacity(table.rows.len());
    let mut validated = Vec::new();
    for (row_number, raw_data) in (1_i64..).zip(table.rows) {
        let (row, typed) = validator.validate(row_number, raw_data);
        rows.push(row);
        validated.extend(typed);
    }

    let upload = NewUpload {
        filename: request.filename.to_owned(),
        checksum: ingest::checksum(request.bytes),
        uploaded_by: request.uploaded_by.map(str::to_owned),
        schema_version: request.schema_version.to_owned(),
        rows,
        validated,
    };
    let upload_id = store.save_upload(&upload).await?;

    tracing::info!(
        upload_id,
        filename = %upload.filename,
        total_rows = upload.total_rows(),
        invalid_rows = upload.invalid_rows(),
        "instrument upload stored"
    );

    Ok(UploadSummary {
        upload_id,
        total_rows: upload.total_rows(),
        valid_rows: upload.valid_rows(),
        invalid_rows: upload.invalid_rows(),
        filename: upload.filename,
        checksum: upload.checksum,
        preview: upload.rows,
    })
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
