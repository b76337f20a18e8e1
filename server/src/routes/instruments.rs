//! Typed instrument routes: upload, staged-row listing, upload history.
//!
//! ERROR HANDLING
//! ==============
//! Errors are answered as plain text. Client mistakes (missing part,
//! unsupported or unreadable file) are 400; storage failures are logged and
//! answered with a generic 500.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use records::{InstrumentFilter, Page, PreviewRow, UploadHistoryEntry};

use crate::db::StoreError;
use crate::routes::multipart::{self, MultipartError};
use crate::services::ErrorCode;
use crate::services::upload::{self, UploadError, UploadRequest};
use crate::state::AppState;

pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// `POST /upload_instruments`: parse, validate, and stage an upload.
pub async fn upload_instruments(State(state): State<AppState>, multipart: Multipart) -> Response {
    let file = match multipart::read_upload(multipart).await {
        Ok(file) => file,
        Err(err) => return multipart_error_response(&err),
    };

    let request = UploadRequest {
        filename: &file.filename,
        bytes: &file.bytes,
        uploaded_by: file.uploaded_by.as_deref(),
        schema_version: &state.schema_version,
    };
    match upload::process_upload(state.store.as_ref(), request).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => upload_error_response(&err),
    }
}

/// `GET /instruments`: staged rows matching the query filters.
pub async fn list_instruments(
    State(state): State<AppState>,
    Query(filter): Query<InstrumentFilter>,
) -> Result<Json<Vec<PreviewRow>>, Response> {
    let rows = state
        .store
        .list_instruments(&filter)
        .await
        .map_err(|err| store_error_response(&err))?;
    Ok(Json(rows))
}

/// `GET /upload-history`: paged upload summaries, oldest first.
pub async fn upload_history(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<UploadHistoryEntry>>, Response> {
    let entries = state
        .store
        .list_upload_history(page.clamped())
        .await
        .map_err(|err| store_error_response(&err))?;
    Ok(Json(entries))
}

pub(crate) fn upload_error_to_status(err: &UploadError) -> StatusCode {
    match err {
        UploadError::Ingest(_) => StatusCode::BAD_REQUEST,
        UploadError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn upload_error_response(err: &UploadError) -> Response {
    let status = upload_error_to_status(err);
    if status.is_server_error() {
        tracing::error!(error = %err, code = err.error_code(), "instrument upload failed");
        return (status, INTERNAL_ERROR_MESSAGE).into_response();
    }
    tracing::warn!(error = %err, code = err.error_code(), "instrument upload rejected");
    (status, err.to_string()).into_response()
}

fn multipart_error_response(err: &MultipartError) -> Response {
    tracing::warn!(error = %err, "unreadable upload body");
    (err.status(), err.to_string()).into_response()
}

fn store_error_response(err: &StoreError) -> Response {
    tracing::error!(error = %err, "instrument listing failed");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
}

#[cfg(test)]
#[path = "instruments_test.rs"]
mod tests;
