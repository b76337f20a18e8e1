//! Legacy PD/LGD/EAD routes. Errors are JSON `{ "detail": ... }` bodies.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use records::{ErrorDetail, Instrument, LegacyUploadHistoryEntry, LegacyUploadResult, Page};

use crate::db::StoreError;
use crate::routes::instruments::INTERNAL_ERROR_MESSAGE;
use crate::routes::multipart;
use crate::services::ErrorCode;
use crate::services::legacy::{self, LegacyError};
use crate::state::AppState;

type DetailResponse = (StatusCode, Json<ErrorDetail>);

/// `POST /upload`: validate and insert a legacy instrument file.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<LegacyUploadResult>, DetailResponse> {
    let multipart = multipart.map_err(|rejection| detail(rejection.status(), rejection.body_text()))?;
    let file = multipart::read_upload(multipart)
        .await
        .map_err(|err| detail(err.status(), err.to_string()))?;

    let inserted = legacy::ingest_legacy(state.store.as_ref(), &file.filename, &file.bytes)
        .await
        .map_err(|err| legacy_error_response(&err))?;
    Ok(Json(LegacyUploadResult { inserted }))
}

/// `GET /legacy/instruments`: paged legacy instruments.
pub async fn list_instruments(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Instrument>>, DetailResponse> {
    let rows = state
        .store
        .list_legacy_instruments(page.clamped())
        .await
        .map_err(|err| store_error_response(&err))?;
    Ok(Json(rows))
}

/// `GET /legacy/upload-history`: paged legacy upload records.
pub async fn upload_history(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<LegacyUploadHistoryEntry>>, DetailResponse> {
    let entries = state
        .store
        .list_legacy_upload_history(page.clamped())
        .await
        .map_err(|err| store_error_response(&err))?;
    Ok(Json(entries))
}

pub(crate) fn legacy_error_to_status(err: &LegacyError) -> StatusCode {
    match err {
        LegacyError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn detail(status: StatusCode, message: impl Into<String>) -> DetailResponse {
    (status, Json(ErrorDetail::new(message)))
}

fn legacy_error_response(err: &LegacyError) -> DetailResponse {
    let status = legacy_error_to_status(err);
    if status.is_server_error() {
        tracing::error!(error = %err, code = err.error_code(), "legacy upload failed");
        return detail(status, INTERNAL_ERROR_MESSAGE);
    }
    tracing::warn!(error = %err, code = err.error_code(), "legacy upload rejected");
    detail(status, err.to_string())
}

fn store_error_response(err: &StoreError) -> DetailResponse {
    tracing::error!(error = %err, "legacy listing failed");
    detail(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}

#[cfg(test)]
#[path = "legacy_test.rs"]
mod tests;
