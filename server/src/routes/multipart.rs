//! Multipart extraction shared by both upload endpoints.

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::StatusCode;

/// Fallback name recorded when the `file` part carries no filename.
pub const UNKNOWN_FILENAME: &str = "unknown";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
    /// Optional `uploaded_by` text part, blank treated as absent.
    pub uploaded_by: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MultipartError {
    #[error("Missing multipart field 'file'")]
    MissingFile,
    #[error("{message}")]
    Read { status: StatusCode, message: String },
}

impl MultipartError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::Read { status, .. } => *status,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for MultipartError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Read { status: err.status(), message: err.body_text() }
    }
}

/// Drain `multipart`, keeping the `file` part and the optional `uploaded_by`
/// part. Unknown parts are skipped; a repeated `file` part keeps the last one.
///
/// # Errors
///
/// [`MultipartError::MissingFile`] when no `file` part was sent, or
/// [`MultipartError::Read`] when the body cannot be read (including the body
/// size limit).
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, MultipartError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut uploaded_by = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNKNOWN_FILENAME)
                    .to_owned();
                let bytes = field.bytes().await?;
                file = Some((filename, bytes));
            }
            Some("uploaded_by") => {
                let text = field.text().await?;
                let text = text.trim();
                uploaded_by = (!text.is_empty()).then(|| text.to_owned());
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or(MultipartError::MissingFile)?;
    Ok(UploadedFile { filename, bytes, uploaded_by })
}
