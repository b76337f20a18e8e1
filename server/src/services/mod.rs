//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own parsing, validation, and persistence calls so route
//! handlers can stay focused on multipart extraction and status mapping.

pub mod ingest;
pub mod legacy;
pub mod upload;
pub mod validation;

/// Grepable error code logged next to every failed request.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}
