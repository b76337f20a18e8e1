//! Database initialization, migration runner, and the storage seam.
//!
//! SYSTEM CONTEXT
//! ==============
//! Startup uses this module to create the shared SQLx pool and enforce schema
//! migrations before accepting API traffic. Services talk to storage only
//! through [`InstrumentStore`], so route and service tests can run against
//! the in-memory store without a live Postgres.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use records::{Instrument, InstrumentFilter, LegacyUploadHistoryEntry, Page, PreviewRow, UploadHistoryEntry};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use time::Date;

/// Initialize the `PostgreSQL` connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to encode row: {0}")]
    Encode(#[from] serde_json::Error),
}

// =============================================================================
// STORED SHAPES
// =============================================================================

/// An error-free upload row with typed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInstrument {
    pub instrument_id: String,
    pub borrower_id: String,
    pub asset_class: String,
    pub classification_category: String,
    pub measurement_basis: String,
    pub off_balance_flag: bool,
    pub pd_12m: f64,
    pub pd_lifetime: f64,
    pub lgd: f64,
    pub ead: f64,
    pub sicr_flag: bool,
    pub eir: f64,
    pub collateral_flag: bool,
    pub collateral_type: Option<String>,
    pub collateral_value: Option<f64>,
    pub appraisal_date: Option<Date>,
    pub drawdown_date: Date,
    pub maturity_date: Date,
}

/// Everything persisted for one typed upload, written atomically.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub filename: String,
    pub checksum: String,
    pub uploaded_by: Option<String>,
    pub schema_version: String,
    /// Every parsed row, including rows with errors.
    pub rows: Vec<PreviewRow>,
    /// Typed copies of the error-free rows.
    pub validated: Vec<ValidatedInstrument>,
}

impl NewUpload {
    #[must_use]
    pub fn total_rows(&self) -> i64 {
        i64::try_from(self.rows.len()).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub fn invalid_rows(&self) -> i64 {
        i64::try_from(self.rows.iter().filter(|row| row.has_errors()).count()).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub fn valid_rows(&self) -> i64 {
        self.total_rows() - self.invalid_rows()
    }
}

/// One legacy instrument before insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRow {
    pub raw_pd: String,
    pub raw_lgd: String,
    pub raw_ead: String,
    pub pd: f64,
    pub lgd: f64,
    pub ead: f64,
}

// =============================================================================
// STORE
// =============================================================================

/// Persistence operations behind the upload and listing endpoints.
#[async_trait]
pub trait InstrumentStore: Send + Sync {
    /// Subset of `candidates` already present among validated instruments.
    async fn existing_instrument_ids(&self, candidates: &[String]) -> Result<HashSet<String>, StoreError>;

    /// Persist an upload and return its `upload_id`.
    async fn save_upload(&self, upload: &NewUpload) -> Result<i64, StoreError>;

    /// Staged rows matching `filter`, ordered by id.
    async fn list_instruments(&self, filter: &InstrumentFilter) -> Result<Vec<PreviewRow>, StoreError>;

    async fn list_upload_history(&self, page: Page) -> Result<Vec<UploadHistoryEntry>, StoreError>;

    /// Insert legacy rows plus their history entry; returns the inserted count.
    async fn save_legacy_upload(&self, filename: &str, rows: &[LegacyRow]) -> Result<u64, StoreError>;

    async fn list_legacy_instruments(&self, page: Page) -> Result<Vec<Instrument>, StoreError>;

    async fn list_legacy_upload_history(&self, page: Page) -> Result<Vec<LegacyUploadHistoryEntry>, StoreError>;
}

/// Lower-cased spellings a raw `off_balance_flag` may use for `flag`.
#[must_use]
pub fn flag_spellings(flag: bool) -> &'static [&'static str] {
    if flag {
        &crate::services::validation::TRUE_SPELLINGS
    } else {
        &crate::services::validation::FALSE_SPELLINGS
    }
}
