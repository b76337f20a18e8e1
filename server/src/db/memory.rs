//! In-process [`InstrumentStore`] for service and route tests.
//!
//! Mirrors the Postgres store: ids are assigned sequentially from 1, listings
//! are ordered by id, and the `off_balance_flag` filter matches the same
//! spellings the SQL query does.

use std::collections::HashSet;

use async_trait::async_trait;
use records::{Instrument, InstrumentFilter, LegacyUploadHistoryEntry, Page, PreviewRow, UploadHistoryEntry};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{InstrumentStore, LegacyRow, NewUpload, StoreError, ValidatedInstrument, flag_spellings};

const FIXED_TIMESTAMP: &str = "2024-01-01T00:00:00Z";

#[derive(Default)]
struct Tables {
    uploads: Vec<UploadHistoryEntry>,
    raw: Vec<PreviewRow>,
    validated: Vec<ValidatedInstrument>,
    legacy: Vec<Instrument>,
    legacy_history: Vec<LegacyUploadHistoryEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of validated rows written so far.
    pub async fn validated_count(&self) -> usize {
        self.tables.lock().await.validated.len()
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn page_slice<T: Clone>(items: &[T], page: Page) -> Vec<T> {
    let skip = usize::try_from(page.skip.max(0)).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit.max(0)).unwrap_or(usize::MAX);
    items.iter().skip(skip).take(limit).cloned().collect()
}

fn text_field<'a>(row: &'a PreviewRow, key: &str) -> Option<&'a str> {
    row.raw_data.get(key).and_then(Value::as_str)
}

fn matches(row: &PreviewRow, filter: &InstrumentFilter) -> bool {
    if let Some(want) = filter.error {
        if row.has_errors() != want {
            return false;
        }
    }
    if let Some(asset_class) = &filter.asset_class {
        if text_field(row, "asset_class") != Some(asset_class.as_str()) {
            return false;
        }
    }
    if let Some(category) = &filter.classification_category {
        if text_field(row, "classification_category") != Some(category.as_str()) {
            return false;
        }
    }
    if let Some(flag) = filter.off_balance_flag {
        let Some(raw) = row.raw_data.get("off_balance_flag") else {
            return false;
        };
        let text = match raw {
            Value::String(s) => s.trim().to_lowercase(),
            Value::Null => return false,
            other => other.to_string(),
        };
        if !flag_spellings(flag).contains(&text.as_str()) {
            return false;
        }
    }
    true
}

#[async_trait]
impl InstrumentStore for MemoryStore {
    async fn existing_instrument_ids(&self, candidates: &[String]) -> Result<HashSet<String>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .validated
            .iter()
            .filter(|v| candidates.contains(&v.instrument_id))
            .map(|v| v.instrument_id.clone())
            .collect())
    }

    async fn save_upload(&self, upload: &NewUpload) -> Result<i64, StoreError> {
        let mut tables = self.tables.lock().await;
        let upload_id = to_i64(tables.uploads.len() + 1);
        tables.uploads.push(UploadHistoryEntry {
            upload_id,
            filename: upload.filename.clone(),
            checksum: upload.checksum.clone(),
            uploaded_by: upload.uploaded_by.clone(),
            upload_timestamp: FIXED_TIMESTAMP.to_owned(),
            schema_version: upload.schema_version.clone(),
            total_rows: upload.total_rows(),
            valid_rows: upload.valid_rows(),
            invalid_rows: upload.invalid_rows(),
        });
        for row in &upload.rows {
            let id = to_i64(tables.raw.len() + 1);
            let mut stored = row.clone();
            stored.id = Some(id);
            tables.raw.push(stored);
        }
        tables.validated.extend(upload.validated.iter().cloned());
        Ok(upload_id)
    }

    async fn list_instruments(&self, filter: &InstrumentFilter) -> Result<Vec<PreviewRow>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.raw.iter().filter(|row| matches(row, filter)).cloned().collect())
    }

    async fn list_upload_history(&self, page: Page) -> Result<Vec<UploadHistoryEntry>, StoreError> {
        Ok(page_slice(&self.tables.lock().await.uploads, page))
    }

    async fn save_legacy_upload(&self, filename: &str, rows: &[LegacyRow]) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        for row in rows {
            let id = to_i64(tables.legacy.len() + 1);
            tables.legacy.push(Instrument {
                id,
                pd: row.pd,
                lgd: row.lgd,
                ead: row.ead,
                raw_pd: row.raw_pd.clone(),
                raw_lgd: row.raw_lgd.clone(),
                raw_ead: row.raw_ead.clone(),
                created_at: Some(FIXED_TIMESTAMP.to_owned()),
            });
        }
        let id = to_i64(tables.legacy_history.len() + 1);
        tables.legacy_history.push(LegacyUploadHistoryEntry {
            id,
            filename: filename.to_owned(),
            inserted: to_i64(rows.len()),
            uploaded_at: FIXED_TIMESTAMP.to_owned(),
        });
        Ok(rows.len() as u64)
    }

    async fn list_legacy_instruments(&self, page: Page) -> Result<Vec<Instrument>, StoreError> {
        Ok(page_slice(&self.tables.lock().await.legacy, page))
    }

    async fn list_legacy_upload_history(&self, page: Page) -> Result<Vec<LegacyUploadHistoryEntry>, StoreError> {
        Ok(page_slice(&self.tables.lock().await.legacy_history, page))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
