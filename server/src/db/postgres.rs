//! Postgres-backed [`InstrumentStore`].
//!
//! DESIGN
//! ======
//! Uploads are written inside one transaction: the history row first (to get
//! the `upload_id`), then raw rows and validated rows in bulk `INSERT`s built
//! with `QueryBuilder`. Bulk inserts are chunked to stay under the Postgres
//! bind-parameter limit.
//!
//! `raw_data` is a `JSON` column, not `JSONB`: listings must return keys in
//! the order of the uploaded file's headers. It is bound as encoded text and
//! cast to `json`, since a `Json<_>` bind is typed `jsonb` and would be
//! normalized on the way in.

use std::collections::HashSet;

use async_trait::async_trait;
use records::{Instrument, InstrumentFilter, LegacyUploadHistoryEntry, Page, PreviewRow, RawData, UploadHistoryEntry};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::{InstrumentStore, LegacyRow, NewUpload, StoreError, flag_spellings};

const RAW_ROW_CHUNK: usize = 1000;
const VALIDATED_ROW_CHUNK: usize = 500;
const LEGACY_ROW_CHUNK: usize = 1000;

type RawInstrumentRow = (i64, i64, Json<RawData>, Option<Json<Vec<String>>>);
type HistoryRow = (i64, String, String, Option<String>, OffsetDateTime, String, i64, i64, i64);
type LegacyInstrumentRow = (i64, f64, f64, f64, String, String, String, OffsetDateTime);

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstrumentStore for PgStore {
    async fn existing_instrument_ids(&self, candidates: &[String]) -> Result<HashSet<String>, StoreError> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT instrument_id FROM validated_instruments WHERE instrument_id = ANY($1)",
        )
        .bind(candidates)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn save_upload(&self, upload: &NewUpload) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let upload_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO upload_history
                (filename, checksum, uploaded_by, schema_version, total_rows, valid_rows, invalid_rows)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING upload_id",
        )
        .bind(&upload.filename)
        .bind(&upload.checksum)
        .bind(upload.uploaded_by.as_deref())
        .bind(&upload.schema_version)
        .bind(upload.total_rows())
        .bind(upload.valid_rows())
        .bind(upload.invalid_rows())
        .fetch_one(&mut *tx)
        .await?;

        for chunk in upload.rows.chunks(RAW_ROW_CHUNK) {
            let encoded = chunk
                .iter()
                .map(|row| serde_json::to_string(&row.raw_data))
                .collect::<Result<Vec<_>, _>>()?;
            let mut builder =
                QueryBuilder::<Postgres>::new("INSERT INTO raw_instruments (upload_id, row_number, raw_data, errors) ");
            builder.push_values(chunk.iter().zip(encoded), |mut row_builder, (row, raw_json)| {
                row_builder
                    .push_bind(upload_id)
                    .push_bind(row.row_number)
                    .push_bind(raw_json)
                    .push_unseparated("::json")
                    .push_bind(row.has_errors().then(|| Json(&row.errors)));
            });
            builder.build().execute(&mut *tx).await?;
        }

        for chunk in upload.validated.chunks(VALIDATED_ROW_CHUNK) {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO validated_instruments (
                    upload_id, instrument_id, borrower_id, asset_class, classification_category,
                    measurement_basis, off_balance_flag, pd_12m, pd_lifetime, lgd, ead, sicr_flag,
                    eir, collateral_flag, collateral_type, collateral_value, appraisal_date,
                    drawdown_date, maturity_date
                ) ",
            );
            builder.push_values(chunk, |mut row_builder, instrument| {
                row_builder
                    .push_bind(upload_id)
                    .push_bind(&instrument.instrument_id)
                    .push_bind(&instrument.borrower_id)
                    .push_bind(&instrument.asset_class)
                    .push_bind(&instrument.classification_category)
                    .push_bind(&instrument.measurement_basis)
                    .push_bind(instrument.off_balance_flag)
                    .push_bind(instrument.pd_12m)
                    .push_bind(instrument.pd_lifetime)
                    .push_bind(instrument.lgd)
                    .push_bind(instrument.ead)
                    .push_bind(instrument.sicr_flag)
                    .push_bind(instrument.eir)
                    .push_bind(instrument.collateral_flag)
                    .push_bind(instrument.collateral_type.as_deref())
                    .push_bind(instrument.collateral_value)
                    .push_bind(instrument.appraisal_date)
                    .push_bind(instrument.drawdown_date)
                    .push_bind(instrument.maturity_date);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(upload_id)
    }

    async fn list_instruments(&self, filter: &InstrumentFilter) -> Result<Vec<PreviewRow>, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT id, row_number, raw_data, errors FROM raw_instruments WHERE TRUE");

        if let Some(asset_class) = &filter.asset_class {
            builder.push(" AND raw_data->>'asset_class' = ").push_bind(asset_class.as_str());
        }
        if let Some(category) = &filter.classification_category {
            builder
                .push(" AND raw_data->>'classification_category' = ")
                .push_bind(category.as_str());
        }
        if let Some(flag) = filter.off_balance_flag {
            builder
                .push(" AND lower(trim(raw_data->>'off_balance_flag')) = ANY(")
                .push_bind(flag_spellings(flag))
                .push(")");
        }
        match filter.error {
            Some(true) => {
                builder.push(" AND errors IS NOT NULL AND jsonb_array_length(errors) > 0");
            }
            Some(false) => {
                builder.push(" AND (errors IS NULL OR jsonb_array_length(errors) = 0)");
            }
            None => {}
        }
        builder.push(" ORDER BY id");

        let rows = builder
            .build_query_as::<RawInstrumentRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, row_number, raw_data, errors)| PreviewRow {
                id: Some(id),
                row_number,
                raw_data: raw_data.0,
                errors: errors.map(|errors| errors.0).unwrap_or_default(),
            })
            .collect())
    }

    async fn list_upload_history(&self, page: Page) -> Result<Vec<UploadHistoryEntry>, StoreError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT upload_id, filename, checksum, uploaded_by, upload_timestamp, schema_version,
                    total_rows, valid_rows, invalid_rows
             FROM upload_history
             ORDER BY upload_id
             LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(upload_id, filename, checksum, uploaded_by, ts, schema_version, total_rows, valid_rows, invalid_rows)| {
                    UploadHistoryEntry {
                        upload_id,
                        filename,
                        checksum,
                        uploaded_by,
                        upload_timestamp: rfc3339(ts),
                        schema_version,
                        total_rows,
                        valid_rows,
                        invalid_rows,
                    }
                },
            )
            .collect())
    }

    async fn save_legacy_upload(&self, filename: &str, rows: &[LegacyRow]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(LEGACY_ROW_CHUNK) {
            let mut builder =
                QueryBuilder::<Postgres>::new("INSERT INTO legacy_instruments (raw_pd, raw_lgd, raw_ead, pd, lgd, ead) ");
            builder.push_values(chunk, |mut row_builder, row| {
                row_builder
                    .push_bind(&row.raw_pd)
                    .push_bind(&row.raw_lgd)
                    .push_bind(&row.raw_ead)
                    .push_bind(row.pd)
                    .push_bind(row.lgd)
                    .push_bind(row.ead);
            });
            builder.build().execute(&mut *tx).await?;
        }

        let inserted = i64::try_from(rows.len()).unwrap_or(i64::MAX);
        sqlx::query("INSERT INTO legacy_upload_history (filename, inserted) VALUES ($1, $2)")
            .bind(filename)
            .bind(inserted)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    async fn list_legacy_instruments(&self, page: Page) -> Result<Vec<Instrument>, StoreError> {
        let rows = sqlx::query_as::<_, LegacyInstrumentRow>(
            "SELECT id, pd, lgd, ead, raw_pd, raw_lgd, raw_ead, created_at
             FROM legacy_instruments
             ORDER BY id
             LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, pd, lgd, ead, raw_pd, raw_lgd, raw_ead, created_at)| Instrument {
                id,
                pd,
                lgd,
                ead,
                raw_pd,
                raw_lgd,
                raw_ead,
                created_at: Some(rfc3339(created_at)),
            })
            .collect())
    }

    async fn list_legacy_upload_history(&self, page: Page) -> Result<Vec<LegacyUploadHistoryEntry>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String, i64, OffsetDateTime)>(
            "SELECT id, filename, inserted, uploaded_at
             FROM legacy_upload_history
             ORDER BY id
             LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, filename, inserted, uploaded_at)| LegacyUploadHistoryEntry {
                id,
                filename,
                inserted,
                uploaded_at: rfc3339(uploaded_at),
            })
            .collect())
    }
}

fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
