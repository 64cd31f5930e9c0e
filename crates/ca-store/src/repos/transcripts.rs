//! Transcript repository

use crate::models::TranscriptRow;
use crate::StoreResult;
use ca_core::QuarterRef;
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct TranscriptRepo {
    pool: SqlitePool,
}

impl TranscriptRepo {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_for_quarter(
        &self,
        company_id: i64,
        quarter: QuarterRef,
    ) -> StoreResult<Option<TranscriptRow>> {
        let row = sqlx::query_as::<_, TranscriptRow>(
            "SELECT * FROM transcripts WHERE company_id = ? AND year = ? AND quarter = ?",
        )
        .bind(company_id)
        .bind(quarter.year)
        .bind(quarter.quarter as i64)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert unless a transcript already exists for the quarter.
    /// Returns whether a row was written.
    pub async fn insert_if_absent(
        &self,
        company_id: i64,
        quarter: QuarterRef,
        call_date: NaiveDate,
        full_text: &str,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO transcripts
                (company_id, year, quarter, call_date, full_text, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(company_id)
        .bind(quarter.year)
        .bind(quarter.quarter as i64)
        .bind(call_date)
        .bind(full_text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transcripts that have no extracted claims yet.
    pub async fn unprocessed(&self) -> StoreResult<Vec<TranscriptRow>> {
        let rows = sqlx::query_as::<_, TranscriptRow>(
            r#"
            SELECT t.* FROM transcripts t
            WHERE NOT EXISTS (SELECT 1 FROM claims c WHERE c.transcript_id = t.id)
            ORDER BY t.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
