//! Verification repository

use crate::models::VerificationRow;
use crate::{StoreError, StoreResult};
use ca_core::{VerdictCounts, VerificationOutcome};
use chrono::Utc;
use sqlx::SqlitePool;
use std::str::FromStr;

#[derive(Clone)]
pub struct VerificationRepo {
    pool: SqlitePool,
}

impl VerificationRepo {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_for_claim(&self, claim_id: i64) -> StoreResult<Option<VerificationRow>> {
        let row = sqlx::query_as::<_, VerificationRow>(
            "SELECT * FROM verifications WHERE claim_id = ?",
        )
        .bind(claim_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Persist an outcome unless the claim already has one. Existing
    /// verifications are never mutated. Returns whether a row was
    /// written.
    pub async fn insert_if_absent(
        &self,
        claim_id: i64,
        outcome: &VerificationOutcome,
        period_id: Option<i64>,
        comparison_period_id: Option<i64>,
    ) -> StoreResult<bool> {
        let flags = serde_json::to_string(&outcome.flags)
            .map_err(|e| StoreError::Decode(format!("misleading_flags: {e}")))?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO verifications (
                claim_id, actual_value, accuracy_score, verdict, explanation,
                period_id, comparison_period_id, misleading_flags, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(claim_id)
        .bind(outcome.actual_value)
        .bind(outcome.accuracy_score)
        .bind(outcome.verdict.as_str())
        .bind(&outcome.explanation)
        .bind(period_id)
        .bind(comparison_period_id)
        .bind(flags)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Verdict tallies for a company across all its claims.
    pub async fn counts_for_company(&self, company_id: i64) -> StoreResult<VerdictCounts> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT v.verdict, COUNT(*)
            FROM verifications v
            JOIN claims c ON c.id = v.claim_id
            JOIN transcripts t ON t.id = c.transcript_id
            WHERE t.company_id = ?
            GROUP BY v.verdict
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = VerdictCounts::default();
        for (verdict, count) in rows {
            let count = count as u64;
            match ca_core::Verdict::from_str(&verdict)
                .map_err(|e| StoreError::Decode(e.to_string()))?
            {
                ca_core::Verdict::Verified => counts.verified += count,
                ca_core::Verdict::ApproximatelyCorrect => counts.approximately_correct += count,
                ca_core::Verdict::Misleading => counts.misleading += count,
                ca_core::Verdict::Incorrect => counts.incorrect += count,
                ca_core::Verdict::Unverifiable => counts.unverifiable += count,
            }
        }
        Ok(counts)
    }
}
