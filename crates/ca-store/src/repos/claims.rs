//! Claim repository

use crate::models::{AuditedClaimRow, PendingClaim};
use crate::StoreResult;
use ca_core::ClaimDraft;
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct ClaimRepo {
    pool: SqlitePool,
}

impl ClaimRepo {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, transcript_id: i64, draft: &ClaimDraft) -> StoreResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO claims (
                transcript_id, speaker, speaker_role, claim_text, metric,
                metric_kind, stated_value, unit, comparison_period, is_gaap,
                segment, confidence, context, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transcript_id)
        .bind(&draft.speaker)
        .bind(&draft.speaker_role)
        .bind(&draft.claim_text)
        .bind(&draft.metric)
        .bind(draft.metric_kind.as_str())
        .bind(draft.stated_value)
        .bind(draft.unit.as_str())
        .bind(draft.comparison_period.as_str())
        .bind(draft.is_gaap)
        .bind(&draft.segment)
        .bind(draft.confidence)
        .bind(&draft.context)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn count_for_transcript(&self, transcript_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM claims WHERE transcript_id = ?")
            .bind(transcript_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Claims with no verification yet, joined with their transcript's
    /// company and quarter.
    pub async fn unverified(&self) -> StoreResult<Vec<PendingClaim>> {
        let rows = sqlx::query_as::<_, PendingClaim>(
            r#"
            SELECT c.id, c.transcript_id, c.speaker, c.speaker_role, c.claim_text,
                   c.metric, c.metric_kind, c.stated_value, c.unit,
                   c.comparison_period, c.is_gaap, c.segment, c.confidence,
                   c.context, t.company_id, co.ticker, t.year, t.quarter
            FROM claims c
            JOIN transcripts t ON t.id = c.transcript_id
            JOIN companies co ON co.id = t.company_id
            WHERE NOT EXISTS (SELECT 1 FROM verifications v WHERE v.claim_id = c.id)
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// A company's claims joined with their verifications, for the
    /// analyzer and for reporting.
    pub async fn audited_for_company(&self, company_id: i64) -> StoreResult<Vec<AuditedClaimRow>> {
        let rows = sqlx::query_as::<_, AuditedClaimRow>(
            r#"
            SELECT c.id AS claim_id, t.year, t.quarter, c.speaker, c.claim_text,
                   c.metric, c.metric_kind, c.stated_value, c.is_gaap,
                   v.verdict, v.actual_value, v.accuracy_score, v.explanation
            FROM claims c
            JOIN transcripts t ON t.id = c.transcript_id
            JOIN verifications v ON v.claim_id = c.id
            WHERE t.company_id = ?
            ORDER BY t.year, t.quarter, c.id
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
