//! Discrepancy pattern repository

use crate::models::PatternRow;
use crate::{StoreError, StoreResult};
use ca_core::Pattern;
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct PatternRepo {
    pool: SqlitePool,
}

impl PatternRepo {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn for_company(&self, company_id: i64) -> StoreResult<Vec<PatternRow>> {
        let rows = sqlx::query_as::<_, PatternRow>(
            "SELECT * FROM discrepancy_patterns WHERE company_id = ? ORDER BY id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Atomically replace the company's pattern set: delete and insert
    /// inside one transaction, so observers see either the old set or
    /// the new one.
    pub async fn replace_for_company(
        &self,
        company_id: i64,
        patterns: &[Pattern],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM discrepancy_patterns WHERE company_id = ?")
            .bind(company_id)
            .execute(&mut *tx)
            .await?;

        for pattern in patterns {
            let quarters = serde_json::to_string(&pattern.affected_quarters)
                .map_err(|e| StoreError::Decode(format!("affected_quarters: {e}")))?;
            let evidence = serde_json::to_string(&pattern.evidence)
                .map_err(|e| StoreError::Decode(format!("evidence: {e}")))?;

            sqlx::query(
                r#"
                INSERT INTO discrepancy_patterns
                    (company_id, kind, severity, description, affected_quarters, evidence, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(company_id)
            .bind(pattern.kind.as_str())
            .bind(pattern.severity)
            .bind(&pattern.description)
            .bind(quarters)
            .bind(evidence)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
