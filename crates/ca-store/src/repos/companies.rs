//! Company repository

use crate::models::CompanyRow;
use crate::StoreResult;
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct CompanyRepo {
    pool: SqlitePool,
}

impl CompanyRepo {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> StoreResult<Option<CompanyRow>> {
        let row = sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_by_ticker(&self, ticker: &str) -> StoreResult<Option<CompanyRow>> {
        let row = sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE ticker = ?")
            .bind(ticker.to_uppercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Insert the company if its ticker is new, then return the stored
    /// row either way. Tickers are canonicalized to upper case.
    pub async fn get_or_create(
        &self,
        ticker: &str,
        name: &str,
        sector: &str,
    ) -> StoreResult<CompanyRow> {
        let ticker = ticker.to_uppercase();
        sqlx::query(
            "INSERT OR IGNORE INTO companies (ticker, name, sector, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&ticker)
        .bind(name)
        .bind(sector)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE ticker = ?")
            .bind(&ticker)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn all(&self) -> StoreResult<Vec<CompanyRow>> {
        let rows = sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies ORDER BY ticker")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
