//! SQLite persistence for the claim auditor
//!
//! One table per entity, idempotent schema creation at open time, and a
//! repository per entity exposing exactly the queries the pipeline
//! stages need. All writes commit immediately; the only multi-statement
//! transaction is the atomic pattern replacement in
//! [`repos::PatternRepo::replace_for_company`].

pub mod models;
pub mod repos;
mod schema;

#[cfg(test)]
mod tests;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored value error: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the claim auditor database. Cloning is cheap; the inner
/// pool is reference-counted.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database at `database_url` and run schema
    /// initialization.
    pub async fn open(database_url: &str) -> StoreResult<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        Self::init(pool).await
    }

    /// In-memory store for tests. A single connection keeps the whole
    /// database on one handle.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;
        schema::init(&pool).await?;
        debug!("database schema ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn companies(&self) -> repos::CompanyRepo {
        repos::CompanyRepo::new(self.pool.clone())
    }

    pub fn transcripts(&self) -> repos::TranscriptRepo {
        repos::TranscriptRepo::new(self.pool.clone())
    }

    pub fn periods(&self) -> repos::PeriodRepo {
        repos::PeriodRepo::new(self.pool.clone())
    }

    pub fn claims(&self) -> repos::ClaimRepo {
        repos::ClaimRepo::new(self.pool.clone())
    }

    pub fn verifications(&self) -> repos::VerificationRepo {
        repos::VerificationRepo::new(self.pool.clone())
    }

    pub fn patterns(&self) -> repos::PatternRepo {
        repos::PatternRepo::new(self.pool.clone())
    }
}
