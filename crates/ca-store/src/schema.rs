//! Schema initialization
//!
//! Idempotent `CREATE TABLE IF NOT EXISTS` statements, safe to run on
//! every open. Unique constraints carry the identity rules: one company
//! per ticker, one transcript and one financial period per
//! (company, year, quarter), one verification per claim.

use sqlx::SqlitePool;

pub(crate) async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ticker TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            sector TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transcripts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            year INTEGER NOT NULL,
            quarter INTEGER NOT NULL,
            call_date TEXT NOT NULL,
            full_text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(company_id, year, quarter)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS financial_periods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            year INTEGER NOT NULL,
            quarter INTEGER NOT NULL,
            revenue REAL,
            cost_of_revenue REAL,
            gross_profit REAL,
            operating_income REAL,
            operating_expenses REAL,
            net_income REAL,
            eps REAL,
            eps_diluted REAL,
            ebitda REAL,
            research_and_development REAL,
            selling_general_admin REAL,
            interest_expense REAL,
            income_tax_expense REAL,
            operating_cash_flow REAL,
            capital_expenditure REAL,
            free_cash_flow REAL,
            total_assets REAL,
            total_liabilities REAL,
            total_debt REAL,
            cash_and_equivalents REAL,
            shareholders_equity REAL,
            created_at TEXT NOT NULL,
            UNIQUE(company_id, year, quarter)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS claims (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transcript_id INTEGER NOT NULL REFERENCES transcripts(id),
            speaker TEXT NOT NULL,
            speaker_role TEXT NOT NULL,
            claim_text TEXT NOT NULL,
            metric TEXT NOT NULL,
            metric_kind TEXT NOT NULL,
            stated_value REAL NOT NULL,
            unit TEXT NOT NULL,
            comparison_period TEXT NOT NULL,
            is_gaap INTEGER NOT NULL,
            segment TEXT,
            confidence REAL NOT NULL,
            context TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            claim_id INTEGER NOT NULL UNIQUE REFERENCES claims(id),
            actual_value REAL,
            accuracy_score REAL,
            verdict TEXT NOT NULL,
            explanation TEXT NOT NULL,
            period_id INTEGER REFERENCES financial_periods(id),
            comparison_period_id INTEGER REFERENCES financial_periods(id),
            misleading_flags TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS discrepancy_patterns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES companies(id),
            kind TEXT NOT NULL,
            severity REAL NOT NULL,
            description TEXT NOT NULL,
            affected_quarters TEXT NOT NULL,
            evidence TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_claims_transcript ON claims(transcript_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_periods_company ON financial_periods(company_id, year, quarter)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_patterns_company ON discrepancy_patterns(company_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
