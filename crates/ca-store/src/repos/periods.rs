//! Financial period repository

use crate::models::FinancialPeriodRow;
use crate::StoreResult;
use ca_core::{FinancialFigures, QuarterRef};
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct PeriodRepo {
    pool: SqlitePool,
}

impl PeriodRepo {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_for_quarter(
        &self,
        company_id: i64,
        quarter: QuarterRef,
    ) -> StoreResult<Option<FinancialPeriodRow>> {
        let row = sqlx::query_as::<_, FinancialPeriodRow>(
            "SELECT * FROM financial_periods WHERE company_id = ? AND year = ? AND quarter = ?",
        )
        .bind(company_id)
        .bind(quarter.year)
        .bind(quarter.quarter as i64)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Every stored period for the company, newest first.
    pub async fn all_for_company(&self, company_id: i64) -> StoreResult<Vec<FinancialPeriodRow>> {
        let rows = sqlx::query_as::<_, FinancialPeriodRow>(
            "SELECT * FROM financial_periods WHERE company_id = ? ORDER BY year DESC, quarter DESC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_for_company(&self, company_id: i64) -> StoreResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM financial_periods WHERE company_id = ?")
                .bind(company_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Insert unless a period already exists for the quarter. Returns
    /// whether a row was written.
    pub async fn insert_if_absent(
        &self,
        company_id: i64,
        quarter: QuarterRef,
        figures: &FinancialFigures,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO financial_periods (
                company_id, year, quarter,
                revenue, cost_of_revenue, gross_profit, operating_income,
                operating_expenses, net_income, eps, eps_diluted, ebitda,
                research_and_development, selling_general_admin,
                interest_expense, income_tax_expense, operating_cash_flow,
                capital_expenditure, free_cash_flow, total_assets,
                total_liabilities, total_debt, cash_and_equivalents,
                shareholders_equity, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(company_id)
        .bind(quarter.year)
        .bind(quarter.quarter as i64)
        .bind(figures.revenue)
        .bind(figures.cost_of_revenue)
        .bind(figures.gross_profit)
        .bind(figures.operating_income)
        .bind(figures.operating_expenses)
        .bind(figures.net_income)
        .bind(figures.eps)
        .bind(figures.eps_diluted)
        .bind(figures.ebitda)
        .bind(figures.research_and_development)
        .bind(figures.selling_general_admin)
        .bind(figures.interest_expense)
        .bind(figures.income_tax_expense)
        .bind(figures.operating_cash_flow)
        .bind(figures.capital_expenditure)
        .bind(figures.free_cash_flow)
        .bind(figures.total_assets)
        .bind(figures.total_liabilities)
        .bind(figures.total_debt)
        .bind(figures.cash_and_equivalents)
        .bind(figures.shareholders_equity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
