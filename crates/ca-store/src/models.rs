//! Row models
//!
//! One `FromRow` struct per table, plus conversion helpers back into the
//! core domain types. Enum columns are stored as their snake_case string
//! values; a value outside the vocabulary is a [`StoreError::Decode`].

use crate::{StoreError, StoreResult};
use ca_core::{
    ClaimDraft, ClaimUnit, ComparisonPeriod, FinancialFigures, MetricKind, MisleadingFlag,
    QuarterRef, Verdict,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CompanyRow {
    pub id: i64,
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TranscriptRow {
    pub id: i64,
    pub company_id: i64,
    pub year: i64,
    pub quarter: i64,
    pub call_date: NaiveDate,
    pub full_text: String,
    pub created_at: DateTime<Utc>,
}

impl TranscriptRow {
    pub fn quarter_ref(&self) -> QuarterRef {
        QuarterRef::new(self.year as i32, self.quarter as u8)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FinancialPeriodRow {
    pub id: i64,
    pub company_id: i64,
    pub year: i64,
    pub quarter: i64,
    pub revenue: Option<f64>,
    pub cost_of_revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub operating_expenses: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,
    pub eps_diluted: Option<f64>,
    pub ebitda: Option<f64>,
    pub research_and_development: Option<f64>,
    pub selling_general_admin: Option<f64>,
    pub interest_expense: Option<f64>,
    pub income_tax_expense: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub total_debt: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub shareholders_equity: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl FinancialPeriodRow {
    pub fn quarter_ref(&self) -> QuarterRef {
        QuarterRef::new(self.year as i32, self.quarter as u8)
    }

    pub fn figures(&self) -> FinancialFigures {
        FinancialFigures {
            revenue: self.revenue,
            cost_of_revenue: self.cost_of_revenue,
            gross_profit: self.gross_profit,
            operating_income: self.operating_income,
            operating_expenses: self.operating_expenses,
            net_income: self.net_income,
            eps: self.eps,
            eps_diluted: self.eps_diluted,
            ebitda: self.ebitda,
            research_and_development: self.research_and_development,
            selling_general_admin: self.selling_general_admin,
            interest_expense: self.interest_expense,
            income_tax_expense: self.income_tax_expense,
            operating_cash_flow: self.operating_cash_flow,
            capital_expenditure: self.capital_expenditure,
            free_cash_flow: self.free_cash_flow,
            total_assets: self.total_assets,
            total_liabilities: self.total_liabilities,
            total_debt: self.total_debt,
            cash_and_equivalents: self.cash_and_equivalents,
            shareholders_equity: self.shareholders_equity,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ClaimRow {
    pub id: i64,
    pub transcript_id: i64,
    pub speaker: String,
    pub speaker_role: String,
    pub claim_text: String,
    pub metric: String,
    pub metric_kind: String,
    pub stated_value: f64,
    pub unit: String,
    pub comparison_period: String,
    pub is_gaap: bool,
    pub segment: Option<String>,
    pub confidence: f64,
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClaimRow {
    /// Rehydrate the domain claim from the stored row.
    pub fn as_draft(&self) -> StoreResult<ClaimDraft> {
        Ok(ClaimDraft {
            speaker: self.speaker.clone(),
            speaker_role: self.speaker_role.clone(),
            claim_text: self.claim_text.clone(),
            metric: self.metric.clone(),
            metric_kind: parse_enum::<MetricKind>(&self.metric_kind)?,
            stated_value: self.stated_value,
            unit: parse_enum::<ClaimUnit>(&self.unit)?,
            comparison_period: parse_enum::<ComparisonPeriod>(&self.comparison_period)?,
            is_gaap: self.is_gaap,
            segment: self.segment.clone(),
            confidence: self.confidence,
            context: self.context.clone(),
        })
    }
}

/// A claim joined with its transcript's addressing, for the verify
/// stage.
#[derive(Debug, Clone, FromRow)]
pub struct PendingClaim {
    pub id: i64,
    pub transcript_id: i64,
    pub speaker: String,
    pub speaker_role: String,
    pub claim_text: String,
    pub metric: String,
    pub metric_kind: String,
    pub stated_value: f64,
    pub unit: String,
    pub comparison_period: String,
    pub is_gaap: bool,
    pub segment: Option<String>,
    pub confidence: f64,
    pub context: Option<String>,
    pub company_id: i64,
    pub ticker: String,
    pub year: i64,
    pub quarter: i64,
}

impl PendingClaim {
    pub fn quarter_ref(&self) -> QuarterRef {
        QuarterRef::new(self.year as i32, self.quarter as u8)
    }

    pub fn as_draft(&self) -> StoreResult<ClaimDraft> {
        Ok(ClaimDraft {
            speaker: self.speaker.clone(),
            speaker_role: self.speaker_role.clone(),
            claim_text: self.claim_text.clone(),
            metric: self.metric.clone(),
            metric_kind: parse_enum::<MetricKind>(&self.metric_kind)?,
            stated_value: self.stated_value,
            unit: parse_enum::<ClaimUnit>(&self.unit)?,
            comparison_period: parse_enum::<ComparisonPeriod>(&self.comparison_period)?,
            is_gaap: self.is_gaap,
            segment: self.segment.clone(),
            confidence: self.confidence,
            context: self.context.clone(),
        })
    }
}

/// A claim joined with its verification, for the analyzer and reports.
#[derive(Debug, Clone, FromRow)]
pub struct AuditedClaimRow {
    pub claim_id: i64,
    pub year: i64,
    pub quarter: i64,
    pub speaker: String,
    pub claim_text: String,
    pub metric: String,
    pub metric_kind: String,
    pub stated_value: f64,
    pub is_gaap: bool,
    pub verdict: String,
    pub actual_value: Option<f64>,
    pub accuracy_score: Option<f64>,
    pub explanation: String,
}

impl AuditedClaimRow {
    pub fn quarter_ref(&self) -> QuarterRef {
        QuarterRef::new(self.year as i32, self.quarter as u8)
    }

    pub fn verdict(&self) -> StoreResult<Verdict> {
        parse_enum(&self.verdict)
    }

    pub fn audited(&self) -> StoreResult<ca_core::AuditedClaim> {
        Ok(ca_core::AuditedClaim {
            metric: self.metric.clone(),
            metric_kind: parse_enum::<MetricKind>(&self.metric_kind)?,
            stated_value: self.stated_value,
            is_gaap: self.is_gaap,
            verdict: self.verdict()?,
            actual_value: self.actual_value,
            accuracy_score: self.accuracy_score,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VerificationRow {
    pub id: i64,
    pub claim_id: i64,
    pub actual_value: Option<f64>,
    pub accuracy_score: Option<f64>,
    pub verdict: String,
    pub explanation: String,
    pub period_id: Option<i64>,
    pub comparison_period_id: Option<i64>,
    pub misleading_flags: String,
    pub created_at: DateTime<Utc>,
}

impl VerificationRow {
    pub fn verdict(&self) -> StoreResult<Verdict> {
        parse_enum(&self.verdict)
    }

    pub fn flags(&self) -> StoreResult<Vec<MisleadingFlag>> {
        let names: Vec<String> = serde_json::from_str(&self.misleading_flags)
            .map_err(|e| StoreError::Decode(format!("misleading_flags: {e}")))?;
        names.iter().map(|n| parse_enum(n)).collect()
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PatternRow {
    pub id: i64,
    pub company_id: i64,
    pub kind: String,
    pub severity: f64,
    pub description: String,
    pub affected_quarters: String,
    pub evidence: String,
    pub created_at: DateTime<Utc>,
}

impl PatternRow {
    pub fn affected_quarters(&self) -> StoreResult<Vec<String>> {
        serde_json::from_str(&self.affected_quarters)
            .map_err(|e| StoreError::Decode(format!("affected_quarters: {e}")))
    }

    pub fn evidence(&self) -> StoreResult<Vec<String>> {
        serde_json::from_str(&self.evidence)
            .map_err(|e| StoreError::Decode(format!("evidence: {e}")))
    }
}

fn parse_enum<T: FromStr<Err = ca_core::claim::UnknownVariant>>(value: &str) -> StoreResult<T> {
    value.parse().map_err(|e: ca_core::claim::UnknownVariant| StoreError::Decode(e.to_string()))
}
