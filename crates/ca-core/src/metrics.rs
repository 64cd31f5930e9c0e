//! Metric registry
//!
//! The bridge between what an executive says ("top line", "FCF") and
//! which line item of the financial statements to read. Canonical names
//! resolve either directly to a statement field or to a derived ratio of
//! two fields. Anything outside the registry is unverifiable by
//! construction.

use crate::math::margin;
use serde::{Deserialize, Serialize};

/// One quarter's worth of statement line items. Every field is optional;
/// sources routinely omit line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialFigures {
    // Income statement
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
    // Cash flow
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
    pub free_cash_flow: Option<f64>,
    // Balance sheet
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub total_debt: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub shareholders_equity: Option<f64>,
}

/// Resolves claim metric names against [`FinancialFigures`].
pub struct MetricRegistry;

impl MetricRegistry {
    /// Normalize a free-form metric name to its canonical form. Unknown
    /// names come back lower-cased and trimmed but otherwise unchanged.
    pub fn normalize(raw: &str) -> String {
        let name = raw.trim().to_lowercase();
        let canonical = match name.as_str() {
            // Revenue
            "total revenue" | "net revenue" | "net revenues" | "sales" | "net sales"
            | "top line" => "revenue",
            // Earnings
            "earnings per share" | "basic eps" => "eps",
            "diluted eps" | "diluted earnings per share" => "eps_diluted",
            // Operating
            "op income" | "operating profit" | "operating loss" => "operating_income",
            "op margin" | "operating profit margin" => "operating_margin",
            // Margins
            "gross profit margin" => "gross_margin",
            "profit margin" => "net_margin",
            // Cash flow
            "fcf" => "free_cash_flow",
            "capex" | "capital expenditures" => "capital_expenditure",
            // Opex
            "r&d" | "research and development" => "research_and_development",
            "sg&a" | "sga" => "selling_general_admin",
            // Balance sheet
            "cash" | "cash and cash equivalents" => "cash_and_equivalents",
            "debt" | "long-term debt" => "total_debt",
            "stockholders equity" | "shareholders equity" | "total stockholders equity" => {
                "shareholders_equity"
            }
            _ => return name,
        };
        canonical.to_string()
    }

    /// Whether a canonical metric has a direct or derived mapping.
    pub fn can_resolve(metric: &str) -> bool {
        Self::is_direct(metric) || Self::is_derived(metric)
    }

    /// Whether a canonical metric is a derived ratio (reported in
    /// percent).
    pub fn is_derived(metric: &str) -> bool {
        Self::derived_fields(metric).is_some()
    }

    fn is_direct(metric: &str) -> bool {
        matches!(
            metric,
            "revenue"
                | "cost_of_revenue"
                | "gross_profit"
                | "operating_income"
                | "operating_expenses"
                | "net_income"
                | "eps"
                | "eps_diluted"
                | "ebitda"
                | "research_and_development"
                | "selling_general_admin"
                | "interest_expense"
                | "income_tax_expense"
                | "operating_cash_flow"
                | "capital_expenditure"
                | "free_cash_flow"
                | "total_assets"
                | "total_liabilities"
                | "total_debt"
                | "cash_and_equivalents"
                | "shareholders_equity"
        )
    }

    /// The actual numeric value for `metric` in `figures`, or `None`
    /// when the required fields are missing (or a derived denominator is
    /// zero). Derived metrics come back as percentages.
    pub fn resolve(metric: &str, figures: &FinancialFigures) -> Option<f64> {
        if let Some((num, den)) = Self::derived_fields(metric) {
            let num = Self::field(num, figures)?;
            let den = Self::field(den, figures)?;
            return margin(num, den);
        }
        let value = Self::field(metric, figures)?;
        // Sources store capex as a negative outflow; executives report it
        // as a positive figure.
        if metric == "capital_expenditure" {
            return Some(value.abs());
        }
        Some(value)
    }

    fn derived_fields(metric: &str) -> Option<(&'static str, &'static str)> {
        match metric {
            "gross_margin" => Some(("gross_profit", "revenue")),
            "operating_margin" => Some(("operating_income", "revenue")),
            "net_margin" => Some(("net_income", "revenue")),
            _ => None,
        }
    }

    fn field(name: &str, f: &FinancialFigures) -> Option<f64> {
        match name {
            "revenue" => f.revenue,
            "cost_of_revenue" => f.cost_of_revenue,
            "gross_profit" => f.gross_profit,
            "operating_income" => f.operating_income,
            "operating_expenses" => f.operating_expenses,
            "net_income" => f.net_income,
            "eps" => f.eps,
            "eps_diluted" => f.eps_diluted,
            "ebitda" => f.ebitda,
            "research_and_development" => f.research_and_development,
            "selling_general_admin" => f.selling_general_admin,
            "interest_expense" => f.interest_expense,
            "income_tax_expense" => f.income_tax_expense,
            "operating_cash_flow" => f.operating_cash_flow,
            "capital_expenditure" => f.capital_expenditure,
            "free_cash_flow" => f.free_cash_flow,
            "total_assets" => f.total_assets,
            "total_liabilities" => f.total_liabilities,
            "total_debt" => f.total_debt,
            "cash_and_equivalents" => f.cash_and_equivalents,
            "shareholders_equity" => f.shareholders_equity,
            _ => None,
        }
    }
}
