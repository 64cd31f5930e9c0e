//! Analyze stage
//!
//! Groups each company's verified claims by fiscal quarter, runs the
//! discrepancy detectors, and atomically replaces the company's stored
//! pattern set. Also assembles the per-company report surfaced by the
//! CLI: verdict tallies, accuracy rate, trust score, and the worst
//! discrepancies.

use crate::summary::AnalyzeSummary;
use crate::PipelineResult;
use ca_core::analyzer::ClaimsByQuarter;
use ca_core::{scoring, DiscrepancyAnalyzer, Pattern, Verdict, VerdictCounts};
use ca_store::models::{AuditedClaimRow, CompanyRow};
use ca_store::Store;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{error, info};

/// One company's analysis: verdict tallies, scores, and patterns.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyAnalysis {
    pub ticker: String,
    pub name: String,
    pub total_claims: u64,
    pub counts: VerdictCounts,
    pub accuracy_rate: f64,
    pub trust_score: f64,
    pub quarters_analyzed: Vec<String>,
    pub patterns: Vec<Pattern>,
    pub top_discrepancies: Vec<TopDiscrepancy>,
}

/// A claim whose verification went badly, for the report.
#[derive(Debug, Clone, Serialize)]
pub struct TopDiscrepancy {
    pub claim_id: i64,
    pub quarter: String,
    pub speaker: String,
    pub claim_text: String,
    pub metric: String,
    pub stated_value: f64,
    pub actual_value: Option<f64>,
    pub verdict: String,
    pub explanation: String,
}

pub async fn run(store: &Store) -> PipelineResult<AnalyzeSummary> {
    let mut summary = AnalyzeSummary::default();

    for company in store.companies().all().await? {
        match analyze_company(store, &company).await {
            Ok(Some(analysis)) => {
                summary.companies_analyzed += 1;
                for pattern in &analysis.patterns {
                    *summary.patterns.entry(pattern.kind.as_str().to_string()).or_default() += 1;
                }
                info!(
                    "{}: trust {:.1}, {} patterns across {} quarters",
                    company.ticker,
                    analysis.trust_score,
                    analysis.patterns.len(),
                    analysis.quarters_analyzed.len(),
                );
            }
            Ok(None) => summary.companies_skipped += 1,
            Err(e) => {
                error!("analysis failed for {}: {e}", company.ticker);
                summary.errors += 1;
            }
        }
    }

    summary.ok = summary.errors == 0;
    Ok(summary)
}

/// Analyze one company. Returns `None` when it has no verified claims;
/// in that case the stored pattern set is left untouched.
pub async fn analyze_company(
    store: &Store,
    company: &CompanyRow,
) -> PipelineResult<Option<CompanyAnalysis>> {
    let rows = store.claims().audited_for_company(company.id).await?;
    if rows.is_empty() {
        return Ok(None);
    }

    let mut counts = VerdictCounts::default();
    let mut claims_by_quarter = ClaimsByQuarter::new();
    for row in &rows {
        let audited = row.audited()?;
        counts.record(audited.verdict);
        claims_by_quarter.entry(row.quarter_ref()).or_default().push(audited);
    }

    let patterns = DiscrepancyAnalyzer::analyze(&claims_by_quarter);
    store.patterns().replace_for_company(company.id, &patterns).await?;

    Ok(Some(CompanyAnalysis {
        ticker: company.ticker.clone(),
        name: company.name.clone(),
        total_claims: rows.len() as u64,
        counts,
        accuracy_rate: scoring::percentage_accuracy(&counts),
        trust_score: scoring::trust_score(&counts),
        quarters_analyzed: claims_by_quarter.keys().map(|q| q.label()).collect(),
        patterns,
        top_discrepancies: top_discrepancies(&rows, 5),
    }))
}

/// The worst-scoring misleading and incorrect claims, up to `limit`.
fn top_discrepancies(rows: &[AuditedClaimRow], limit: usize) -> Vec<TopDiscrepancy> {
    let mut bad: Vec<&AuditedClaimRow> = rows
        .iter()
        .filter(|row| {
            matches!(row.verdict().ok(), Some(Verdict::Misleading) | Some(Verdict::Incorrect))
        })
        .collect();
    bad.sort_by(|a, b| {
        let a_score = a.accuracy_score.unwrap_or(1.0);
        let b_score = b.accuracy_score.unwrap_or(1.0);
        a_score.partial_cmp(&b_score).unwrap_or(Ordering::Equal)
    });

    bad.into_iter()
        .take(limit)
        .map(|row| TopDiscrepancy {
            claim_id: row.claim_id,
            quarter: row.quarter_ref().label(),
            speaker: row.speaker.clone(),
            claim_text: row.claim_text.clone(),
            metric: row.metric.clone(),
            stated_value: row.stated_value,
            actual_value: row.actual_value,
            verdict: row.verdict.clone(),
            explanation: row.explanation.clone(),
        })
        .collect()
}
