//! Verify stage
//!
//! Runs the verification engine over every claim without a
//! verification. Pure CPU: the company's periods are preloaded into a
//! map once and shared across its claims. Existing verifications are
//! never touched, so re-runs only fill gaps.

use crate::summary::VerifySummary;
use crate::PipelineResult;
use ca_core::{FinancialFigures, QuarterRef, Thresholds, VerificationEngine};
use ca_store::Store;
use std::collections::HashMap;
use tracing::{debug, error, info};

struct CompanyPeriods {
    figures: HashMap<QuarterRef, FinancialFigures>,
    ids: HashMap<QuarterRef, i64>,
}

pub async fn run(store: &Store, thresholds: Thresholds) -> PipelineResult<VerifySummary> {
    let engine = VerificationEngine::new(thresholds);
    let pending = store.claims().unverified().await?;
    let mut summary = VerifySummary::default();
    if pending.is_empty() {
        info!("no unverified claims");
        summary.ok = true;
        return Ok(summary);
    }
    info!("verifying {} claims", pending.len());

    let mut periods_by_company: HashMap<i64, CompanyPeriods> = HashMap::new();

    for claim in &pending {
        if !periods_by_company.contains_key(&claim.company_id) {
            let rows = store.periods().all_for_company(claim.company_id).await?;
            periods_by_company.insert(
                claim.company_id,
                CompanyPeriods {
                    figures: rows.iter().map(|r| (r.quarter_ref(), r.figures())).collect(),
                    ids: rows.iter().map(|r| (r.quarter_ref(), r.id)).collect(),
                },
            );
        }
        let periods = &periods_by_company[&claim.company_id];

        let draft = match claim.as_draft() {
            Ok(draft) => draft,
            Err(e) => {
                error!("claim {} ({}): {e}", claim.id, claim.ticker);
                summary.errors += 1;
                continue;
            }
        };

        let outcome = engine.verify(&draft, claim.quarter_ref(), &periods.figures);
        let period_id =
            outcome.periods_consulted.first().and_then(|q| periods.ids.get(q)).copied();
        let comparison_period_id =
            outcome.periods_consulted.get(1).and_then(|q| periods.ids.get(q)).copied();

        let inserted = store
            .verifications()
            .insert_if_absent(claim.id, &outcome, period_id, comparison_period_id)
            .await?;
        if inserted {
            debug!(
                "claim {} ({} {} {}): {}",
                claim.id,
                claim.ticker,
                claim.metric,
                claim.quarter_ref(),
                outcome.verdict,
            );
            summary.record(outcome.verdict);
        }
    }

    summary.ok = summary.errors == 0;
    info!(
        "verify complete: {} verified, {} approximate, {} misleading, {} incorrect, {} unverifiable",
        summary.verified,
        summary.approximately_correct,
        summary.misleading,
        summary.incorrect,
        summary.unverifiable,
    );
    Ok(summary)
}
