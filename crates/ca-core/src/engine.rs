//! Per-claim verification engine
//!
//! Reconciles one extracted claim against the structured statement data:
//! resolve the metric, select the periods, compute the actual value,
//! normalize units, score accuracy, detect misleading framing, and
//! assign the verdict.
//!
//! The engine never fails. Missing data, unresolvable metrics, and
//! zero-base growth all come back as `unverifiable` outcomes with an
//! explanation the caller can persist as-is.

use crate::claim::{ClaimDraft, ClaimUnit, MetricKind, MisleadingFlag, QuarterRef, Verdict};
use crate::math::{accuracy_score, growth_rate, normalize_to_unit, percentage_difference};
use crate::metrics::{FinancialFigures, MetricRegistry};
use crate::scoring::{assign_verdict, Thresholds};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Read access to a company's financial periods.
pub trait PeriodProvider {
    fn period(&self, quarter: QuarterRef) -> Option<&FinancialFigures>;
}

impl PeriodProvider for HashMap<QuarterRef, FinancialFigures> {
    fn period(&self, quarter: QuarterRef) -> Option<&FinancialFigures> {
        self.get(&quarter)
    }
}

impl PeriodProvider for BTreeMap<QuarterRef, FinancialFigures> {
    fn period(&self, quarter: QuarterRef) -> Option<&FinancialFigures> {
        self.get(&quarter)
    }
}

/// The result of verifying one claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub actual_value: Option<f64>,
    pub accuracy_score: Option<f64>,
    pub verdict: Verdict,
    pub explanation: String,
    pub flags: Vec<MisleadingFlag>,
    /// Quarters whose statement data the verdict rests on.
    pub periods_consulted: Vec<QuarterRef>,
}

impl VerificationOutcome {
    fn unverifiable(reason: impl Into<String>) -> Self {
        Self {
            actual_value: None,
            accuracy_score: None,
            verdict: Verdict::Unverifiable,
            explanation: reason.into(),
            flags: Vec::new(),
            periods_consulted: Vec::new(),
        }
    }
}

pub struct VerificationEngine {
    thresholds: Thresholds,
}

impl VerificationEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Verify `claim`, made on the earnings call for quarter `at`,
    /// against the periods visible through `periods`.
    pub fn verify(
        &self,
        claim: &ClaimDraft,
        at: QuarterRef,
        periods: &dyn PeriodProvider,
    ) -> VerificationOutcome {
        if !MetricRegistry::can_resolve(&claim.metric) {
            return VerificationOutcome::unverifiable(format!(
                "Metric '{}' has no mapping to the financial statements.",
                claim.metric
            ));
        }

        let (actual, consulted) = match self.effective_kind(claim) {
            MetricKind::GrowthRate | MetricKind::Change => {
                match self.actual_growth(claim, at, periods) {
                    Ok(pair) => pair,
                    Err(outcome) => return outcome,
                }
            }
            MetricKind::Margin | MetricKind::Ratio => {
                let Some(figures) = periods.period(at) else {
                    return VerificationOutcome::unverifiable(NO_DATA);
                };
                let Some(value) = MetricRegistry::resolve(&claim.metric, figures) else {
                    return VerificationOutcome::unverifiable(NO_DATA);
                };
                (value, vec![at])
            }
            MetricKind::Absolute | MetricKind::PerShare => {
                let Some(figures) = periods.period(at) else {
                    return VerificationOutcome::unverifiable(NO_DATA);
                };
                let Some(raw) = MetricRegistry::resolve(&claim.metric, figures) else {
                    return VerificationOutcome::unverifiable(NO_DATA);
                };
                // Statement data is in raw dollars; compare in the claim's
                // declared unit.
                (normalize_to_unit(raw, claim.unit), vec![at])
            }
        };

        let stated = stated_comparable(claim);
        let score = accuracy_score(stated, actual);
        let flags = detect_flags(claim, stated, actual, score);
        let verdict = assign_verdict(score, &flags, &self.thresholds);
        let explanation = explain(stated, actual, verdict, &flags);

        VerificationOutcome {
            actual_value: Some(actual),
            accuracy_score: Some(score),
            verdict,
            explanation,
            flags,
            periods_consulted: consulted,
        }
    }

    /// Extractors routinely tag "gross margin was 46%, up from 44%" as a
    /// change claim with the 46 as the stated value. A double-digit
    /// quarterly margin *change* is implausible, so a derived-margin
    /// claim in that shape is verified as a margin level instead.
    fn effective_kind(&self, claim: &ClaimDraft) -> MetricKind {
        if claim.metric_kind.is_comparative()
            && MetricRegistry::is_derived(&claim.metric)
            && claim.stated_value > 10.0
        {
            return MetricKind::Margin;
        }
        claim.metric_kind
    }

    fn actual_growth(
        &self,
        claim: &ClaimDraft,
        at: QuarterRef,
        periods: &dyn PeriodProvider,
    ) -> Result<(f64, Vec<QuarterRef>), VerificationOutcome> {
        let Some(comparison) = at.comparison_for(claim.comparison_period) else {
            return Err(VerificationOutcome::unverifiable(format!(
                "Growth claim with '{}' comparison basis cannot be matched to a prior period.",
                claim.comparison_period.as_str()
            )));
        };
        let (Some(current), Some(prior)) = (periods.period(at), periods.period(comparison)) else {
            return Err(VerificationOutcome::unverifiable(NO_DATA));
        };
        let (Some(current_value), Some(prior_value)) = (
            MetricRegistry::resolve(&claim.metric, current),
            MetricRegistry::resolve(&claim.metric, prior),
        ) else {
            return Err(VerificationOutcome::unverifiable(NO_DATA));
        };
        let Some(actual) = growth_rate(current_value, prior_value) else {
            return Err(VerificationOutcome::unverifiable(NO_DATA));
        };
        Ok((actual, vec![at, comparison]))
    }
}

const NO_DATA: &str = "Could not find sufficient financial data to verify this claim.";

/// Normalize the stated value for an apples-to-apples comparison.
/// Basis points become percentage points; everything else is already in
/// the claim's declared unit.
fn stated_comparable(claim: &ClaimDraft) -> f64 {
    if claim.unit == ClaimUnit::BasisPoints {
        return claim.stated_value / 100.0;
    }
    claim.stated_value
}

fn detect_flags(claim: &ClaimDraft, stated: f64, actual: f64, score: f64) -> Vec<MisleadingFlag> {
    let mut flags = Vec::new();

    // Close but consistently overshooting: rounding in the favorable
    // direction.
    if (0.90..0.98).contains(&score) && stated.abs() > actual.abs() {
        flags.push(MisleadingFlag::RoundingBias);
    }

    if !claim.is_gaap {
        flags.push(MisleadingFlag::GaapNongaapMismatch);
    }

    // Segment-level claims are verified against total-company data.
    if claim.segment.is_some() {
        flags.push(MisleadingFlag::SegmentVsTotal);
    }

    flags
}

fn explain(stated: f64, actual: f64, verdict: Verdict, flags: &[MisleadingFlag]) -> String {
    let diff = match percentage_difference(stated, actual) {
        Some(pct) => format!("{pct:+.1}%"),
        None => "n/a".to_string(),
    };

    let mut text = match verdict {
        Verdict::Verified => format!(
            "Verified: stated {stated:.2}, actual {actual:.2} (difference {diff}). \
             Within acceptable tolerance."
        ),
        Verdict::ApproximatelyCorrect => format!(
            "Approximately correct: stated {stated:.2}, actual {actual:.2} (difference {diff})."
        ),
        Verdict::Misleading => format!(
            "Misleading: stated {stated:.2}, actual {actual:.2} (difference {diff}). \
             The framing may create a false impression."
        ),
        Verdict::Incorrect => format!(
            "Incorrect: stated {stated:.2}, actual {actual:.2} (difference {diff}). \
             Materially inaccurate."
        ),
        Verdict::Unverifiable => "Cannot verify against available data.".to_string(),
    };

    if !flags.is_empty() {
        let names: Vec<String> =
            flags.iter().map(|f| f.as_str().replace('_', " ")).collect();
        text.push_str(&format!(" Flags: {}.", names.join(", ")));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ComparisonPeriod;

    fn engine() -> VerificationEngine {
        VerificationEngine::new(Thresholds::default())
    }

    fn claim(metric: &str, kind: MetricKind, value: f64, unit: ClaimUnit) -> ClaimDraft {
        ClaimDraft {
            speaker: "Jane Doe".to_string(),
            speaker_role: "CFO".to_string(),
            claim_text: String::new(),
            metric: metric.to_string(),
            metric_kind: kind,
            stated_value: value,
            unit,
            comparison_period: ComparisonPeriod::None,
            is_gaap: true,
            segment: None,
            confidence: 0.9,
            context: None,
        }
    }

    fn revenue_figures(revenue: f64) -> FinancialFigures {
        FinancialFigures { revenue: Some(revenue), ..Default::default() }
    }

    fn two_quarters() -> HashMap<QuarterRef, FinancialFigures> {
        let mut periods = HashMap::new();
        periods.insert(QuarterRef::new(2025, 3), revenue_figures(94.93e9));
        periods.insert(QuarterRef::new(2024, 3), revenue_figures(85.777e9));
        periods
    }

    #[test]
    fn yoy_growth_verified() {
        let mut c = claim("revenue", MetricKind::GrowthRate, 10.7, ClaimUnit::Percent);
        c.comparison_period = ComparisonPeriod::YearOverYear;

        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &two_quarters());
        let actual = outcome.actual_value.unwrap();
        assert!((actual - 10.67).abs() < 0.01);
        assert!(outcome.accuracy_score.unwrap() >= 0.98);
        assert_eq!(outcome.verdict, Verdict::Verified);
        assert_eq!(
            outcome.periods_consulted,
            vec![QuarterRef::new(2025, 3), QuarterRef::new(2024, 3)]
        );
    }

    #[test]
    fn absolute_with_unit_conversion() {
        let c = claim("revenue", MetricKind::Absolute, 94.9, ClaimUnit::UsdBillions);
        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &two_quarters());
        assert!((outcome.actual_value.unwrap() - 94.93).abs() < 1e-9);
        assert_eq!(outcome.verdict, Verdict::Verified);
    }

    #[test]
    fn derived_margin_close_to_stated() {
        let mut periods = HashMap::new();
        periods.insert(
            QuarterRef::new(2025, 3),
            FinancialFigures {
                revenue: Some(94.93e9),
                gross_profit: Some(43.879e9),
                ..Default::default()
            },
        );
        let c = claim("gross_margin", MetricKind::Margin, 46.0, ClaimUnit::Percent);
        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &periods);
        assert!((outcome.actual_value.unwrap() - 46.22).abs() < 0.01);
        assert!(outcome.accuracy_score.unwrap() > 0.99);
        assert_eq!(outcome.verdict, Verdict::Verified);
    }

    #[test]
    fn overstated_growth_is_incorrect() {
        let mut c = claim("revenue", MetricKind::GrowthRate, 15.0, ClaimUnit::Percent);
        c.comparison_period = ComparisonPeriod::YearOverYear;

        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &two_quarters());
        let score = outcome.accuracy_score.unwrap();
        assert!((score - 0.595).abs() < 0.01);
        assert_eq!(outcome.verdict, Verdict::Incorrect);
    }

    #[test]
    fn non_gaap_upgrades_to_misleading() {
        let mut periods = HashMap::new();
        periods.insert(
            QuarterRef::new(2025, 3),
            FinancialFigures { eps_diluted: Some(1.46), ..Default::default() },
        );
        let mut c = claim("eps_diluted", MetricKind::PerShare, 1.47, ClaimUnit::Usd);
        c.is_gaap = false;

        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &periods);
        assert!(outcome.accuracy_score.unwrap() > 0.99);
        assert_eq!(outcome.verdict, Verdict::Misleading);
        assert!(outcome.flags.contains(&MisleadingFlag::GaapNongaapMismatch));
    }

    #[test]
    fn segment_claim_is_flagged() {
        let mut c = claim("revenue", MetricKind::Absolute, 94.9, ClaimUnit::UsdBillions);
        c.segment = Some("Services".to_string());
        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &two_quarters());
        assert!(outcome.flags.contains(&MisleadingFlag::SegmentVsTotal));
        assert_eq!(outcome.verdict, Verdict::Misleading);
    }

    #[test]
    fn rounding_bias_flagged_in_band() {
        // actual 10.0, stated 10.8: score 0.92, overshooting
        let mut periods = HashMap::new();
        periods.insert(QuarterRef::new(2025, 2), revenue_figures(110.0e9));
        periods.insert(QuarterRef::new(2024, 2), revenue_figures(100.0e9));
        let mut c = claim("revenue", MetricKind::GrowthRate, 10.8, ClaimUnit::Percent);
        c.comparison_period = ComparisonPeriod::YearOverYear;

        let outcome = engine().verify(&c, QuarterRef::new(2025, 2), &periods);
        assert!(outcome.flags.contains(&MisleadingFlag::RoundingBias));
        assert_eq!(outcome.verdict, Verdict::Misleading);
    }

    #[test]
    fn unresolvable_metric_is_unverifiable() {
        let c = claim("daily active users", MetricKind::Absolute, 3.2, ClaimUnit::Shares);
        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &two_quarters());
        assert_eq!(outcome.verdict, Verdict::Unverifiable);
        assert!(outcome.actual_value.is_none());
        assert!(outcome.accuracy_score.is_none());
        assert!(outcome.explanation.contains("daily active users"));
    }

    #[test]
    fn growth_without_comparison_basis_is_unverifiable() {
        let c = claim("revenue", MetricKind::GrowthRate, 10.0, ClaimUnit::Percent);
        // comparison_period stays None
        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &two_quarters());
        assert_eq!(outcome.verdict, Verdict::Unverifiable);
    }

    #[test]
    fn growth_with_missing_prior_period_is_unverifiable() {
        let mut periods = HashMap::new();
        periods.insert(QuarterRef::new(2025, 3), revenue_figures(94.93e9));
        let mut c = claim("revenue", MetricKind::GrowthRate, 10.7, ClaimUnit::Percent);
        c.comparison_period = ComparisonPeriod::YearOverYear;

        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &periods);
        assert_eq!(outcome.verdict, Verdict::Unverifiable);
    }

    #[test]
    fn growth_over_zero_base_is_unverifiable() {
        let mut periods = HashMap::new();
        periods.insert(QuarterRef::new(2025, 3), revenue_figures(94.93e9));
        periods.insert(QuarterRef::new(2024, 3), revenue_figures(0.0));
        let mut c = claim("revenue", MetricKind::GrowthRate, 10.7, ClaimUnit::Percent);
        c.comparison_period = ComparisonPeriod::YearOverYear;

        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &periods);
        assert_eq!(outcome.verdict, Verdict::Unverifiable);
    }

    #[test]
    fn sequential_comparison_wraps_q1() {
        let mut periods = HashMap::new();
        periods.insert(QuarterRef::new(2025, 1), revenue_figures(105.0e9));
        periods.insert(QuarterRef::new(2024, 4), revenue_figures(100.0e9));
        let mut c = claim("revenue", MetricKind::GrowthRate, 5.0, ClaimUnit::Percent);
        c.comparison_period = ComparisonPeriod::Sequential;

        let outcome = engine().verify(&c, QuarterRef::new(2025, 1), &periods);
        assert_eq!(outcome.verdict, Verdict::Verified);
        assert_eq!(
            outcome.periods_consulted,
            vec![QuarterRef::new(2025, 1), QuarterRef::new(2024, 4)]
        );
    }

    #[test]
    fn basis_points_stated_value_scores_exactly() {
        let mut periods = HashMap::new();
        periods.insert(
            QuarterRef::new(2025, 3),
            FinancialFigures {
                revenue: Some(100.0e9),
                net_income: Some(2.0e9),
                ..Default::default()
            },
        );
        let c = claim("net_margin", MetricKind::Margin, 200.0, ClaimUnit::BasisPoints);
        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &periods);
        assert_eq!(outcome.accuracy_score, Some(1.0));
        assert_eq!(outcome.verdict, Verdict::Verified);
    }

    #[test]
    fn misclassified_margin_change_verified_as_level() {
        let mut periods = HashMap::new();
        periods.insert(
            QuarterRef::new(2025, 3),
            FinancialFigures {
                revenue: Some(100.0e9),
                gross_profit: Some(46.0e9),
                ..Default::default()
            },
        );
        // "Gross margin was 46%, up from 44%" extracted as a change claim
        let mut c = claim("gross_margin", MetricKind::Change, 46.0, ClaimUnit::Percent);
        c.comparison_period = ComparisonPeriod::YearOverYear;

        let outcome = engine().verify(&c, QuarterRef::new(2025, 3), &periods);
        assert_eq!(outcome.actual_value, Some(46.0));
        assert_eq!(outcome.verdict, Verdict::Verified);
    }
}
