//! Cross-quarter discrepancy pattern detection
//!
//! Mines a company's verified claims, grouped by fiscal quarter, for
//! systematic patterns of misleading communication. Each detector is
//! independent and emits at most one pattern; the set is produced in a
//! fixed order so repeated runs are byte-identical.

use crate::claim::{MetricKind, PatternKind, QuarterRef, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A claim together with its verification, as the detectors see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditedClaim {
    pub metric: String,
    pub metric_kind: MetricKind,
    pub stated_value: f64,
    pub is_gaap: bool,
    pub verdict: Verdict,
    pub actual_value: Option<f64>,
    pub accuracy_score: Option<f64>,
}

/// A company-level cross-quarter finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub severity: f64,
    pub description: String,
    pub affected_quarters: Vec<String>,
    pub evidence: Vec<String>,
}

pub type ClaimsByQuarter = BTreeMap<QuarterRef, Vec<AuditedClaim>>;

pub struct DiscrepancyAnalyzer;

impl DiscrepancyAnalyzer {
    /// Run all detectors over one company's claims. Detector order is
    /// fixed: rounding, switching, inaccuracy, GAAP, emphasis.
    pub fn analyze(claims_by_quarter: &ClaimsByQuarter) -> Vec<Pattern> {
        [
            detect_rounding_bias(claims_by_quarter),
            detect_metric_switching(claims_by_quarter),
            detect_increasing_inaccuracy(claims_by_quarter),
            detect_gaap_shifting(claims_by_quarter),
            detect_selective_emphasis(claims_by_quarter),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// More than 70% of inexact claims overshooting the actual figure, over
/// at least 4 inexact claims.
fn detect_rounding_bias(cbq: &ClaimsByQuarter) -> Option<Pattern> {
    let mut favorable = 0usize;
    let mut total = 0usize;
    let mut affected: Vec<String> = Vec::new();

    for (quarter, claims) in cbq {
        for claim in claims {
            let (Some(actual), Some(score)) = (claim.actual_value, claim.accuracy_score) else {
                continue;
            };
            if score <= 0.0 || score >= 1.0 {
                continue;
            }
            total += 1;
            if claim.stated_value > actual {
                favorable += 1;
                let label = quarter.label();
                if !affected.contains(&label) {
                    affected.push(label);
                }
            }
        }
    }

    if total < 4 || (favorable as f64 / total as f64) <= 0.70 {
        return None;
    }

    Some(Pattern {
        kind: PatternKind::ConsistentRoundingUp,
        severity: round2(favorable as f64 / total as f64),
        description: format!(
            "Management consistently rounds in a favorable direction: \
             {favorable}/{total} inexact claims overshoot the actual figure."
        ),
        affected_quarters: affected,
        evidence: vec![format!("{favorable}/{total} favorable roundings")],
    })
}

/// The most-emphasized metric changes from quarter to quarter.
fn detect_metric_switching(cbq: &ClaimsByQuarter) -> Option<Pattern> {
    let mut top_by_quarter: Vec<(QuarterRef, String)> = Vec::new();

    for (quarter, claims) in cbq {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for claim in claims {
            *counts.entry(claim.metric.as_str()).or_default() += 1;
        }
        // Ties break toward the alphabetically first metric, keeping the
        // result stable across runs.
        if let Some(top) = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(metric, _)| metric.to_string())
        {
            top_by_quarter.push((*quarter, top));
        }
    }

    let unique: std::collections::BTreeSet<&str> =
        top_by_quarter.iter().map(|(_, m)| m.as_str()).collect();
    if unique.len() < 3 || top_by_quarter.len() < 3 {
        return None;
    }

    let pairs: Vec<String> =
        top_by_quarter.iter().map(|(q, m)| format!("{q}: {m}")).collect();

    Some(Pattern {
        kind: PatternKind::MetricSwitching,
        severity: 0.5,
        description: format!(
            "Most-emphasized metric shifts across quarters ({}). Possible selective emphasis.",
            pairs.join("; ")
        ),
        affected_quarters: top_by_quarter.iter().map(|(q, _)| q.label()).collect(),
        evidence: vec![format!("Top metrics by quarter: {}", pairs.join("; "))],
    })
}

/// Mean claim accuracy declining across at least three quarters.
fn detect_increasing_inaccuracy(cbq: &ClaimsByQuarter) -> Option<Pattern> {
    let mut series: Vec<(QuarterRef, f64)> = Vec::new();

    for (quarter, claims) in cbq {
        let scores: Vec<f64> = claims.iter().filter_map(|c| c.accuracy_score).collect();
        if !scores.is_empty() {
            series.push((*quarter, scores.iter().sum::<f64>() / scores.len() as f64));
        }
    }

    if series.len() < 3 {
        return None;
    }
    let first = series.first().map(|(_, v)| *v).unwrap_or(0.0);
    let last = series.last().map(|(_, v)| *v).unwrap_or(0.0);
    if last - first > -0.05 {
        return None;
    }

    let trend: Vec<String> =
        series.iter().map(|(q, v)| format!("{q}: {:.1}%", v * 100.0)).collect();

    Some(Pattern {
        kind: PatternKind::IncreasingInaccuracy,
        severity: round2((last - first).abs()),
        description: format!("Claim accuracy is declining over time ({}).", trend.join("; ")),
        affected_quarters: series.iter().map(|(q, _)| q.label()).collect(),
        evidence: vec![format!("Accuracy trend: {}", trend.join("; "))],
    })
}

/// The GAAP / non-GAAP mix swings by more than 30 points.
fn detect_gaap_shifting(cbq: &ClaimsByQuarter) -> Option<Pattern> {
    let mut ratios: Vec<(QuarterRef, f64)> = Vec::new();

    for (quarter, claims) in cbq {
        if claims.is_empty() {
            continue;
        }
        let gaap = claims.iter().filter(|c| c.is_gaap).count();
        ratios.push((*quarter, gaap as f64 / claims.len() as f64));
    }

    if ratios.len() < 2 {
        return None;
    }
    let max = ratios.iter().map(|(_, r)| *r).fold(f64::MIN, f64::max);
    let min = ratios.iter().map(|(_, r)| *r).fold(f64::MAX, f64::min);
    if max - min <= 0.30 {
        return None;
    }

    let detail: Vec<String> =
        ratios.iter().map(|(q, r)| format!("{q}: {:.0}%", r * 100.0)).collect();

    Some(Pattern {
        kind: PatternKind::GaapNongaapShifting,
        severity: round2(max - min),
        description: format!(
            "Reporting shifts between GAAP and non-GAAP emphasis (GAAP share {}).",
            detail.join("; ")
        ),
        affected_quarters: ratios.iter().map(|(q, _)| q.label()).collect(),
        evidence: vec![format!("GAAP ratios: {}", detail.join("; "))],
    })
}

/// Growth claims almost exclusively positive in two or more quarters.
fn detect_selective_emphasis(cbq: &ClaimsByQuarter) -> Option<Pattern> {
    let mut biased: Vec<String> = Vec::new();

    for (quarter, claims) in cbq {
        let growth = claims.iter().filter(|c| c.metric_kind == MetricKind::GrowthRate);
        let (mut pos, mut neg) = (0usize, 0usize);
        for claim in growth {
            if claim.stated_value > 0.0 {
                pos += 1;
            } else if claim.stated_value < 0.0 {
                neg += 1;
            }
        }
        let total = pos + neg;
        if total > 2 && (pos as f64 / total as f64) > 0.90 {
            biased.push(quarter.label());
        }
    }

    if biased.len() < 2 {
        return None;
    }

    Some(Pattern {
        kind: PatternKind::SelectiveEmphasis,
        severity: 0.6,
        description: format!(
            "Management overwhelmingly highlights positive growth in {} quarters \
             while avoiding negative trends.",
            biased.len()
        ),
        affected_quarters: biased.clone(),
        evidence: vec![format!("Quarters with >90% positive growth claims: {}", biased.join(", "))],
    })
}
