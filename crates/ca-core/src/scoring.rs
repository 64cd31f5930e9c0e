//! Verdict assignment and aggregate scoring
//!
//! Verdicts are a pure function of the accuracy score and the detected
//! misleading flags, so the classification is trivially property-testable.

use crate::claim::{MisleadingFlag, Verdict};
use serde::{Deserialize, Serialize};

/// Accuracy tolerances for verdict classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    /// Within this relative error a claim is verified.
    pub verified: f64,
    /// Within this relative error a claim is approximately correct.
    pub approximate: f64,
    /// Beyond this relative error a claim is incorrect rather than
    /// merely misleading.
    pub misleading: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { verified: 0.02, approximate: 0.10, misleading: 0.25 }
    }
}

/// Classify an accuracy score, then apply the flag upgrade rule: an
/// accurate number framed deceptively is still misleading.
pub fn assign_verdict(score: f64, flags: &[MisleadingFlag], thresholds: &Thresholds) -> Verdict {
    let base = if score >= 1.0 - thresholds.verified {
        Verdict::Verified
    } else if score >= 1.0 - thresholds.approximate {
        Verdict::ApproximatelyCorrect
    } else if score >= 1.0 - thresholds.misleading {
        Verdict::Misleading
    } else {
        Verdict::Incorrect
    };

    if matches!(base, Verdict::Verified | Verdict::ApproximatelyCorrect)
        && flags.iter().any(MisleadingFlag::is_substantive)
    {
        return Verdict::Misleading;
    }
    base
}

/// Verdict tallies for a company or quarter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub verified: u64,
    pub approximately_correct: u64,
    pub misleading: u64,
    pub incorrect: u64,
    pub unverifiable: u64,
}

impl VerdictCounts {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Verified => self.verified += 1,
            Verdict::ApproximatelyCorrect => self.approximately_correct += 1,
            Verdict::Misleading => self.misleading += 1,
            Verdict::Incorrect => self.incorrect += 1,
            Verdict::Unverifiable => self.unverifiable += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.verified + self.approximately_correct + self.misleading + self.incorrect
            + self.unverifiable
    }

    /// Claims that could be checked against data at all.
    pub fn verifiable(&self) -> u64 {
        self.verified + self.approximately_correct + self.misleading + self.incorrect
    }
}

/// Weighted trust score on a 0-100 scale. Returns 50 when no claim was
/// verifiable (no evidence either way).
pub fn trust_score(counts: &VerdictCounts) -> f64 {
    let verifiable = counts.verifiable();
    if verifiable == 0 {
        return 50.0;
    }
    let raw = (counts.verified as f64
        + 0.7 * counts.approximately_correct as f64
        - 0.3 * counts.misleading as f64
        - counts.incorrect as f64)
        / verifiable as f64;
    ((raw + 1.0) * 50.0).clamp(0.0, 100.0)
}

/// Share of verifiable claims that were correct (verified or
/// approximately correct), in `[0.0, 1.0]`. Zero when nothing was
/// verifiable.
pub fn percentage_accuracy(counts: &VerdictCounts) -> f64 {
    let verifiable = counts.verifiable();
    if verifiable == 0 {
        return 0.0;
    }
    (counts.verified + counts.approximately_correct) as f64 / verifiable as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn verdict_bands() {
        assert_eq!(assign_verdict(1.0, &[], &t()), Verdict::Verified);
        assert_eq!(assign_verdict(0.99, &[], &t()), Verdict::Verified);
        assert_eq!(assign_verdict(0.98, &[], &t()), Verdict::Verified);
        assert_eq!(assign_verdict(0.95, &[], &t()), Verdict::ApproximatelyCorrect);
        assert_eq!(assign_verdict(0.90, &[], &t()), Verdict::ApproximatelyCorrect);
        assert_eq!(assign_verdict(0.80, &[], &t()), Verdict::Misleading);
        assert_eq!(assign_verdict(0.75, &[], &t()), Verdict::Misleading);
        assert_eq!(assign_verdict(0.50, &[], &t()), Verdict::Incorrect);
        assert_eq!(assign_verdict(0.0, &[], &t()), Verdict::Incorrect);
    }

    #[test]
    fn substantive_flag_upgrades_accurate_verdicts() {
        let flags = [MisleadingFlag::GaapNongaapMismatch];
        assert_eq!(assign_verdict(0.99, &flags, &t()), Verdict::Misleading);
        assert_eq!(assign_verdict(0.95, &flags, &t()), Verdict::Misleading);
        // Already worse than misleading: the flag does not soften it
        assert_eq!(assign_verdict(0.50, &flags, &t()), Verdict::Incorrect);
    }

    #[test]
    fn non_substantive_flag_does_not_upgrade() {
        let flags = [MisleadingFlag::OmitsContext];
        assert_eq!(assign_verdict(0.99, &flags, &t()), Verdict::Verified);
    }

    #[test]
    fn upgrade_is_idempotent() {
        let flags = [MisleadingFlag::RoundingBias, MisleadingFlag::SegmentVsTotal];
        let once = assign_verdict(0.99, &flags, &t());
        assert_eq!(once, Verdict::Misleading);
        // Re-classifying a misleading score with the same flags stays put
        assert_eq!(assign_verdict(0.80, &flags, &t()), Verdict::Misleading);
    }

    #[test]
    fn trust_score_extremes() {
        let all_good = VerdictCounts { verified: 10, unverifiable: 2, ..Default::default() };
        assert_eq!(trust_score(&all_good), 100.0);

        let all_bad = VerdictCounts { incorrect: 10, ..Default::default() };
        assert_eq!(trust_score(&all_bad), 0.0);

        let nothing = VerdictCounts { unverifiable: 5, ..Default::default() };
        assert_eq!(trust_score(&nothing), 50.0);
    }

    #[test]
    fn trust_score_weighting() {
        let mixed = VerdictCounts { verified: 5, approximately_correct: 5, ..Default::default() };
        assert!((trust_score(&mixed) - 92.5).abs() < 1e-9);

        let misleading = VerdictCounts { misleading: 10, ..Default::default() };
        assert!((trust_score(&misleading) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn trust_score_is_monotone() {
        let base = VerdictCounts { verified: 3, misleading: 3, incorrect: 2, ..Default::default() };
        let more_verified = VerdictCounts { verified: 4, ..base };
        assert!(trust_score(&more_verified) >= trust_score(&base));
        let more_incorrect = VerdictCounts { incorrect: 3, ..base };
        assert!(trust_score(&more_incorrect) <= trust_score(&base));
    }

    #[test]
    fn accuracy_share() {
        let counts = VerdictCounts {
            verified: 8,
            approximately_correct: 2,
            unverifiable: 3,
            ..Default::default()
        };
        assert_eq!(percentage_accuracy(&counts), 1.0);

        let half = VerdictCounts { verified: 5, misleading: 5, ..Default::default() };
        assert_eq!(percentage_accuracy(&half), 0.5);

        assert_eq!(percentage_accuracy(&VerdictCounts::default()), 0.0);
    }
}
