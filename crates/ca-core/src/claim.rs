//! Claim vocabulary and quarter arithmetic
//!
//! The closed enums shared across extraction, verification, storage, and
//! analysis, plus [`QuarterRef`] for fiscal-quarter addressing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A stored enum value that does not belong to the vocabulary.
#[derive(Debug, Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// What shape of quantity a claim states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Absolute,
    GrowthRate,
    Margin,
    Ratio,
    Change,
    PerShare,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Absolute => "absolute",
            MetricKind::GrowthRate => "growth_rate",
            MetricKind::Margin => "margin",
            MetricKind::Ratio => "ratio",
            MetricKind::Change => "change",
            MetricKind::PerShare => "per_share",
        }
    }

    /// Growth-rate and change claims compare two periods.
    pub fn is_comparative(&self) -> bool {
        matches!(self, MetricKind::GrowthRate | MetricKind::Change)
    }
}

impl FromStr for MetricKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(MetricKind::Absolute),
            "growth_rate" => Ok(MetricKind::GrowthRate),
            "margin" => Ok(MetricKind::Margin),
            "ratio" => Ok(MetricKind::Ratio),
            "change" => Ok(MetricKind::Change),
            "per_share" => Ok(MetricKind::PerShare),
            _ => Err(UnknownVariant { kind: "metric_kind", value: s.to_string() }),
        }
    }
}

/// The unit a claim's stated value is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimUnit {
    Usd,
    UsdMillions,
    UsdBillions,
    Percent,
    BasisPoints,
    Ratio,
    Shares,
}

impl ClaimUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimUnit::Usd => "usd",
            ClaimUnit::UsdMillions => "usd_millions",
            ClaimUnit::UsdBillions => "usd_billions",
            ClaimUnit::Percent => "percent",
            ClaimUnit::BasisPoints => "basis_points",
            ClaimUnit::Ratio => "ratio",
            ClaimUnit::Shares => "shares",
        }
    }
}

impl FromStr for ClaimUnit {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "usd" => Ok(ClaimUnit::Usd),
            "usd_millions" => Ok(ClaimUnit::UsdMillions),
            "usd_billions" => Ok(ClaimUnit::UsdBillions),
            "percent" => Ok(ClaimUnit::Percent),
            "basis_points" => Ok(ClaimUnit::BasisPoints),
            "ratio" => Ok(ClaimUnit::Ratio),
            "shares" => Ok(ClaimUnit::Shares),
            _ => Err(UnknownVariant { kind: "unit", value: s.to_string() }),
        }
    }
}

/// Which prior period a comparative claim measures against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPeriod {
    YearOverYear,
    QuarterOverQuarter,
    Sequential,
    FullYear,
    Custom,
    None,
}

impl ComparisonPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonPeriod::YearOverYear => "year_over_year",
            ComparisonPeriod::QuarterOverQuarter => "quarter_over_quarter",
            ComparisonPeriod::Sequential => "sequential",
            ComparisonPeriod::FullYear => "full_year",
            ComparisonPeriod::Custom => "custom",
            ComparisonPeriod::None => "none",
        }
    }
}

impl FromStr for ComparisonPeriod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year_over_year" => Ok(ComparisonPeriod::YearOverYear),
            "quarter_over_quarter" => Ok(ComparisonPeriod::QuarterOverQuarter),
            "sequential" => Ok(ComparisonPeriod::Sequential),
            "full_year" => Ok(ComparisonPeriod::FullYear),
            "custom" => Ok(ComparisonPeriod::Custom),
            "none" => Ok(ComparisonPeriod::None),
            _ => Err(UnknownVariant { kind: "comparison_period", value: s.to_string() }),
        }
    }
}

/// Outcome of verifying one claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Verified,
    ApproximatelyCorrect,
    Misleading,
    Incorrect,
    Unverifiable,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Verified => "verified",
            Verdict::ApproximatelyCorrect => "approximately_correct",
            Verdict::Misleading => "misleading",
            Verdict::Incorrect => "incorrect",
            Verdict::Unverifiable => "unverifiable",
        }
    }
}

impl FromStr for Verdict {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified" => Ok(Verdict::Verified),
            "approximately_correct" => Ok(Verdict::ApproximatelyCorrect),
            "misleading" => Ok(Verdict::Misleading),
            "incorrect" => Ok(Verdict::Incorrect),
            "unverifiable" => Ok(Verdict::Unverifiable),
            _ => Err(UnknownVariant { kind: "verdict", value: s.to_string() }),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A misleading-framing signal detected during verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MisleadingFlag {
    GaapNongaapMismatch,
    CherryPickedPeriod,
    SegmentVsTotal,
    RoundingBias,
    MisleadingComparison,
    OmitsContext,
}

impl MisleadingFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MisleadingFlag::GaapNongaapMismatch => "gaap_nongaap_mismatch",
            MisleadingFlag::CherryPickedPeriod => "cherry_picked_period",
            MisleadingFlag::SegmentVsTotal => "segment_vs_total",
            MisleadingFlag::RoundingBias => "rounding_bias",
            MisleadingFlag::MisleadingComparison => "misleading_comparison",
            MisleadingFlag::OmitsContext => "omits_context",
        }
    }

    /// Whether this flag upgrades an otherwise-accurate verdict to
    /// misleading.
    pub fn is_substantive(&self) -> bool {
        matches!(
            self,
            MisleadingFlag::RoundingBias
                | MisleadingFlag::GaapNongaapMismatch
                | MisleadingFlag::SegmentVsTotal
                | MisleadingFlag::MisleadingComparison
        )
    }
}

impl FromStr for MisleadingFlag {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gaap_nongaap_mismatch" => Ok(MisleadingFlag::GaapNongaapMismatch),
            "cherry_picked_period" => Ok(MisleadingFlag::CherryPickedPeriod),
            "segment_vs_total" => Ok(MisleadingFlag::SegmentVsTotal),
            "rounding_bias" => Ok(MisleadingFlag::RoundingBias),
            "misleading_comparison" => Ok(MisleadingFlag::MisleadingComparison),
            "omits_context" => Ok(MisleadingFlag::OmitsContext),
            _ => Err(UnknownVariant { kind: "misleading_flag", value: s.to_string() }),
        }
    }
}

impl fmt::Display for MisleadingFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cross-quarter finding kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    ConsistentRoundingUp,
    MetricSwitching,
    IncreasingInaccuracy,
    GaapNongaapShifting,
    SelectiveEmphasis,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::ConsistentRoundingUp => "consistent_rounding_up",
            PatternKind::MetricSwitching => "metric_switching",
            PatternKind::IncreasingInaccuracy => "increasing_inaccuracy",
            PatternKind::GaapNongaapShifting => "gaap_nongaap_shifting",
            PatternKind::SelectiveEmphasis => "selective_emphasis",
        }
    }
}

impl FromStr for PatternKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consistent_rounding_up" => Ok(PatternKind::ConsistentRoundingUp),
            "metric_switching" => Ok(PatternKind::MetricSwitching),
            "increasing_inaccuracy" => Ok(PatternKind::IncreasingInaccuracy),
            "gaap_nongaap_shifting" => Ok(PatternKind::GaapNongaapShifting),
            "selective_emphasis" => Ok(PatternKind::SelectiveEmphasis),
            _ => Err(UnknownVariant { kind: "pattern_kind", value: s.to_string() }),
        }
    }
}

/// One fiscal quarter of one company. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuarterRef {
    pub year: i32,
    pub quarter: u8,
}

impl QuarterRef {
    pub fn new(year: i32, quarter: u8) -> Self {
        Self { year, quarter }
    }

    /// Same quarter of the prior fiscal year.
    pub fn prior_year(self) -> Self {
        Self { year: self.year - 1, quarter: self.quarter }
    }

    /// The immediately preceding quarter, wrapping Q1 to the prior
    /// year's Q4.
    pub fn prior_sequential(self) -> Self {
        if self.quarter > 1 {
            Self { year: self.year, quarter: self.quarter - 1 }
        } else {
            Self { year: self.year - 1, quarter: 4 }
        }
    }

    /// The comparison period a comparative claim measures against, or
    /// `None` when the comparison basis cannot be resolved to a single
    /// quarter. Full-year comparisons resolve to the same quarter of the
    /// prior year; the statement source yields quarterly records only.
    pub fn comparison_for(self, period: ComparisonPeriod) -> Option<QuarterRef> {
        match period {
            ComparisonPeriod::YearOverYear | ComparisonPeriod::FullYear => Some(self.prior_year()),
            ComparisonPeriod::QuarterOverQuarter | ComparisonPeriod::Sequential => {
                Some(self.prior_sequential())
            }
            ComparisonPeriod::Custom | ComparisonPeriod::None => None,
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QuarterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.quarter, self.year)
    }
}

/// A validated quantitative claim as produced by extraction, before it
/// is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDraft {
    pub speaker: String,
    pub speaker_role: String,
    pub claim_text: String,
    /// Canonical metric name from the registry's vocabulary.
    pub metric: String,
    pub metric_kind: MetricKind,
    pub stated_value: f64,
    pub unit: ClaimUnit,
    pub comparison_period: ComparisonPeriod,
    pub is_gaap: bool,
    pub segment: Option<String>,
    pub confidence: f64,
    pub context: Option<String>,
}
