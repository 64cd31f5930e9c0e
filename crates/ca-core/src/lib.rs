//! Claim Auditor core domain
//!
//! This crate provides the pure verification domain for reconciling
//! executive claims against structured financial data: financial math
//! primitives, the metric registry, verdict and scoring rules, the
//! per-claim verification engine, and the cross-quarter discrepancy
//! analyzer.
//!
//! Everything here is synchronous and side-effect free. Persistence and
//! external services live in the `ca-store` and `ca-clients` crates.

pub mod analyzer;
pub mod claim;
pub mod engine;
pub mod math;
pub mod metrics;
pub mod scoring;

pub use analyzer::{AuditedClaim, DiscrepancyAnalyzer, Pattern};
pub use claim::{
    ClaimDraft, ClaimUnit, ComparisonPeriod, MetricKind, MisleadingFlag, PatternKind, QuarterRef,
    Verdict,
};
pub use engine::{PeriodProvider, VerificationEngine, VerificationOutcome};
pub use metrics::{FinancialFigures, MetricRegistry};
pub use scoring::{Thresholds, VerdictCounts};
