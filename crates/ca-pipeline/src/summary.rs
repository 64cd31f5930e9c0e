//! Stage summaries
//!
//! JSON-serializable counters returned by every stage, and the overall
//! run report. `ok` is false when any record-level error was swallowed.

use crate::Step;
use ca_core::{Verdict, VerdictCounts};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    pub ok: bool,
    pub companies: u64,
    pub transcripts_fetched: u64,
    pub transcripts_skipped: u64,
    pub transcripts_missing: u64,
    pub financial_periods_fetched: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractSummary {
    pub ok: bool,
    pub transcripts_processed: u64,
    pub claims_extracted: u64,
    pub claims_invalid: u64,
    pub claims_deduped: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifySummary {
    pub ok: bool,
    pub verified: u64,
    pub approximately_correct: u64,
    pub misleading: u64,
    pub incorrect: u64,
    pub unverifiable: u64,
    pub errors: u64,
}

impl VerifySummary {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Verified => self.verified += 1,
            Verdict::ApproximatelyCorrect => self.approximately_correct += 1,
            Verdict::Misleading => self.misleading += 1,
            Verdict::Incorrect => self.incorrect += 1,
            Verdict::Unverifiable => self.unverifiable += 1,
        }
    }

    pub fn counts(&self) -> VerdictCounts {
        VerdictCounts {
            verified: self.verified,
            approximately_correct: self.approximately_correct,
            misleading: self.misleading,
            incorrect: self.incorrect,
            unverifiable: self.unverifiable,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyzeSummary {
    pub ok: bool,
    pub companies_analyzed: u64,
    pub companies_skipped: u64,
    /// Pattern counts by kind across all companies.
    pub patterns: BTreeMap<String, u64>,
    pub errors: u64,
}

/// The overall result of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub steps_run: Vec<String>,
    pub tickers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest: Option<IngestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify: Option<VerifySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyze: Option<AnalyzeSummary>,
}

impl PipelineReport {
    pub fn new(tickers: &[String]) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            steps_run: Vec::new(),
            tickers: tickers.to_vec(),
            ingest: None,
            extract: None,
            verify: None,
            analyze: None,
        }
    }

    pub fn record_step(&mut self, step: Step) {
        self.steps_run.push(step.as_str().to_string());
    }

    /// True when every executed stage completed without record-level
    /// errors.
    pub fn ok(&self) -> bool {
        self.ingest.as_ref().map_or(true, |s| s.ok)
            && self.extract.as_ref().map_or(true, |s| s.ok)
            && self.verify.as_ref().map_or(true, |s| s.ok)
            && self.analyze.as_ref().map_or(true, |s| s.ok)
    }
}
