//! Pipeline orchestration
//!
//! The four stages (ingest, extract, verify, analyze) as independent
//! functions with explicit dependencies, plus [`run_pipeline`] which
//! chains them. Every stage is idempotent: already-ingested quarters,
//! already-extracted transcripts, and already-verified claims are
//! skipped, so a cancelled or failed run resumes by re-running.

pub mod analyze;
pub mod config;
pub mod extract;
pub mod ingest;
pub mod summary;
pub mod verify;

use ca_clients::{
    ClientError, ExtractionClient, ExtractionConfig, FmpClient, FmpConfig, LocalTranscriptSource,
    ResponseCache,
};
use ca_store::{Store, StoreError};
use thiserror::Error;
use tracing::info;

pub use config::Settings;
pub use summary::{
    AnalyzeSummary, ExtractSummary, IngestSummary, PipelineReport, VerifySummary,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ingest,
    Extract,
    Verify,
    Analyze,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Ingest, Step::Extract, Step::Verify, Step::Analyze];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Ingest => "ingest",
            Step::Extract => "extract",
            Step::Verify => "verify",
            Step::Analyze => "analyze",
        }
    }
}

impl std::str::FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ingest" => Ok(Step::Ingest),
            "extract" => Ok(Step::Extract),
            "verify" => Ok(Step::Verify),
            "analyze" => Ok(Step::Analyze),
            other => Err(format!("unknown pipeline step '{other}'")),
        }
    }
}

/// Run the requested steps in order against the configured store.
pub async fn run_pipeline(settings: &Settings, steps: &[Step]) -> PipelineResult<PipelineReport> {
    settings.validate_for(steps)?;
    settings.ensure_data_root()?;

    let store = Store::open(&settings.database_url).await?;
    let mut report = PipelineReport::new(&settings.target_tickers);

    if steps.contains(&Step::Ingest) {
        info!("stage: ingest");
        let cache = ResponseCache::new(settings.cache_dir());
        let fmp = FmpClient::new(
            FmpConfig::new(&settings.fmp_api_key),
            cache,
            settings.retry_policy(),
        )?;
        let local = LocalTranscriptSource::new(settings.transcript_dir());
        let summary = ingest::run(
            &store,
            &fmp,
            &local,
            &settings.target_tickers,
            &settings.target_quarters,
            settings.statement_window,
            settings.worker_pool,
        )
        .await?;
        report.record_step(Step::Ingest);
        report.ingest = Some(summary);
    }

    if steps.contains(&Step::Extract) {
        info!("stage: extract");
        let extractor = ExtractionClient::new(
            ExtractionConfig::new(&settings.extraction_api_key, &settings.extraction_model),
            settings.retry_policy(),
        )?;
        let summary = extract::run(
            &store,
            &extractor,
            settings.max_claims_per_transcript,
            settings.worker_pool,
        )
        .await?;
        report.record_step(Step::Extract);
        report.extract = Some(summary);
    }

    if steps.contains(&Step::Verify) {
        info!("stage: verify");
        let summary = verify::run(&store, settings.thresholds).await?;
        report.record_step(Step::Verify);
        report.verify = Some(summary);
    }

    if steps.contains(&Step::Analyze) {
        info!("stage: analyze");
        let summary = analyze::run(&store).await?;
        report.record_step(Step::Analyze);
        report.analyze = Some(summary);
    }

    Ok(report)
}

#[cfg(test)]
mod tests;
