//! Environment-based configuration

use crate::{PipelineError, Step};
use ca_clients::RetryPolicy;
use ca_core::{QuarterRef, Thresholds};
use std::path::PathBuf;
use std::time::Duration;

/// All configuration for a pipeline run, loaded from environment
/// variables with sensible defaults for everything but the API keys.
#[derive(Debug, Clone)]
pub struct Settings {
    pub fmp_api_key: String,
    pub extraction_api_key: String,
    pub database_url: String,
    pub extraction_model: String,
    pub max_claims_per_transcript: usize,
    pub thresholds: Thresholds,
    pub target_tickers: Vec<String>,
    pub target_quarters: Vec<QuarterRef>,
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    /// Root for the response cache and local transcript fallback.
    pub data_root: PathBuf,
    /// How many recent quarters of statements to pull per company.
    pub statement_window: u32,
    /// Bounded worker pool size for the I/O stages.
    pub worker_pool: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let data_root = PathBuf::from(env_or("DATA_ROOT", "./data"));
        Self {
            fmp_api_key: std::env::var("FMP_API_KEY").unwrap_or_default(),
            extraction_api_key: std::env::var("EXTRACTION_API_KEY").unwrap_or_default(),
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| {
                format!("sqlite://{}/claim_auditor.db?mode=rwc", data_root.display())
            }),
            extraction_model: env_or("EXTRACTION_MODEL", "claude-sonnet-4-20250514"),
            max_claims_per_transcript: env_parsed("MAX_CLAIMS_PER_TRANSCRIPT", 50),
            thresholds: Thresholds {
                verified: env_parsed("VERIFICATION_TOLERANCE", 0.02),
                approximate: env_parsed("APPROXIMATE_TOLERANCE", 0.10),
                misleading: env_parsed("MISLEADING_THRESHOLD", 0.25),
            },
            target_tickers: parse_tickers(&env_or(
                "TARGET_TICKERS",
                "AAPL,MSFT,NVDA,AMZN,GOOG,META,JPM,JNJ,TSLA,CRM",
            )),
            target_quarters: parse_quarters(&env_or(
                "TARGET_QUARTERS",
                "2026Q2,2026Q1,2025Q4,2025Q3,2025Q2,2025Q1,2024Q4",
            )),
            retry_max_attempts: env_parsed("RETRY_MAX_ATTEMPTS", 5),
            retry_base_delay: Duration::from_millis(env_parsed("RETRY_BASE_DELAY_MS", 250)),
            data_root,
            statement_window: env_parsed("STATEMENT_WINDOW", 8),
            worker_pool: env_parsed("WORKER_POOL", 4),
        }
    }
}

impl Settings {
    pub fn cache_dir(&self) -> PathBuf {
        self.data_root.join("cache")
    }

    pub fn transcript_dir(&self) -> PathBuf {
        self.data_root.join("transcripts")
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_max_attempts, self.retry_base_delay)
    }

    /// Required keys are only required for the steps that use them.
    pub fn validate_for(&self, steps: &[Step]) -> Result<(), PipelineError> {
        if steps.contains(&Step::Ingest) && self.fmp_api_key.is_empty() {
            return Err(PipelineError::Config(
                "FMP_API_KEY is not set; the ingest stage cannot fetch data".to_string(),
            ));
        }
        if steps.contains(&Step::Extract) && self.extraction_api_key.is_empty() {
            return Err(PipelineError::Config(
                "EXTRACTION_API_KEY is not set; the extract stage cannot run".to_string(),
            ));
        }
        if self.target_tickers.is_empty() {
            return Err(PipelineError::Config("TARGET_TICKERS is empty".to_string()));
        }
        Ok(())
    }

    pub fn ensure_data_root(&self) -> Result<(), PipelineError> {
        std::fs::create_dir_all(&self.data_root).map_err(|e| {
            PipelineError::Config(format!(
                "cannot create data root {}: {e}",
                self.data_root.display()
            ))
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_tickers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Quarters are written `YYYYQn`, comma-separated.
fn parse_quarters(raw: &str) -> Vec<QuarterRef> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let (year, quarter) = entry.split_once(['Q', 'q'])?;
            let year = year.parse().ok()?;
            let quarter: u8 = quarter.parse().ok()?;
            (1..=4).contains(&quarter).then_some(QuarterRef::new(year, quarter))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_list_parsing() {
        let quarters = parse_quarters("2025Q3, 2025Q2,2024q4");
        assert_eq!(
            quarters,
            vec![QuarterRef::new(2025, 3), QuarterRef::new(2025, 2), QuarterRef::new(2024, 4)]
        );
    }

    #[test]
    fn invalid_quarters_are_dropped() {
        assert!(parse_quarters("2025Q5,garbage,Q3").is_empty());
    }

    #[test]
    fn tickers_are_canonicalized() {
        assert_eq!(parse_tickers("aapl, msft ,,NVDA"), vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn missing_keys_fail_only_for_the_steps_that_need_them() {
        let settings = Settings {
            fmp_api_key: String::new(),
            extraction_api_key: String::new(),
            ..test_settings()
        };
        assert!(settings.validate_for(&[Step::Ingest]).is_err());
        assert!(settings.validate_for(&[Step::Extract]).is_err());
        assert!(settings.validate_for(&[Step::Verify, Step::Analyze]).is_ok());
    }

    fn test_settings() -> Settings {
        Settings {
            fmp_api_key: "key".to_string(),
            extraction_api_key: "key".to_string(),
            database_url: "sqlite::memory:".to_string(),
            extraction_model: "model".to_string(),
            max_claims_per_transcript: 50,
            thresholds: Thresholds::default(),
            target_tickers: vec!["AAPL".to_string()],
            target_quarters: vec![QuarterRef::new(2025, 3)],
            retry_max_attempts: 5,
            retry_base_delay: Duration::from_millis(250),
            data_root: PathBuf::from("./data"),
            statement_window: 8,
            worker_pool: 4,
        }
    }
}
