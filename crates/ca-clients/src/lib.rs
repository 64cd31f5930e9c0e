//! External data adapters
//!
//! Everything that talks to the outside world: the financial-data
//! provider (HTTP + disk cache + retry), the local transcript fallback,
//! and the LLM claim-extraction service. The domain crates never see
//! HTTP; these adapters hand back plain values and absorb the
//! provider's quirks.

pub mod cache;
pub mod fmp;
pub mod llm;
pub mod prompt;
pub mod retry;
pub mod transcripts;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("permanent failure: {0}")]
    Permanent(String),

    #[error("retries exhausted after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

pub use cache::ResponseCache;
pub use fmp::{CompanyProfile, EarningsTranscript, FmpClient, FmpConfig};
pub use llm::{ExtractionClient, ExtractionConfig};
pub use retry::RetryPolicy;
pub use transcripts::LocalTranscriptSource;
