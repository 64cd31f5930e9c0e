//! Local transcript fallback
//!
//! When the provider has no transcript for a quarter, a plain-text file
//! at `{dir}/{TICKER}_Q{quarter}_{year}.txt` stands in. Blank files
//! count as absent.

use ca_core::QuarterRef;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct LocalTranscriptSource {
    dir: PathBuf,
}

impl LocalTranscriptSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str, quarter: QuarterRef) -> PathBuf {
        self.dir.join(format!(
            "{}_Q{}_{}.txt",
            ticker.to_uppercase(),
            quarter.quarter,
            quarter.year
        ))
    }

    pub async fn load(&self, ticker: &str, quarter: QuarterRef) -> Option<String> {
        let path = self.path_for(ticker, quarter);
        let content = tokio::fs::read_to_string(&path).await.ok()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        info!("loaded local transcript {}", path.display());
        Some(trimmed.to_string())
    }
}
