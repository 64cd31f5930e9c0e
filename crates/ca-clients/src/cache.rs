//! Content-addressed response cache
//!
//! One file per (endpoint, params) pair under the cache directory, raw
//! JSON contents. Keys are deterministic hashes with the API key
//! excluded, so cached payloads are shareable and re-runs never touch
//! the network. Writes go through a temp file and an atomic rename;
//! concurrent writers for the same key produce identical content, so
//! last-writer-wins is safe.

use crate::ClientResult;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic filename for an endpoint + query-parameter pair.
    /// Parameters are sorted and the API key is excluded, so the same
    /// logical request always maps to the same file.
    pub fn key(endpoint: &str, params: &[(&str, String)]) -> String {
        let mut filtered: Vec<&(&str, String)> =
            params.iter().filter(|(name, _)| *name != "apikey").collect();
        filtered.sort();

        let mut hasher = Sha256::new();
        for (name, value) in &filtered {
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
            hasher.update(b"&");
        }
        let digest = hex::encode(hasher.finalize());

        format!("{}_{}.json", endpoint.replace('/', "_"), &digest[..16])
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let path = self.dir.join(key);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("cache hit {key}");
                Some(value)
            }
            Err(e) => {
                debug!("cache entry {key} unreadable, ignoring: {e}");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, value: &serde_json::Value) -> ClientResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(key);
        let tmp = self.dir.join(format!("{key}.tmp{}", rand::random::<u32>()));
        let body = serde_json::to_string_pretty(value)
            .map_err(|e| crate::ClientError::Parse(e.to_string()))?;

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("cache save {key}");
        Ok(())
    }
}
