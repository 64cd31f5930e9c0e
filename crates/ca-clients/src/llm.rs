//! LLM claim-extraction client
//!
//! Sends transcript text with the versioned system prompt to an
//! Anthropic-style messages API and parses the response into raw claim
//! records. The model's output is treated as untrusted: the response
//! may be bare JSON, fenced JSON, or JSON buried in prose, and
//! individual records are validated downstream.

use crate::retry::{classify_status, with_retry, Attempt, RetryPolicy};
use crate::{ClientError, ClientResult};
use ca_core::QuarterRef;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, info};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ExtractionConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 8192,
            timeout: Duration::from_secs(300),
        }
    }
}

pub struct ExtractionClient {
    client: reqwest::Client,
    config: ExtractionConfig,
    retry: RetryPolicy,
}

impl ExtractionClient {
    pub fn new(config: ExtractionConfig, retry: RetryPolicy) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config, retry })
    }

    /// Run extraction over one transcript. Returns the raw claim
    /// records; schema validation and deduplication happen in the
    /// pipeline.
    pub async fn extract_claims(
        &self,
        transcript_text: &str,
        ticker: &str,
        quarter: QuarterRef,
        system_prompt: &str,
    ) -> ClientResult<Vec<Value>> {
        let user_message = format!(
            "Analyze this {ticker} {quarter} earnings call transcript.\n\n\
             Extract ALL quantitative claims made by management (CEO, CFO, and other executives).\n\n\
             Transcript:\n{transcript_text}"
        );
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": system_prompt,
            "messages": [{"role": "user", "content": user_message}],
        });
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));

        let response = with_retry(&self.retry, "claim-extraction", || {
            let client = &self.client;
            let url = url.clone();
            let body = body.clone();
            let api_key = self.config.api_key.clone();
            async move {
                let result = client
                    .post(&url)
                    .header("x-api-key", api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body)
                    .send()
                    .await;
                let response = match result {
                    Ok(response) => response,
                    Err(e) => return Attempt::Transient(e.to_string()),
                };
                match classify_status(response.status()) {
                    Some(true) => Attempt::Transient(format!("status {}", response.status())),
                    Some(false) => Attempt::Permanent(format!("status {}", response.status())),
                    None => match response.json::<Value>().await {
                        Ok(value) => Attempt::Success(value),
                        Err(e) => Attempt::Transient(format!("unreadable body: {e}")),
                    },
                }
            }
        })
        .await?;

        let text = response
            .get("content")
            .and_then(Value::as_array)
            .and_then(|blocks| blocks.first())
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::Parse("extraction response has no text content".to_string())
            })?;

        if let Some(usage) = response.get("usage") {
            info!(
                "{ticker} {quarter}: extraction used {}/{} tokens",
                usage.get("input_tokens").and_then(serde_json::Value::as_i64).unwrap_or(0),
                usage.get("output_tokens").and_then(serde_json::Value::as_i64).unwrap_or(0),
            );
        }

        Ok(parse_claims_response(text))
    }
}

/// Pull a JSON array of claim records out of possibly messy model
/// output. Tries, in order: a fenced code block, the bare payload, the
/// outermost `[...]` span. Anything unparseable yields an empty list.
pub fn parse_claims_response(text: &str) -> Vec<Value> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"```(?:json)?\s*(\[[\s\S]*?\])\s*```").expect("fence pattern")
    });

    if let Some(captures) = fence.captures(text) {
        if let Ok(Value::Array(records)) = serde_json::from_str(&captures[1]) {
            return records;
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        if let Ok(Value::Array(records)) = serde_json::from_str(trimmed) {
            return records;
        }
    }

    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            if let Ok(Value::Array(records)) = serde_json::from_str(&text[start..=end]) {
                return records;
            }
        }
    }

    error!(
        "could not parse claims JSON from extraction response (first 300 chars): {}",
        text.chars().take(300).collect::<String>()
    );
    Vec::new()
}
