//! Extract stage
//!
//! Runs LLM claim extraction over every transcript that has no claims
//! yet, then validates, normalizes, deduplicates, and persists the
//! results. Individual malformed records are dropped with a warning;
//! their siblings survive.

use crate::summary::ExtractSummary;
use crate::PipelineResult;
use ca_clients::{prompt, ExtractionClient};
use ca_core::{ClaimDraft, ComparisonPeriod, MetricRegistry};
use ca_store::models::TranscriptRow;
use ca_store::Store;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

#[derive(Default)]
struct TranscriptTally {
    extracted: u64,
    invalid: u64,
    deduped: u64,
}

pub async fn run(
    store: &Store,
    extractor: &ExtractionClient,
    max_claims_per_transcript: usize,
    workers: usize,
) -> PipelineResult<ExtractSummary> {
    let pending = store.transcripts().unprocessed().await?;
    let mut summary = ExtractSummary::default();
    if pending.is_empty() {
        info!("no unprocessed transcripts");
        summary.ok = true;
        return Ok(summary);
    }

    let system_prompt = prompt::claim_extraction(max_claims_per_transcript);
    info!(
        "extracting claims from {} transcripts (prompt {})",
        pending.len(),
        prompt::CLAIM_EXTRACTION_VERSION,
    );

    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = FuturesUnordered::new();
    for transcript in &pending {
        let semaphore = semaphore.clone();
        let system_prompt = system_prompt.as_str();
        tasks.push(async move {
            let _permit = semaphore.acquire().await.unwrap();
            let result = extract_one(
                store,
                extractor,
                transcript,
                system_prompt,
                max_claims_per_transcript,
            )
            .await;
            (transcript.id, result)
        });
    }

    while let Some((transcript_id, result)) = tasks.next().await {
        match result {
            Ok(tally) => {
                summary.transcripts_processed += 1;
                summary.claims_extracted += tally.extracted;
                summary.claims_invalid += tally.invalid;
                summary.claims_deduped += tally.deduped;
            }
            Err(e) => {
                error!("extraction failed for transcript {transcript_id}: {e}");
                summary.errors += 1;
            }
        }
    }

    summary.ok = summary.errors == 0;
    Ok(summary)
}

async fn extract_one(
    store: &Store,
    extractor: &ExtractionClient,
    transcript: &TranscriptRow,
    system_prompt: &str,
    max_claims: usize,
) -> PipelineResult<TranscriptTally> {
    let company = store.companies().get(transcript.company_id).await?;
    let ticker = company.map(|c| c.ticker).unwrap_or_else(|| "UNKNOWN".to_string());
    let quarter = transcript.quarter_ref();

    let records = extractor
        .extract_claims(&transcript.full_text, &ticker, quarter, system_prompt)
        .await?;
    let raw_count = records.len();

    let mut tally = TranscriptTally::default();
    let mut drafts = Vec::new();
    for record in records.iter().take(max_claims) {
        match validate_record(record) {
            Some(draft) => drafts.push(draft),
            None => {
                tally.invalid += 1;
                warn!(
                    "{ticker} {quarter}: dropping invalid claim record: {}",
                    record.to_string().chars().take(120).collect::<String>()
                );
            }
        }
    }

    let valid_count = drafts.len();
    let unique = deduplicate(drafts);
    tally.deduped = (valid_count - unique.len()) as u64;
    tally.extracted = unique.len() as u64;

    for draft in &unique {
        store.claims().insert(transcript.id, draft).await?;
    }

    info!(
        "{ticker} {quarter}: {raw_count} raw claims, {valid_count} valid, {} unique",
        unique.len(),
    );
    Ok(tally)
}

/// Validate one raw extraction record into a [`ClaimDraft`]. The metric
/// name is normalized through the registry's alias table; records with
/// values outside the enumerated vocabularies are dropped, not coerced.
pub fn validate_record(record: &Value) -> Option<ClaimDraft> {
    let obj = record.as_object()?;

    let metric_raw = obj.get("metric")?.as_str()?;
    if metric_raw.trim().is_empty() {
        return None;
    }
    let metric = MetricRegistry::normalize(metric_raw);

    let metric_kind = obj.get("metric_kind")?.as_str()?.parse().ok()?;
    let unit = obj.get("unit")?.as_str()?.parse().ok()?;
    let comparison_period = obj.get("comparison_period")?.as_str()?.parse().ok()?;
    let stated_value = obj.get("stated_value")?.as_f64()?;
    let claim_text = obj.get("claim_text")?.as_str()?.to_string();

    let as_nonempty = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(ClaimDraft {
        speaker: as_nonempty("speaker").unwrap_or_else(|| "Unknown".to_string()),
        speaker_role: as_nonempty("speaker_role").unwrap_or_else(|| "Unknown".to_string()),
        claim_text,
        metric,
        metric_kind,
        stated_value,
        unit,
        comparison_period,
        is_gaap: obj.get("is_gaap").and_then(Value::as_bool).unwrap_or(true),
        segment: as_nonempty("segment"),
        confidence: obj
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.5)
            .clamp(0.0, 1.0),
        context: as_nonempty("context"),
    })
}

/// Drop repeats of the same statement, keyed by metric, stated value,
/// and comparison basis. First occurrence wins.
pub fn deduplicate(drafts: Vec<ClaimDraft>) -> Vec<ClaimDraft> {
    let mut seen: HashSet<(String, u64, ComparisonPeriod)> = HashSet::new();
    drafts
        .into_iter()
        .filter(|draft| {
            seen.insert((
                draft.metric.clone(),
                draft.stated_value.to_bits(),
                draft.comparison_period,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ca_core::{ClaimUnit, MetricKind};
    use serde_json::json;

    fn full_record() -> Value {
        json!({
            "speaker": "Tim Cook",
            "speaker_role": "CEO",
            "claim_text": "Revenue grew 10.7% year over year",
            "metric": "Total Revenue",
            "metric_kind": "growth_rate",
            "stated_value": 10.7,
            "unit": "percent",
            "comparison_period": "year_over_year",
            "is_gaap": true,
            "segment": null,
            "confidence": 0.95,
            "context": "Opening remarks"
        })
    }

    #[test]
    fn valid_record_normalizes_metric() {
        let draft = validate_record(&full_record()).unwrap();
        assert_eq!(draft.metric, "revenue");
        assert_eq!(draft.metric_kind, MetricKind::GrowthRate);
        assert_eq!(draft.unit, ClaimUnit::Percent);
        assert_eq!(draft.comparison_period, ComparisonPeriod::YearOverYear);
    }

    #[test]
    fn invalid_enum_values_discard_the_record() {
        let mut record = full_record();
        record["metric_kind"] = json!("vibes");
        assert!(validate_record(&record).is_none());

        let mut record = full_record();
        record["unit"] = json!("bitcoin");
        assert!(validate_record(&record).is_none());

        let mut record = full_record();
        record["comparison_period"] = json!("whenever");
        assert!(validate_record(&record).is_none());
    }

    #[test]
    fn missing_required_fields_discard_the_record() {
        for key in ["metric", "metric_kind", "stated_value", "unit", "comparison_period", "claim_text"] {
            let mut record = full_record();
            record.as_object_mut().unwrap().remove(key);
            assert!(validate_record(&record).is_none(), "{key} should be required");
        }
    }

    #[test]
    fn optional_fields_get_defaults() {
        let record = json!({
            "claim_text": "EPS was $1.46",
            "metric": "eps_diluted",
            "metric_kind": "per_share",
            "stated_value": 1.46,
            "unit": "usd",
            "comparison_period": "none"
        });
        let draft = validate_record(&record).unwrap();
        assert_eq!(draft.speaker, "Unknown");
        assert!(draft.is_gaap);
        assert_eq!(draft.confidence, 0.5);
        assert_eq!(draft.segment, None);
    }

    #[test]
    fn confidence_is_clamped() {
        let mut record = full_record();
        record["confidence"] = json!(3.5);
        assert_eq!(validate_record(&record).unwrap().confidence, 1.0);
    }

    #[test]
    fn non_object_records_are_invalid() {
        assert!(validate_record(&json!("just a string")).is_none());
        assert!(validate_record(&json!(42)).is_none());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let a = validate_record(&full_record()).unwrap();
        let mut b = validate_record(&full_record()).unwrap();
        b.speaker = "Luca Maestri".to_string(); // same key, different speaker
        let mut c = validate_record(&full_record()).unwrap();
        c.stated_value = 11.0; // different key

        let unique = deduplicate(vec![a, b, c]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].speaker, "Tim Cook");
        assert_eq!(unique[1].stated_value, 11.0);
    }
}
