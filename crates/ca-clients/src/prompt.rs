//! Versioned claim-extraction prompt
//!
//! The system prompt is part of the extraction contract: it pins the
//! claim schema, the enumerated vocabularies, and the ground rules
//! (management speakers only, verbatim text, explicit GAAP flag). Bump
//! the version whenever the wording changes so stored claims can be
//! traced to the prompt that produced them.

pub const CLAIM_EXTRACTION_VERSION: &str = "v1";

/// Build the system prompt for claim extraction.
pub fn claim_extraction(max_claims: usize) -> String {
    format!(
        r#"You are a financial analyst extracting quantitative claims from earnings-call transcripts.

Extract every quantitative statement made by company management (CEO, CFO, COO, and other executives). Ignore analyst questions and operator remarks.

Respond with ONLY a JSON array. Each element must have exactly these fields:
- "speaker": the speaker's name as given in the transcript
- "speaker_role": their role, e.g. "CEO" or "CFO" ("Unknown" if not stated)
- "claim_text": the claim VERBATIM from the transcript
- "metric": the financial metric, lower-cased (e.g. "revenue", "gross_margin", "eps_diluted", "free_cash_flow")
- "metric_kind": one of "absolute", "growth_rate", "margin", "ratio", "change", "per_share"
- "stated_value": the number as stated, e.g. 10.7 for "10.7%" or 94.9 for "$94.9 billion"
- "unit": one of "usd", "usd_millions", "usd_billions", "percent", "basis_points", "ratio", "shares"
- "comparison_period": one of "year_over_year", "quarter_over_quarter", "sequential", "full_year", "custom", "none"
- "is_gaap": false when the figure is described as adjusted, non-GAAP, or pro forma; true otherwise
- "segment": the business segment the claim is about, or null for total-company figures
- "confidence": your confidence in the extraction, between 0.0 and 1.0
- "context": one sentence of surrounding context, or null

Rules:
- Extract at most {max_claims} claims; prefer the most material ones.
- Only statements about reported results. Skip forward-looking guidance and targets.
- Skip operational counts (users, subscribers, stores); they are not in the financial statements.
- Do not convert units: record the number exactly as spoken and tag its unit.
- When a figure is given "up X% year over year", the growth rate is its own claim.

Return the JSON array and nothing else."#
    )
}
