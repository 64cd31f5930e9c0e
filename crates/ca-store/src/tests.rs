use crate::Store;
use ca_core::{
    ClaimDraft, ClaimUnit, ComparisonPeriod, FinancialFigures, MetricKind, MisleadingFlag,
    Pattern, PatternKind, QuarterRef, Verdict, VerificationOutcome,
};
use chrono::NaiveDate;

fn call_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 30).unwrap()
}

fn draft(metric: &str) -> ClaimDraft {
    ClaimDraft {
        speaker: "Jane Doe".to_string(),
        speaker_role: "CFO".to_string(),
        claim_text: "Revenue grew 10.7% year over year".to_string(),
        metric: metric.to_string(),
        metric_kind: MetricKind::GrowthRate,
        stated_value: 10.7,
        unit: ClaimUnit::Percent,
        comparison_period: ComparisonPeriod::YearOverYear,
        is_gaap: true,
        segment: None,
        confidence: 0.9,
        context: None,
    }
}

fn outcome(verdict: Verdict) -> VerificationOutcome {
    VerificationOutcome {
        actual_value: Some(10.67),
        accuracy_score: Some(0.997),
        verdict,
        explanation: "Verified: stated 10.70, actual 10.67 (difference +0.3%).".to_string(),
        flags: vec![MisleadingFlag::RoundingBias],
        periods_consulted: vec![QuarterRef::new(2025, 3), QuarterRef::new(2024, 3)],
    }
}

#[tokio::test]
async fn company_upsert_is_idempotent_and_canonicalizes_ticker() {
    let store = Store::open_in_memory().await.unwrap();
    let companies = store.companies();

    let first = companies.get_or_create("aapl", "Apple Inc.", "Technology").await.unwrap();
    assert_eq!(first.ticker, "AAPL");

    let second = companies.get_or_create("AAPL", "Renamed", "Other").await.unwrap();
    assert_eq!(second.id, first.id);
    // Companies are never mutated after creation
    assert_eq!(second.name, "Apple Inc.");

    assert_eq!(companies.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn transcript_upsert_skips_existing_quarter() {
    let store = Store::open_in_memory().await.unwrap();
    let company = store.companies().get_or_create("MSFT", "Microsoft", "Technology").await.unwrap();
    let transcripts = store.transcripts();
    let q = QuarterRef::new(2025, 3);

    assert!(transcripts.insert_if_absent(company.id, q, call_date(), "call text").await.unwrap());
    assert!(!transcripts.insert_if_absent(company.id, q, call_date(), "other text").await.unwrap());

    let stored = transcripts.get_for_quarter(company.id, q).await.unwrap().unwrap();
    assert_eq!(stored.full_text, "call text");
    assert_eq!(stored.quarter_ref(), q);
}

#[tokio::test]
async fn period_upsert_and_lookup() {
    let store = Store::open_in_memory().await.unwrap();
    let company = store.companies().get_or_create("NVDA", "NVIDIA", "Technology").await.unwrap();
    let periods = store.periods();
    let q = QuarterRef::new(2025, 2);

    let figures = FinancialFigures { revenue: Some(44.06e9), ..Default::default() };
    assert!(periods.insert_if_absent(company.id, q, &figures).await.unwrap());
    assert!(!periods.insert_if_absent(company.id, q, &figures).await.unwrap());
    assert_eq!(periods.count_for_company(company.id).await.unwrap(), 1);

    let stored = periods.get_for_quarter(company.id, q).await.unwrap().unwrap();
    assert_eq!(stored.figures().revenue, Some(44.06e9));
    assert_eq!(stored.figures().net_income, None);
}

#[tokio::test]
async fn unprocessed_transcripts_shrink_as_claims_arrive() {
    let store = Store::open_in_memory().await.unwrap();
    let company = store.companies().get_or_create("AMZN", "Amazon", "Retail").await.unwrap();
    let transcripts = store.transcripts();

    transcripts
        .insert_if_absent(company.id, QuarterRef::new(2025, 1), call_date(), "q1")
        .await
        .unwrap();
    transcripts
        .insert_if_absent(company.id, QuarterRef::new(2025, 2), call_date(), "q2")
        .await
        .unwrap();
    assert_eq!(transcripts.unprocessed().await.unwrap().len(), 2);

    let q1 = transcripts.get_for_quarter(company.id, QuarterRef::new(2025, 1)).await.unwrap().unwrap();
    store.claims().insert(q1.id, &draft("revenue")).await.unwrap();

    let remaining = transcripts.unprocessed().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].quarter_ref(), QuarterRef::new(2025, 2));
}

#[tokio::test]
async fn one_verification_per_claim() {
    let store = Store::open_in_memory().await.unwrap();
    let company = store.companies().get_or_create("META", "Meta", "Communication").await.unwrap();
    store
        .transcripts()
        .insert_if_absent(company.id, QuarterRef::new(2025, 3), call_date(), "text")
        .await
        .unwrap();
    let transcript =
        store.transcripts().get_for_quarter(company.id, QuarterRef::new(2025, 3)).await.unwrap().unwrap();
    let claim_id = store.claims().insert(transcript.id, &draft("revenue")).await.unwrap();

    let verifications = store.verifications();
    assert!(verifications.insert_if_absent(claim_id, &outcome(Verdict::Verified), None, None).await.unwrap());
    // A second pass must not overwrite the stored verdict
    assert!(!verifications
        .insert_if_absent(claim_id, &outcome(Verdict::Incorrect), None, None)
        .await
        .unwrap());

    let stored = verifications.get_for_claim(claim_id).await.unwrap().unwrap();
    assert_eq!(stored.verdict().unwrap(), Verdict::Verified);
    assert_eq!(stored.flags().unwrap(), vec![MisleadingFlag::RoundingBias]);

    let pending = store.claims().unverified().await.unwrap();
    assert!(pending.is_empty());

    let counts = verifications.counts_for_company(company.id).await.unwrap();
    assert_eq!(counts.verified, 1);
    assert_eq!(counts.total(), 1);
}

#[tokio::test]
async fn pending_claims_carry_transcript_addressing() {
    let store = Store::open_in_memory().await.unwrap();
    let company = store.companies().get_or_create("JPM", "JPMorgan", "Financial").await.unwrap();
    store
        .transcripts()
        .insert_if_absent(company.id, QuarterRef::new(2024, 4), call_date(), "text")
        .await
        .unwrap();
    let transcript =
        store.transcripts().get_for_quarter(company.id, QuarterRef::new(2024, 4)).await.unwrap().unwrap();
    store.claims().insert(transcript.id, &draft("net_income")).await.unwrap();

    let pending = store.claims().unverified().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].ticker, "JPM");
    assert_eq!(pending[0].company_id, company.id);
    assert_eq!(pending[0].quarter_ref(), QuarterRef::new(2024, 4));

    let rehydrated = pending[0].as_draft().unwrap();
    assert_eq!(rehydrated.metric, "net_income");
    assert_eq!(rehydrated.metric_kind, MetricKind::GrowthRate);
}

#[tokio::test]
async fn pattern_replacement_is_wholesale() {
    let store = Store::open_in_memory().await.unwrap();
    let company = store.companies().get_or_create("TSLA", "Tesla", "Automotive").await.unwrap();
    let patterns = store.patterns();

    let old = Pattern {
        kind: PatternKind::MetricSwitching,
        severity: 0.5,
        description: "old".to_string(),
        affected_quarters: vec!["Q1 2025".to_string()],
        evidence: vec![],
    };
    patterns.replace_for_company(company.id, &[old]).await.unwrap();

    let new = Pattern {
        kind: PatternKind::ConsistentRoundingUp,
        severity: 0.8,
        description: "new".to_string(),
        affected_quarters: vec!["Q1 2025".to_string(), "Q2 2025".to_string()],
        evidence: vec!["8/10 favorable roundings".to_string()],
    };
    patterns.replace_for_company(company.id, &[new]).await.unwrap();

    let stored = patterns.for_company(company.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].kind, "consistent_rounding_up");
    assert_eq!(stored[0].affected_quarters().unwrap().len(), 2);

    // An empty analysis clears the set
    patterns.replace_for_company(company.id, &[]).await.unwrap();
    assert!(patterns.for_company(company.id).await.unwrap().is_empty());
}
