use crate::{analyze, verify};
use ca_core::{
    ClaimDraft, ClaimUnit, ComparisonPeriod, FinancialFigures, MetricKind, Pattern, PatternKind,
    QuarterRef, Thresholds,
};
use ca_store::Store;
use chrono::NaiveDate;

fn draft(
    metric: &str,
    kind: MetricKind,
    value: f64,
    unit: ClaimUnit,
    comparison: ComparisonPeriod,
    is_gaap: bool,
) -> ClaimDraft {
    ClaimDraft {
        speaker: "Jane Doe".to_string(),
        speaker_role: "CFO".to_string(),
        claim_text: format!("{metric} claim"),
        metric: metric.to_string(),
        metric_kind: kind,
        stated_value: value,
        unit,
        comparison_period: comparison,
        is_gaap,
        segment: None,
        confidence: 0.9,
        context: None,
    }
}

/// One company, one transcript, two periods, six claims covering every
/// verdict band.
async fn seeded_store() -> (Store, i64) {
    let store = Store::open_in_memory().await.unwrap();
    let company = store.companies().get_or_create("AAPL", "Apple Inc.", "Technology").await.unwrap();

    let q3_2025 = QuarterRef::new(2025, 3);
    let call_date = NaiveDate::from_ymd_opt(2025, 10, 30).unwrap();
    store
        .transcripts()
        .insert_if_absent(company.id, q3_2025, call_date, "earnings call text")
        .await
        .unwrap();
    let transcript = store.transcripts().get_for_quarter(company.id, q3_2025).await.unwrap().unwrap();

    store
        .periods()
        .insert_if_absent(
            company.id,
            q3_2025,
            &FinancialFigures {
                revenue: Some(94.93e9),
                gross_profit: Some(43.879e9),
                eps_diluted: Some(1.46),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    store
        .periods()
        .insert_if_absent(
            company.id,
            QuarterRef::new(2024, 3),
            &FinancialFigures { revenue: Some(85.777e9), ..Default::default() },
        )
        .await
        .unwrap();

    let claims = store.claims();
    for claim in [
        draft("revenue", MetricKind::GrowthRate, 10.7, ClaimUnit::Percent, ComparisonPeriod::YearOverYear, true),
        draft("revenue", MetricKind::Absolute, 94.9, ClaimUnit::UsdBillions, ComparisonPeriod::None, true),
        draft("gross_margin", MetricKind::Margin, 46.0, ClaimUnit::Percent, ComparisonPeriod::None, true),
        draft("revenue", MetricKind::GrowthRate, 15.0, ClaimUnit::Percent, ComparisonPeriod::YearOverYear, true),
        draft("eps_diluted", MetricKind::PerShare, 1.47, ClaimUnit::Usd, ComparisonPeriod::None, false),
        draft("daily active users", MetricKind::Absolute, 3.2e9, ClaimUnit::Shares, ComparisonPeriod::None, true),
    ] {
        claims.insert(transcript.id, &claim).await.unwrap();
    }

    (store, company.id)
}

#[tokio::test]
async fn verify_stage_classifies_every_band() {
    let (store, _) = seeded_store().await;
    let summary = verify::run(&store, Thresholds::default()).await.unwrap();

    assert!(summary.ok);
    assert_eq!(summary.verified, 3);
    assert_eq!(summary.incorrect, 1);
    assert_eq!(summary.misleading, 1);
    assert_eq!(summary.unverifiable, 1);
    assert_eq!(summary.errors, 0);
}

#[tokio::test]
async fn verify_stage_is_idempotent() {
    let (store, _) = seeded_store().await;
    let first = verify::run(&store, Thresholds::default()).await.unwrap();
    assert_eq!(first.counts().total(), 6);

    let second = verify::run(&store, Thresholds::default()).await.unwrap();
    assert!(second.ok);
    assert_eq!(second.counts().total(), 0);
    assert!(store.claims().unverified().await.unwrap().is_empty());
}

#[tokio::test]
async fn verify_links_the_periods_consulted() {
    let (store, company_id) = seeded_store().await;
    verify::run(&store, Thresholds::default()).await.unwrap();

    let current =
        store.periods().get_for_quarter(company_id, QuarterRef::new(2025, 3)).await.unwrap().unwrap();
    let prior =
        store.periods().get_for_quarter(company_id, QuarterRef::new(2024, 3)).await.unwrap().unwrap();

    let audited = store.claims().audited_for_company(company_id).await.unwrap();
    let growth_claim =
        audited.iter().find(|r| r.metric == "revenue" && r.stated_value == 10.7).unwrap();
    let verification =
        store.verifications().get_for_claim(growth_claim.claim_id).await.unwrap().unwrap();
    assert_eq!(verification.period_id, Some(current.id));
    assert_eq!(verification.comparison_period_id, Some(prior.id));
}

#[tokio::test]
async fn unverifiable_outcomes_have_no_values() {
    let (store, company_id) = seeded_store().await;
    verify::run(&store, Thresholds::default()).await.unwrap();

    let audited = store.claims().audited_for_company(company_id).await.unwrap();
    let unverifiable = audited.iter().find(|r| r.metric == "daily active users").unwrap();
    assert_eq!(unverifiable.verdict, "unverifiable");
    assert_eq!(unverifiable.actual_value, None);
    assert_eq!(unverifiable.accuracy_score, None);
}

#[tokio::test]
async fn analyze_builds_a_company_report() {
    let (store, company_id) = seeded_store().await;
    verify::run(&store, Thresholds::default()).await.unwrap();

    let summary = analyze::run(&store).await.unwrap();
    assert!(summary.ok);
    assert_eq!(summary.companies_analyzed, 1);

    let company = store.companies().get(company_id).await.unwrap().unwrap();
    let analysis = analyze::analyze_company(&store, &company).await.unwrap().unwrap();
    assert_eq!(analysis.total_claims, 6);
    assert_eq!(analysis.counts.verified, 3);
    assert_eq!(analysis.counts.unverifiable, 1);
    assert_eq!(analysis.quarters_analyzed, vec!["Q3 2025"]);
    assert!(analysis.trust_score > 50.0);
    // The 15% growth overstatement scores worst and leads the list
    assert_eq!(analysis.top_discrepancies[0].stated_value, 15.0);
}

#[tokio::test]
async fn analyze_replaces_stale_patterns() {
    let (store, company_id) = seeded_store().await;
    verify::run(&store, Thresholds::default()).await.unwrap();

    // A leftover pattern from an earlier run with different data
    let stale = Pattern {
        kind: PatternKind::SelectiveEmphasis,
        severity: 0.6,
        description: "stale".to_string(),
        affected_quarters: vec!["Q1 2020".to_string()],
        evidence: vec![],
    };
    store.patterns().replace_for_company(company_id, &[stale]).await.unwrap();

    analyze::run(&store).await.unwrap();

    // One quarter of data triggers no detector, so the set is now empty
    let stored = store.patterns().for_company(company_id).await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn analyze_skips_companies_without_verifications() {
    let store = Store::open_in_memory().await.unwrap();
    store.companies().get_or_create("MSFT", "Microsoft", "Technology").await.unwrap();

    let summary = analyze::run(&store).await.unwrap();
    assert_eq!(summary.companies_analyzed, 0);
    assert_eq!(summary.companies_skipped, 1);
}

#[tokio::test]
async fn repeated_runs_leave_the_database_unchanged() {
    let (store, company_id) = seeded_store().await;

    verify::run(&store, Thresholds::default()).await.unwrap();
    analyze::run(&store).await.unwrap();
    let audited_first = store.claims().audited_for_company(company_id).await.unwrap();
    let patterns_first = store.patterns().for_company(company_id).await.unwrap();

    verify::run(&store, Thresholds::default()).await.unwrap();
    analyze::run(&store).await.unwrap();
    let audited_second = store.claims().audited_for_company(company_id).await.unwrap();
    let patterns_second = store.patterns().for_company(company_id).await.unwrap();

    assert_eq!(audited_first.len(), audited_second.len());
    for (a, b) in audited_first.iter().zip(&audited_second) {
        assert_eq!(a.claim_id, b.claim_id);
        assert_eq!(a.verdict, b.verdict);
        assert_eq!(a.accuracy_score, b.accuracy_score);
    }
    assert_eq!(patterns_first.len(), patterns_second.len());
}
