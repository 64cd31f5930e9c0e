//! Ingest stage
//!
//! Pulls company profiles, quarterly statements, and earnings-call
//! transcripts for the target tickers, and persists anything not
//! already stored. Companies fan out across a bounded worker pool;
//! within one company all work is sequential.

use crate::summary::IngestSummary;
use crate::PipelineResult;
use ca_clients::fmp::{BalanceSheetRecord, CashFlowRecord, IncomeRecord};
use ca_clients::{FmpClient, LocalTranscriptSource};
use ca_core::{FinancialFigures, QuarterRef};
use ca_store::Store;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

#[derive(Default)]
struct CompanyTally {
    transcripts_fetched: u64,
    transcripts_skipped: u64,
    transcripts_missing: u64,
    periods: u64,
    errors: u64,
}

pub async fn run(
    store: &Store,
    fmp: &FmpClient,
    local: &LocalTranscriptSource,
    tickers: &[String],
    quarters: &[QuarterRef],
    statement_window: u32,
    workers: usize,
) -> PipelineResult<IngestSummary> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = FuturesUnordered::new();

    for ticker in tickers {
        let semaphore = semaphore.clone();
        tasks.push(async move {
            let _permit = semaphore.acquire().await.unwrap();
            let result =
                ingest_company(store, fmp, local, ticker, quarters, statement_window).await;
            (ticker.as_str(), result)
        });
    }

    let mut summary = IngestSummary::default();
    while let Some((ticker, result)) = tasks.next().await {
        match result {
            Ok(tally) => {
                summary.companies += 1;
                summary.transcripts_fetched += tally.transcripts_fetched;
                summary.transcripts_skipped += tally.transcripts_skipped;
                summary.transcripts_missing += tally.transcripts_missing;
                summary.financial_periods_fetched += tally.periods;
                summary.errors += tally.errors;
            }
            Err(e) => {
                error!("ingest failed for {ticker}: {e}");
                summary.errors += 1;
            }
        }
    }

    summary.ok = summary.errors == 0;
    Ok(summary)
}

async fn ingest_company(
    store: &Store,
    fmp: &FmpClient,
    local: &LocalTranscriptSource,
    ticker: &str,
    quarters: &[QuarterRef],
    statement_window: u32,
) -> PipelineResult<CompanyTally> {
    let mut tally = CompanyTally::default();
    let companies = store.companies();

    // Companies are created once; the profile endpoint is only hit for
    // tickers we have never seen.
    let company = match companies.get_by_ticker(ticker).await? {
        Some(existing) => existing,
        None => {
            let profile = match fmp.profile(ticker).await {
                Ok(profile) => profile,
                Err(e) => {
                    warn!("profile fetch failed for {ticker}: {e}");
                    tally.errors += 1;
                    None
                }
            };
            let (name, sector) = match profile {
                Some(p) => {
                    let sector = if p.sector.is_empty() { "Unknown".to_string() } else { p.sector };
                    (p.company_name, sector)
                }
                None => (ticker.to_uppercase(), "Unknown".to_string()),
            };
            companies.get_or_create(ticker, &name, &sector).await?
        }
    };
    info!("ingesting {} ({})", company.ticker, company.name);

    if store.periods().count_for_company(company.id).await? > 0 {
        info!("{}: financial periods already present, skipping fetch", company.ticker);
    } else {
        tally.periods = ingest_financials(store, fmp, &company.ticker, company.id, statement_window)
            .await?;
    }

    for &quarter in quarters {
        if store.transcripts().get_for_quarter(company.id, quarter).await?.is_some() {
            tally.transcripts_skipped += 1;
            continue;
        }

        let fetched = match fmp.transcript(&company.ticker, quarter).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("transcript fetch failed for {} {quarter}: {e}", company.ticker);
                tally.errors += 1;
                None
            }
        };

        let (call_date, content) = match fetched {
            Some(t) => (t.call_date, t.content),
            None => match local.load(&company.ticker, quarter).await {
                Some(content) => (chrono::Utc::now().date_naive(), content),
                None => {
                    warn!("no transcript for {} {quarter}", company.ticker);
                    tally.transcripts_missing += 1;
                    continue;
                }
            },
        };

        if store
            .transcripts()
            .insert_if_absent(company.id, quarter, call_date, &content)
            .await?
        {
            tally.transcripts_fetched += 1;
            info!("{}: stored transcript {quarter}", company.ticker);
        } else {
            tally.transcripts_skipped += 1;
        }
    }

    Ok(tally)
}

/// Fetch the three statements and merge them into one period record per
/// quarter, keyed off the income statement.
async fn ingest_financials(
    store: &Store,
    fmp: &FmpClient,
    ticker: &str,
    company_id: i64,
    window: u32,
) -> PipelineResult<u64> {
    let income = fmp.income_statements(ticker, window).await?;
    if income.is_empty() {
        warn!("no income statement data for {ticker}");
        return Ok(0);
    }
    let cash_flow = fmp.cash_flow_statements(ticker, window).await?;
    let balance = fmp.balance_sheets(ticker, window).await?;

    let cash_by_quarter: HashMap<QuarterRef, &CashFlowRecord> =
        cash_flow.iter().filter_map(|r| r.stamp.quarter_ref().map(|q| (q, r))).collect();
    let balance_by_quarter: HashMap<QuarterRef, &BalanceSheetRecord> =
        balance.iter().filter_map(|r| r.stamp.quarter_ref().map(|q| (q, r))).collect();

    let mut stored = 0;
    for record in &income {
        let Some(quarter) = record.stamp.quarter_ref() else { continue };
        let figures = merge_figures(
            record,
            cash_by_quarter.get(&quarter).copied(),
            balance_by_quarter.get(&quarter).copied(),
        );
        if store.periods().insert_if_absent(company_id, quarter, &figures).await? {
            stored += 1;
        }
    }
    info!("{ticker}: stored {stored} financial periods");
    Ok(stored)
}

fn merge_figures(
    income: &IncomeRecord,
    cash_flow: Option<&CashFlowRecord>,
    balance: Option<&BalanceSheetRecord>,
) -> FinancialFigures {
    FinancialFigures {
        revenue: income.revenue,
        cost_of_revenue: income.cost_of_revenue,
        gross_profit: income.gross_profit,
        operating_income: income.operating_income,
        operating_expenses: income.operating_expenses,
        net_income: income.net_income,
        eps: income.eps,
        eps_diluted: income.eps_diluted,
        ebitda: income.ebitda,
        research_and_development: income.research_and_development,
        selling_general_admin: income.selling_general_admin,
        interest_expense: income.interest_expense,
        income_tax_expense: income.income_tax_expense,
        operating_cash_flow: cash_flow.and_then(|c| c.operating_cash_flow),
        capital_expenditure: cash_flow.and_then(|c| c.capital_expenditure),
        free_cash_flow: cash_flow.and_then(|c| c.free_cash_flow),
        total_assets: balance.and_then(|b| b.total_assets),
        total_liabilities: balance.and_then(|b| b.total_liabilities),
        total_debt: balance.and_then(|b| b.total_debt),
        cash_and_equivalents: balance.and_then(|b| b.cash_and_equivalents),
        shareholders_equity: balance.and_then(|b| b.shareholders_equity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ca_clients::fmp::PeriodStamp;

    #[test]
    fn merge_combines_all_three_statements() {
        let income = IncomeRecord {
            stamp: PeriodStamp::default(),
            revenue: Some(100.0),
            net_income: Some(20.0),
            ..Default::default()
        };
        let cash = CashFlowRecord {
            stamp: PeriodStamp::default(),
            free_cash_flow: Some(15.0),
            ..Default::default()
        };
        let balance = BalanceSheetRecord {
            stamp: PeriodStamp::default(),
            total_debt: Some(50.0),
            ..Default::default()
        };

        let figures = merge_figures(&income, Some(&cash), Some(&balance));
        assert_eq!(figures.revenue, Some(100.0));
        assert_eq!(figures.free_cash_flow, Some(15.0));
        assert_eq!(figures.total_debt, Some(50.0));
        assert_eq!(figures.eps, None);
    }

    #[test]
    fn missing_sibling_statements_leave_fields_empty() {
        let income = IncomeRecord {
            stamp: PeriodStamp::default(),
            revenue: Some(100.0),
            ..Default::default()
        };
        let figures = merge_figures(&income, None, None);
        assert_eq!(figures.revenue, Some(100.0));
        assert_eq!(figures.operating_cash_flow, None);
        assert_eq!(figures.total_assets, None);
    }
}
