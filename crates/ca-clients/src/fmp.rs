//! Financial Modeling Prep client (stable API)
//!
//! Typed endpoint wrappers for company profiles, earnings-call
//! transcripts, and the three quarterly statements. Every response is
//! cached on disk; transient failures retry with backoff; other 4xx
//! responses and plan-restriction messages surface as absent data, not
//! errors.
//!
//! The stable endpoints take `symbol=TICKER` query parameters. Fiscal
//! years arrive as `fiscalYear` (stable) or `calendarYear` (legacy and
//! cached fixtures), occasionally as strings; period labels are `Q1`
//! through `Q4`.

use crate::cache::ResponseCache;
use crate::retry::{classify_status, with_retry, Attempt, RetryPolicy};
use crate::{ClientError, ClientResult};
use ca_core::QuarterRef;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FmpConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl FmpConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://financialmodelingprep.com/stable".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Company identity fields from the profile endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyProfile {
    pub company_name: String,
    pub sector: String,
}

/// A cleaned earnings-call transcript.
#[derive(Debug, Clone)]
pub struct EarningsTranscript {
    pub call_date: NaiveDate,
    pub content: String,
}

/// Fiscal years arrive as numbers or strings depending on the endpoint
/// generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YearField {
    Num(i64),
    Text(String),
}

impl YearField {
    fn as_year(&self) -> Option<i32> {
        match self {
            YearField::Num(n) => i32::try_from(*n).ok(),
            YearField::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// The period-addressing fields every statement record carries.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeriodStamp {
    pub date: String,
    pub period: String,
    pub fiscal_year: Option<YearField>,
    pub calendar_year: Option<YearField>,
}

impl PeriodStamp {
    /// Resolve the record's fiscal quarter, trying `fiscalYear`, then
    /// `calendarYear`, then the date prefix.
    pub fn quarter_ref(&self) -> Option<QuarterRef> {
        let quarter = match self.period.as_bytes() {
            [b'Q', digit @ b'1'..=b'4', ..] => digit - b'0',
            _ => return None,
        };
        let year = self
            .fiscal_year
            .as_ref()
            .and_then(YearField::as_year)
            .or_else(|| self.calendar_year.as_ref().and_then(YearField::as_year))
            .or_else(|| self.date.get(..4).and_then(|y| y.parse().ok()))?;
        Some(QuarterRef::new(year, quarter))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeRecord {
    #[serde(flatten)]
    pub stamp: PeriodStamp,
    pub revenue: Option<f64>,
    pub cost_of_revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub operating_expenses: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,
    #[serde(alias = "epsdiluted")]
    pub eps_diluted: Option<f64>,
    pub ebitda: Option<f64>,
    #[serde(rename = "researchAndDevelopmentExpenses")]
    pub research_and_development: Option<f64>,
    #[serde(rename = "sellingGeneralAndAdministrativeExpenses")]
    pub selling_general_admin: Option<f64>,
    pub interest_expense: Option<f64>,
    pub income_tax_expense: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CashFlowRecord {
    #[serde(flatten)]
    pub stamp: PeriodStamp,
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
    pub free_cash_flow: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BalanceSheetRecord {
    #[serde(flatten)]
    pub stamp: PeriodStamp,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub total_debt: Option<f64>,
    #[serde(rename = "cashAndCashEquivalents")]
    pub cash_and_equivalents: Option<f64>,
    #[serde(rename = "totalStockholdersEquity")]
    pub shareholders_equity: Option<f64>,
}

pub struct FmpClient {
    client: reqwest::Client,
    config: FmpConfig,
    cache: ResponseCache,
    retry: RetryPolicy,
}

impl FmpClient {
    pub fn new(config: FmpConfig, cache: ResponseCache, retry: RetryPolicy) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config, cache, retry })
    }

    /// Company name and sector, or `None` when the provider has no
    /// profile for the ticker.
    pub async fn profile(&self, ticker: &str) -> ClientResult<Option<CompanyProfile>> {
        let params = vec![("symbol", ticker.to_uppercase())];
        let Some(value) = self.get_json("profile", params).await? else {
            return Ok(None);
        };
        let entry = first_entry(value);
        let Some(entry) = entry else { return Ok(None) };
        match serde_json::from_value::<CompanyProfile>(entry) {
            Ok(profile) if !profile.company_name.is_empty() => Ok(Some(profile)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!("profile for {ticker}: unexpected shape: {e}");
                Ok(None)
            }
        }
    }

    /// One earnings-call transcript, or `None` when the provider has no
    /// transcript for that quarter (including plan-restricted
    /// endpoints, which answer with a bare string).
    pub async fn transcript(
        &self,
        ticker: &str,
        quarter: QuarterRef,
    ) -> ClientResult<Option<EarningsTranscript>> {
        let params = vec![
            ("symbol", ticker.to_uppercase()),
            ("quarter", quarter.quarter.to_string()),
            ("year", quarter.year.to_string()),
        ];
        let Some(value) = self.get_json("earning_call_transcript", params).await? else {
            return Ok(None);
        };

        if let Value::String(message) = &value {
            warn!(
                "transcript {ticker} {quarter} restricted: {}",
                message.chars().take(120).collect::<String>()
            );
            return Ok(None);
        }

        let Some(entry) = first_entry(value) else { return Ok(None) };
        let content = entry.get("content").and_then(Value::as_str).unwrap_or_default();
        if content.is_empty() {
            return Ok(None);
        }

        let call_date = entry
            .get("date")
            .and_then(Value::as_str)
            .and_then(|raw| raw.get(..10))
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        Ok(Some(EarningsTranscript { call_date, content: content.to_string() }))
    }

    pub async fn income_statements(
        &self,
        ticker: &str,
        limit: u32,
    ) -> ClientResult<Vec<IncomeRecord>> {
        self.statement_list("income-statement", ticker, limit).await
    }

    pub async fn cash_flow_statements(
        &self,
        ticker: &str,
        limit: u32,
    ) -> ClientResult<Vec<CashFlowRecord>> {
        self.statement_list("cash-flow-statement", ticker, limit).await
    }

    pub async fn balance_sheets(
        &self,
        ticker: &str,
        limit: u32,
    ) -> ClientResult<Vec<BalanceSheetRecord>> {
        self.statement_list("balance-sheet-statement", ticker, limit).await
    }

    async fn statement_list<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        ticker: &str,
        limit: u32,
    ) -> ClientResult<Vec<T>> {
        let params = vec![
            ("symbol", ticker.to_uppercase()),
            ("period", "quarter".to_string()),
            ("limit", limit.to_string()),
        ];
        let Some(value) = self.get_json(endpoint, params).await? else {
            return Ok(Vec::new());
        };
        let Value::Array(entries) = value else {
            warn!("{endpoint} for {ticker}: expected a list");
            return Ok(Vec::new());
        };

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<T>(entry) {
                Ok(record) => records.push(record),
                Err(e) => warn!("{endpoint} for {ticker}: skipping malformed record: {e}"),
            }
        }
        Ok(records)
    }

    /// Cached GET. `Ok(None)` means the provider answered but has
    /// nothing for us (4xx, malformed body); errors mean the transport
    /// gave out after retries.
    async fn get_json(
        &self,
        endpoint: &str,
        params: Vec<(&str, String)>,
    ) -> ClientResult<Option<Value>> {
        let key = ResponseCache::key(endpoint, &params);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(Some(cached));
        }

        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut query = params;
        query.push(("apikey", self.config.api_key.clone()));

        debug!("GET {url}");
        let result = with_retry(&self.retry, endpoint, || {
            let client = &self.client;
            let url = url.clone();
            let query = query.clone();
            async move {
                let response = match client.get(&url).query(&query).send().await {
                    Ok(response) => response,
                    Err(e) => return Attempt::Transient(e.to_string()),
                };
                match classify_status(response.status()) {
                    Some(true) => Attempt::Transient(format!("status {}", response.status())),
                    Some(false) => Attempt::Permanent(format!("status {}", response.status())),
                    None => match response.json::<Value>().await {
                        Ok(value) => Attempt::Success(value),
                        Err(e) => Attempt::Permanent(format!("unreadable body: {e}")),
                    },
                }
            }
        })
        .await;

        match result {
            Ok(value) => {
                if let Err(e) = self.cache.put(&key, &value).await {
                    debug!("cache save failed for {key}: {e}");
                }
                Ok(Some(value))
            }
            Err(ClientError::Permanent(message)) => {
                warn!("{endpoint}: {message}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn first_entry(value: Value) -> Option<Value> {
    match value {
        Value::Array(mut entries) if !entries.is_empty() => Some(entries.remove(0)),
        Value::Object(_) => Some(value),
        _ => None,
    }
}
