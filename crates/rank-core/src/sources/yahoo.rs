//! Yahoo Finance market data: company name, prices and analyst consensus.
//!
//! The quoteSummary snapshot is tried first. When it is unavailable or lacks a
//! price, the last two daily closes from the chart API fill the gap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::IgnoredAny;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use super::MarketDataSource;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::model::{MarketRecord, finite};
use crate::ticker::Ticker;

const SUMMARY_MODULES: &str = "price,financialData";

/// How long a failed handshake is remembered before it is tried again
const HANDSHAKE_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Daily closes for a ticker, oldest first
#[async_trait]
pub trait CloseHistory: Send + Sync {
    async fn daily_closes(&self, ticker: &Ticker, days: u32) -> Result<Vec<f64>>;
}

/// Close history from the Yahoo chart API
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartHistory;

#[async_trait]
impl CloseHistory for ChartHistory {
    async fn daily_closes(&self, ticker: &Ticker, days: u32) -> Result<Vec<f64>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| TrackerError::YahooFinance(e.to_string()))?;

        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(i64::from(days));

        let response = provider
            .get_quote_history(ticker.as_str(), start, end)
            .await
            .map_err(|e| TrackerError::YahooFinance(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| TrackerError::YahooFinance(e.to_string()))?;

        Ok(quotes.iter().map(|q| q.close).collect())
    }
}

#[derive(Debug)]
enum Crumb {
    Unknown,
    Ready(String),
    Failed { at: Instant, reason: String },
}

/// Market data client backed by Yahoo Finance
pub struct YahooMarketData {
    client: Client,
    summary_url: String,
    cookie_url: String,
    crumb_url: String,
    history_days: u32,
    history: Arc<dyn CloseHistory>,
    crumb: Mutex<Crumb>,
}

/// Fields read from the quoteSummary `price` and `financialData` modules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub company_name: Option<String>,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub analyst_mean: Option<f64>,
    pub target_price: Option<f64>,
}

impl Snapshot {
    fn has_prices(&self) -> bool {
        self.current_price.is_some() && self.previous_close.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    result: Option<Vec<SummaryModules>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryModules {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    financial_data: Option<FinancialDataModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    regular_market_price: Option<YValue>,
    #[serde(default)]
    regular_market_previous_close: Option<YValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialDataModule {
    #[serde(default)]
    recommendation_mean: Option<YValue>,
    #[serde(default)]
    target_mean_price: Option<YValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.9, "fmt": "1.90"}`, sometimes `{}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YValue {
    Plain(f64),
    Wrapped {
        #[serde(default)]
        raw: Option<f64>,
    },
    Other(IgnoredAny),
}

impl YValue {
    fn value(&self) -> Option<f64> {
        match self {
            YValue::Plain(v) => finite(Some(*v)),
            YValue::Wrapped { raw } => finite(*raw),
            YValue::Other(_) => None,
        }
    }
}

fn number(value: Option<&YValue>) -> Option<f64> {
    value.and_then(YValue::value)
}

/// Parse a quoteSummary response body
pub fn parse_snapshot(body: &str) -> Result<Snapshot> {
    let envelope: SummaryEnvelope = serde_json::from_str(body)?;
    if let Some(error) = envelope.quote_summary.error.filter(|e| !e.is_null()) {
        return Err(TrackerError::YahooFinance(error.to_string()));
    }

    let modules = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| TrackerError::Parse("quoteSummary has no result".to_string()))?;

    let mut snapshot = Snapshot::default();
    if let Some(price) = modules.price {
        snapshot.company_name = price
            .short_name
            .or(price.long_name)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        snapshot.current_price = number(price.regular_market_price.as_ref());
        snapshot.previous_close = number(price.regular_market_previous_close.as_ref());
    }
    if let Some(financial) = modules.financial_data {
        snapshot.analyst_mean = number(financial.recommendation_mean.as_ref());
        snapshot.target_price = number(financial.target_mean_price.as_ref());
    }
    Ok(snapshot)
}

/// Latest and previous close from a close series, oldest first
pub fn last_two_closes(closes: &[f64]) -> (Option<f64>, Option<f64>) {
    let mut valid = closes.iter().copied().filter(|c| c.is_finite() && *c > 0.0).rev();
    let current = valid.next();
    let previous = valid.next();
    (current, previous)
}

/// Combine whatever the two strategies produced into one record.
///
/// Snapshot prices win; history only fills prices the snapshot lacks.
pub fn assemble(ticker: Ticker, snapshot: Option<Snapshot>, closes: Option<&[f64]>) -> MarketRecord {
    let snapshot = snapshot.unwrap_or_default();
    let (history_current, history_previous) = closes.map(last_two_closes).unwrap_or_default();

    let mut record = MarketRecord::empty(ticker).with_prices(
        snapshot.current_price.or(history_current),
        snapshot.previous_close.or(history_previous),
    );
    record.company_name = snapshot.company_name;
    record.analyst_mean = snapshot.analyst_mean;
    record.target_price = snapshot.target_price;
    record
}

impl YahooMarketData {
    /// Build a client from the pipeline configuration
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            summary_url: config.quote_summary_url.trim_end_matches('/').to_string(),
            cookie_url: config.cookie_url.clone(),
            crumb_url: config.crumb_url.clone(),
            history_days: config.history_days,
            history: Arc::new(ChartHistory),
            crumb: Mutex::new(Crumb::Unknown),
        })
    }

    /// Replace the close history provider
    pub fn with_history(mut self, history: Arc<dyn CloseHistory>) -> Self {
        self.history = history;
        self
    }

    /// Fetch market data for a ticker; failures leave fields absent
    pub async fn fetch(&self, ticker: &Ticker) -> MarketRecord {
        let started = Instant::now();

        let snapshot = match self.fetch_snapshot(ticker).await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(%ticker, error = %err, "quoteSummary fetch failed");
                None
            },
        };

        let closes = if snapshot.as_ref().is_none_or(|s| !s.has_prices()) {
            match self.history.daily_closes(ticker, self.history_days).await {
                Ok(closes) => Some(closes),
                Err(err) => {
                    warn!(%ticker, error = %err, "Close history fetch failed");
                    None
                },
            }
        } else {
            None
        };

        let record = assemble(ticker.clone(), snapshot, closes.as_deref());
        debug!(
            %ticker,
            price = ?record.current_price,
            change = ?record.percent_change,
            analyst_mean = ?record.analyst_mean,
            elapsed_ms = started.elapsed().as_millis(),
            "Fetched market data"
        );
        record
    }

    async fn fetch_snapshot(&self, ticker: &Ticker) -> Result<Snapshot> {
        let crumb = self.crumb().await?;
        let url = format!("{}/{}", self.summary_url, ticker);

        let response = self
            .client
            .get(&url)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // Crumb expired, the next call performs a fresh handshake
            *self.crumb.lock().await = Crumb::Unknown;
        }
        if !status.is_success() {
            return Err(TrackerError::Status { url, status });
        }

        let body = response.text().await?;
        parse_snapshot(&body)
    }

    /// Session crumb, obtained once and reused until rejected.
    ///
    /// Concurrent fetches wait on the lock while one handshake runs. A failed
    /// handshake is remembered for [`HANDSHAKE_RETRY_AFTER`].
    async fn crumb(&self) -> Result<String> {
        let mut state = self.crumb.lock().await;
        match &*state {
            Crumb::Ready(crumb) => return Ok(crumb.clone()),
            Crumb::Failed { at, reason } if at.elapsed() < HANDSHAKE_RETRY_AFTER => {
                return Err(TrackerError::Auth(format!("skipped, last attempt: {reason}")));
            },
            _ => {},
        }

        match self.handshake().await {
            Ok(crumb) => {
                *state = Crumb::Ready(crumb.clone());
                Ok(crumb)
            },
            Err(err) => {
                debug!(error = %err, "Crumb handshake failed");
                *state = Crumb::Failed {
                    at: Instant::now(),
                    reason: err.to_string(),
                };
                Err(err)
            },
        }
    }

    async fn handshake(&self) -> Result<String> {
        // Only the cookie matters here; the page itself is usually a 404
        if let Err(err) = self.client.get(&self.cookie_url).send().await {
            debug!(error = %err, "Cookie request failed, trying crumb anyway");
        }

        let response = self.client.get(&self.crumb_url).send().await?;
        if !response.status().is_success() {
            return Err(TrackerError::Auth(format!(
                "crumb endpoint answered {}",
                response.status()
            )));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.len() > 100 || crumb.contains(char::is_whitespace) || crumb.contains('<') {
            return Err(TrackerError::Auth("unexpected crumb body".to_string()));
        }
        Ok(crumb)
    }
}

#[async_trait]
impl MarketDataSource for YahooMarketData {
    async fn fetch_market_data(&self, ticker: &Ticker) -> MarketRecord {
        self.fetch(ticker).await
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}
