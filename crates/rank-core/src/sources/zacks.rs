//! Zacks quote page scraper

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use super::RankSource;
use super::extract::{RankExtractor, extractor_for};
use crate::config::{TrackerConfig, expand_rank_url};
use crate::error::{Result, TrackerError};
use crate::model::{RankResult, ZacksRank};
use crate::ticker::Ticker;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Scrapes the Zacks rank from each ticker's quote page
#[derive(Clone)]
pub struct ZacksRankSource {
    client: Client,
    url_template: String,
    timeout: Duration,
    extractor: Arc<dyn RankExtractor>,
    rate_limiter: Option<SharedRateLimiter>,
}

impl ZacksRankSource {
    /// Build a source from the pipeline configuration
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        // Shared by every worker of the batch; a burst of one keeps requests evenly spaced
        let rate_limiter = config
            .scrape_rate_per_minute
            .and_then(NonZeroU32::new)
            .map(|rate| {
                let quota = Quota::per_minute(rate).allow_burst(NonZeroU32::MIN);
                Arc::new(RateLimiter::direct(quota))
            });

        Ok(Self {
            client,
            url_template: config.rank_url_template.clone(),
            timeout: config.request_timeout,
            extractor: extractor_for(config.extract_strategy),
            rate_limiter,
        })
    }

    /// Replace the extraction strategy
    pub fn with_extractor(mut self, extractor: Arc<dyn RankExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Fetch the quote page and extract the rank within `deadline`.
    ///
    /// Network failures, non-2xx answers and pages without the pattern all
    /// produce an absent result.
    pub async fn extract_rank(&self, ticker: &Ticker, deadline: Duration) -> RankResult {
        let started = Instant::now();
        match self.try_extract(ticker, deadline).await {
            Ok(Some(rank)) => {
                debug!(
                    %ticker,
                    rank = %rank.label(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Extracted rank"
                );
                RankResult::new(ticker.clone(), Some(rank))
            },
            Ok(None) => {
                debug!(%ticker, extractor = self.extractor.name(), "Rank pattern not found in page");
                RankResult::absent(ticker.clone())
            },
            Err(err) => {
                warn!(%ticker, error = %err, "Rank fetch failed");
                RankResult::absent(ticker.clone())
            },
        }
    }

    async fn try_extract(&self, ticker: &Ticker, deadline: Duration) -> Result<Option<ZacksRank>> {
        let page = self.fetch_page(ticker, deadline).await?;
        Ok(self.extractor.extract(&page))
    }

    async fn fetch_page(&self, ticker: &Ticker, deadline: Duration) -> Result<String> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let url = expand_rank_url(&self.url_template, ticker.as_str());
        let response = self
            .client
            .get(&url)
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| classify(e, deadline))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Status { url, status });
        }

        response.text().await.map_err(|e| classify(e, deadline))
    }
}

fn classify(err: reqwest::Error, deadline: Duration) -> TrackerError {
    if err.is_timeout() {
        TrackerError::Timeout(deadline)
    } else {
        TrackerError::Http(err)
    }
}

#[async_trait]
impl RankSource for ZacksRankSource {
    async fn fetch_rank(&self, ticker: &Ticker) -> RankResult {
        self.extract_rank(ticker, self.timeout).await
    }

    fn name(&self) -> &'static str {
        "zacks"
    }
}
