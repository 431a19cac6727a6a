//! Bounded fan-out over tickers for both sources

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::merge::merge_and_sort;
use crate::config::TrackerConfig;
use crate::error::Result;
use crate::model::{BatchReport, MarketRecord, RankResult};
use crate::sources::{MarketDataSource, RankSource, YahooMarketData, ZacksRankSource};
use crate::ticker::{Ticker, Watchlist};

/// Runs the fetch-and-merge pipeline for a watchlist
#[derive(Clone)]
pub struct FetchOrchestrator {
    rank_source: Arc<dyn RankSource>,
    market_source: Arc<dyn MarketDataSource>,
    rank_concurrency: usize,
    market_concurrency: usize,
}

impl FetchOrchestrator {
    pub fn new(
        rank_source: Arc<dyn RankSource>,
        market_source: Arc<dyn MarketDataSource>,
        rank_concurrency: usize,
        market_concurrency: usize,
    ) -> Self {
        Self {
            rank_source,
            market_source,
            rank_concurrency: rank_concurrency.max(1),
            market_concurrency: market_concurrency.max(1),
        }
    }

    /// Wire the Zacks and Yahoo sources from configuration
    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            Arc::new(ZacksRankSource::new(config)?),
            Arc::new(YahooMarketData::new(config)?),
            config.rank_concurrency,
            config.market_concurrency,
        ))
    }

    /// Extract ranks for every ticker concurrently, keyed by ticker
    pub async fn orchestrate(&self, tickers: &[Ticker]) -> HashMap<Ticker, RankResult> {
        let source = Arc::clone(&self.rank_source);
        fan_out(tickers, self.rank_concurrency, RankResult::absent, move |ticker| {
            let source = Arc::clone(&source);
            async move { source.fetch_rank(&ticker).await }
        })
        .await
    }

    /// Fetch market data for every ticker, keyed by ticker
    pub async fn collect_market_data(&self, tickers: &[Ticker]) -> HashMap<Ticker, MarketRecord> {
        let source = Arc::clone(&self.market_source);
        fan_out(tickers, self.market_concurrency, MarketRecord::empty, move |ticker| {
            let source = Arc::clone(&source);
            async move { source.fetch_market_data(&ticker).await }
        })
        .await
    }

    /// Full cycle: ranks, then market data, then merge and sort
    pub async fn run(&self, watchlist: &Watchlist) -> BatchReport {
        let started = Instant::now();
        let tickers = watchlist.tickers();
        info!(
            tickers = tickers.len(),
            rank_source = self.rank_source.name(),
            market_source = self.market_source.name(),
            "Starting fetch"
        );

        let ranks = self.orchestrate(tickers).await;
        let market = self.collect_market_data(tickers).await;
        let report = BatchReport::new(merge_and_sort(&ranks, &market, tickers));

        info!(
            rows = report.rows.len(),
            ranked = report.ranked(),
            priced = report.priced(),
            elapsed_ms = started.elapsed().as_millis(),
            "Fetch complete"
        );
        report
    }
}

/// Spawn one task per unique ticker, at most `limit` running at once, and
/// join them all.
///
/// Each task hands back its own value and the map is built here after the
/// join. A task that panics yields `fallback` for its ticker only.
async fn fan_out<T, F, Fut>(
    tickers: &[Ticker],
    limit: usize,
    fallback: fn(Ticker) -> T,
    work: F,
) -> HashMap<Ticker, T>
where
    T: Send + 'static,
    F: Fn(Ticker) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut seen = HashSet::new();
    let unique: Vec<Ticker> = tickers
        .iter()
        .filter(|t| seen.insert(*t))
        .cloned()
        .collect();

    let handles = unique.iter().map(|ticker| {
        let semaphore = Arc::clone(&semaphore);
        let task = work(ticker.clone());
        tokio::spawn(async move {
            // The semaphore is never closed, so acquiring only waits
            let _permit = semaphore.acquire_owned().await;
            task.await
        })
    });
    let outcomes = join_all(handles).await;

    unique
        .into_iter()
        .zip(outcomes)
        .map(|(ticker, outcome)| {
            let value = outcome.unwrap_or_else(|err| {
                warn!(%ticker, error = %err, "Fetch task failed");
                fallback(ticker.clone())
            });
            (ticker, value)
        })
        .collect()
}
