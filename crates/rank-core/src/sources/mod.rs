//! Upstream sources that resolve a ticker to a typed result.
//!
//! Both sources swallow their own failures: callers always get a value back,
//! with absent fields standing in for anything that could not be fetched.

pub mod extract;
pub mod yahoo;
pub mod zacks;

use async_trait::async_trait;

use crate::model::{MarketRecord, RankResult};
use crate::ticker::Ticker;

pub use extract::{RankExtractor, RankViewExtractor, TextPatternExtractor, extractor_for};
pub use yahoo::{ChartHistory, CloseHistory, YahooMarketData};
pub use zacks::ZacksRankSource;

/// Resolves a ticker to its scraped rank
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankSource: Send + Sync {
    /// Never fails; an unreachable page or a missing pattern yields an absent rank
    async fn fetch_rank(&self, ticker: &Ticker) -> RankResult;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Resolves a ticker to its market data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Never fails; unavailable fields are `None`
    async fn fetch_market_data(&self, ticker: &Ticker) -> MarketRecord;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
