//! Zacks rank and analyst consensus tracker
//!
//! This crate fetches per-ticker rating signals from two upstreams and turns
//! them into a sorted, styled table:
//!
//! - Zacks Rank scraped from each ticker's quote page
//! - Company name, prices and analyst consensus from Yahoo Finance
//!
//! # Architecture
//!
//! Both upstreams sit behind traits (`RankSource`, `MarketDataSource`) whose
//! implementations never fail: anything that cannot be fetched comes back as an
//! absent field. `FetchOrchestrator` fans out over the watchlist with a bounded
//! number of tasks, `merge_and_sort` joins the results by ticker, and
//! `format_row` turns each row into display strings with style tags.
//!
//! # Example
//!
//! ```rust,ignore
//! use rank_core::{FetchOrchestrator, TrackerConfig, Watchlist, format_rows};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TrackerConfig::builder().rank_concurrency(5).build()?;
//!     let orchestrator = FetchOrchestrator::from_config(&config)?;
//!
//!     let report = orchestrator.run(&Watchlist::parse("AAPL, msft")).await;
//!     for row in format_rows(&report.rows) {
//!         println!("{} {}", row.ticker.text, row.zacks_rank.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod pipeline;
pub mod sources;
pub mod ticker;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use config::{ExtractStrategy, TrackerConfig};
pub use error::{Result, TrackerError};
pub use format::{CellStyle, StyledCell, StyledRow, format_row, format_rows};
pub use model::{AnalystRating, BatchReport, MarketRecord, RankResult, Rating, Row, ZacksRank};
pub use pipeline::{FetchOrchestrator, merge_and_sort};
pub use sources::{CloseHistory, MarketDataSource, RankSource, YahooMarketData, ZacksRankSource};
pub use ticker::{Ticker, Watchlist};
