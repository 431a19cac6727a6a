//! Command-line interface for rank-tracker

mod render;
mod session;

use std::time::Duration;

use clap::{Parser, ValueEnum};
use rank_core::{ExtractStrategy, FetchOrchestrator, TrackerConfig, Watchlist};
use rank_utils::LogConfig;
use tracing::info;

use crate::render::{OutputFormat, Renderer};
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "rank-tracker")]
#[command(about = "Zacks Rank and analyst consensus for a watchlist", long_about = None)]
struct Args {
    /// Tickers to fetch, e.g. `AAPL MSFT` or `AAPL,MSFT`
    tickers: Vec<String>,

    /// Comma-separated ticker list, appended to positional tickers
    #[arg(short = 't', long = "tickers", id = "ticker_list")]
    ticker_list: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Maximum concurrent rank page fetches
    #[arg(long, default_value_t = 10)]
    concurrency: usize,

    /// Maximum concurrent market data fetches
    #[arg(long, default_value_t = 4)]
    market_concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Cap on rank page requests per minute
    #[arg(long)]
    rate_per_minute: Option<u32>,

    /// How the rank is located in the quote page
    #[arg(long, value_enum, default_value_t = Strategy::Text)]
    strategy: Strategy,

    /// Start an interactive session
    #[arg(short, long)]
    interactive: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Debug-level logs for this tool
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Search the visible page text
    Text,
    /// Read the dedicated rank element
    RankView,
}

impl From<Strategy> for ExtractStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Text => ExtractStrategy::TextPattern,
            Strategy::RankView => ExtractStrategy::RankView,
        }
    }
}

impl Args {
    fn log_config(&self) -> LogConfig {
        let config = LogConfig::default().with_json(self.json_logs);
        if self.verbose { config.verbose() } else { config }
    }

    fn tracker_config(&self) -> rank_core::Result<TrackerConfig> {
        let mut builder = TrackerConfig::builder()
            .request_timeout(Duration::from_secs(self.timeout_secs))
            .rank_concurrency(self.concurrency)
            .market_concurrency(self.market_concurrency)
            .extract_strategy(self.strategy.into());
        if let Some(rate) = self.rate_per_minute {
            builder = builder.scrape_rate_per_minute(rate);
        }
        builder.build()
    }

    /// Positional and `--tickers` input combined, or the default list when neither is given
    fn watchlist(&self) -> Watchlist {
        if self.tickers.is_empty() && self.ticker_list.is_none() {
            return Watchlist::default();
        }
        let input = self
            .tickers
            .iter()
            .map(String::as_str)
            .chain(self.ticker_list.as_deref())
            .collect::<Vec<_>>()
            .join(",");
        Watchlist::parse(&input)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    rank_utils::init_tracing_with(&args.log_config());

    let config = args.tracker_config()?;
    let orchestrator = FetchOrchestrator::from_config(&config)?;
    let renderer = Renderer::new(args.format, !args.no_color);
    let watchlist = args.watchlist();

    info!(
        tickers = watchlist.len(),
        interactive = args.interactive,
        "Starting rank-tracker"
    );

    if args.interactive {
        return Session::new(watchlist, orchestrator, renderer).run().await;
    }

    let output = session::fetch(&orchestrator, &renderer, &watchlist).await?;
    println!("{output}");

    Ok(())
}
