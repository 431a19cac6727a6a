//! Configuration for the fetch pipeline

use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quote page template, `{ticker}` is substituted per request
pub const DEFAULT_RANK_URL_TEMPLATE: &str = "https://www.zacks.com/stock/quote/{ticker}";

/// Base URL of the Yahoo quoteSummary endpoint
pub const DEFAULT_QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Sets the Yahoo session cookie; the body is ignored
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

/// Returns the crumb that authorizes quoteSummary requests
pub const DEFAULT_CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";

/// Browser user agent; the quote page rejects obvious non-browser clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How the rank is located inside the fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractStrategy {
    /// Scan the visible text for `Zacks Rank #N - Word`
    #[default]
    TextPattern,
    /// Read the `rank_view` paragraph
    RankView,
}

/// Configuration for the fetch pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Rank page URL template containing `{ticker}`
    pub rank_url_template: String,

    /// quoteSummary endpoint, the ticker is appended as a path segment
    pub quote_summary_url: String,

    /// Yahoo cookie endpoint hit before asking for a crumb
    pub cookie_url: String,

    /// Yahoo crumb endpoint
    pub crumb_url: String,

    /// User agent sent to both upstreams
    pub user_agent: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Simultaneous rank extractions
    pub rank_concurrency: usize,

    /// Simultaneous market data fetches, 1 keeps them sequential
    pub market_concurrency: usize,

    /// Optional cap on rank page requests per minute
    pub scrape_rate_per_minute: Option<u32>,

    /// Rank extraction strategy
    pub extract_strategy: ExtractStrategy,

    /// Days of close history used when the snapshot lacks prices
    pub history_days: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            rank_url_template: DEFAULT_RANK_URL_TEMPLATE.to_string(),
            quote_summary_url: DEFAULT_QUOTE_SUMMARY_URL.to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            crumb_url: DEFAULT_CRUMB_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            rank_concurrency: 10,
            market_concurrency: 4,
            scrape_rate_per_minute: None,
            extract_strategy: ExtractStrategy::TextPattern,
            history_days: 10,
        }
    }
}

impl TrackerConfig {
    /// Create a new configuration builder
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.rank_url_template.contains("{ticker}") {
            return Err(TrackerError::Config(
                "rank_url_template must contain {ticker}".to_string(),
            ));
        }

        url::Url::parse(&self.rank_url("AAPL")).map_err(|e| {
            TrackerError::Config(format!("rank_url_template is not a valid URL: {e}"))
        })?;

        for (name, value) in [
            ("quote_summary_url", &self.quote_summary_url),
            ("cookie_url", &self.cookie_url),
            ("crumb_url", &self.crumb_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| TrackerError::Config(format!("{name} is not a valid URL: {e}")))?;
        }

        if self.rank_concurrency == 0 || self.market_concurrency == 0 {
            return Err(TrackerError::Config(
                "concurrency limits must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(TrackerError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.scrape_rate_per_minute == Some(0) {
            return Err(TrackerError::Config(
                "scrape_rate_per_minute must be greater than 0 when set".to_string(),
            ));
        }

        if self.history_days < 2 {
            return Err(TrackerError::Config(
                "history_days must cover at least two sessions".to_string(),
            ));
        }

        Ok(())
    }

    /// Rank page URL for a ticker
    pub fn rank_url(&self, ticker: &str) -> String {
        expand_rank_url(&self.rank_url_template, ticker)
    }
}

/// Substitute `{ticker}` into a rank page template
pub fn expand_rank_url(template: &str, ticker: &str) -> String {
    template.replace("{ticker}", ticker)
}

/// Builder for TrackerConfig
#[derive(Debug, Default)]
pub struct TrackerConfigBuilder {
    rank_url_template: Option<String>,
    quote_summary_url: Option<String>,
    cookie_url: Option<String>,
    crumb_url: Option<String>,
    user_agent: Option<String>,
    request_timeout: Option<Duration>,
    rank_concurrency: Option<usize>,
    market_concurrency: Option<usize>,
    scrape_rate_per_minute: Option<u32>,
    extract_strategy: Option<ExtractStrategy>,
    history_days: Option<u32>,
}

impl TrackerConfigBuilder {
    /// Set the rank page URL template
    pub fn rank_url_template(mut self, template: impl Into<String>) -> Self {
        self.rank_url_template = Some(template.into());
        self
    }

    /// Set the quoteSummary endpoint
    pub fn quote_summary_url(mut self, url: impl Into<String>) -> Self {
        self.quote_summary_url = Some(url.into());
        self
    }

    /// Set the Yahoo cookie endpoint
    pub fn cookie_url(mut self, url: impl Into<String>) -> Self {
        self.cookie_url = Some(url.into());
        self
    }

    /// Set the Yahoo crumb endpoint
    pub fn crumb_url(mut self, url: impl Into<String>) -> Self {
        self.crumb_url = Some(url.into());
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the rank extraction worker bound
    pub fn rank_concurrency(mut self, limit: usize) -> Self {
        self.rank_concurrency = Some(limit);
        self
    }

    /// Set the market data worker bound
    pub fn market_concurrency(mut self, limit: usize) -> Self {
        self.market_concurrency = Some(limit);
        self
    }

    /// Cap rank page requests per minute
    pub fn scrape_rate_per_minute(mut self, rate: u32) -> Self {
        self.scrape_rate_per_minute = Some(rate);
        self
    }

    /// Set the rank extraction strategy
    pub fn extract_strategy(mut self, strategy: ExtractStrategy) -> Self {
        self.extract_strategy = Some(strategy);
        self
    }

    /// Set the close history window
    pub fn history_days(mut self, days: u32) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<TrackerConfig> {
        let defaults = TrackerConfig::default();

        let config = TrackerConfig {
            rank_url_template: self.rank_url_template.unwrap_or(defaults.rank_url_template),
            quote_summary_url: self.quote_summary_url.unwrap_or(defaults.quote_summary_url),
            cookie_url: self.cookie_url.unwrap_or(defaults.cookie_url),
            crumb_url: self.crumb_url.unwrap_or(defaults.crumb_url),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            rank_concurrency: self.rank_concurrency.unwrap_or(defaults.rank_concurrency),
            market_concurrency: self.market_concurrency.unwrap_or(defaults.market_concurrency),
            scrape_rate_per_minute: self.scrape_rate_per_minute,
            extract_strategy: self.extract_strategy.unwrap_or(defaults.extract_strategy),
            history_days: self.history_days.unwrap_or(defaults.history_days),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.rank_concurrency, 10);
        assert_eq!(config.extract_strategy, ExtractStrategy::TextPattern);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = TrackerConfig::builder()
            .rank_concurrency(3)
            .market_concurrency(1)
            .request_timeout(Duration::from_secs(2))
            .scrape_rate_per_minute(30)
            .extract_strategy(ExtractStrategy::RankView)
            .build()
            .unwrap();

        assert_eq!(config.rank_concurrency, 3);
        assert_eq!(config.market_concurrency, 1);
        assert_eq!(config.scrape_rate_per_minute, Some(30));
        assert_eq!(config.extract_strategy, ExtractStrategy::RankView);
    }

    #[test]
    fn test_rank_url() {
        let config = TrackerConfig::default();
        assert_eq!(
            config.rank_url("AAPL"),
            "https://www.zacks.com/stock/quote/AAPL"
        );
    }

    #[test]
    fn test_expand_rank_url_replaces_every_placeholder() {
        assert_eq!(
            expand_rank_url("http://127.0.0.1:1/{ticker}/quote?s={ticker}", "BRK.B"),
            "http://127.0.0.1:1/BRK.B/quote?s=BRK.B"
        );
    }

    #[test]
    fn test_validation_rejects_template_without_placeholder() {
        let result = TrackerConfig::builder()
            .rank_url_template("https://example.com/quote")
            .build();
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        assert!(TrackerConfig::builder().rank_concurrency(0).build().is_err());
        assert!(TrackerConfig::builder().market_concurrency(0).build().is_err());
        assert!(TrackerConfig::builder().scrape_rate_per_minute(0).build().is_err());
        assert!(TrackerConfig::builder()
            .request_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let result = TrackerConfig::builder()
            .rank_url_template("not a url/{ticker}")
            .build();
        assert!(result.is_err());

        let result = TrackerConfig::builder().crumb_url("getcrumb").build();
        assert!(matches!(result, Err(TrackerError::Config(msg)) if msg.contains("crumb_url")));
    }

    #[test]
    fn test_yahoo_endpoints_are_configurable() {
        let config = TrackerConfig::builder()
            .cookie_url("http://127.0.0.1:8080/cookie")
            .crumb_url("http://127.0.0.1:8080/crumb")
            .build()
            .unwrap();
        assert_eq!(config.cookie_url, "http://127.0.0.1:8080/cookie");
        assert_eq!(config.crumb_url, "http://127.0.0.1:8080/crumb");
        assert_eq!(TrackerConfig::default().crumb_url, DEFAULT_CRUMB_URL);
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&ExtractStrategy::RankView).unwrap();
        assert_eq!(json, "\"rank-view\"");
    }
}
