//! Ticker symbols and the watchlist that carries them between fetches

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Watchlist used when the user has not supplied one
pub const DEFAULT_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "TSLA", "FIGR", "AMZN", "GOOGL", "META", "JNJ", "JPM",
];

/// A trimmed, uppercased stock symbol.
///
/// No further validation happens: whatever the user typed is passed to the
/// upstream sources, which answer with absent data for unknown symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Normalize raw input into a ticker, `None` when nothing is left after trimming
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s).ok_or_else(|| TrackerError::InvalidTicker(s.to_string()))
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Split comma-delimited input into tickers, dropping empty entries.
///
/// Order and duplicates are preserved.
pub fn parse_tickers(input: &str) -> Vec<Ticker> {
    input.split(',').filter_map(Ticker::new).collect()
}

/// Ordered list of tickers owned by the front end between fetches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    tickers: Vec<Ticker>,
}

impl Watchlist {
    pub fn new(tickers: Vec<Ticker>) -> Self {
        Self { tickers }
    }

    /// Parse comma-delimited input such as `"AAPL, msft , "`
    pub fn parse(input: &str) -> Self {
        Self::new(parse_tickers(input))
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Append every ticker found in `input`
    pub fn add(&mut self, input: &str) -> usize {
        let added = parse_tickers(input);
        let count = added.len();
        self.tickers.extend(added);
        count
    }

    /// Remove every occurrence of the tickers found in `input`
    pub fn remove(&mut self, input: &str) -> usize {
        let targets = parse_tickers(input);
        let before = self.tickers.len();
        self.tickers.retain(|t| !targets.contains(t));
        before - self.tickers.len()
    }

    /// Replace the whole list
    pub fn replace(&mut self, input: &str) {
        self.tickers = parse_tickers(input);
    }

    /// Comma-joined form, suitable for feeding back into [`Watchlist::parse`]
    pub fn to_input_string(&self) -> String {
        self.tickers
            .iter()
            .map(Ticker::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::new(DEFAULT_TICKERS.iter().copied().filter_map(Ticker::new).collect())
    }
}

impl FromIterator<Ticker> for Watchlist {
    fn from_iter<I: IntoIterator<Item = Ticker>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
