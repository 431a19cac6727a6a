//! Domain types produced by the sources and consumed by merge and formatting

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ticker::Ticker;

/// Five-step rating scale shared by Zacks ranks and analyst consensus.
///
/// The discriminant doubles as the severity bucket: 1 is the most bullish,
/// 5 the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "Strong Buy")]
    StrongBuy = 1,
    #[serde(rename = "Buy")]
    Buy = 2,
    #[serde(rename = "Hold")]
    Hold = 3,
    #[serde(rename = "Sell")]
    Sell = 4,
    #[serde(rename = "Strong Sell")]
    StrongSell = 5,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::StrongBuy,
        Rating::Buy,
        Rating::Hold,
        Rating::Sell,
        Rating::StrongSell,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::StrongBuy => "Strong Buy",
            Rating::Buy => "Buy",
            Rating::Hold => "Hold",
            Rating::Sell => "Sell",
            Rating::StrongSell => "Strong Sell",
        }
    }

    /// Severity bucket, 1 through 5
    pub fn bucket(self) -> u8 {
        self as u8
    }

    pub fn from_bucket(bucket: u8) -> Option<Self> {
        Self::ALL.get(usize::from(bucket).checked_sub(1)?).copied()
    }

    /// Match one of the five fixed phrases, ignoring case and inner whitespace runs
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(&normalized))
    }

    /// Map an analyst consensus mean onto the scale.
    ///
    /// Thresholds are strict: a mean of exactly 1.5 is a Buy, not a Strong Buy.
    pub fn from_mean(mean: f64) -> Option<Self> {
        if !mean.is_finite() {
            return None;
        }
        Some(if mean < 1.5 {
            Rating::StrongBuy
        } else if mean < 2.5 {
            Rating::Buy
        } else if mean < 3.5 {
            Rating::Hold
        } else if mean < 4.5 {
            Rating::Sell
        } else {
            Rating::StrongSell
        })
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scraped Zacks rank: a digit in 1..=5 and its phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZacksRank {
    value: u8,
    rating: Rating,
}

impl ZacksRank {
    /// `None` unless `value` is in 1..=5
    pub fn new(value: u8, rating: Rating) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self { value, rating })
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    /// Display label such as `"2 - Buy"`
    pub fn label(&self) -> String {
        format!("{} - {}", self.value, self.rating)
    }
}

/// Outcome of one rank extraction. `rank` is `None` on any failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankResult {
    pub ticker: Ticker,
    pub rank: Option<ZacksRank>,
}

impl RankResult {
    pub fn new(ticker: Ticker, rank: Option<ZacksRank>) -> Self {
        Self { ticker, rank }
    }

    pub fn absent(ticker: Ticker) -> Self {
        Self { ticker, rank: None }
    }

    pub fn numeric_rank(&self) -> Option<u8> {
        self.rank.map(|r| r.value())
    }

    pub fn rank_label(&self) -> Option<String> {
        self.rank.map(|r| r.label())
    }
}

/// Market data for one ticker. Every field is independently optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub ticker: Ticker,
    pub company_name: Option<String>,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub percent_change: Option<f64>,
    pub analyst_mean: Option<f64>,
    pub target_price: Option<f64>,
}

impl MarketRecord {
    /// Record with every field absent
    pub fn empty(ticker: Ticker) -> Self {
        Self {
            ticker,
            company_name: None,
            current_price: None,
            previous_close: None,
            percent_change: None,
            analyst_mean: None,
            target_price: None,
        }
    }

    /// Set both prices and derive `percent_change` from them
    pub fn with_prices(mut self, current: Option<f64>, previous: Option<f64>) -> Self {
        self.current_price = finite(current);
        self.previous_close = finite(previous);
        self.percent_change = percent_change(self.current_price, self.previous_close);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.current_price.is_none()
            && self.previous_close.is_none()
            && self.analyst_mean.is_none()
            && self.target_price.is_none()
    }
}

/// Day-over-day change in percent, `None` when it cannot be computed
pub fn percent_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let (current, previous) = (finite(current)?, finite(previous)?);
    if previous == 0.0 {
        return None;
    }
    finite(Some((current - previous) / previous * 100.0))
}

/// Drop NaN and infinities
pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Analyst consensus mean with its derived rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalystRating {
    pub mean: f64,
    pub rating: Rating,
}

impl AnalystRating {
    pub fn from_mean(mean: f64) -> Option<Self> {
        Rating::from_mean(mean).map(|rating| Self { mean, rating })
    }

    /// Display label such as `"4.60 - Strong Sell"`
    pub fn label(&self) -> String {
        format!("{:.2} - {}", self.mean, self.rating)
    }
}

/// One merged table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub ticker: Ticker,
    pub company_name: Option<String>,
    pub zacks_rank: Option<ZacksRank>,
    pub analyst: Option<AnalystRating>,
    pub target_price: Option<f64>,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub percent_change: Option<f64>,
}

impl Row {
    pub fn numeric_rank(&self) -> Option<u8> {
        self.zacks_rank.map(|r| r.value())
    }
}

/// Rows from one fetch cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub fetched_at: DateTime<Utc>,
    pub rows: Vec<Row>,
}

impl BatchReport {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            fetched_at: Utc::now(),
            rows,
        }
    }

    /// Rows that carry a Zacks rank
    pub fn ranked(&self) -> usize {
        self.rows.iter().filter(|r| r.zacks_rank.is_some()).count()
    }

    /// Rows that carry a current price
    pub fn priced(&self) -> usize {
        self.rows.iter().filter(|r| r.current_price.is_some()).count()
    }
}
