//! Presentation formatting: display strings and style tags per cell.
//!
//! Everything here is pure. Renderers decide what a style looks like; this
//! module only decides which style a cell gets.

use serde::{Deserialize, Serialize};

use crate::model::{AnalystRating, Rating, Row, finite};

/// Placeholder for absent prices and percentages
pub const MISSING: &str = "-";

/// Placeholder for absent ratings
pub const NOT_AVAILABLE: &str = "N/A";

/// Column headers in display order
pub const COLUMNS: [&str; 7] = [
    "Ticker",
    "Company",
    "Zacks Rank",
    "Analyst Rating",
    "Target Price",
    "Current Price",
    "Today % Change",
];

/// Emphasis applied to a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStyle {
    /// Rating bucket, 1 (strong buy) through 5 (strong sell)
    Severity(Rating),
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledCell {
    pub text: String,
    pub style: Option<CellStyle>,
}

impl StyledCell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: Option<CellStyle>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A row ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRow {
    pub ticker: StyledCell,
    pub company: StyledCell,
    pub zacks_rank: StyledCell,
    pub analyst_rating: StyledCell,
    pub target_price: StyledCell,
    pub current_price: StyledCell,
    pub percent_change: StyledCell,
}

impl StyledRow {
    /// Cells in [`COLUMNS`] order
    pub fn cells(&self) -> [&StyledCell; 7] {
        [
            &self.ticker,
            &self.company,
            &self.zacks_rank,
            &self.analyst_rating,
            &self.target_price,
            &self.current_price,
            &self.percent_change,
        ]
    }
}

pub fn format_row(row: &Row) -> StyledRow {
    let zacks_rank = match row.zacks_rank {
        Some(rank) => StyledCell::styled(rank.label(), severity_for_label(&rank.label())),
        None => StyledCell::plain(NOT_AVAILABLE),
    };

    let analyst_rating = match row.analyst.filter(|a| a.mean.is_finite()) {
        Some(analyst) => StyledCell::styled(analyst.label(), severity_for_mean(Some(analyst.mean))),
        None => StyledCell::plain(NOT_AVAILABLE),
    };

    StyledRow {
        ticker: StyledCell::plain(row.ticker.as_str()),
        company: StyledCell::plain(row.company_name.as_deref().unwrap_or(MISSING)),
        zacks_rank,
        analyst_rating,
        target_price: StyledCell::plain(format_price(row.target_price)),
        current_price: StyledCell::plain(format_price(row.current_price)),
        percent_change: StyledCell::styled(
            format_percent(row.percent_change),
            change_style(row.percent_change),
        ),
    }
}

pub fn format_rows(rows: &[Row]) -> Vec<StyledRow> {
    rows.iter().map(format_row).collect()
}

/// Analyst label for a consensus mean, `"N/A"` when absent
pub fn analyst_label(mean: Option<f64>) -> String {
    finite(mean)
        .and_then(AnalystRating::from_mean)
        .map_or_else(|| NOT_AVAILABLE.to_string(), |a| a.label())
}

/// Bucket keyed by the leading digit of a label such as `"4 - Sell"`
pub fn severity_for_label(label: &str) -> Option<CellStyle> {
    let digit = label.trim_start().chars().next()?.to_digit(10)?;
    Rating::from_bucket(u8::try_from(digit).ok()?).map(CellStyle::Severity)
}

/// Bucket for a consensus mean, same thresholds as the analyst label
pub fn severity_for_mean(mean: Option<f64>) -> Option<CellStyle> {
    finite(mean)
        .and_then(Rating::from_mean)
        .map(CellStyle::Severity)
}

/// Style for a percent change: by sign, none for zero or absent
pub fn change_style(change: Option<f64>) -> Option<CellStyle> {
    match finite(change) {
        Some(v) if v > 0.0 => Some(CellStyle::Positive),
        Some(v) if v < 0.0 => Some(CellStyle::Negative),
        _ => None,
    }
}

/// `"$150.00"`, or `"-"` when absent
pub fn format_price(price: Option<f64>) -> String {
    finite(price).map_or_else(|| MISSING.to_string(), |p| format!("${p:.2}"))
}

/// Sign-prefixed percentage such as `"+1.23%"`, or `"-"` when absent
pub fn format_percent(change: Option<f64>) -> String {
    match finite(change) {
        // Avoid "-0.00%" for negative zero
        Some(v) if v == 0.0 => "+0.00%".to_string(),
        Some(v) => format!("{v:+.2}%"),
        None => MISSING.to_string(),
    }
}
