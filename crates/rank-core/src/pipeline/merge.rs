//! Join rank and market results into ordered rows

use std::collections::HashMap;

use crate::model::{AnalystRating, MarketRecord, RankResult, Row};
use crate::ticker::Ticker;

/// Build one row per input ticker occurrence and sort by Zacks rank.
///
/// Tickers missing from either map get absent fields. The sort is stable:
/// lower ranks first, rows without a rank last, ties in input order.
pub fn merge_and_sort(
    ranks: &HashMap<Ticker, RankResult>,
    market: &HashMap<Ticker, MarketRecord>,
    tickers: &[Ticker],
) -> Vec<Row> {
    let mut rows: Vec<Row> = tickers
        .iter()
        .map(|ticker| merge_row(ticker, ranks.get(ticker), market.get(ticker)))
        .collect();

    rows.sort_by_key(|row| (row.numeric_rank().is_none(), row.numeric_rank()));
    rows
}

/// Combine the two results for one ticker
pub fn merge_row(ticker: &Ticker, rank: Option<&RankResult>, market: Option<&MarketRecord>) -> Row {
    let zacks_rank = rank.and_then(|r| r.rank);
    let analyst_mean = market.and_then(|m| m.analyst_mean);

    Row {
        ticker: ticker.clone(),
        company_name: market.and_then(|m| m.company_name.clone()),
        zacks_rank,
        analyst: analyst_mean.and_then(AnalystRating::from_mean),
        target_price: market.and_then(|m| m.target_price),
        current_price: market.and_then(|m| m.current_price),
        previous_close: market.and_then(|m| m.previous_close),
        percent_change: market.and_then(|m| m.percent_change),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Rating, ZacksRank};

    fn ticker(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn ranked(s: &str, value: u8) -> (Ticker, RankResult) {
        let rating = Rating::from_bucket(value).unwrap();
        (ticker(s), RankResult::new(ticker(s), ZacksRank::new(value, rating)))
    }

    fn unranked(s: &str) -> (Ticker, RankResult) {
        (ticker(s), RankResult::absent(ticker(s)))
    }

    fn order(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.ticker.as_str()).collect()
    }

    #[test]
    fn test_sorts_by_rank_with_absent_last() {
        let ranks: HashMap<_, _> = [
            unranked("MSFT"),
            ranked("TSLA", 4),
            ranked("AAPL", 2),
            ranked("NVDA", 1),
        ]
        .into_iter()
        .collect();
        let tickers = vec![ticker("MSFT"), ticker("TSLA"), ticker("AAPL"), ticker("NVDA")];

        let rows = merge_and_sort(&ranks, &HashMap::new(), &tickers);
        assert_eq!(order(&rows), vec!["NVDA", "AAPL", "TSLA", "MSFT"]);
    }

    #[test]
    fn test_ties_and_absent_keep_input_order() {
        let ranks: HashMap<_, _> = [
            unranked("JNJ"),
            ranked("META", 3),
            unranked("JPM"),
            ranked("AMZN", 3),
        ]
        .into_iter()
        .collect();
        let tickers = vec![ticker("JNJ"), ticker("META"), ticker("JPM"), ticker("AMZN")];

        let rows = merge_and_sort(&ranks, &HashMap::new(), &tickers);
        assert_eq!(order(&rows), vec!["META", "AMZN", "JNJ", "JPM"]);
    }

    #[test]
    fn test_one_row_per_occurrence() {
        let ranks: HashMap<_, _> = [ranked("AAPL", 2)].into_iter().collect();
        let tickers = vec![ticker("AAPL"), ticker("GOOGL"), ticker("AAPL")];

        let rows = merge_and_sort(&ranks, &HashMap::new(), &tickers);
        assert_eq!(rows.len(), 3);
        assert_eq!(order(&rows), vec!["AAPL", "AAPL", "GOOGL"]);
    }

    #[test]
    fn test_missing_entries_become_nulls() {
        let rows = merge_and_sort(&HashMap::new(), &HashMap::new(), &[ticker("FIGR")]);
        let row = &rows[0];
        assert_eq!(row.zacks_rank, None);
        assert_eq!(row.company_name, None);
        assert_eq!(row.analyst, None);
        assert_eq!(row.percent_change, None);
    }

    #[test]
    fn test_market_fields_and_analyst_rating() {
        let mut record = MarketRecord::empty(ticker("AAPL")).with_prices(Some(150.0), Some(100.0));
        record.company_name = Some("Apple Inc.".to_string());
        record.analyst_mean = Some(4.6);
        record.target_price = Some(180.0);
        let market: HashMap<_, _> = [(ticker("AAPL"), record)].into_iter().collect();

        let rows = merge_and_sort(&HashMap::new(), &market, &[ticker("AAPL")]);
        let row = &rows[0];
        assert_eq!(row.company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(row.analyst.map(|a| a.rating), Some(Rating::StrongSell));
        assert_eq!(row.target_price, Some(180.0));
        assert!((row.percent_change.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_and_sort(&HashMap::new(), &HashMap::new(), &[]).is_empty());
    }
}
