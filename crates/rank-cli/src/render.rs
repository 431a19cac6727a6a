//! Terminal and JSON rendering of a fetch report

use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use rank_core::format::COLUMNS;
use rank_core::{BatchReport, CellStyle, Rating, StyledCell, format_rows};

/// How a report is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored table
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

pub struct Renderer {
    format: OutputFormat,
    color: bool,
}

impl Renderer {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    pub fn render(&self, report: &BatchReport) -> anyhow::Result<String> {
        match self.format {
            OutputFormat::Table => Ok(format!("{}\n{}", self.table(report), summary(report))),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        }
    }

    fn table(&self, report: &BatchReport) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(COLUMNS.iter().map(|c| Cell::new(c).add_attribute(Attribute::Bold)));

        if !self.color {
            table.force_no_tty();
        }

        for row in format_rows(&report.rows) {
            table.add_row(row.cells().into_iter().map(|c| self.cell(c)));
        }
        table
    }

    fn cell(&self, cell: &StyledCell) -> Cell {
        let rendered = Cell::new(&cell.text);
        match cell.style.filter(|_| self.color) {
            Some(style) => rendered.fg(color_for(style)),
            None => rendered,
        }
    }
}

/// Terminal color for a style tag
pub fn color_for(style: CellStyle) -> Color {
    match style {
        CellStyle::Severity(Rating::StrongBuy) => Color::DarkGreen,
        CellStyle::Severity(Rating::Buy) => Color::Green,
        CellStyle::Severity(Rating::Hold) => Color::Yellow,
        CellStyle::Severity(Rating::Sell) => Color::DarkYellow,
        CellStyle::Severity(Rating::StrongSell) => Color::Red,
        CellStyle::Positive => Color::Green,
        CellStyle::Negative => Color::Red,
    }
}

fn summary(report: &BatchReport) -> String {
    format!(
        "{} tickers, {} ranked, {} priced (fetched {})",
        report.rows.len(),
        report.ranked(),
        report.priced(),
        report.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rank_core::{AnalystRating, Row, Ticker, ZacksRank};

    fn report() -> BatchReport {
        BatchReport::new(vec![
            Row {
                ticker: Ticker::new("AAPL").unwrap(),
                company_name: Some("Apple Inc.".to_string()),
                zacks_rank: ZacksRank::new(2, Rating::Buy),
                analyst: AnalystRating::from_mean(1.9),
                target_price: None,
                current_price: Some(150.0),
                previous_close: Some(100.0),
                percent_change: Some(50.0),
            },
            Row {
                ticker: Ticker::new("MSFT").unwrap(),
                company_name: None,
                zacks_rank: None,
                analyst: None,
                target_price: None,
                current_price: None,
                previous_close: None,
                percent_change: None,
            },
        ])
    }

    #[test]
    fn test_table_contains_formatted_cells() {
        let output = Renderer::new(OutputFormat::Table, false)
            .render(&report())
            .unwrap();
        for expected in ["Zacks Rank", "AAPL", "2 - Buy", "1.90 - Buy", "$150.00", "+50.00%", "MSFT", "N/A"] {
            assert!(output.contains(expected), "missing {expected} in\n{output}");
        }
        assert!(output.contains("2 tickers, 1 ranked, 1 priced"));
        assert!(!output.contains('\u{1b}'), "no ANSI escapes without color");
    }

    #[test]
    fn test_json_output() {
        let output = Renderer::new(OutputFormat::Json, true)
            .render(&report())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["rows"][0]["ticker"], "AAPL");
        assert_eq!(value["rows"][0]["zacks_rank"]["value"], 2);
        assert!(value["rows"][1]["zacks_rank"].is_null());
    }

    #[test]
    fn test_color_mapping() {
        assert_eq!(color_for(CellStyle::Severity(Rating::StrongSell)), Color::Red);
        assert_eq!(color_for(CellStyle::Positive), Color::Green);
        assert_eq!(color_for(CellStyle::Negative), Color::Red);
    }
}
