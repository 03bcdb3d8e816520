//! Plain-text rendering of records and reports for chat replies

use crate::ai::Narrative;
use crate::format::{format_decimal, format_money, format_percent, format_price};
use crate::report::{ComparisonReport, ReportError};
use crate::stock::{ClosePoint, StockDataError, StockRecord};

/// Telegram rejects messages longer than this many characters
pub const MESSAGE_LIMIT: usize = 4096;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Key metrics for one stock
pub fn format_stock_summary(record: &StockRecord) -> String {
    let cur = record.currency_symbol.as_str();

    let trend_emoji = match record.price_1y_change_pct {
        Some(change) if change > 0.0 => "📈",
        Some(change) if change < 0.0 => "📉",
        _ => "➡️",
    };

    format!(
        "{} {} ({})\nSector: {}\nPrice: {}\nMarket Cap: {}\nP/E (TTM / Fwd): {} / {}\nP/B: {}\nDividend Yield: {}\nBeta: {}\nRevenue: {}\nGross Profit: {}\n1Y Change: {}\n5Y Change: {}",
        trend_emoji,
        record.long_name,
        record.symbol,
        record.sector.as_deref().unwrap_or("N/A"),
        format_price(record.price, cur),
        format_money(record.market_cap, cur),
        format_decimal(record.pe_ratio_trailing),
        format_decimal(record.pe_ratio_forward),
        format_decimal(record.pb_ratio),
        record
            .dividend_yield
            .map_or_else(|| "N/A".to_string(), |y| format!("{:.2}%", y * 100.0)),
        format_decimal(record.beta),
        format_money(record.annual_revenue, cur),
        format_money(record.gross_profit, cur),
        format_percent(record.price_1y_change_pct),
        format_percent(record.price_5y_change_pct),
    )
}

/// One glyph per close, scaled between the window's low and high
pub fn sparkline(closes: &[ClosePoint]) -> String {
    let (low, high) = closes.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.close), hi.max(p.close))
    });
    let span = high - low;
    let top = (SPARK_LEVELS.len() - 1) as f64;

    closes
        .iter()
        .map(|p| {
            if span <= 0.0 {
                SPARK_LEVELS[SPARK_LEVELS.len() / 2]
            } else {
                SPARK_LEVELS[(((p.close - low) / span) * top).round() as usize]
            }
        })
        .collect()
}

/// Sparkline plus the dates and range it covers
pub fn format_price_chart(record: &StockRecord) -> String {
    let (Some(first), Some(last)) = (record.recent_closes.first(), record.recent_closes.last()) else {
        return format!("{}: no recent closes", record.symbol);
    };

    let cur = record.currency_symbol.as_str();
    let low = record.recent_closes.iter().map(|p| p.close).fold(f64::INFINITY, f64::min);
    let high = record.recent_closes.iter().map(|p| p.close).fold(f64::NEG_INFINITY, f64::max);

    format!(
        "{} last {} closes ({} → {})\n{}\nLow {}  High {}  Last {}",
        record.symbol,
        record.recent_closes.len(),
        first.date.format("%Y-%m-%d"),
        last.date.format("%Y-%m-%d"),
        sparkline(&record.recent_closes),
        format_price(Some(low), cur),
        format_price(Some(high), cur),
        format_price(Some(last.close), cur),
    )
}

/// All reply messages for a finished comparison, in send order
pub fn render_report(report: &ComparisonReport) -> Vec<String> {
    let mut messages = vec![
        format!(
            "{}\n\n{}",
            format_stock_summary(&report.first),
            format_stock_summary(&report.second)
        ),
        format!(
            "📉 Price charts\n\n{}\n\n{}",
            format_price_chart(&report.first),
            format_price_chart(&report.second)
        ),
    ];

    let narrative = match &report.narrative {
        Narrative::Completion(text) => format!("🧠 Investment analysis\n\n{text}"),
        rejected @ Narrative::Rejected { .. } => {
            format!("⚠️ The analysis service returned an error instead of a report:\n\n{rejected}")
        }
    };
    messages.extend(split_message(&narrative, MESSAGE_LIMIT));
    messages
}

/// Split on line boundaries so every chunk fits in one message; lines longer
/// than the limit are cut at character boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Format error messages for user display
pub fn format_stock_error(error: &StockDataError, symbol: Option<&str>) -> String {
    match error {
        StockDataError::InvalidSymbol(_) | StockDataError::SymbolNotFound(_) => {
            if let Some(symbol) = symbol {
                let upper_symbol = symbol.trim().to_uppercase();
                let suggestion = match upper_symbol.as_str() {
                    "APPL" => "\n💡 Did you mean AAPL (Apple Inc.)?",
                    "GOOG" => "\n💡 Try GOOGL (Alphabet Inc.)",
                    _ => "\n💡 Make sure you're using the correct ticker symbol",
                };
                format!("❌ Stock symbol not found: \"{upper_symbol}\"\nPlease check the symbol and try again.{suggestion}")
            } else {
                "❌ Invalid stock symbol\nPlease provide a valid stock symbol.".to_string()
            }
        }
        StockDataError::InsufficientHistory { symbol, wanted, got } => {
            format!("📅 Not enough price history for {symbol}: need {wanted} trading days, found {got}.")
        }
        StockDataError::RateLimitExceeded => {
            "⚠️ Rate limit exceeded\nPlease wait a moment before trying again.".to_string()
        }
        StockDataError::NetworkError(_) => {
            "🌐 Network error\nPlease check your connection and try again.".to_string()
        }
        StockDataError::ProviderError(message) => {
            format!("🔧 The data provider refused the request:\n{message}")
        }
        StockDataError::InvalidApiKey(_) | StockDataError::ConfigError(_) => {
            "⚙️ Configuration error\nPlease contact the administrator.".to_string()
        }
        _ => {
            "🔧 Service temporarily unavailable\nPlease try again later.".to_string()
        }
    }
}

pub fn format_report_error(error: &ReportError) -> String {
    match error {
        ReportError::Fetch { first, second, source } => {
            let detail = match source {
                StockDataError::SymbolNotFound(_) | StockDataError::InvalidSymbol(_) => {
                    "💡 Check that both ticker symbols are valid. Non-US listings need an exchange suffix, e.g. RELIANCE.BSE.".to_string()
                }
                other => format_stock_error(other, None),
            };
            format!("❌ Failed to generate report: could not fetch data for {first} or {second}.\n{detail}")
        }
        ReportError::Narrative(e) => {
            format!("❌ Failed to generate report: the analysis service could not be reached.\n{e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::provider::{CompanyOverview, StockQuote};
    use chrono::NaiveDate;

    fn closes(values: &[f64]) -> Vec<ClosePoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &close)| ClosePoint {
                date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap() + chrono::Duration::days(i as i64),
                close,
            })
            .collect()
    }

    fn record(symbol: &str, values: &[f64]) -> StockRecord {
        let overview = CompanyOverview {
            symbol: symbol.to_string(),
            name: Some(format!("{symbol} Inc.")),
            currency: Some("USD".to_string()),
            market_cap: Some(2_500_000_000_000.0),
            ..Default::default()
        };
        let quote = StockQuote {
            symbol: symbol.to_string(),
            price: 150.25,
        };
        let points = closes(values);
        StockRecord::from_parts(symbol, overview, Some(quote), &points, points.clone())
    }

    #[test]
    fn test_stock_summary() {
        let summary = format_stock_summary(&record("AAPL", &[1.0, 2.0]));
        assert!(summary.contains("AAPL Inc. (AAPL)"));
        assert!(summary.contains("Price: $150.25"));
        assert!(summary.contains("Market Cap: $2.50T"));
        assert!(summary.contains("Sector: N/A"));
        assert!(summary.contains("5Y Change: N/A"));
    }

    #[test]
    fn test_sparkline_spans_levels() {
        let line = sparkline(&closes(&[1.0, 5.0, 8.0]));
        assert_eq!(line, "▁▅█");
        assert_eq!(sparkline(&closes(&[3.0, 3.0])), "▅▅");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_price_chart() {
        let chart = format_price_chart(&record("MSFT", &[10.0, 12.5, 11.0]));
        assert!(chart.contains("MSFT last 3 closes (2024-06-03 → 2024-06-05)"));
        assert!(chart.contains("Low $10.00  High $12.50  Last $11.00"));
    }

    #[test]
    fn test_split_message_respects_limit_and_lines() {
        let text = "aaaa\nbbbb\ncccc\n";
        assert_eq!(split_message(text, 10), vec!["aaaa\nbbbb\n", "cccc\n"]);
        assert_eq!(split_message("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(split_message("", 10).is_empty());

        let long = "₹".repeat(5000);
        let chunks = split_message(&long, MESSAGE_LIMIT);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= MESSAGE_LIMIT));
    }

    #[test]
    fn test_render_report_marks_rejection() {
        let report = ComparisonReport {
            first: record("AAPL", &[1.0, 2.0]),
            second: record("MSFT", &[2.0, 1.0]),
            narrative: Narrative::Rejected {
                status: 401,
                body: "invalid key".to_string(),
            },
        };

        let messages = render_report(&report);
        assert_eq!(messages.len(), 3);
        assert!(messages[2].starts_with("⚠️"));
        assert!(messages[2].contains("401 - invalid key"));
    }

    #[test]
    fn test_format_error_messages() {
        let symbol_error = StockDataError::SymbolNotFound("Invalid symbol".to_string());
        let rate_limit_error = StockDataError::RateLimitExceeded;
        let network_error = StockDataError::NetworkError("Connection failed".to_string());

        assert!(format_stock_error(&symbol_error, Some("appl")).contains("Did you mean AAPL"));
        assert!(format_stock_error(&rate_limit_error, None).contains("⚠️ Rate limit exceeded"));
        assert!(format_stock_error(&network_error, None).contains("🌐 Network error"));
    }

    #[test]
    fn test_provider_refusal_is_shown_verbatim() {
        let error = StockDataError::ProviderError(
            "The outputsize=full parameter value is a premium feature".to_string(),
        );
        let message = format_stock_error(&error, Some("AAPL"));
        assert!(message.contains("premium feature"));
        assert!(!message.contains("Rate limit"));
    }

    #[test]
    fn test_report_error_names_both_tickers() {
        let error = ReportError::Fetch {
            first: "AAPL".to_string(),
            second: "NOTAREALTICKER".to_string(),
            source: StockDataError::SymbolNotFound("NOTAREALTICKER".to_string()),
        };
        let message = format_report_error(&error);
        assert!(message.contains("AAPL or NOTAREALTICKER"));
        assert!(message.contains("Check that both ticker symbols"));
    }
}
