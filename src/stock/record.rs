use chrono::{Duration, Months};
use serde::{Deserialize, Serialize};

use super::provider::{ClosePoint, CompanyOverview, StockQuote};

pub const NO_SUMMARY: &str = "No summary available.";

/// How far past the window start the first available close may sit before a
/// horizon counts as not covered (weekends, holidays, listing gaps).
const HISTORY_GRACE_DAYS: i64 = 7;

/// Normalized view of one ticker, ready for the prompt and the presenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub symbol: String,
    pub long_name: String,
    pub sector: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub annual_revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub pe_ratio_trailing: Option<f64>,
    pub pe_ratio_forward: Option<f64>,
    pub pb_ratio: Option<f64>,
    /// Fraction, 0.0052 is 0.52%
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub price_1y_change_pct: Option<f64>,
    pub price_5y_change_pct: Option<f64>,
    pub business_summary: String,
    /// Oldest first, always exactly the configured window
    pub recent_closes: Vec<ClosePoint>,
    pub currency_code: String,
    pub currency_symbol: String,
}

impl StockRecord {
    /// Assemble a record from raw provider pieces. `closes` is the full daily
    /// history, oldest first; `recent` is the tail already cut to the window.
    pub fn from_parts(
        symbol: &str,
        overview: CompanyOverview,
        quote: Option<StockQuote>,
        closes: &[ClosePoint],
        recent: Vec<ClosePoint>,
    ) -> Self {
        let currency_code = overview.currency.unwrap_or_else(|| "USD".to_string());

        Self {
            symbol: symbol.to_string(),
            long_name: overview.name.unwrap_or_else(|| symbol.to_string()),
            sector: overview.sector,
            price: quote.map(|q| q.price),
            market_cap: overview.market_cap,
            annual_revenue: overview.revenue_ttm,
            gross_profit: overview.gross_profit_ttm,
            pe_ratio_trailing: overview.pe_ratio_trailing,
            pe_ratio_forward: overview.pe_ratio_forward,
            pb_ratio: overview.pb_ratio,
            dividend_yield: overview.dividend_yield,
            beta: overview.beta,
            price_1y_change_pct: change_over_months(closes, 12),
            price_5y_change_pct: change_over_months(closes, 60),
            business_summary: overview.description.unwrap_or_else(|| NO_SUMMARY.to_string()),
            recent_closes: recent,
            currency_symbol: currency_symbol(&currency_code),
            currency_code,
        }
    }
}

/// USD → "$", INR → "₹", anything else passes through untouched
pub fn currency_symbol(code: &str) -> String {
    match code.trim().to_uppercase().as_str() {
        "USD" => "$".to_string(),
        "INR" => "₹".to_string(),
        _ => code.to_string(),
    }
}

/// Percentage move from the first to the last close of the slice
pub fn percent_change(closes: &[ClosePoint]) -> Option<f64> {
    let first = closes.first()?;
    let last = closes.last()?;

    if first.close == 0.0 {
        return None;
    }

    Some((last.close - first.close) / first.close * 100.0)
}

/// Percentage move over the trailing `months`, measured back from the latest
/// close. `None` if the history does not reach back far enough.
pub fn change_over_months(closes: &[ClosePoint], months: u32) -> Option<f64> {
    let first = closes.first()?;
    let last = closes.last()?;
    let start = last.date.checked_sub_months(Months::new(months))?;

    if first.date > start + Duration::days(HISTORY_GRACE_DAYS) {
        return None;
    }

    let from = closes.partition_point(|point| point.date < start);
    percent_change(&closes[from..])
}
