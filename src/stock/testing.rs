//! Deterministic in-memory provider for tests

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::provider::{
    ClosePoint, CompanyOverview, ProviderConfig, StockDataError, StockDataProvider, StockQuote,
};

struct Listing {
    overview: CompanyOverview,
    price: f64,
    closes: Vec<ClosePoint>,
}

pub struct StaticProvider {
    listings: HashMap<String, Listing>,
    calls: Arc<AtomicUsize>,
    quote_failure: Option<fn(&str) -> StockDataError>,
}

/// Weekday closes ending on 2024-12-31, rising linearly from `start_price`
pub fn weekday_closes(days: usize, start_price: f64) -> Vec<ClosePoint> {
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date");
    let mut dates: Vec<NaiveDate> = Vec::with_capacity(days);
    let mut date = end;
    while dates.len() < days {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(date);
        }
        date -= Duration::days(1);
    }
    dates.reverse();

    dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| ClosePoint {
            date,
            close: start_price + i as f64 * 0.1,
        })
        .collect()
}

impl StaticProvider {
    /// AAPL and MSFT with six years of history, NEWCO with ten sparse days
    pub fn with_defaults() -> Self {
        let mut listings = HashMap::new();

        listings.insert(
            "AAPL".to_string(),
            Listing {
                overview: CompanyOverview {
                    symbol: "AAPL".to_string(),
                    name: Some("Apple Inc.".to_string()),
                    description: Some("Apple designs consumer electronics.".to_string()),
                    sector: Some("TECHNOLOGY".to_string()),
                    currency: Some("USD".to_string()),
                    market_cap: Some(2_890_000_000_000.0),
                    pe_ratio_trailing: Some(28.5),
                    pe_ratio_forward: Some(26.1),
                    pb_ratio: Some(45.2),
                    dividend_yield: Some(0.0052),
                    beta: Some(1.29),
                    revenue_ttm: Some(383_290_000_000.0),
                    gross_profit_ttm: Some(169_150_000_000.0),
                },
                price: 185.64,
                closes: weekday_closes(6 * 261, 40.0),
            },
        );

        listings.insert(
            "MSFT".to_string(),
            Listing {
                overview: CompanyOverview {
                    symbol: "MSFT".to_string(),
                    name: Some("Microsoft Corporation".to_string()),
                    description: Some("Microsoft builds software and cloud services.".to_string()),
                    sector: Some("TECHNOLOGY".to_string()),
                    currency: Some("USD".to_string()),
                    market_cap: Some(3_100_000_000_000.0),
                    pe_ratio_trailing: Some(35.2),
                    pe_ratio_forward: Some(31.0),
                    pb_ratio: Some(12.4),
                    dividend_yield: Some(0.0072),
                    beta: Some(0.9),
                    revenue_ttm: Some(236_580_000_000.0),
                    gross_profit_ttm: Some(164_000_000_000.0),
                },
                price: 415.1,
                closes: weekday_closes(6 * 261, 120.0),
            },
        );

        listings.insert(
            "NEWCO".to_string(),
            Listing {
                overview: CompanyOverview {
                    symbol: "NEWCO".to_string(),
                    name: Some("NewCo Holdings".to_string()),
                    dividend_yield: Some(0.0),
                    ..Default::default()
                },
                price: 12.0,
                closes: weekday_closes(10, 10.0),
            },
        );

        Self {
            listings,
            calls: Arc::new(AtomicUsize::new(0)),
            quote_failure: None,
        }
    }

    /// Every quote request fails with the error built by `failure`
    pub fn with_quote_failure(mut self, failure: fn(&str) -> StockDataError) -> Self {
        self.quote_failure = Some(failure);
        self
    }

    /// Shared counter of provider calls, usable after the provider is boxed
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn listing(&self, symbol: &str) -> Result<&Listing, StockDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.listings
            .get(symbol)
            .ok_or_else(|| StockDataError::SymbolNotFound(symbol.to_string()))
    }
}

#[async_trait]
impl StockDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "Static"
    }

    async fn initialize(&mut self, _config: ProviderConfig) -> Result<(), StockDataError> {
        Ok(())
    }

    async fn get_overview(&self, symbol: &str) -> Result<CompanyOverview, StockDataError> {
        self.listing(symbol).map(|l| l.overview.clone())
    }

    async fn get_quote(&self, symbol: &str) -> Result<StockQuote, StockDataError> {
        let listing = self.listing(symbol)?;
        if let Some(failure) = self.quote_failure {
            return Err(failure(symbol));
        }
        Ok(StockQuote {
            symbol: symbol.to_string(),
            price: listing.price,
        })
    }

    async fn get_daily_closes(&self, symbol: &str) -> Result<Vec<ClosePoint>, StockDataError> {
        self.listing(symbol).map(|l| l.closes.clone())
    }
}
