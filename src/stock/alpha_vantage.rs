use super::provider::{
    ClosePoint, CompanyOverview, ProviderConfig, StockDataError, StockDataProvider, StockQuote,
};
use alpha_vantage::api::ApiClient;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Rate limiting state for Alpha Vantage API
#[derive(Debug)]
struct RateLimitState {
    requests_made: u32,
    window_start: Instant,
    requests_per_minute: u32,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self {
            requests_made: 0,
            window_start: Instant::now(),
            requests_per_minute: 5, // Alpha Vantage free tier: 5 requests per minute
        }
    }
}

/// Everything that only exists after `initialize`
struct Connection {
    api: ApiClient,
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// Alpha Vantage stock data provider.
///
/// Quotes go through the `alpha_vantage` crate; the overview and daily series
/// endpoints are queried directly since the crate does not model them.
pub struct AlphaVantageProvider {
    connection: Option<Connection>,
    rate_limit: Mutex<RateLimitState>,
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider
    pub fn new() -> Self {
        Self {
            connection: None,
            rate_limit: Mutex::new(RateLimitState::default()),
        }
    }

    /// Block until the current minute window has room for one more request
    async fn check_rate_limit(&self) {
        loop {
            let wait_time = {
                let mut rate_limit = self.rate_limit.lock().await;
                let now = Instant::now();

                // Reset window if more than a minute has passed
                if now.duration_since(rate_limit.window_start) >= RATE_WINDOW {
                    rate_limit.requests_made = 0;
                    rate_limit.window_start = now;
                }

                if rate_limit.requests_made < rate_limit.requests_per_minute {
                    rate_limit.requests_made += 1;
                    return;
                }

                RATE_WINDOW.saturating_sub(now.duration_since(rate_limit.window_start))
            };

            log::warn!("⏳ Alpha Vantage rate limit reached, waiting {wait_time:?}");
            tokio::time::sleep(wait_time).await;
        }
    }

    /// Get the connection, ensuring the provider is initialized
    fn get_connection(&self) -> Result<&Connection, StockDataError> {
        self.connection
            .as_ref()
            .ok_or_else(|| StockDataError::ConfigError("Provider not initialized".to_string()))
    }

    async fn query(&self, function: &str, symbol: &str, extra: &[(&str, &str)]) -> Result<Value, StockDataError> {
        let connection = self.get_connection()?;
        self.check_rate_limit().await;

        log::debug!("Alpha Vantage {function} request for {symbol}");

        let response = connection
            .http
            .get(&connection.base_url)
            .query(&[
                ("function", function),
                ("symbol", symbol),
                ("apikey", connection.api_key.as_str()),
            ])
            .query(extra)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StockDataError::NetworkError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: Value = response.json().await?;
        check_api_message(&data, symbol)?;
        Ok(data)
    }
}

impl Default for AlphaVantageProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Alpha Vantage reports errors inside a 200 response body
fn check_api_message(data: &Value, symbol: &str) -> Result<(), StockDataError> {
    if let Some(message) = data.get("Error Message").and_then(Value::as_str) {
        if message.to_lowercase().contains("apikey") {
            return Err(StockDataError::InvalidApiKey(message.to_string()));
        }
        return Err(StockDataError::SymbolNotFound(format!("{symbol}: {message}")));
    }

    let Some(message) = data
        .get("Note")
        .or_else(|| data.get("Information"))
        .and_then(Value::as_str)
    else {
        return Ok(());
    };

    log::warn!("Alpha Vantage notice for {symbol}: {message}");

    let lower = message.to_lowercase();
    if lower.contains("apikey") {
        Err(StockDataError::InvalidApiKey(message.to_string()))
    } else if lower.contains("premium")
        && !lower.contains("rate limit")
        && !lower.contains("call frequency")
    {
        Err(StockDataError::ProviderError(message.to_string()))
    } else {
        Err(StockDataError::RateLimitExceeded)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawOverview {
    symbol: Option<String>,
    name: Option<String>,
    description: Option<String>,
    sector: Option<String>,
    currency: Option<String>,
    market_capitalization: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "ForwardPE")]
    forward_pe: Option<String>,
    price_to_book_ratio: Option<String>,
    dividend_yield: Option<String>,
    beta: Option<String>,
    #[serde(rename = "RevenueTTM")]
    revenue_ttm: Option<String>,
    #[serde(rename = "GrossProfitTTM")]
    gross_profit_ttm: Option<String>,
}

/// Alpha Vantage spells "missing" as "None" or "-"
fn parse_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "None" && v != "-")
}

fn parse_number(value: Option<String>) -> Option<f64> {
    parse_text(value)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_overview(symbol: &str, data: Value) -> Result<CompanyOverview, StockDataError> {
    // An unknown symbol comes back as an empty object
    if data.as_object().map(|o| o.is_empty()).unwrap_or(true) {
        return Err(StockDataError::SymbolNotFound(symbol.to_string()));
    }

    let raw: RawOverview = serde_json::from_value(data)
        .map_err(|e| StockDataError::ParseError(format!("overview for {symbol}: {e}")))?;

    Ok(CompanyOverview {
        symbol: parse_text(raw.symbol).unwrap_or_else(|| symbol.to_string()),
        name: parse_text(raw.name),
        description: parse_text(raw.description),
        sector: parse_text(raw.sector),
        currency: parse_text(raw.currency),
        market_cap: parse_number(raw.market_capitalization),
        pe_ratio_trailing: parse_number(raw.pe_ratio),
        pe_ratio_forward: parse_number(raw.forward_pe),
        pb_ratio: parse_number(raw.price_to_book_ratio),
        dividend_yield: parse_number(raw.dividend_yield),
        beta: parse_number(raw.beta),
        revenue_ttm: parse_number(raw.revenue_ttm),
        gross_profit_ttm: parse_number(raw.gross_profit_ttm),
    })
}

fn parse_daily_closes(data: &Value) -> Result<Vec<ClosePoint>, StockDataError> {
    let series = data
        .get("Time Series (Daily)")
        .and_then(Value::as_object)
        .ok_or_else(|| StockDataError::ProviderError("No daily data found".to_string()))?;

    let mut closes: Vec<ClosePoint> = series
        .iter()
        .filter_map(|(date, values)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            let close = values.get("4. close")?.as_str()?.trim().parse::<f64>().ok()?;
            Some(ClosePoint { date, close })
        })
        .collect();

    if closes.len() < series.len() {
        log::debug!("Skipped {} unparsable daily entries", series.len() - closes.len());
    }

    closes.sort_by_key(|point| point.date);
    Ok(closes)
}

#[async_trait]
impl StockDataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "Alpha Vantage"
    }

    async fn initialize(&mut self, config: ProviderConfig) -> Result<(), StockDataError> {
        if config.api_key.is_empty() {
            return Err(StockDataError::InvalidApiKey(
                "API key is required".to_string(),
            ));
        }

        // Update rate limit if provided
        if let Some(rate_limit) = config.rate_limit {
            let mut rl = self.rate_limit.lock().await;
            rl.requests_per_minute = rate_limit.max(1);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| StockDataError::ConfigError(format!("HTTP client: {e}")))?;

        self.connection = Some(Connection {
            api: ApiClient::set_api(&config.api_key, http.clone()),
            http,
            api_key: config.api_key,
            base_url: config.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        });

        log::info!("Alpha Vantage provider initialized successfully");
        Ok(())
    }

    async fn get_overview(&self, symbol: &str) -> Result<CompanyOverview, StockDataError> {
        let data = self.query("OVERVIEW", symbol, &[]).await?;
        parse_overview(symbol, data)
    }

    async fn get_quote(&self, symbol: &str) -> Result<StockQuote, StockDataError> {
        let connection = self.get_connection()?;
        self.check_rate_limit().await;

        log::debug!("Fetching quote for symbol: {}", symbol);

        let quote = connection.api.quote(symbol).json().await?;

        Ok(StockQuote {
            symbol: quote.symbol().to_uppercase(),
            price: quote.price(),
        })
    }

    async fn get_daily_closes(&self, symbol: &str) -> Result<Vec<ClosePoint>, StockDataError> {
        let data = self
            .query("TIME_SERIES_DAILY", symbol, &[("outputsize", "full")])
            .await?;
        parse_daily_closes(&data)
    }
}
