use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything that can go wrong while resolving one ticker
#[derive(Debug, thiserror::Error)]
pub enum StockDataError {
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
    /// Fewer daily closes than the recent window needs
    #[error("Insufficient history for {symbol}: wanted {wanted} closes, got {got}")]
    InsufficientHistory {
        symbol: String,
        wanted: usize,
        got: usize,
    },
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for StockDataError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            StockDataError::ParseError(error.to_string())
        } else {
            StockDataError::NetworkError(error.to_string())
        }
    }
}

// The crate only exposes message strings, so classify by wording
impl From<alpha_vantage::error::Error> for StockDataError {
    fn from(error: alpha_vantage::error::Error) -> Self {
        let message = format!("{error:?}");
        let lower = message.to_lowercase();

        if lower.contains("api key") || lower.contains("apikey") {
            StockDataError::InvalidApiKey(message)
        } else if lower.contains("call frequency") || lower.contains("premium") {
            StockDataError::RateLimitExceeded
        } else if lower.contains("invalid api call") || lower.contains("invaliddata") || lower.contains("symbol") {
            StockDataError::SymbolNotFound(message)
        } else if lower.contains("network") || lower.contains("connection") || lower.contains("request") {
            StockDataError::NetworkError(message)
        } else {
            StockDataError::ProviderError(message)
        }
    }
}

/// Current price for a symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    /// Stock symbol (e.g., "AAPL")
    pub symbol: String,
    /// Latest traded price
    pub price: f64,
}

/// Company profile, ratios and trailing statement figures.
///
/// Every numeric field is `None` when the provider has no value for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub sector: Option<String>,
    /// ISO currency code as reported (e.g. "USD")
    pub currency: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio_trailing: Option<f64>,
    pub pe_ratio_forward: Option<f64>,
    pub pb_ratio: Option<f64>,
    /// Fraction, not percent
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub revenue_ttm: Option<f64>,
    pub gross_profit_ttm: Option<f64>,
}

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Configuration for stock data providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key for the provider
    pub api_key: String,
    /// Base URL for API requests (optional override)
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Rate limit (requests per minute)
    pub rate_limit: Option<u32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            timeout: 30,
            rate_limit: None,
        }
    }
}

/// Trait for stock data providers
#[async_trait]
pub trait StockDataProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Initialize the provider with configuration
    async fn initialize(&mut self, config: ProviderConfig) -> Result<(), StockDataError>;

    /// Company profile and fundamentals. Fails with `SymbolNotFound` when the
    /// provider knows nothing about the symbol.
    async fn get_overview(&self, symbol: &str) -> Result<CompanyOverview, StockDataError>;

    /// Fetch current quote for a single stock
    async fn get_quote(&self, symbol: &str) -> Result<StockQuote, StockDataError>;

    /// Full daily close history, oldest first
    async fn get_daily_closes(&self, symbol: &str) -> Result<Vec<ClosePoint>, StockDataError>;
}
