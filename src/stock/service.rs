use std::sync::Arc;

use super::alpha_vantage::AlphaVantageProvider;
use super::cache::RecordCache;
use super::provider::{ProviderConfig, StockDataError, StockDataProvider};
use super::record::StockRecord;

/// Stock service: fetches, normalizes and caches one ticker at a time
pub struct StockService {
    provider: Box<dyn StockDataProvider>,
    cache: Arc<dyn RecordCache>,
    history_window: usize,
}

impl StockService {
    /// Create a new stock service backed by Alpha Vantage
    pub async fn new(
        config: ProviderConfig,
        cache: Arc<dyn RecordCache>,
        history_window: usize,
    ) -> Result<Self, StockDataError> {
        if config.api_key.is_empty() {
            return Err(StockDataError::InvalidApiKey("API key is empty".to_string()));
        }

        let mut provider = AlphaVantageProvider::new();
        provider.initialize(config).await?;

        Ok(Self::with_provider(Box::new(provider), cache, history_window))
    }

    pub fn with_provider(
        provider: Box<dyn StockDataProvider>,
        cache: Arc<dyn RecordCache>,
        history_window: usize,
    ) -> Self {
        Self {
            provider,
            cache,
            history_window,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Drop any cached record for `ticker` so the next fetch goes to the provider
    pub async fn invalidate(&self, ticker: &str) {
        let symbol = ticker.trim().to_uppercase();
        log::debug!("Evicting {symbol} from cache");
        self.cache.evict(&symbol).await;
    }

    /// Fetch a fully normalized record for `ticker`, served from the cache
    /// when possible. Failures are never cached.
    pub async fn fetch(&self, ticker: &str) -> Result<StockRecord, StockDataError> {
        let symbol = ticker.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(StockDataError::InvalidSymbol("Symbol cannot be empty".to_string()));
        }

        if let Some(record) = self.cache.get(&symbol).await {
            log::debug!("Cache hit for {symbol}");
            return Ok(record);
        }
        log::debug!("Cache miss for {symbol}");

        log::info!("Fetching {symbol} from {}", self.provider.name());

        match self.fetch_uncached(&symbol).await {
            Ok(record) => {
                log::info!(
                    "Successfully fetched {} ({}) with {} recent closes",
                    record.symbol,
                    record.long_name,
                    record.recent_closes.len()
                );
                self.cache.put(record.clone()).await;
                Ok(record)
            }
            Err(e) => {
                log::error!("Failed to fetch {symbol}: {e:?}");
                Err(e)
            }
        }
    }

    async fn fetch_uncached(&self, symbol: &str) -> Result<StockRecord, StockDataError> {
        let overview = self.provider.get_overview(symbol).await?;

        // No resolvable name means the ticker is unknown or delisted
        if overview.name.is_none() {
            return Err(StockDataError::SymbolNotFound(symbol.to_string()));
        }

        // A missing quote leaves the price unavailable; transport, key and
        // throttling failures still abort the fetch
        let quote = match self.provider.get_quote(symbol).await {
            Ok(quote) => {
                log::debug!("Quote for {}: {}", quote.symbol, quote.price);
                Some(quote)
            }
            Err(e @ (StockDataError::ProviderError(_) | StockDataError::ParseError(_))) => {
                log::warn!("⚠️ No quote for {symbol}, price unavailable: {e}");
                None
            }
            Err(e) => return Err(e),
        };

        let closes = self.provider.get_daily_closes(symbol).await?;

        if closes.len() < self.history_window {
            return Err(StockDataError::InsufficientHistory {
                symbol: symbol.to_string(),
                wanted: self.history_window,
                got: closes.len(),
            });
        }

        let recent = closes[closes.len() - self.history_window..].to_vec();
        Ok(StockRecord::from_parts(symbol, overview, quote, &closes, recent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::cache::{NoopRecordCache, TimedRecordCache};
    use crate::stock::testing::StaticProvider;
    use std::time::Duration;

    fn service(provider: StaticProvider, window: usize) -> StockService {
        StockService::with_provider(
            Box::new(provider),
            Arc::new(TimedRecordCache::new(Duration::from_secs(60))),
            window,
        )
    }

    #[tokio::test]
    async fn test_fetch_builds_record() {
        let provider = StaticProvider::with_defaults();
        let service = service(provider, 30);

        let record = service.fetch(" aapl ").await.unwrap();
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.long_name, "Apple Inc.");
        assert_eq!(record.recent_closes.len(), 30);
        assert!(record.recent_closes.windows(2).all(|w| w[0].date < w[1].date));
        assert!(record.price_1y_change_pct.is_some());
        assert!(record.price_5y_change_pct.is_some());
        assert_eq!(record.currency_symbol, "$");
    }

    #[tokio::test]
    async fn test_fetch_uses_cache_for_repeat_queries() {
        let provider = StaticProvider::with_defaults();
        let calls = provider.call_counter();
        let service = service(provider, 30);

        service.fetch("MSFT").await.unwrap();
        let after_first = calls.load(std::sync::atomic::Ordering::SeqCst);
        service.fetch("msft").await.unwrap();

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), after_first);
    }

    #[tokio::test]
    async fn test_noop_cache_always_refetches() {
        let provider = StaticProvider::with_defaults();
        let calls = provider.call_counter();
        let service = StockService::with_provider(Box::new(provider), Arc::new(NoopRecordCache), 30);

        service.fetch("MSFT").await.unwrap();
        let after_first = calls.load(std::sync::atomic::Ordering::SeqCst);
        service.fetch("MSFT").await.unwrap();

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), after_first * 2);
    }

    #[tokio::test]
    async fn test_missing_quote_leaves_price_unavailable() {
        let provider = StaticProvider::with_defaults()
            .with_quote_failure(|s| StockDataError::ProviderError(format!("empty Global Quote for {s}")));
        let service = service(provider, 30);

        let record = service.fetch("AAPL").await.unwrap();
        assert_eq!(record.price, None);
        assert_eq!(record.long_name, "Apple Inc.");
        assert_eq!(record.recent_closes.len(), 30);
    }

    #[tokio::test]
    async fn test_quote_transport_failure_still_aborts() {
        let provider = StaticProvider::with_defaults()
            .with_quote_failure(|_| StockDataError::NetworkError("connection reset".to_string()));
        let service = service(provider, 30);

        let result = service.fetch("AAPL").await;
        assert!(matches!(result, Err(StockDataError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let provider = StaticProvider::with_defaults();
        let calls = provider.call_counter();
        let service = service(provider, 30);

        service.fetch("AAPL").await.unwrap();
        let after_first = calls.load(std::sync::atomic::Ordering::SeqCst);

        service.invalidate(" aapl").await;
        service.fetch("AAPL").await.unwrap();

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), after_first * 2);
    }

    #[tokio::test]
    async fn test_unknown_ticker_fails() {
        let service = service(StaticProvider::with_defaults(), 30);
        let result = service.fetch("NOTAREALTICKER").await;
        assert!(matches!(result, Err(StockDataError::SymbolNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_ticker_rejected() {
        let service = service(StaticProvider::with_defaults(), 30);
        let result = service.fetch("   ").await;
        assert!(matches!(result, Err(StockDataError::InvalidSymbol(_))));
    }

    #[tokio::test]
    async fn test_short_history_fails_instead_of_partial_window() {
        let service = service(StaticProvider::with_defaults(), 30);
        let result = service.fetch("NEWCO").await;
        assert!(matches!(
            result,
            Err(StockDataError::InsufficientHistory { wanted: 30, got: 10, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_fields_stay_unavailable() {
        let service = service(StaticProvider::with_defaults(), 5);
        let record = service.fetch("NEWCO").await.unwrap();

        assert_eq!(record.sector, None);
        assert_eq!(record.market_cap, None);
        assert_eq!(record.dividend_yield, Some(0.0));
        assert_eq!(record.price_1y_change_pct, None);
        assert_eq!(record.price_5y_change_pct, None);
        assert_eq!(record.recent_closes.len(), 5);
    }
}
