/// Stock market data functionality
pub mod alpha_vantage;
pub mod cache;
pub mod provider;
pub mod record;
pub mod service;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use cache::{NoopRecordCache, RecordCache, TimedRecordCache};
pub use provider::{ClosePoint, ProviderConfig, StockDataError};
pub use record::StockRecord;
pub use service::StockService;
