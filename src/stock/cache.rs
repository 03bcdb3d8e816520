//! Fetch cache for stock records, keyed by normalized symbol

use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::time::Duration;
use tokio::sync::Mutex;

use super::record::StockRecord;

#[async_trait]
pub trait RecordCache: Send + Sync {
    async fn get(&self, symbol: &str) -> Option<StockRecord>;
    async fn put(&self, record: StockRecord);
    async fn evict(&self, symbol: &str);
}

/// In-memory cache whose entries expire after a fixed lifespan
pub struct TimedRecordCache {
    inner: Mutex<TimedCache<String, StockRecord>>,
}

impl TimedRecordCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(TimedCache::with_lifespan(ttl)),
        }
    }
}

#[async_trait]
impl RecordCache for TimedRecordCache {
    async fn get(&self, symbol: &str) -> Option<StockRecord> {
        let mut cache = self.inner.lock().await;
        cache.cache_get(&symbol.to_string()).cloned()
    }

    async fn put(&self, record: StockRecord) {
        let mut cache = self.inner.lock().await;
        let _ = cache.cache_set(record.symbol.clone(), record);
    }

    async fn evict(&self, symbol: &str) {
        let mut cache = self.inner.lock().await;
        let _ = cache.cache_remove(&symbol.to_string());
    }
}

/// Never stores anything; every lookup goes to the provider
pub struct NoopRecordCache;

#[async_trait]
impl RecordCache for NoopRecordCache {
    async fn get(&self, _symbol: &str) -> Option<StockRecord> {
        None
    }

    async fn put(&self, _record: StockRecord) {}

    async fn evict(&self, _symbol: &str) {}
}
