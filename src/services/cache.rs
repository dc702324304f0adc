//! TTL cache for fetched price series, keyed by `TICKER:timeframe`.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::types::Timeframe;

/// Cache key for one ticker's series on one timeframe.
pub fn series_key(ticker: &str, timeframe: Timeframe) -> String {
    format!("{}:{}", ticker, timeframe.key())
}

/// Thread-safe map whose entries expire after a fixed TTL.
pub struct Cache<V> {
    entries: DashMap<String, (V, Instant)>,
    ttl: Duration,
}

impl<V: Clone> Cache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`. Expired entries are evicted on read.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.1 > Instant::now() {
            return Some(entry.0.clone());
        }
        drop(entry);
        self.entries.remove(key);
        None
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.1 > Instant::now())
    }

    pub fn insert(&self, key: String, value: V) {
        self.entries.insert(key, (value, Instant::now() + self.ttl));
    }

    /// Drop every timeframe cached for `ticker`.
    pub fn invalidate_ticker(&self, ticker: &str) {
        let prefix = format!("{}:", ticker);
        self.entries.retain(|key, _| !key.starts_with(&prefix));
    }

    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.1 > now);
    }

    /// Entry count, expired entries included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
