//! OHLCV supply for the analyzers: the source trait, a caching wrapper and
//! bar resampling.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::error::Result;
use crate::services::cache::{series_key, Cache};
use crate::types::{OhlcPoint, Timeframe};

/// Anything that can supply ascending OHLCV bars for a ticker and timeframe.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn fetch_ohlcv(&self, ticker: &str, timeframe: Timeframe) -> Result<Vec<OhlcPoint>>;
}

/// Uppercase with share-class dots turned into hyphens (`brk.b` -> `BRK-B`).
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase().replace('.', "-")
}

/// Aggregate ascending bars into buckets of `bucket_ms` aligned to the epoch:
/// first open, highest high, lowest low, last close, summed volume.
pub fn resample(points: &[OhlcPoint], bucket_ms: i64) -> Vec<OhlcPoint> {
    if bucket_ms <= 0 {
        return points.to_vec();
    }

    let mut out: Vec<OhlcPoint> = Vec::new();
    for point in points {
        let bucket = point.time.div_euclid(bucket_ms) * bucket_ms;
        match out.last_mut() {
            Some(bar) if bar.time == bucket => {
                bar.high = bar.high.max(point.high);
                bar.low = bar.low.min(point.low);
                bar.close = point.close;
                bar.volume += point.volume;
            }
            _ => out.push(OhlcPoint {
                time: bucket,
                ..*point
            }),
        }
    }
    out
}

/// Caching wrapper around a [`MarketDataSource`].
pub struct MarketDataService {
    source: Arc<dyn MarketDataSource>,
    cache: Cache<Vec<OhlcPoint>>,
}

impl MarketDataService {
    pub fn new(source: Arc<dyn MarketDataSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: Cache::new(ttl),
        }
    }

    /// Fetch every timeframe concurrently. Failed or empty fetches are logged
    /// and left out of the map.
    pub async fn fetch_all(
        &self,
        ticker: &str,
        timeframes: &[Timeframe],
    ) -> BTreeMap<Timeframe, Vec<OhlcPoint>> {
        let fetches = timeframes.iter().map(|&tf| async move {
            (tf, self.fetch_ohlcv(ticker, tf).await)
        });

        let mut series = BTreeMap::new();
        for (tf, result) in join_all(fetches).await {
            match result {
                Ok(bars) if !bars.is_empty() => {
                    series.insert(tf, bars);
                }
                Ok(_) => warn!("{} {}: source returned no bars", ticker, tf),
                Err(e) => warn!("{} {}: fetch failed: {}", ticker, tf, e),
            }
        }
        series
    }

    pub fn invalidate(&self, ticker: &str) {
        self.cache.invalidate_ticker(&normalize_ticker(ticker));
    }

    pub fn purge_expired(&self) {
        self.cache.purge_expired();
    }

    /// Whether a live cached series exists for `ticker` on `timeframe`.
    pub fn is_cached(&self, ticker: &str, timeframe: Timeframe) -> bool {
        self.cache
            .contains(&series_key(&normalize_ticker(ticker), timeframe))
    }
}

#[async_trait]
impl MarketDataSource for MarketDataService {
    fn name(&self) -> &str {
        self.source.name()
    }

    async fn fetch_ohlcv(&self, ticker: &str, timeframe: Timeframe) -> Result<Vec<OhlcPoint>> {
        let ticker = normalize_ticker(ticker);
        let key = series_key(&ticker, timeframe);
        if let Some(bars) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(bars);
        }

        let mut bars = self.source.fetch_ohlcv(&ticker, timeframe).await?;
        bars.sort_by_key(|b| b.time);
        bars.dedup_by_key(|b| b.time);
        debug!("Fetched {} bars for {} from {}", bars.len(), key, self.source.name());

        if !bars.is_empty() {
            self.cache.insert(key, bars.clone());
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn point(time: i64, open: f64, high: f64, low: f64, close: f64) -> OhlcPoint {
        OhlcPoint {
            time,
            open,
            high,
            low,
            close,
            volume: 10.0,
        }
    }

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch_ohlcv(&self, _ticker: &str, timeframe: Timeframe) -> Result<Vec<OhlcPoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match timeframe {
                Timeframe::Month1 => Err(AppError::ExternalApi("unavailable".into())),
                Timeframe::Week1 => Ok(Vec::new()),
                _ => Ok(vec![point(2, 1.0, 2.0, 0.5, 1.5), point(1, 1.0, 2.0, 0.5, 1.2)]),
            }
        }
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker("brk.b"), "BRK-B");
        assert_eq!(normalize_ticker(" aapl "), "AAPL");
    }

    #[test]
    fn test_resample_four_hour_buckets() {
        let hour = 3_600_000;
        let hourly: Vec<OhlcPoint> = (0..8)
            .map(|i| point(i * hour, 10.0 + i as f64, 11.0 + i as f64, 9.0 + i as f64, 10.5 + i as f64))
            .collect();
        let bars = resample(&hourly, 4 * hour);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].time, 0);
        assert_eq!(bars[0].open, 10.0);
        assert_eq!(bars[0].high, 14.0);
        assert_eq!(bars[0].low, 9.0);
        assert_eq!(bars[0].close, 13.5);
        assert_eq!(bars[0].volume, 40.0);
        assert_eq!(bars[1].time, 4 * hour);
    }

    #[tokio::test]
    async fn test_cached_fetch_sorts_and_hits_cache() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let service = MarketDataService::new(source.clone(), Duration::from_secs(60));

        let first = service.fetch_ohlcv("aapl", Timeframe::Day1).await.unwrap();
        let second = service.fetch_ohlcv("AAPL", Timeframe::Day1).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].time, 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        service.invalidate("aapl");
        service.fetch_ohlcv("AAPL", Timeframe::Day1).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_omits_failures() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let service = MarketDataService::new(source, Duration::from_secs(60));
        let series = service.fetch_all("AAPL", &Timeframe::ALL).await;

        assert!(!series.contains_key(&Timeframe::Month1));
        assert!(!series.contains_key(&Timeframe::Week1));
        assert_eq!(series.len(), 3);
    }
}
