use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use series_core::{AnalysisError, MarketDataProvider, PriceSeries};

/// Cache key: one provider request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

struct CacheEntry {
    series: PriceSeries,
    cached_at: DateTime<Utc>,
}

/// Time-boxed memoization of provider fetches, keyed by (ticker, start, end).
///
/// Owned by whoever constructs it; the TTL is an explicit parameter, not a
/// process-wide constant.
pub struct SeriesCache {
    entries: DashMap<SeriesKey, CacheEntry>,
    ttl: Duration,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &SeriesKey) -> Option<PriceSeries> {
        let entry = self.entries.get(key)?;
        if Utc::now() - entry.cached_at < self.ttl {
            Some(entry.series.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: SeriesKey, series: PriceSeries) {
        self.entries.insert(
            key,
            CacheEntry {
                series,
                cached_at: Utc::now(),
            },
        );
    }
}

/// Provider decorator that consults a caller-owned [`SeriesCache`] before
/// delegating to the wrapped provider. Only successful fetches are cached.
pub struct CachedProvider<P> {
    inner: P,
    cache: SeriesCache,
}

impl<P> CachedProvider<P> {
    pub fn new(inner: P, cache: SeriesCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    async fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, AnalysisError> {
        let key = SeriesKey {
            ticker: ticker.to_string(),
            start,
            end,
        };
        if let Some(series) = self.cache.get(&key) {
            tracing::debug!("cache hit for {} {} to {}", ticker, start, end);
            return Ok(series);
        }

        let series = self.inner.fetch(ticker, start, end).await?;
        self.cache.insert(key, series.clone());
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use series_core::Bar;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for CountingProvider {
        async fn fetch(
            &self,
            ticker: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PriceSeries::new(
                ticker,
                vec![Bar {
                    date: start,
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.5,
                    volume: 1000.0,
                }],
            ))
        }
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_the_provider() {
        let provider = CachedProvider::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
            },
            SeriesCache::new(Duration::minutes(5)),
        );
        let (start, end) = range();

        provider.fetch("AAPL", start, end).await.unwrap();
        provider.fetch("AAPL", start, end).await.unwrap();

        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_refetches() {
        let provider = CachedProvider::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
            },
            SeriesCache::new(Duration::zero()),
        );
        let (start, end) = range();

        provider.fetch("AAPL", start, end).await.unwrap();
        provider.fetch("AAPL", start, end).await.unwrap();

        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_ranges_are_distinct_keys() {
        let provider = CachedProvider::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
            },
            SeriesCache::new(Duration::minutes(5)),
        );
        let (start, end) = range();

        provider.fetch("AAPL", start, end).await.unwrap();
        provider
            .fetch("AAPL", start, end - Duration::days(1))
            .await
            .unwrap();

        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 2);
    }
}
