pub mod cache;
pub mod names;
pub mod summary;

pub use cache::{CachedProvider, SeriesCache, SeriesKey};
pub use names::{StaticNameTable, YahooNameResolver};
pub use summary::{build_stats, build_summary, SeriesStats, TickerSummary, TRADING_DAYS_PER_YEAR};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use series_core::{
    AnalysisError, CorrelationMatrix, DerivedSeries, MarketDataProvider, NameResolver, PriceSeries,
};
use std::collections::{BTreeMap, HashMap};

/// Which derived columns an analysis request wants attached. Returns and
/// volatility are always computed; RSI and Bollinger bands are opt-in,
/// matching the dashboard's default view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub ma_windows: Vec<usize>,
    pub volatility_window: usize,
    pub rsi_period: Option<usize>,
    pub bollinger_window: Option<usize>,
}

impl Default for IndicatorRequest {
    fn default() -> Self {
        Self {
            ma_windows: vec![5, 20, 60],
            volatility_window: indicator_engine::DEFAULT_VOLATILITY_WINDOW,
            rsi_period: None,
            bollinger_window: None,
        }
    }
}

/// One ticker that could not be served, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: String,
}

/// Best-effort multi-ticker fetch: successes collected, failures reported,
/// the overall request never aborted. An empty series is a success.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub series: BTreeMap<String, PriceSeries>,
    pub failures: Vec<TickerFailure>,
}

/// Everything one analysis request produces.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub series: BTreeMap<String, DerivedSeries>,
    pub summaries: Vec<TickerSummary>,
    pub stats: Vec<SeriesStats>,
    pub failures: Vec<TickerFailure>,
}

/// Apply the requested engine operations to one fetched series.
pub fn derive_series(
    series: PriceSeries,
    request: &IndicatorRequest,
) -> Result<DerivedSeries, AnalysisError> {
    let mut derived = indicator_engine::compute_returns(series.into())?;
    derived = indicator_engine::compute_moving_averages(derived, &request.ma_windows);
    derived = indicator_engine::compute_volatility(derived, request.volatility_window)?;
    if let Some(period) = request.rsi_period {
        derived = indicator_engine::compute_rsi(derived, period);
    }
    if let Some(window) = request.bollinger_window {
        derived = indicator_engine::compute_bollinger_bands(derived, window);
    }
    Ok(derived)
}

/// Coordinates provider, cache, name resolution, and the indicator engine
/// for one dashboard request. Holds no per-request state: every call works
/// on series it owns exclusively.
pub struct DashboardOrchestrator<P> {
    provider: CachedProvider<P>,
    resolver: Box<dyn NameResolver>,
}

impl<P: MarketDataProvider> DashboardOrchestrator<P> {
    pub fn new(provider: P, cache: SeriesCache, resolver: Box<dyn NameResolver>) -> Self {
        Self {
            provider: CachedProvider::new(provider, cache),
            resolver,
        }
    }

    /// Fetch every requested ticker over the range, best-effort.
    pub async fn load_many(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        for ticker in tickers {
            let ticker = ticker.trim().to_uppercase();
            if ticker.is_empty() {
                continue;
            }
            match self.provider.fetch(&ticker, start, end).await {
                Ok(series) => {
                    outcome.series.insert(ticker, series);
                }
                Err(e) => {
                    tracing::warn!("failed to load {}: {}", ticker, e);
                    outcome.failures.push(TickerFailure {
                        ticker,
                        error: e.to_string(),
                    });
                }
            }
        }
        outcome
    }

    /// Full analysis pass: fetch, derive, summarize. A per-ticker derivation
    /// failure joins the failure list instead of aborting the request.
    pub async fn analyze(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        request: &IndicatorRequest,
    ) -> AnalysisReport {
        let outcome = self.load_many(tickers, start, end).await;
        let mut report = AnalysisReport {
            series: BTreeMap::new(),
            summaries: Vec::new(),
            stats: Vec::new(),
            failures: outcome.failures,
        };

        for (ticker, series) in outcome.series {
            match derive_series(series, request) {
                Ok(derived) => {
                    let display_name = self.resolver.resolve_display_name(&ticker).await;
                    if let Some(summary) = build_summary(&derived, &display_name) {
                        report.summaries.push(summary);
                    }
                    if let Some(stats) = build_stats(&derived) {
                        report.stats.push(stats);
                    }
                    report.series.insert(ticker, derived);
                }
                Err(e) => {
                    tracing::warn!("failed to derive {}: {}", ticker, e);
                    report.failures.push(TickerFailure {
                        ticker,
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Correlation of daily returns across the requested tickers. Engine
    /// errors (too few series, too little overlap, zero variance) surface
    /// to the caller; provider failures are reported alongside the matrix.
    pub async fn correlation(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(CorrelationMatrix, Vec<TickerFailure>), AnalysisError> {
        let outcome = self.load_many(tickers, start, end).await;

        let mut derived: HashMap<String, DerivedSeries> = HashMap::new();
        for (ticker, series) in outcome.series {
            // an empty series carries no overlapping dates
            if series.is_empty() {
                continue;
            }
            derived.insert(ticker, indicator_engine::compute_returns(series.into())?);
        }

        let matrix = indicator_engine::compute_correlation(&derived)?;
        Ok((matrix, outcome.failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use series_core::Bar;

    /// Scripted provider: serves canned closes per ticker, errors on the
    /// rest, and treats "GHOST" as an unknown symbol (empty series).
    struct ScriptedProvider;

    fn bars(start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000.0,
            })
            .collect()
    }

    #[async_trait]
    impl MarketDataProvider for ScriptedProvider {
        async fn fetch(
            &self,
            ticker: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<PriceSeries, AnalysisError> {
            match ticker {
                "AAPL" => Ok(PriceSeries::new(
                    ticker,
                    bars(start, &[100.0, 110.0, 99.0, 99.0]),
                )),
                "MSFT" => Ok(PriceSeries::new(
                    ticker,
                    bars(start, &[50.0, 49.0, 51.0, 52.0]),
                )),
                "GHOST" => Ok(PriceSeries::new(ticker, Vec::new())),
                _ => Err(AnalysisError::Provider("connection reset".to_string())),
            }
        }
    }

    fn orchestrator() -> DashboardOrchestrator<ScriptedProvider> {
        DashboardOrchestrator::new(
            ScriptedProvider,
            SeriesCache::new(Duration::minutes(5)),
            Box::new(StaticNameTable::new()),
        )
    }

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_analyze_is_best_effort_across_tickers() {
        let (start, end) = range();
        let report = orchestrator()
            .analyze(
                &tickers(&["AAPL", "DOWN", "GHOST"]),
                start,
                end,
                &IndicatorRequest::default(),
            )
            .await;

        // the broken ticker is reported, the others still come back
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].ticker, "DOWN");
        assert_eq!(report.series.len(), 2);

        // the unknown ticker stays in the result as a valid empty series
        assert!(report.series["GHOST"].is_empty());
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].display_name, "Apple");
    }

    #[tokio::test]
    async fn test_analyze_attaches_requested_columns() {
        let (start, end) = range();
        let request = IndicatorRequest {
            ma_windows: vec![2],
            volatility_window: 2,
            rsi_period: Some(2),
            bollinger_window: Some(2),
        };
        let report = orchestrator()
            .analyze(&tickers(&["AAPL"]), start, end, &request)
            .await;

        let derived = &report.series["AAPL"].derived;
        assert!(derived.cumulative_return.is_some());
        assert!(derived.moving_averages.contains_key(&2));
        assert!(derived.volatility.is_some());
        assert!(derived.rsi.is_some());
        assert!(derived.bollinger.is_some());
    }

    #[tokio::test]
    async fn test_correlation_roundtrip() {
        let (start, end) = range();
        let (matrix, failures) = orchestrator()
            .correlation(&tickers(&["AAPL", "MSFT"]), start, end)
            .await
            .unwrap();

        assert!(failures.is_empty());
        assert_eq!(matrix.tickers, vec!["AAPL", "MSFT"]);
        let r = matrix.get("AAPL", "MSFT").unwrap();
        assert!((-1.0..=1.0).contains(&r));
    }

    #[tokio::test]
    async fn test_correlation_single_usable_series_is_insufficient() {
        let (start, end) = range();
        let result = orchestrator()
            .correlation(&tickers(&["AAPL", "GHOST"]), start, end)
            .await;

        assert!(matches!(result, Err(AnalysisError::InsufficientData(_))));
    }
}
