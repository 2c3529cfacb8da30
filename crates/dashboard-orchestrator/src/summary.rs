use serde::{Deserialize, Serialize};
use series_core::DerivedSeries;
use statrs::statistics::Statistics;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Plain facts about one analyzed ticker, handed to the narrative generator.
/// No formatting and no prompt text; that belongs to the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSummary {
    pub ticker: String,
    pub display_name: String,
    pub last_close: f64,
    pub period_return_pct: f64,
    pub period_high: f64,
    pub period_low: f64,
}

/// Summary block for a non-empty series; empty series have nothing to say.
pub fn build_summary(series: &DerivedSeries, display_name: &str) -> Option<TickerSummary> {
    let first = series.bars.first()?;
    let last = series.bars.last()?;

    let period_return_pct = match &series.derived.cumulative_return {
        Some(column) => *column.last()?,
        None if first.close != 0.0 => (last.close - first.close) / first.close * 100.0,
        None => return None,
    };

    let period_high = series
        .bars
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let period_low = series
        .bars
        .iter()
        .map(|b| b.low)
        .fold(f64::INFINITY, f64::min);

    Some(TickerSummary {
        ticker: series.ticker.clone(),
        display_name: display_name.to_string(),
        last_close: last.close,
        period_return_pct,
        period_high,
        period_low,
    })
}

/// Descriptive statistics for the dashboard's detail table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesStats {
    pub ticker: String,
    pub first_close: f64,
    pub last_close: f64,
    pub mean_daily_return_pct: f64,
    /// Daily-return standard deviation scaled by sqrt(252).
    pub annualized_volatility_pct: f64,
    pub mean_volume: f64,
}

/// Needs at least two daily-return samples; shorter series have no
/// meaningful dispersion to report.
pub fn build_stats(series: &DerivedSeries) -> Option<SeriesStats> {
    let daily: Vec<f64> = series
        .derived
        .daily_return
        .as_ref()?
        .iter()
        .flatten()
        .copied()
        .collect();
    if daily.len() < 2 {
        return None;
    }

    let mean_volume = series.bars.iter().map(|b| b.volume).sum::<f64>() / series.len() as f64;

    Some(SeriesStats {
        ticker: series.ticker.clone(),
        first_close: series.bars.first()?.close,
        last_close: series.bars.last()?.close,
        mean_daily_return_pct: daily.as_slice().mean(),
        annualized_volatility_pct: daily.as_slice().std_dev() * TRADING_DAYS_PER_YEAR.sqrt(),
        mean_volume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use indicator_engine::compute_returns;
    use series_core::{Bar, PriceSeries};

    fn series(closes: &[f64]) -> DerivedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 2.0,
                low: (close - 2.0).max(0.0),
                close,
                volume: 500_000.0,
            })
            .collect();
        PriceSeries::new("AAPL", bars).into()
    }

    #[test]
    fn test_summary_of_derived_series() {
        let derived = compute_returns(series(&[100.0, 110.0, 99.0, 99.0])).unwrap();
        let summary = build_summary(&derived, "Apple").unwrap();

        assert_eq!(summary.display_name, "Apple");
        assert!((summary.last_close - 99.0).abs() < 1e-9);
        assert!((summary.period_return_pct + 1.0).abs() < 1e-9);
        assert!((summary.period_high - 112.0).abs() < 1e-9);
        assert!((summary.period_low - 97.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_without_returns_column() {
        let summary = build_summary(&series(&[100.0, 110.0]), "Apple").unwrap();
        assert!((summary.period_return_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series_has_no_summary() {
        assert!(build_summary(&series(&[]), "Apple").is_none());
    }

    #[test]
    fn test_stats_values() {
        let derived = compute_returns(series(&[100.0, 110.0, 99.0, 99.0])).unwrap();
        let stats = build_stats(&derived).unwrap();

        assert!((stats.mean_daily_return_pct - 0.0).abs() < 1e-9);
        // sample std of [10, -10, 0] is 10
        assert!((stats.annualized_volatility_pct - 10.0 * 252.0_f64.sqrt()).abs() < 1e-9);
        assert!((stats.mean_volume - 500_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_need_two_daily_samples() {
        let derived = compute_returns(series(&[100.0, 110.0])).unwrap();
        assert!(build_stats(&derived).is_none());
    }
}
