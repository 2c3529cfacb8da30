use series_core::{
    AnalysisError, BollingerColumns, Column, DerivedSeries, RollingColumn, RsiColumn, RsiValue,
};
use statrs::statistics::Statistics;

pub const DEFAULT_VOLATILITY_WINDOW: usize = 20;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_BOLLINGER_WINDOW: usize = 20;

/// Day-over-day percentage returns, aligned to the bars; absent at index 0.
///
/// Shared precondition of the rolling statistics: every operation that needs
/// daily returns derives them through here instead of assuming a prior call
/// already attached the column.
pub(crate) fn daily_return_column(series: &DerivedSeries) -> Result<Column, AnalysisError> {
    let closes = series.closes();
    let mut column: Column = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return Ok(column);
    }

    column.push(None);
    for i in 1..closes.len() {
        let prev = closes[i - 1];
        if prev == 0.0 {
            return Err(AnalysisError::DataIntegrity(format!(
                "{}: close at index {} is zero, daily return is undefined",
                series.ticker,
                i - 1
            )));
        }
        column.push(Some((closes[i] - prev) / prev * 100.0));
    }
    Ok(column)
}

/// Attach cumulative and daily percentage returns.
///
/// An empty series passes through unchanged. A zero close where division
/// requires a non-zero denominator is a data-integrity failure, never a
/// silent infinity.
pub fn compute_returns(mut series: DerivedSeries) -> Result<DerivedSeries, AnalysisError> {
    if series.is_empty() {
        return Ok(series);
    }

    let daily = daily_return_column(&series)?;
    let closes = series.closes();
    let first = closes[0];
    if first == 0.0 {
        return Err(AnalysisError::DataIntegrity(format!(
            "{}: first close is zero, cumulative return is undefined",
            series.ticker
        )));
    }

    series.derived.cumulative_return =
        Some(closes.iter().map(|c| (c - first) / first * 100.0).collect());
    series.derived.daily_return = Some(daily);
    Ok(series)
}

/// Attach a simple moving average column per requested window.
///
/// Windows larger than the series (and the degenerate zero window) are
/// silently skipped so a short-history ticker never fails a multi-ticker
/// request. Duplicate windows collapse to one column.
pub fn compute_moving_averages(mut series: DerivedSeries, windows: &[usize]) -> DerivedSeries {
    let closes = series.closes();
    for &window in windows {
        if window == 0 || window > closes.len() {
            continue;
        }
        series
            .derived
            .moving_averages
            .insert(window, rolling_mean(&closes, window));
    }
    series
}

/// Attach the rolling sample standard deviation of the daily returns.
///
/// Defined from index `window` onward: the window needs `window` daily-return
/// samples, and those only start at index 1. Windows the series cannot
/// support produce no column.
pub fn compute_volatility(
    mut series: DerivedSeries,
    window: usize,
) -> Result<DerivedSeries, AnalysisError> {
    let daily = match &series.derived.daily_return {
        Some(column) => column.clone(),
        None => daily_return_column(&series)?,
    };

    // A sample standard deviation needs two observations.
    if window < 2 || series.len() < window + 1 {
        return Ok(series);
    }

    let mut values: Column = vec![None; window];
    for i in window..series.len() {
        let sample: Vec<f64> = daily[i + 1 - window..=i].iter().flatten().copied().collect();
        values.push(Some(sample.as_slice().std_dev()));
    }
    series.derived.volatility = Some(RollingColumn { window, values });
    Ok(series)
}

/// Attach the Relative Strength Index over simple rolling means of gains
/// and losses.
///
/// Absent for the first `period` indices. When the average loss over the
/// trailing window is exactly zero the ratio has no denominator and the
/// observation is reported as `RsiValue::Undefined` rather than 100 or NaN.
pub fn compute_rsi(mut series: DerivedSeries, period: usize) -> DerivedSeries {
    let n = series.len();
    if period == 0 || n <= period {
        return series;
    }

    let closes = series.closes();
    let mut gains = Vec::with_capacity(n - 1);
    let mut losses = Vec::with_capacity(n - 1);
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let mut values: Vec<Option<RsiValue>> = vec![None; period];
    for i in period..n {
        // Deltas for bars i-period+1..=i live at gains[i-period..i].
        let avg_gain = gains[i - period..i].mean();
        let avg_loss = losses[i - period..i].mean();

        let value = if avg_loss == 0.0 {
            RsiValue::Undefined
        } else {
            let rs = avg_gain / avg_loss;
            RsiValue::Value(100.0 - 100.0 / (1.0 + rs))
        };
        values.push(Some(value));
    }

    series.derived.rsi = Some(RsiColumn { period, values });
    series
}

/// Attach Bollinger bands: middle is the moving average over `window`,
/// upper/lower offset by twice the rolling sample standard deviation of the
/// close over the same window.
///
/// When the series cannot support the window, all three bands stay absent,
/// consistent with the moving-average skip rule.
pub fn compute_bollinger_bands(mut series: DerivedSeries, window: usize) -> DerivedSeries {
    let closes = series.closes();
    if window < 2 || window > closes.len() {
        return series;
    }

    let mut middle: Column = vec![None; window - 1];
    let mut upper: Column = vec![None; window - 1];
    let mut lower: Column = vec![None; window - 1];
    for i in window - 1..closes.len() {
        let slice = &closes[i + 1 - window..=i];
        let mean = slice.mean();
        let sigma = slice.std_dev();
        middle.push(Some(mean));
        upper.push(Some(mean + 2.0 * sigma));
        lower.push(Some(mean - 2.0 * sigma));
    }

    series.derived.bollinger = Some(BollingerColumns {
        window,
        middle,
        upper,
        lower,
    });
    series
}

fn rolling_mean(data: &[f64], window: usize) -> Column {
    let mut column: Column = vec![None; window - 1];
    for i in window - 1..data.len() {
        column.push(Some(data[i + 1 - window..=i].mean()));
    }
    column
}
