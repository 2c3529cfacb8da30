use chrono::NaiveDate;
use series_core::{AnalysisError, CorrelationMatrix, DerivedSeries};
use std::collections::{BTreeMap, HashMap};

use crate::indicators::daily_return_column;

/// Pairwise Pearson correlation of daily returns, inner-joined on date.
///
/// Dates missing in any one series are dropped from all. Needs at least two
/// series and at least two overlapping trading dates; daily returns are
/// derived internally for series that do not carry the column yet.
pub fn compute_correlation(
    series: &HashMap<String, DerivedSeries>,
) -> Result<CorrelationMatrix, AnalysisError> {
    if series.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "correlation needs at least 2 series, got {}",
            series.len()
        )));
    }

    let mut tickers: Vec<String> = series.keys().cloned().collect();
    tickers.sort();

    let mut returns_by_date: Vec<BTreeMap<NaiveDate, f64>> = Vec::with_capacity(tickers.len());
    for ticker in &tickers {
        let s = &series[ticker];
        let daily = match &s.derived.daily_return {
            Some(column) => column.clone(),
            None => daily_return_column(s)?,
        };
        let mut by_date = BTreeMap::new();
        for (bar, value) in s.bars.iter().zip(daily.iter()) {
            if let Some(v) = value {
                by_date.insert(bar.date, *v);
            }
        }
        returns_by_date.push(by_date);
    }

    let joined: Vec<NaiveDate> = returns_by_date[0]
        .keys()
        .filter(|date| returns_by_date[1..].iter().all(|m| m.contains_key(*date)))
        .copied()
        .collect();

    if joined.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "correlation needs at least 2 overlapping dates, got {}",
            joined.len()
        )));
    }

    let columns: Vec<Vec<f64>> = returns_by_date
        .iter()
        .map(|by_date| joined.iter().map(|date| by_date[date]).collect())
        .collect();

    let k = tickers.len();
    let mut values = vec![vec![0.0; k]; k];
    for i in 0..k {
        values[i][i] = 1.0;
        for j in i + 1..k {
            let r = pearson(&tickers[i], &columns[i], &tickers[j], &columns[j])?;
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        tickers,
        values,
        overlapping_dates: joined.len(),
    })
}

fn pearson(ticker_a: &str, a: &[f64], ticker_b: &str, b: &[f64]) -> Result<f64, AnalysisError> {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_a = 0.0;
    let mut variance_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        variance_a += dx * dx;
        variance_b += dy * dy;
    }

    if variance_a == 0.0 {
        return Err(AnalysisError::DataIntegrity(format!(
            "{ticker_a}: daily returns have zero variance over the joined dates"
        )));
    }
    if variance_b == 0.0 {
        return Err(AnalysisError::DataIntegrity(format!(
            "{ticker_b}: daily returns have zero variance over the joined dates"
        )));
    }

    Ok((covariance / (variance_a * variance_b).sqrt()).clamp(-1.0, 1.0))
}
