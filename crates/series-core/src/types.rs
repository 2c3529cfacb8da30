use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One trading day's OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered daily bars for one ticker over an inclusive date range.
///
/// May be empty: an unknown ticker or a range with no trading days is a
/// valid state, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// A derived column aligned index-for-index with the bars of its series.
/// `None` marks the warm-up span where the statistic is not yet defined.
pub type Column = Vec<Option<f64>>;

/// One RSI observation. The oscillator is undefined when the average loss
/// over the trailing window is exactly zero (the ratio has no denominator);
/// that state is reported explicitly instead of being coerced to 100 or NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RsiValue {
    Value(f64),
    Undefined,
}

impl RsiValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RsiValue::Value(v) => Some(*v),
            RsiValue::Undefined => None,
        }
    }
}

/// A rolling statistic with the window it was computed over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingColumn {
    pub window: usize,
    pub values: Column,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiColumn {
    pub period: usize,
    pub values: Vec<Option<RsiValue>>,
}

/// Bollinger bands over a single window: middle is the simple moving
/// average, upper/lower are offset by twice the rolling standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerColumns {
    pub window: usize,
    pub middle: Column,
    pub upper: Column,
    pub lower: Column,
}

/// Optional derived columns. Every field starts absent; indicator
/// operations fill in the ones they own and leave the rest untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    /// Percentage return versus the first close, defined at every index.
    pub cumulative_return: Option<Vec<f64>>,
    /// Day-over-day percentage return, absent at index 0.
    pub daily_return: Option<Column>,
    /// Simple moving averages keyed by window.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub moving_averages: BTreeMap<usize, Column>,
    /// Rolling standard deviation of the daily returns.
    pub volatility: Option<RollingColumn>,
    pub rsi: Option<RsiColumn>,
    pub bollinger: Option<BollingerColumns>,
}

/// A PriceSeries augmented with derived columns. Produced on demand from a
/// fresh PriceSeries and never mutated afterwards; re-deriving with other
/// parameters builds a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedSeries {
    pub ticker: String,
    pub bars: Vec<Bar>,
    pub derived: Derived,
}

impl From<PriceSeries> for DerivedSeries {
    fn from(series: PriceSeries) -> Self {
        Self {
            ticker: series.ticker,
            bars: series.bars,
            derived: Derived::default(),
        }
    }
}

impl DerivedSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// Pairwise Pearson correlation of daily returns, inner-joined on date.
/// Symmetric with a unit diagonal; values ordered by the `tickers` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub values: Vec<Vec<f64>>,
    /// Number of overlapping trading dates the matrix was computed from.
    pub overlapping_dates: usize,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        Some(self.values[i][j])
    }
}
