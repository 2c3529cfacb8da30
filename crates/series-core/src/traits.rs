use crate::{AnalysisError, PriceSeries};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait for historical market data providers.
///
/// An unknown or delisted ticker, or a range with no trading days, resolves
/// to an empty series rather than an error; `Err` is reserved for transport
/// and protocol failures.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, AnalysisError>;
}

/// Trait for ticker display-name lookup.
///
/// Total: implementations fall back to echoing the ticker when no better
/// name is known, so callers never deal with a missing name.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve_display_name(&self, ticker: &str) -> String;
}
