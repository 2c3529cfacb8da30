use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use series_core::{AnalysisError, Bar, MarketDataProvider, PriceSeries};

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
}

/// One hit from the ticker search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerMatch {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Fetch daily OHLCV bars for an inclusive date range.
    ///
    /// Unknown symbols and ranges without trading days resolve to an empty
    /// series; only transport and protocol failures are errors.
    pub async fn fetch_daily_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, AnalysisError> {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // Yahoo treats period2 as exclusive
        let period2 = (end + Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let url = format!("{}/{}", CHART_URL, ticker);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AnalysisError::Provider(e.to_string()))?;

        if response.status().as_u16() == 404 {
            // Yahoo answers 404 for symbols it does not know
            tracing::debug!("no chart data for {}", ticker);
            return Ok(PriceSeries::new(ticker, Vec::new()));
        }
        if !response.status().is_success() {
            return Err(AnalysisError::Provider(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::Provider(e.to_string()))?;
        Ok(PriceSeries::new(ticker, parse_chart_bars(&json)?))
    }

    /// Search tickers by company name or symbol fragment.
    pub async fn search(&self, query: &str) -> Result<Vec<TickerMatch>, AnalysisError> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", query),
                ("quotesCount", "10"),
                ("newsCount", "0"),
                ("enableFuzzyQuery", "true"),
            ])
            .send()
            .await
            .map_err(|e| AnalysisError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::Provider(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::Provider(e.to_string()))?;
        Ok(parse_search_matches(&json))
    }

    /// Best-known display name for a symbol, if the search index has one.
    pub async fn lookup_short_name(&self, ticker: &str) -> Result<Option<String>, AnalysisError> {
        let matches = self.search(ticker).await?;
        Ok(matches
            .into_iter()
            .find(|m| m.symbol.eq_ignore_ascii_case(ticker))
            .map(|m| m.name))
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, AnalysisError> {
        self.fetch_daily_bars(ticker, start, end).await
    }
}

fn parse_chart_bars(json: &Value) -> Result<Vec<Bar>, AnalysisError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| AnalysisError::Provider("malformed chart response".to_string()))?;

    let result = match chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
    {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };

    // A known symbol with no trading days in range comes back without timestamps
    let timestamps = match result.get("timestamp").and_then(|v| v.as_array()) {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let quote = result
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::Provider("chart response missing quote data".to_string()))?;

    let opens = quote_field(quote, "open")?;
    let highs = quote_field(quote, "high")?;
    let lows = quote_field(quote, "low")?;
    let closes = quote_field(quote, "close")?;
    let volumes = quote_field(quote, "volume")?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for i in 0..timestamps.len() {
        // Yahoo emits null rows for halted sessions; skip them
        if let (Some(ts), Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            timestamps[i].as_i64(),
            opens.get(i).and_then(|v| v.as_f64()),
            highs.get(i).and_then(|v| v.as_f64()),
            lows.get(i).and_then(|v| v.as_f64()),
            closes.get(i).and_then(|v| v.as_f64()),
            volumes.get(i).and_then(|v| v.as_f64()),
        ) {
            let date = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| AnalysisError::Provider("invalid timestamp".to_string()))?
                .date_naive();
            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }
    }
    Ok(bars)
}

fn quote_field<'a>(quote: &'a Value, name: &str) -> Result<&'a Vec<Value>, AnalysisError> {
    quote
        .get(name)
        .and_then(|v| v.as_array())
        .ok_or_else(|| AnalysisError::Provider(format!("chart response missing {name} prices")))
}

fn parse_search_matches(json: &Value) -> Vec<TickerMatch> {
    let mut matches: Vec<TickerMatch> = Vec::new();
    if let Some(quotes) = json.get("quotes").and_then(|v| v.as_array()) {
        for quote in quotes {
            let quote_type = quote
                .get("quoteType")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if quote_type != "EQUITY" && quote_type != "ETF" {
                continue;
            }
            let symbol = match quote.get("symbol").and_then(|v| v.as_str()) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => continue,
            };
            if matches.iter().any(|m| m.symbol == symbol) {
                continue;
            }
            let name = quote
                .get("shortname")
                .or_else(|| quote.get("longname"))
                .and_then(|v| v.as_str())
                .unwrap_or(symbol.as_str())
                .to_string();
            let exchange = quote
                .get("exchDisp")
                .or_else(|| quote.get("exchange"))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            matches.push(TickerMatch {
                symbol,
                name,
                exchange,
            });
        }
    }
    matches.truncate(10);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chart_bars_skips_null_rows() {
        let payload = json!({
            "chart": {
                "result": [{
                    "timestamp": [1704153600i64, 1704240000i64, 1704326400i64],
                    "indicators": {
                        "quote": [{
                            "open":   [184.2, null, 182.1],
                            "high":   [185.9, null, 183.0],
                            "low":    [183.4, null, 180.9],
                            "close":  [185.6, null, 181.9],
                            "volume": [82488700i64, null, 58414500i64]
                        }]
                    }
                }],
                "error": null
            }
        });

        let bars = parse_chart_bars(&payload).unwrap();
        assert_eq!(bars.len(), 2);
        assert!((bars[0].close - 185.6).abs() < 1e-9);
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn test_parse_chart_bars_empty_result_is_empty_series() {
        let payload = json!({
            "chart": { "result": null, "error": { "code": "Not Found" } }
        });
        assert!(parse_chart_bars(&payload).unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart_bars_missing_timestamps_is_empty_series() {
        let payload = json!({
            "chart": { "result": [{ "meta": {} }], "error": null }
        });
        assert!(parse_chart_bars(&payload).unwrap().is_empty());
    }

    #[test]
    fn test_parse_search_filters_and_dedupes() {
        let payload = json!({
            "quotes": [
                { "symbol": "AAPL", "shortname": "Apple Inc.", "exchDisp": "NASDAQ", "quoteType": "EQUITY" },
                { "symbol": "AAPL", "shortname": "Apple Inc.", "exchDisp": "NASDAQ", "quoteType": "EQUITY" },
                { "symbol": "AAPL240621C00100000", "shortname": "AAPL call", "quoteType": "OPTION" },
                { "symbol": "QQQ", "longname": "Invesco QQQ Trust", "quoteType": "ETF" }
            ]
        });

        let matches = parse_search_matches(&payload);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].symbol, "AAPL");
        assert_eq!(matches[1].name, "Invesco QQQ Trust");
    }
}
