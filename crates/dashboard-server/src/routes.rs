use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use dashboard_orchestrator::{AnalysisReport, IndicatorRequest, TickerFailure};
use serde::{Deserialize, Serialize};
use series_core::CorrelationMatrix;
use std::collections::BTreeMap;
use yahoo_client::TickerMatch;

use crate::{display, ApiResponse, AppError, AppState};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", get(analyze))
        .route("/api/correlation", get(correlation))
        .route("/api/search", get(search))
}

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("ok"))
}

#[derive(Deserialize)]
pub struct AnalyzeQuery {
    /// Comma-separated ticker list.
    pub tickers: String,
    pub start: String,
    pub end: String,
    /// Comma-separated moving-average windows; defaults to 5,20,60.
    #[serde(default)]
    pub windows: Option<String>,
    #[serde(default)]
    pub rsi: Option<bool>,
    #[serde(default)]
    pub bollinger: Option<bool>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub report: AnalysisReport,
    /// Last close per ticker, formatted in the listing's currency.
    pub price_labels: BTreeMap<String, String>,
}

async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeQuery>,
) -> Result<Json<ApiResponse<AnalyzeResponse>>, AppError> {
    let (tickers, start, end) = parse_range(&params.tickers, &params.start, &params.end)?;

    let request = IndicatorRequest {
        ma_windows: parse_windows(params.windows.as_deref())?,
        volatility_window: indicator_engine::DEFAULT_VOLATILITY_WINDOW,
        rsi_period: params
            .rsi
            .unwrap_or(false)
            .then_some(indicator_engine::DEFAULT_RSI_PERIOD),
        bollinger_window: params
            .bollinger
            .unwrap_or(false)
            .then_some(indicator_engine::DEFAULT_BOLLINGER_WINDOW),
    };

    let report = state.orchestrator.analyze(&tickers, start, end, &request).await;
    let price_labels = report
        .summaries
        .iter()
        .map(|s| {
            (
                s.ticker.clone(),
                display::format_price(s.last_close, &s.ticker),
            )
        })
        .collect();

    Ok(Json(ApiResponse::ok(AnalyzeResponse {
        report,
        price_labels,
    })))
}

#[derive(Deserialize)]
pub struct CorrelationQuery {
    pub tickers: String,
    pub start: String,
    pub end: String,
}

#[derive(Serialize)]
pub struct CorrelationResponse {
    pub matrix: CorrelationMatrix,
    pub failures: Vec<TickerFailure>,
}

async fn correlation(
    State(state): State<AppState>,
    Query(params): Query<CorrelationQuery>,
) -> Result<Json<ApiResponse<CorrelationResponse>>, AppError> {
    let (tickers, start, end) = parse_range(&params.tickers, &params.start, &params.end)?;

    let (matrix, failures) = state.orchestrator.correlation(&tickers, start, end).await?;
    Ok(Json(ApiResponse::ok(CorrelationResponse {
        matrix,
        failures,
    })))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<TickerMatch>>>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }
    let matches = state.search_client.search(query).await?;
    Ok(Json(ApiResponse::ok(matches)))
}

fn parse_range(
    tickers: &str,
    start: &str,
    end: &str,
) -> Result<(Vec<String>, NaiveDate, NaiveDate), AppError> {
    let start = parse_date(start, "start")?;
    let end = parse_date(end, "end")?;
    if end < start {
        return Err(AppError::BadRequest(
            "end must not precede start".to_string(),
        ));
    }

    let tickers: Vec<String> = tickers
        .split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tickers.is_empty() {
        return Err(AppError::BadRequest(
            "at least one ticker is required".to_string(),
        ));
    }

    Ok((tickers, start, end))
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("{field} must be YYYY-MM-DD, got {raw}")))
}

fn parse_windows(raw: Option<&str>) -> Result<Vec<usize>, AppError> {
    match raw {
        None => Ok(vec![5, 20, 60]),
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(|w| {
                w.parse::<usize>()
                    .map_err(|_| AppError::BadRequest(format!("invalid moving-average window: {w}")))
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_normalizes_tickers() {
        let (tickers, start, end) =
            parse_range(" aapl, msft ,,", "2024-01-02", "2024-06-28").unwrap();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
        assert!(start < end);
    }

    #[test]
    fn test_parse_range_rejects_inverted_dates() {
        let result = parse_range("AAPL", "2024-06-28", "2024-01-02");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_range_rejects_bad_dates() {
        let result = parse_range("AAPL", "01/02/2024", "2024-06-28");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_windows_defaults_and_rejects_garbage() {
        assert_eq!(parse_windows(None).unwrap(), vec![5, 20, 60]);
        assert_eq!(parse_windows(Some("5, 20")).unwrap(), vec![5, 20]);
        assert!(parse_windows(Some("5,abc")).is_err());
    }
}
