pub mod display;
pub mod routes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::Duration;
use dashboard_orchestrator::{DashboardOrchestrator, SeriesCache, YahooNameResolver};
use serde::Serialize;
use series_core::AnalysisError;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use yahoo_client::YahooFinanceClient;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_CACHE_TTL_SECS: i64 = 300;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DashboardOrchestrator<YahooFinanceClient>>,
    pub search_client: YahooFinanceClient,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Analysis(AnalysisError),
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        AppError::Analysis(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Analysis(e) => {
                let status = match &e {
                    AnalysisError::DataIntegrity(_) | AnalysisError::InsufficientData(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    AnalysisError::Provider(_) => StatusCode::BAD_GATEWAY,
                };
                (status, e.to_string())
            }
        };

        let body = Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        });
        (status, body).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::dashboard_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    let bind = std::env::var("MARKETBOARD_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let ttl_secs: i64 = std::env::var("MARKETBOARD_CACHE_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CACHE_TTL_SECS);

    let client = YahooFinanceClient::new();
    let orchestrator = DashboardOrchestrator::new(
        client.clone(),
        SeriesCache::new(Duration::seconds(ttl_secs)),
        Box::new(YahooNameResolver::new(client.clone())),
    );
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        search_client: client,
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("marketboard listening on {}", bind);
    axum::serve(listener, app).await?;
    Ok(())
}
