//! dashboard-server: HTTP surface for the marketboard stock dashboard.
//!
//! Fetches daily bars from Yahoo Finance, derives indicator columns, and
//! serves them as plain JSON for a browser frontend.
//!
//! Configuration via environment (or .env):
//!   MARKETBOARD_BIND            listen address, default 0.0.0.0:8080
//!   MARKETBOARD_CACHE_TTL_SECS  provider cache TTL, default 300

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashboard_server=info,yahoo_client=warn".into()),
        )
        .init();

    dashboard_server::run_server().await
}
