use dashboard_api::{router, AppState, Settings};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Dashboard API...");

    let settings = Settings::load()?;
    let state = Arc::new(AppState::from_settings(&settings)?);
    info!(
        "✓ Forecast engine: {} -> {} at {}",
        settings.forecast.base_currency,
        settings.forecast.secondary_currency,
        settings.forecast.exchange_rate
    );

    let app = router(state);

    let addr = settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Dashboard API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
