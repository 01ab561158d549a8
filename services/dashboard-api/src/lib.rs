//! Dashboard API - HTTP surface for buy/sell analysis and price forecasts
//!
//! Scoring and forecasting are delegated to `signal-engine`; live prices
//! come from a `data-retrieval` price feed. A failed price lookup never
//! fails a request.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::Settings;
pub use error::AppError;
pub use state::AppState;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the service router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analysis/buy/{symbol}", get(handlers::get_buy_analysis))
        .route("/analysis/sell/{symbol}", get(handlers::get_sell_analysis))
        .route("/forecast/{symbol}", get(handlers::get_forecast))
        .route("/health", get(handlers::health_check))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
