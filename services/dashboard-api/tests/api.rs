//! Router tests with an in-memory price feed

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use dashboard_api::handlers::ForecastResponse;
use dashboard_api::{router, AppState};
use data_retrieval::{PriceFeed, PriceQuote, SourceHealth};
use serde_json::Value;
use signal_engine::ForecastConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Fixed quotes keyed by ticker; anything else is absent
struct StubFeed {
    quotes: HashMap<&'static str, (f64, f64)>,
}

impl StubFeed {
    fn with(quotes: &[(&'static str, f64, f64)]) -> Arc<Self> {
        Arc::new(Self {
            quotes: quotes.iter().map(|(s, p, c)| (*s, (*p, *c))).collect(),
        })
    }
}

#[async_trait::async_trait]
impl PriceFeed for StubFeed {
    async fn lookup(&self, symbol: &str) -> Option<PriceQuote> {
        self.quotes.get(symbol).map(|(price, change)| PriceQuote {
            symbol: symbol.to_string(),
            price: *price,
            change_24h: *change,
            source: "stub".to_string(),
            timestamp: Utc::now(),
        })
    }

    async fn health(&self) -> Vec<SourceHealth> {
        vec![SourceHealth {
            source: "stub".to_string(),
            is_healthy: true,
            last_success: None,
            last_error: None,
            success_rate: 1.0,
            avg_latency_ms: 1,
        }]
    }
}

fn app(feed: Arc<StubFeed>) -> Router {
    router(Arc::new(AppState::new(feed, ForecastConfig::default())))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_buy_analysis_with_live_price() {
    let feed = StubFeed::with(&[("BTC", 68000.0, -1.5)]);
    let (status, body) = get_json(app(feed), "/analysis/buy/BTC").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["side"], "buy");
    assert_eq!(body["score"], 100);
    assert_eq!(body["status"], "perfect_time");
    assert_eq!(body["label"], "Perfect Time To Buy");
    assert_eq!(body["current_price"], 68000.0);
    assert_eq!(body["change_24h"], -1.5);
}

#[tokio::test]
async fn test_buy_analysis_without_price() {
    let (status, body) = get_json(app(StubFeed::with(&[])), "/analysis/buy/DOT").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 100);
    assert!(body.get("current_price").is_none());
    assert!(body.get("change_24h").is_none());
}

#[tokio::test]
async fn test_sell_analysis_preset_and_overrides() {
    let feed = StubFeed::with(&[("ETH", 3500.0, 0.8)]);

    let (status, body) = get_json(app(feed.clone()), "/analysis/sell/eth").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["side"], "sell");
    assert_eq!(body["score"], 100);
    assert_eq!(body["label"], "Perfect Time To Sell");
    assert_eq!(body["current_price"], 3500.0);

    // Neutral everything -> buy 38, sell 62
    let (_, body) = get_json(
        app(feed),
        "/analysis/sell/ETH?rsi=50&macd=neutral&fear_greed=50",
    )
    .await;
    assert_eq!(body["score"], 62);
    assert_eq!(body["status"], "better_to_wait");
}

#[tokio::test]
async fn test_analysis_rejects_unknown_macd() {
    let (status, body) =
        get_json(app(StubFeed::with(&[])), "/analysis/buy/BTC?macd=sideways").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("sideways"));
}

#[tokio::test]
async fn test_forecast_with_live_price_and_past_target() {
    let feed = StubFeed::with(&[("BTC", 68000.0, 2.0)]);
    let (status, body) = get_json(app(feed), "/forecast/BTC?target=2020-01-01").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price_source"], "live");
    assert_eq!(body["current_price"], 68000.0);
    assert_eq!(body["years"], 0.01);
    assert_eq!(body["secondary_currency"], "EUR");

    let scenarios = body["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), 3);
    assert_eq!(scenarios[0]["kind"], "conservative");
    assert_eq!(scenarios[1]["tag"], "MOST LIKELY");
    assert_eq!(scenarios[2]["name"], "Super Bullish");

    let prices: Vec<f64> = scenarios
        .iter()
        .map(|s| s["projected_price"].as_f64().unwrap())
        .collect();
    assert!(prices[0] > 68000.0);
    assert!(prices[0] <= prices[1] && prices[1] <= prices[2]);

    let eur = scenarios[1]["secondary_currency_price"].as_f64().unwrap();
    assert!((eur - prices[1] * 0.85).abs() < 1e-6);
}

#[tokio::test]
async fn test_forecast_falls_back_to_static_price() {
    let (_, body) = get_json(app(StubFeed::with(&[])), "/forecast/XRP?horizon=6m").await;
    assert_eq!(body["price_source"], "fallback");
    assert_eq!(body["current_price"], 1.5);
    assert!(body.get("change_24h").is_none());

    let years = body["years"].as_f64().unwrap();
    assert!(years > 0.4 && years < 0.6, "six months is ~0.5 years, got {}", years);

    let (_, body) = get_json(app(StubFeed::with(&[])), "/forecast/BTC?horizon=1m").await;
    assert_eq!(body["current_price"], 68000.0);
}

#[tokio::test]
async fn test_forecast_zero_quote_uses_fallback() {
    let feed = StubFeed::with(&[("BTC", 0.0, 0.0)]);
    let (_, body) = get_json(app(feed), "/forecast/BTC?horizon=3m").await;
    assert_eq!(body["price_source"], "fallback");
    assert_eq!(body["current_price"], 68000.0);
}

#[tokio::test]
async fn test_forecast_rejects_bad_horizon() {
    let (status, _) = get_json(app(StubFeed::with(&[])), "/forecast/BTC?horizon=2y").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(app(StubFeed::with(&[])), "/forecast/BTC?target=tomorrow").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forecast_rejects_unprojectable_target() {
    let feed = StubFeed::with(&[("BTC", 68000.0, 0.0)]);
    let (status, body) = get_json(app(feed.clone()), "/forecast/BTC?target=3300-01-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("3300-01-01"));

    // A long but representable horizon still projects
    let (status, body) = get_json(app(feed), "/forecast/BTC?target=2100-01-01").await;
    assert_eq!(status, StatusCode::OK);
    let parsed: ForecastResponse = serde_json::from_value(body).unwrap();
    assert!(parsed.scenarios.iter().all(|s| s.projected_price.is_finite()));
}

#[tokio::test]
async fn test_health_reports_sources() {
    let (status, body) = get_json(app(StubFeed::with(&[])), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sources"][0]["source"], "stub");
}
