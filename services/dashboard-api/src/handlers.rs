use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use data_retrieval::{fallback_price, normalize_ticker, SourceHealth};
use serde::{Deserialize, Serialize};
use signal_engine::{AnalysisResult, ForecastHorizon, MacdSignal, Scenario, ScoringFactors, Side};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Indicator overrides for the analysis endpoints
#[derive(Debug, Default, Deserialize)]
pub struct IndicatorQuery {
    pub rsi: Option<f64>,
    pub macd: Option<String>,
    pub fear_greed: Option<f64>,
}

/// Indicator snapshot used when the caller supplies none. Buy leans
/// oversold with extreme fear, sell leans overbought with extreme greed.
pub fn preset_factors(side: Side, symbol: &str) -> ScoringFactors {
    match side {
        Side::Buy => {
            let rsi = if symbol == "ETH" { 32.0 } else { 28.0 };
            ScoringFactors::new(rsi, MacdSignal::Bullish, 20.0)
        }
        Side::Sell => ScoringFactors::new(78.0, MacdSignal::Bearish, 85.0),
    }
}

fn resolve_factors(side: Side, symbol: &str, query: &IndicatorQuery) -> Result<ScoringFactors> {
    let preset = preset_factors(side, symbol);
    let macd = match query.macd.as_deref() {
        Some(raw) => raw.parse::<MacdSignal>()?,
        None => preset.macd,
    };

    Ok(ScoringFactors::new(
        query.rsi.unwrap_or(preset.rsi),
        macd,
        query.fear_greed.unwrap_or(preset.fear_greed_index),
    ))
}

fn require_symbol(raw: &str) -> Result<String> {
    let symbol = normalize_ticker(raw);
    if symbol.is_empty() {
        return Err(AppError::BadRequest("Ticker symbol is required".to_string()));
    }
    Ok(symbol)
}

async fn analyze(
    state: &AppState,
    side: Side,
    raw_symbol: &str,
    query: &IndicatorQuery,
) -> Result<AnalysisResult> {
    let symbol = require_symbol(raw_symbol)?;
    let factors = resolve_factors(side, &symbol, query)?;

    let mut result = match side {
        Side::Buy => state.score_engine.buy_score(&factors),
        Side::Sell => state.score_engine.sell_score(&factors),
    };

    // A missing quote only leaves the price fields empty
    match state.price_feed.lookup(&symbol).await {
        Some(quote) => result = result.with_price(quote.price, quote.change_24h),
        None => warn!("No live price for {}, returning analysis without it", symbol),
    }

    info!(
        "{:?} analysis for {}: score {} ({})",
        side, symbol, result.score, result.label
    );
    Ok(result)
}

/// GET /analysis/buy/{symbol}
pub async fn get_buy_analysis(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<IndicatorQuery>,
) -> Result<Json<AnalysisResult>> {
    analyze(&state, Side::Buy, &symbol, &query).await.map(Json)
}

/// GET /analysis/sell/{symbol}
pub async fn get_sell_analysis(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<IndicatorQuery>,
) -> Result<Json<AnalysisResult>> {
    analyze(&state, Side::Sell, &symbol, &query).await.map(Json)
}

/// Forecast horizon selection; at most one of the two
#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    /// Target date, YYYY-MM-DD
    pub target: Option<String>,
    /// Shortcut code: 1m, 3m or 6m
    pub horizon: Option<String>,
}

impl ForecastQuery {
    fn horizon(&self, default: ForecastHorizon) -> Result<ForecastHorizon> {
        match (self.target.as_deref(), self.horizon.as_deref()) {
            (Some(_), Some(_)) => Err(AppError::BadRequest(
                "Use either target or horizon, not both".to_string(),
            )),
            (Some(date), None) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(ForecastHorizon::Until)
                .map_err(|e| AppError::BadRequest(format!("Invalid target date '{}': {}", date, e))),
            (None, Some(code)) => ForecastHorizon::from_code(code).ok_or_else(|| {
                AppError::BadRequest(format!("Unknown horizon '{}', expected 1m, 3m or 6m", code))
            }),
            (None, None) => Ok(default),
        }
    }
}

/// Where the forecast's base price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceOrigin {
    Live,
    Fallback,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub symbol: String,
    pub current_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    pub price_source: PriceOrigin,
    pub target: DateTime<Utc>,
    pub years: f64,
    pub base_currency: String,
    pub secondary_currency: String,
    pub scenarios: [Scenario; 3],
}

/// GET /forecast/{symbol}
pub async fn get_forecast(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>> {
    let symbol = require_symbol(&symbol)?;
    let config = state.forecast_engine.config();
    let horizon = query.horizon(config.default_horizon())?;

    // Non-positive quotes are treated as missing, the engine projects whatever it gets
    let (current_price, change_24h, price_source) = match state.price_feed.lookup(&symbol).await {
        Some(quote) if quote.price > 0.0 => (quote.price, Some(quote.change_24h), PriceOrigin::Live),
        _ => {
            warn!("Forecast for {} falls back to static price", symbol);
            (fallback_price(&symbol), None, PriceOrigin::Fallback)
        }
    };

    let now = Utc::now();
    let target = horizon.resolve(now);
    let scenarios = state
        .forecast_engine
        .compute_scenarios(current_price, target, now);

    // Far horizons compound past f64 range
    if scenarios
        .iter()
        .any(|s| !s.projected_price.is_finite() || !s.secondary_currency_price.is_finite())
    {
        return Err(AppError::BadRequest(format!(
            "Target {} is too far out to project",
            target.date_naive()
        )));
    }

    info!(
        "Forecast for {} from {} ({:?}) to {}",
        symbol, current_price, price_source, target
    );

    Ok(Json(ForecastResponse {
        symbol,
        current_price,
        change_24h,
        price_source,
        target,
        years: signal_engine::horizon_years(target, now),
        base_currency: config.base_currency.clone(),
        secondary_currency: config.secondary_currency.clone(),
        scenarios,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sources: Vec<SourceHealth>,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sources = state.price_feed.health().await;
    let status = if sources.is_empty() || sources.iter().any(|s| s.is_healthy) {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_factors() {
        let buy = preset_factors(Side::Buy, "BTC");
        assert_eq!(buy.rsi, 28.0);
        assert_eq!(buy.macd, MacdSignal::Bullish);

        let eth = preset_factors(Side::Buy, "ETH");
        assert_eq!(eth.rsi, 32.0);

        let sell = preset_factors(Side::Sell, "BTC");
        assert_eq!(sell.fear_greed_index, 85.0);
    }

    #[test]
    fn test_query_overrides_preset() {
        let query = IndicatorQuery {
            rsi: Some(50.0),
            macd: Some("neutral".to_string()),
            fear_greed: None,
        };
        let factors = resolve_factors(Side::Buy, "BTC", &query).unwrap();
        assert_eq!(factors.rsi, 50.0);
        assert_eq!(factors.macd, MacdSignal::Neutral);
        assert_eq!(factors.fear_greed_index, 20.0);

        let bad = IndicatorQuery {
            macd: Some("up".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_factors(Side::Buy, "BTC", &bad),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_forecast_query_horizon() {
        let default = ForecastHorizon::SixMonths;

        let q = ForecastQuery::default();
        assert_eq!(q.horizon(default).unwrap(), default);

        let q = ForecastQuery {
            target: Some("2027-06-30".to_string()),
            horizon: None,
        };
        assert_eq!(
            q.horizon(default).unwrap(),
            ForecastHorizon::Until(NaiveDate::from_ymd_opt(2027, 6, 30).unwrap())
        );

        let q = ForecastQuery {
            target: None,
            horizon: Some("1m".to_string()),
        };
        assert_eq!(q.horizon(default).unwrap(), ForecastHorizon::OneMonth);

        let q = ForecastQuery {
            target: Some("30/06/2027".to_string()),
            horizon: None,
        };
        assert!(q.horizon(default).is_err());

        let q = ForecastQuery {
            target: Some("2027-06-30".to_string()),
            horizon: Some("3m".to_string()),
        };
        assert!(q.horizon(default).is_err());
    }
}
