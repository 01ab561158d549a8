//! Signal engine - conviction scoring and price forecasting
//!
//! Two pure, synchronous components sit behind this crate:
//! the [`ScoreEngine`] turning a handful of indicators into a 0-100
//! conviction score, and the [`ForecastEngine`] projecting compounded
//! price scenarios over a time horizon. Neither performs I/O; live
//! prices are supplied by the caller.

pub mod factors;
pub mod forecast;
pub mod scoring;

// Re-export main types for convenience
pub use factors::{MacdSignal, MarketSentiment, ScoringFactors};
pub use forecast::{
    horizon_years, ForecastConfig, ForecastEngine, ForecastHorizon, Scenario, ScenarioKind,
};
pub use scoring::{
    compute_buy_score, compute_sell_score, AnalysisResult, ScoreEngine, Side, Status, Tone,
};
