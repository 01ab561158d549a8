//! Conviction scoring - output of the score engine

use crate::factors::ScoringFactors;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lowest raw score the affine map expects
const RAW_FLOOR: f64 = -50.0;
/// Width of the raw range mapped onto 0-100 (-50 to 80)
const RAW_SPAN: f64 = 130.0;

/// Scores strictly above this are a strong signal
pub const STRONG_THRESHOLD: u8 = 70;
/// Scores strictly below this are a weak signal
pub const WEAK_THRESHOLD: u8 = 30;

/// Which way the score is framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

/// Score category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Score below 30
    NotAGoodTime,
    /// Score in 30..=70
    BetterToWait,
    /// Score above 70
    PerfectTime,
}

/// Presentation-neutral category for a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Caution,
    Negative,
}

impl Status {
    /// Bands are strict on both ends, so 30 and 70 are `BetterToWait`.
    pub fn from_score(score: u8) -> Self {
        if score > STRONG_THRESHOLD {
            Status::PerfectTime
        } else if score < WEAK_THRESHOLD {
            Status::NotAGoodTime
        } else {
            Status::BetterToWait
        }
    }

    pub fn label(&self, side: Side) -> &'static str {
        match (self, side) {
            (Status::PerfectTime, Side::Buy) => "Perfect Time To Buy",
            (Status::PerfectTime, Side::Sell) => "Perfect Time To Sell",
            (Status::BetterToWait, _) => "Better to Wait",
            (Status::NotAGoodTime, _) => "Not a Good Time",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Status::PerfectTime => Tone::Positive,
            Status::BetterToWait => Tone::Caution,
            Status::NotAGoodTime => Tone::Negative,
        }
    }

    pub fn recommendation(&self, side: Side) -> &'static str {
        match (side, self) {
            (Side::Buy, Status::PerfectTime) => {
                "Strong confluence across multiple indicators suggests a high-probability entry point."
            }
            (Side::Buy, Status::BetterToWait) => {
                "Technical indicators are mixed. It might be better to wait for a clearer trend."
            }
            (Side::Buy, Status::NotAGoodTime) => {
                "Strong bearish signals detected. Risk level is currently high."
            }
            (Side::Sell, Status::PerfectTime) => {
                "Indicators show overbought conditions and bearish crossovers. Good time to take profits."
            }
            (Side::Sell, Status::BetterToWait) => {
                "Current conditions do not show a strong exit signal."
            }
            (Side::Sell, Status::NotAGoodTime) => {
                "Asset is showing strong bullish momentum. Selling now might be premature."
            }
        }
    }
}

/// Scored analysis for one side of the market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub side: Side,
    pub score: u8,
    pub status: Status,
    pub label: String,
    pub tone: Tone,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
}

impl AnalysisResult {
    /// Build a result for `score`, categorised on the given side
    pub fn new(side: Side, score: u8) -> Self {
        let score = score.min(100);
        let status = Status::from_score(score);

        Self {
            side,
            score,
            status,
            label: status.label(side).to_string(),
            tone: status.tone(),
            recommendation: status.recommendation(side).to_string(),
            current_price: None,
            change_24h: None,
        }
    }

    pub fn with_price(mut self, price: f64, change_24h: f64) -> Self {
        self.current_price = Some(price);
        self.change_24h = Some(change_24h);
        self
    }

    pub fn is_actionable(&self) -> bool {
        self.status == Status::PerfectTime
    }
}

/// Map a raw additive score onto 0-100
fn rescale(raw: f64) -> u8 {
    let scaled = ((raw - RAW_FLOOR) / RAW_SPAN) * 100.0;
    // NaN falls through clamp, treat it as the bottom of the range
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 100.0).round() as u8
}

/// Score engine - stateless, safe to share across threads
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEngine;

impl ScoreEngine {
    pub fn new() -> Self {
        Self
    }

    /// Buy conviction for the given indicators
    pub fn buy_score(&self, factors: &ScoringFactors) -> AnalysisResult {
        let raw = factors.raw_score();
        let score = rescale(raw);
        debug!(
            rsi = factors.rsi,
            macd = %factors.macd,
            fear_greed = factors.fear_greed_index,
            raw,
            score,
            "Computed buy score"
        );
        AnalysisResult::new(Side::Buy, score)
    }

    /// Sell conviction, the complement of the buy score
    pub fn sell_score(&self, factors: &ScoringFactors) -> AnalysisResult {
        let buy = self.buy_score(factors);
        AnalysisResult::new(Side::Sell, 100 - buy.score)
    }
}

pub fn compute_buy_score(factors: &ScoringFactors) -> AnalysisResult {
    ScoreEngine.buy_score(factors)
}

pub fn compute_sell_score(factors: &ScoringFactors) -> AnalysisResult {
    ScoreEngine.sell_score(factors)
}
