//! Scoring inputs
//!
//! Indicator values are taken as-is. Nothing here rejects an RSI of 140
//! or a negative Fear & Greed reading: the scoring bands are plain
//! comparisons, so out-of-range values simply land in the nearest band
//! and NaN lands in none.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RSI below this is oversold
pub const RSI_OVERSOLD: f64 = 30.0;
/// RSI above this is overbought
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// Fear & Greed below this is extreme fear
pub const EXTREME_FEAR: f64 = 25.0;
/// Fear & Greed above this is extreme greed
pub const EXTREME_GREED: f64 = 75.0;

/// Categorical MACD crossover state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdSignal {
    Bullish,
    Bearish,
    Neutral,
}

impl MacdSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            MacdSignal::Bullish => "bullish",
            MacdSignal::Bearish => "bearish",
            MacdSignal::Neutral => "neutral",
        }
    }
}

impl fmt::Display for MacdSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised MACD state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown MACD signal '{0}', expected bullish, bearish or neutral")]
pub struct ParseMacdError(pub String);

impl FromStr for MacdSignal {
    type Err = ParseMacdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Ok(MacdSignal::Bullish),
            "bearish" => Ok(MacdSignal::Bearish),
            "neutral" => Ok(MacdSignal::Neutral),
            _ => Err(ParseMacdError(s.to_string())),
        }
    }
}

/// Market mood bucket for a Fear & Greed reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSentiment {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl MarketSentiment {
    /// Bucket an index value. The extreme bands share their cutoffs with
    /// the sentiment contribution in the score.
    pub fn from_index(index: f64) -> Self {
        if index < EXTREME_FEAR {
            MarketSentiment::ExtremeFear
        } else if index < 45.0 {
            MarketSentiment::Fear
        } else if index <= 55.0 {
            MarketSentiment::Neutral
        } else if index <= EXTREME_GREED {
            MarketSentiment::Greed
        } else if index > EXTREME_GREED {
            MarketSentiment::ExtremeGreed
        } else {
            // NaN
            MarketSentiment::Neutral
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MarketSentiment::ExtremeFear => "Extreme Fear",
            MarketSentiment::Fear => "Fear",
            MarketSentiment::Neutral => "Neutral",
            MarketSentiment::Greed => "Greed",
            MarketSentiment::ExtremeGreed => "Extreme Greed",
        }
    }
}

/// Indicator snapshot fed to the score engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringFactors {
    /// Relative Strength Index, nominally 0-100
    pub rsi: f64,
    pub macd: MacdSignal,
    /// Fear & Greed index, nominally 0-100
    pub fear_greed_index: f64,
}

impl ScoringFactors {
    pub fn new(rsi: f64, macd: MacdSignal, fear_greed_index: f64) -> Self {
        Self {
            rsi,
            macd,
            fear_greed_index,
        }
    }

    pub fn sentiment(&self) -> MarketSentiment {
        MarketSentiment::from_index(self.fear_greed_index)
    }

    /// RSI contribution: oversold rewards buying, overbought penalises it
    pub(crate) fn rsi_points(&self) -> f64 {
        if self.rsi < RSI_OVERSOLD {
            30.0
        } else if self.rsi > RSI_OVERBOUGHT {
            -30.0
        } else {
            0.0
        }
    }

    pub(crate) fn macd_points(&self) -> f64 {
        match self.macd {
            MacdSignal::Bullish => 30.0,
            MacdSignal::Bearish => -30.0,
            MacdSignal::Neutral => 0.0,
        }
    }

    /// Contrarian sentiment contribution: fear is a buy signal
    pub(crate) fn sentiment_points(&self) -> f64 {
        if self.fear_greed_index < EXTREME_FEAR {
            20.0
        } else if self.fear_greed_index > EXTREME_GREED {
            -20.0
        } else {
            0.0
        }
    }

    /// Unscaled additive score, in [-80, 80]
    pub fn raw_score(&self) -> f64 {
        self.rsi_points() + self.macd_points() + self.sentiment_points()
    }
}
