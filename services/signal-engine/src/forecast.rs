//! Price forecasting - compounded growth scenarios
//!
//! Each scenario compounds the current price at a fixed annual rate over
//! the fractional number of years between `now` and the target date:
//! `price * (1 + rate) ^ years`. Horizons shorter than
//! [`MIN_HORIZON_YEARS`] (including targets in the past) are floored so
//! the projection never degenerates.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shortest horizon a forecast will use
pub const MIN_HORIZON_YEARS: f64 = 0.01;
/// Milliseconds in a Julian year (365.25 days)
const MILLIS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Fractional years from `now` to `target`, floored at 0.01
pub fn horizon_years(target: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (target - now).num_milliseconds() as f64;
    (millis / MILLIS_PER_YEAR).max(MIN_HORIZON_YEARS)
}

/// Growth scenario, ordered by annual rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Conservative,
    Bullish,
    SuperBullish,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Conservative,
        ScenarioKind::Bullish,
        ScenarioKind::SuperBullish,
    ];

    /// Annualized growth rate
    pub fn annual_rate(&self) -> f64 {
        match self {
            ScenarioKind::Conservative => 0.15,
            ScenarioKind::Bullish => 0.40,
            ScenarioKind::SuperBullish => 0.80,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ScenarioKind::Conservative => "Conservative",
            ScenarioKind::Bullish => "Bullish",
            ScenarioKind::SuperBullish => "Super Bullish",
        }
    }

    /// Risk label
    pub fn tag(&self) -> &'static str {
        match self {
            ScenarioKind::Conservative => "LOWER RISK",
            ScenarioKind::Bullish => "MOST LIKELY",
            ScenarioKind::SuperBullish => "HIGH VOLATILITY",
        }
    }

    pub fn description(&self, years: f64) -> String {
        match self {
            ScenarioKind::Conservative => format!(
                "Based on a {:.1}-year horizon with 15% annual compounding. Assumes steady \
                 institutional adoption and standard market corrections. Growth is driven by \
                 historical support levels and long-term moving averages.",
                years
            ),
            ScenarioKind::Bullish => format!(
                "Factors in positive ETF inflows and upcoming halving momentum over {:.1} years \
                 (40% APR). We project a breakout above previous resistance zones, supported by \
                 strong RSI indicators.",
                years
            ),
            ScenarioKind::SuperBullish => format!(
                "The 'Hyper-Growth' projection at 80% APR. This scenario considers a supply shock \
                 event combined with massive retail FOMO and sovereign adoption over the \
                 {:.1}-year period.",
                years
            ),
        }
    }
}

/// One compounded price projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub name: String,
    pub annual_rate: f64,
    /// Projection in the base currency
    pub projected_price: f64,
    /// Projection converted with the configured exchange rate
    pub secondary_currency_price: f64,
    pub description: String,
    pub tag: String,
}

/// Forecast horizon picked by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastHorizon {
    OneMonth,
    ThreeMonths,
    SixMonths,
    /// Midnight UTC on the given date
    Until(NaiveDate),
}

impl ForecastHorizon {
    /// Parse the dashboard shortcut codes ("1m", "3m", "6m")
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "1m" => Some(ForecastHorizon::OneMonth),
            "3m" => Some(ForecastHorizon::ThreeMonths),
            "6m" => Some(ForecastHorizon::SixMonths),
            _ => None,
        }
    }

    /// Target instant for this horizon. Month shortcuts keep the time of
    /// day and clamp the day to the end of the target month.
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = match self {
            ForecastHorizon::OneMonth => 1,
            ForecastHorizon::ThreeMonths => 3,
            ForecastHorizon::SixMonths => 6,
            ForecastHorizon::Until(date) => {
                return Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
            }
        };

        now.checked_add_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

fn default_exchange_rate() -> f64 {
    0.85
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_secondary_currency() -> String {
    "EUR".to_string()
}

fn default_target_date() -> NaiveDate {
    // Literal is a valid calendar date
    NaiveDate::from_ymd_opt(2026, 12, 31).unwrap_or_default()
}

/// Forecast settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Base-to-secondary currency multiplier
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_secondary_currency")]
    pub secondary_currency: String,
    /// Target used when the caller gives no horizon
    #[serde(default = "default_target_date")]
    pub default_target: NaiveDate,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            exchange_rate: default_exchange_rate(),
            base_currency: default_base_currency(),
            secondary_currency: default_secondary_currency(),
            default_target: default_target_date(),
        }
    }
}

impl ForecastConfig {
    pub fn with_exchange_rate(mut self, rate: f64) -> Self {
        self.exchange_rate = rate;
        self
    }

    pub fn default_horizon(&self) -> ForecastHorizon {
        ForecastHorizon::Until(self.default_target)
    }
}

/// Forecast engine - projects price scenarios from a current price
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Project the three scenarios, always in
    /// [Conservative, Bullish, SuperBullish] order.
    ///
    /// Zero or negative prices are projected as given; deciding that a
    /// price is unusable is up to the caller.
    pub fn compute_scenarios(
        &self,
        current_price: f64,
        target: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> [Scenario; 3] {
        let years = horizon_years(target, now);
        debug!(current_price, years, "Computing forecast scenarios");

        ScenarioKind::ALL.map(|kind| self.project(kind, current_price, years))
    }

    fn project(&self, kind: ScenarioKind, current_price: f64, years: f64) -> Scenario {
        let rate = kind.annual_rate();
        let projected_price = current_price * (1.0 + rate).powf(years);

        Scenario {
            kind,
            name: kind.display_name().to_string(),
            annual_rate: rate,
            projected_price,
            secondary_currency_price: projected_price * self.config.exchange_rate,
            description: kind.description(years),
            tag: kind.tag().to_string(),
        }
    }
}
