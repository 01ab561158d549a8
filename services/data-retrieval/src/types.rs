use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live quote for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,          // "BTC", "ETH", etc.
    pub price: f64,              // Last traded price in USD(T)
    pub change_24h: f64,         // Percent change over 24h
    pub source: String,          // "binance", "coingecko"
    pub timestamp: DateTime<Utc>,
}

/// Data source health/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHealth {
    pub source: String,
    pub is_healthy: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub success_rate: f64,
    pub avg_latency_ms: u64,
}

/// Error types for data retrieval
#[derive(Debug, thiserror::Error)]
pub enum DataRetrievalError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Rate limit exceeded for {source_name}")]
    RateLimit {
        source_name: String,
        retry_after: Option<u64>,
    },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Source unhealthy: {0}")]
    SourceUnhealthy(String),
}

/// Result type for data retrieval operations
pub type Result<T> = std::result::Result<T, DataRetrievalError>;

/// Trait for a single upstream price source
#[async_trait::async_trait]
pub trait PriceDataSource: Send + Sync {
    /// Get current quote for a normalized ticker
    async fn get_quote(&self, symbol: &str) -> Result<PriceQuote>;

    /// Get source health status
    async fn health(&self) -> SourceHealth;

    /// Source name
    fn name(&self) -> &str;
}

/// Price lookup consumed by the dashboard
///
/// Absence is the only failure signal: transport and lookup errors are
/// logged by the implementation and surface as `None`.
#[async_trait::async_trait]
pub trait PriceFeed: Send + Sync {
    async fn lookup(&self, symbol: &str) -> Option<PriceQuote>;

    async fn health(&self) -> Vec<SourceHealth> {
        Vec::new()
    }
}

/// Reduce a display ticker to its bare symbol.
///
/// "btc (Bitcoin)" -> "BTC", "(ETH)" -> "ETH", "  sol " -> "SOL".
pub fn normalize_ticker(input: &str) -> String {
    input
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .collect::<String>()
        .to_uppercase()
}
