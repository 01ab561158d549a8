use crate::health::HealthTracker;
use crate::types::*;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Free tier friendly gap between consecutive requests
const MIN_REQUEST_SPACING: Duration = Duration::from_millis(100);

/// CoinGecko API client
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    rate_limiter: tokio::sync::Semaphore,
    last_request: tokio::sync::Mutex<Instant>,
    /// Internal health tracking to avoid API calls in health()
    health_tracker: HealthTracker,
}

impl CoinGeckoClient {
    /// Free tier: ~10-30 calls/minute
    /// Pro tier: higher limits with API key
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| DataRetrievalError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        // Free tier: allow 1 concurrent request to stay under rate limit
        let permits = if api_key.is_some() { 5 } else { 1 };

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            rate_limiter: tokio::sync::Semaphore::new(permits),
            last_request: tokio::sync::Mutex::new(
                Instant::now()
                    .checked_sub(MIN_REQUEST_SPACING)
                    .unwrap_or_else(Instant::now),
            ),
            health_tracker: HealthTracker::new(),
        })
    }

    /// Spaced, permit-gated GET against the API root
    async fn rate_limited_request<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| DataRetrievalError::ApiError(e.to_string()))?;

        {
            let mut last = self.last_request.lock().await;
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_SPACING {
                tokio::time::sleep(MIN_REQUEST_SPACING - elapsed).await;
            }
            *last = Instant::now();
        }

        let mut request = self
            .client
            .get(format!("{}{}", self.base_url, endpoint))
            .query(query);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-pro-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DataRetrievalError::ApiError(e.to_string()))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(DataRetrievalError::RateLimit {
                source_name: "coingecko".to_string(),
                retry_after,
            });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DataRetrievalError::ApiError(format!(
                "CoinGecko API error ({}): {}",
                status, text
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DataRetrievalError::InvalidResponse(e.to_string()))
    }

    /// Common mappings, avoids a search call for the majors
    fn static_coin_id(symbol: &str) -> Option<&'static str> {
        let id = match symbol.to_uppercase().as_str() {
            "BTC" => "bitcoin",
            "ETH" => "ethereum",
            "SOL" => "solana",
            "USDC" => "usd-coin",
            "USDT" => "tether",
            "BNB" => "binancecoin",
            "XRP" => "ripple",
            "ADA" => "cardano",
            "DOT" => "polkadot",
            "DOGE" => "dogecoin",
            "AVAX" => "avalanche-2",
            "LINK" => "chainlink",
            "MATIC" => "matic-network",
            _ => return None,
        };
        Some(id)
    }

    /// Get CoinGecko ID for asset symbol
    async fn get_coin_id(&self, symbol: &str) -> Result<String> {
        if let Some(id) = Self::static_coin_id(symbol) {
            return Ok(id.to_string());
        }

        // Fallback: search API
        let response: SearchResponse = self
            .rate_limited_request("/search", &[("query", symbol)])
            .await?;

        response
            .coins
            .into_iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
            .map(|c| c.id)
            .ok_or_else(|| DataRetrievalError::AssetNotFound(symbol.to_string()))
    }

    /// Get current USD quote for an asset
    pub async fn get_quote(&self, symbol: &str) -> Result<PriceQuote> {
        let started = Instant::now();
        let quote = self.fetch_quote(symbol).await;
        self.health_tracker.observe(&quote, started.elapsed());
        quote
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<PriceQuote> {
        // Binance-style pairs are accepted too
        let upper = symbol.to_uppercase();
        let asset = match upper.strip_suffix("USDT") {
            Some(base) if !base.is_empty() => base.to_string(),
            _ => upper.clone(),
        };
        let coin_id = self.get_coin_id(&asset).await?;

        let response: serde_json::Value = self
            .rate_limited_request(
                "/simple/price",
                &[
                    ("ids", coin_id.as_str()),
                    ("vs_currencies", "usd"),
                    ("include_24hr_change", "true"),
                ],
            )
            .await?;

        let data = response.get(&coin_id).ok_or_else(|| {
            DataRetrievalError::InvalidResponse(format!("Missing data for coin: {}", coin_id))
        })?;

        let price = data
            .get("usd")
            .and_then(|v| v.as_f64())
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| {
                DataRetrievalError::InvalidResponse(format!("No usable USD price for {}", coin_id))
            })?;

        // Change is omitted for coins without 24h history
        let change_24h = data
            .get("usd_24h_change")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        Ok(PriceQuote {
            symbol: symbol.to_uppercase(),
            price,
            change_24h,
            source: "coingecko".to_string(),
            timestamp: Utc::now(),
        })
    }
}

// Response types for CoinGecko API
#[derive(Debug, serde::Deserialize)]
struct SearchResponse {
    coins: Vec<SearchCoin>,
}

#[derive(Debug, serde::Deserialize)]
struct SearchCoin {
    id: String,
    symbol: String,
}

#[async_trait::async_trait]
impl PriceDataSource for CoinGeckoClient {
    async fn get_quote(&self, symbol: &str) -> Result<PriceQuote> {
        CoinGeckoClient::get_quote(self, symbol).await
    }

    async fn health(&self) -> SourceHealth {
        self.health_tracker.snapshot("coingecko")
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}
