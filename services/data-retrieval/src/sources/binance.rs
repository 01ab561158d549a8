use crate::health::HealthTracker;
use crate::types::*;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";

/// Binance REST client for the 24h rolling ticker
///
/// The 24h endpoint carries both the last price and the percent change,
/// so one request fills a whole [`PriceQuote`].
pub struct BinanceTickerClient {
    client: Client,
    base_url: String,
    health_tracker: HealthTracker,
}

impl BinanceTickerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| DataRetrievalError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_tracker: HealthTracker::new(),
        })
    }

    /// Trading pair for a ticker, quoted in USDT
    pub fn pair_symbol(symbol: &str) -> String {
        let symbol = symbol.to_uppercase();
        if symbol.ends_with("USDT") {
            symbol
        } else {
            format!("{}USDT", symbol)
        }
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<PriceQuote> {
        let started = Instant::now();
        let quote = self.fetch_quote(symbol).await;
        self.health_tracker.observe(&quote, started.elapsed());
        quote
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<PriceQuote> {
        let pair = Self::pair_symbol(symbol);
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", pair.as_str())])
            .send()
            .await
            .map_err(|e| DataRetrievalError::ApiError(e.to_string()))?;

        let status = response.status();

        // 418 is Binance's escalation after ignoring 429s
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(DataRetrievalError::RateLimit {
                source_name: "binance".to_string(),
                retry_after,
            });
        }

        if status == StatusCode::BAD_REQUEST {
            // Binance answers unknown pairs with 400 {"code":-1121,"msg":"Invalid symbol."}
            return Err(DataRetrievalError::AssetNotFound(pair));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DataRetrievalError::ApiError(format!(
                "Binance API error ({}): {}",
                status, text
            )));
        }

        let ticker: Ticker24h = response
            .json()
            .await
            .map_err(|e| DataRetrievalError::InvalidResponse(e.to_string()))?;
        let quote = ticker.into_quote(symbol)?;

        debug!("Binance {} = {} ({:+.2}%)", pair, quote.price, quote.change_24h);
        Ok(quote)
    }
}

/// Subset of `/api/v3/ticker/24hr`; Binance sends numbers as strings
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    last_price: String,
    price_change_percent: String,
}

impl Ticker24h {
    fn into_quote(self, requested: &str) -> Result<PriceQuote> {
        let price = self.last_price.parse::<f64>().map_err(|_| {
            DataRetrievalError::InvalidResponse(format!(
                "Bad lastPrice '{}' for {}",
                self.last_price, self.symbol
            ))
        })?;
        // Halted or delisted pairs report a zero last price
        if !price.is_finite() || price <= 0.0 {
            return Err(DataRetrievalError::InvalidResponse(format!(
                "No tradable price for {}: '{}'",
                self.symbol, self.last_price
            )));
        }
        let change_24h = self.price_change_percent.parse::<f64>().map_err(|_| {
            DataRetrievalError::InvalidResponse(format!(
                "Bad priceChangePercent '{}' for {}",
                self.price_change_percent, self.symbol
            ))
        })?;

        Ok(PriceQuote {
            symbol: requested.to_uppercase(),
            price,
            change_24h,
            source: "binance".to_string(),
            timestamp: Utc::now(),
        })
    }
}

#[async_trait::async_trait]
impl PriceDataSource for BinanceTickerClient {
    async fn get_quote(&self, symbol: &str) -> Result<PriceQuote> {
        BinanceTickerClient::get_quote(self, symbol).await
    }

    async fn health(&self) -> SourceHealth {
        self.health_tracker.snapshot("binance")
    }

    fn name(&self) -> &str {
        "binance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_symbol() {
        assert_eq!(BinanceTickerClient::pair_symbol("BTC"), "BTCUSDT");
        assert_eq!(BinanceTickerClient::pair_symbol("eth"), "ETHUSDT");
        assert_eq!(BinanceTickerClient::pair_symbol("SOLUSDT"), "SOLUSDT");
    }

    #[test]
    fn test_ticker_into_quote() {
        let ticker = Ticker24h {
            symbol: "BTCUSDT".to_string(),
            last_price: "68123.45000000".to_string(),
            price_change_percent: "-1.250".to_string(),
        };
        let quote = ticker.into_quote("btc").unwrap();
        assert_eq!(quote.symbol, "BTC");
        assert_eq!(quote.price, 68123.45);
        assert_eq!(quote.change_24h, -1.25);
        assert_eq!(quote.source, "binance");
    }

    #[test]
    fn test_ticker_rejects_garbage_price() {
        let ticker = Ticker24h {
            symbol: "BTCUSDT".to_string(),
            last_price: "n/a".to_string(),
            price_change_percent: "0".to_string(),
        };
        assert!(matches!(
            ticker.into_quote("BTC"),
            Err(DataRetrievalError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_ticker_rejects_untradable_price() {
        for last in ["0.00000000", "-3.5", "NaN", "inf"] {
            let ticker = Ticker24h {
                symbol: "LUNAUSDT".to_string(),
                last_price: last.to_string(),
                price_change_percent: "0.000".to_string(),
            };
            assert!(
                matches!(ticker.into_quote("LUNA"), Err(DataRetrievalError::InvalidResponse(_))),
                "lastPrice {} accepted",
                last
            );
        }
    }
}
