pub mod types;
pub mod sources {
    pub mod binance;
    pub mod coingecko;
}
mod health;

pub use types::*;
pub use sources::binance::BinanceTickerClient;
pub use sources::coingecko::CoinGeckoClient;

use std::sync::Arc;
use tracing::{debug, warn};

/// Default BTC price when no source answers
pub const FALLBACK_BTC_PRICE: f64 = 68_000.0;
/// Default price for every other ticker when no source answers
pub const FALLBACK_ALT_PRICE: f64 = 1.5;

/// Static stand-in price for a ticker the feed could not quote
pub fn fallback_price(symbol: &str) -> f64 {
    if normalize_ticker(symbol) == "BTC" {
        FALLBACK_BTC_PRICE
    } else {
        FALLBACK_ALT_PRICE
    }
}

/// Ordered chain of price sources; the first good quote wins
pub struct FallbackPriceFeed {
    sources: Vec<Arc<dyn PriceDataSource>>,
}

impl FallbackPriceFeed {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn add_source(&mut self, source: Arc<dyn PriceDataSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Arc<dyn PriceDataSource>) -> Self {
        self.add_source(source);
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

impl Default for FallbackPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PriceFeed for FallbackPriceFeed {
    async fn lookup(&self, symbol: &str) -> Option<PriceQuote> {
        let symbol = normalize_ticker(symbol);
        if symbol.is_empty() {
            return None;
        }

        for source in &self.sources {
            match source.get_quote(&symbol).await {
                Ok(quote) if quote.price.is_finite() && quote.price > 0.0 => {
                    debug!("{} quoted {} at {}", source.name(), symbol, quote.price);
                    return Some(quote);
                }
                Ok(quote) => warn!(
                    "{} quoted {} at unusable price {}",
                    source.name(),
                    symbol,
                    quote.price
                ),
                Err(e) => warn!("{} failed to quote {}: {}", source.name(), symbol, e),
            }
        }

        warn!("No source could quote {}", symbol);
        None
    }

    async fn health(&self) -> Vec<SourceHealth> {
        let mut healths = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            healths.push(source.health().await);
        }
        healths
    }
}
