use data_retrieval::{BinanceTickerClient, CoinGeckoClient, FallbackPriceFeed, PriceFeed};
use signal_engine::{ForecastConfig, ForecastEngine, ScoreEngine};
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::error::Result;

/// Application state shared across handlers
pub struct AppState {
    pub score_engine: ScoreEngine,
    pub forecast_engine: ForecastEngine,
    pub price_feed: Arc<dyn PriceFeed>,
}

impl AppState {
    pub fn new(price_feed: Arc<dyn PriceFeed>, forecast: ForecastConfig) -> Self {
        Self {
            score_engine: ScoreEngine::new(),
            forecast_engine: ForecastEngine::new(forecast),
            price_feed,
        }
    }

    /// Wire the live price sources described by `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = settings.sources.request_timeout();

        // Binance first: one request carries price and 24h change
        let binance = BinanceTickerClient::new(&settings.sources.binance_url, timeout)?;
        let mut feed = FallbackPriceFeed::new().with_source(Arc::new(binance));
        info!("✓ Binance ticker source at {}", settings.sources.binance_url);

        if settings.sources.enable_coingecko {
            let coingecko = CoinGeckoClient::new(
                &settings.sources.coingecko_url,
                settings.sources.coingecko_api_key.clone(),
                timeout,
            )?;
            feed.add_source(Arc::new(coingecko));
            info!("✓ CoinGecko fallback source at {}", settings.sources.coingecko_url);
        }

        Ok(Self::new(Arc::new(feed), settings.forecast.clone()))
    }
}
