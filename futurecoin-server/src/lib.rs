//! HTTP front end and batch fetch job for the FutureCoin pipeline.
//!
//! The binary wires the Yahoo, Binance and CryptoCompare connectors into a
//! [`FutureCoin`] orchestrator from environment configuration, then either
//! serves the JSON API or runs one bulk download into the data directory.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use futurecoin::{
    BackoffConfig, ConnectorBuilder, DatasetStore, FutureCoin, FutureCoinConnector,
    FutureCoinError, IntervalClass, ModelRegistry,
};
use futurecoin_binance::BinanceConnector;
use futurecoin_cryptocompare::CryptoCompareConnector;
use futurecoin_yahoo::YahooConnector;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use error::ApiError;
pub use state::AppState;

/// Router with request tracing and permissive CORS, bound to `state`.
pub fn app(state: Arc<AppState>) -> Router {
    routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn finish(builder: ConnectorBuilder, cfg: &AppConfig) -> Arc<dyn FutureCoinConnector> {
    builder
        .with_retry(cfg.retry_attempts, BackoffConfig::default())
        .build()
}

/// Build the orchestrator the server and the fetch job share.
///
/// Hourly requests prefer Binance, then CryptoCompare, then Yahoo; daily
/// requests prefer Yahoo, then CryptoCompare, then Binance. Exchange rates
/// come from Yahoo.
///
/// # Errors
/// Returns `Config` for an invalid base URL and `Storage` when the models
/// directory exists but cannot be read.
pub fn build_futurecoin(cfg: &AppConfig) -> Result<FutureCoin, FutureCoinError> {
    let yahoo = finish(
        YahooConnector::with_base_url(&cfg.yahoo_base_url)?.rate_limited(),
        cfg,
    );
    let binance = finish(
        BinanceConnector::with_base_url(&cfg.binance_base_url)?.rate_limited(),
        cfg,
    );
    let cryptocompare = finish(
        CryptoCompareConnector::with_base_url(
            &cfg.cryptocompare_base_url,
            cfg.cryptocompare_api_key.clone(),
        )?
        .rate_limited(),
        cfg,
    );
    let models = ModelRegistry::load_dir(&cfg.models_dir)?;
    let status = models.status();
    tracing::info!(
        dir = %cfg.models_dir.display(),
        total = status.total,
        loaded = status.loaded,
        "model registry loaded"
    );

    FutureCoin::builder()
        .with_connector(yahoo.clone())
        .with_connector(binance.clone())
        .with_connector(cryptocompare.clone())
        .prefer_for_interval(
            IntervalClass::Hourly,
            &[binance.clone(), cryptocompare.clone(), yahoo.clone()],
        )
        .prefer_for_interval(IntervalClass::Daily, &[yahoo, cryptocompare, binance])
        .provider_timeout(cfg.provider_timeout)
        .limits(cfg.limits)
        .currencies(cfg.currencies)
        .supported_symbols(cfg.supported_symbols.clone())
        .fallback(cfg.fallback)
        .models(models)
        .store(DatasetStore::new(&cfg.data_dir))
        .build()
}
