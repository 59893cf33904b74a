use std::sync::Arc;

use futurecoin::FutureCoin;

use crate::config::AppConfig;

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub fc: FutureCoin,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(fc: FutureCoin, config: AppConfig) -> Arc<Self> {
        Arc::new(Self { fc, config })
    }
}
