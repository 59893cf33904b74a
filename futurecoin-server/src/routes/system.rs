use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use futurecoin::{FutureCoinError, ModelRegistry};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Build system sub-router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/models", get(list_models))
        .route("/api/models/reload", post(reload_models))
}

/// GET /api/health: Liveness plus model counts and output currencies.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let status = state.fc.models().await.status();
    let cfg = state.fc.config();
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "models": {
            "total": status.total,
            "loaded": status.loaded,
        },
        "config": {
            "daily_currency": cfg.currencies.daily,
            "hourly_currency": cfg.currencies.hourly,
            "fallback": state.fc.fallback_name(),
            "connectors": state.fc.connector_names(),
        },
    }))
}

/// GET /api/models: Every model file or registration seen at load time.
async fn list_models(State(state): State<Arc<AppState>>) -> Json<Value> {
    let registry = state.fc.models().await;
    Json(json!({ "models": registry.list() }))
}

/// POST /api/models/reload: Rescan the models directory and swap the registry.
///
/// Requests already running keep the registry they started with.
async fn reload_models(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let dir = state.config.models_dir.clone();
    let registry = tokio::task::spawn_blocking(move || ModelRegistry::load_dir(dir))
        .await
        .map_err(|e| FutureCoinError::Other(format!("model reload task failed: {e}")))??;
    let status = registry.status();
    state.fc.replace_models(registry).await;
    tracing::info!(total = status.total, loaded = status.loaded, "model registry reloaded");
    Ok(Json(json!({
        "models": {
            "total": status.total,
            "loaded": status.loaded,
        }
    })))
}
