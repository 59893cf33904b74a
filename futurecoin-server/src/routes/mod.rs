pub mod predict;
pub mod system;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// Assemble the API router.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(predict::routes())
        .merge(system::routes())
}
