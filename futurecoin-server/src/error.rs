use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futurecoin::FutureCoinError;
use serde_json::json;

/// Error returned by API handlers, rendered as `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError(pub FutureCoinError);

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        status_for(&self.0)
    }
}

fn status_for(e: &FutureCoinError) -> StatusCode {
    match e {
        FutureCoinError::Validation { .. } | FutureCoinError::InvalidArg(_) => {
            StatusCode::BAD_REQUEST
        }
        FutureCoinError::NotFound { .. } => StatusCode::NOT_FOUND,
        FutureCoinError::Unsupported { .. } => StatusCode::NOT_IMPLEMENTED,
        FutureCoinError::ProviderTimeout { .. }
        | FutureCoinError::RequestTimeout { .. }
        | FutureCoinError::AllProvidersTimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
        FutureCoinError::Connector { .. }
        | FutureCoinError::RateLimited { .. }
        | FutureCoinError::TemporarilyBlacklisted { .. }
        | FutureCoinError::DataIntegrity(_)
        | FutureCoinError::AllProvidersFailed(_) => StatusCode::BAD_GATEWAY,
        FutureCoinError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<FutureCoinError> for ApiError {
    fn from(e: FutureCoinError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self(FutureCoinError::validation("invalid_body", e.body_text()))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request failed");
        }
        let body = json!({
            "error": {
                "code": self.0.code(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
