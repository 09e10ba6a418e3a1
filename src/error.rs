use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::store::StoreError;

// Generic text so a client cannot tell which policy rejected it
pub const RATE_LIMITED_MESSAGE: &str = "Too many attempts, please try again later.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("--backend-url requires --backend-key")]
    MissingBackendKey,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("invalid submission: {0}")]
    InvalidSubmission(&'static str),

    #[error("persistence queue unavailable")]
    Queue,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("metrics encoding failed: {0}")]
    Metrics(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::InvalidSubmission(_) => StatusCode::BAD_REQUEST,
            GatewayError::Queue => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Store(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let message = match &self {
            GatewayError::RateLimited => RATE_LIMITED_MESSAGE.to_string(),
            GatewayError::InvalidSubmission(_) => self.to_string(),
            // backend details stay in the logs
            GatewayError::Queue | GatewayError::Store(_) | GatewayError::Metrics(_) => {
                tracing::error!(error = %self, "request failed");
                "Submission could not be saved".to_string()
            }
        };

        (self.status(), Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            GatewayError::InvalidSubmission("site_id is required").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Store(StoreError::Closed).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(GatewayError::Queue.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::NotPositive("--ip-limit").to_string(),
            "--ip-limit must be greater than zero"
        );
    }
}
