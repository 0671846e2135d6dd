use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reqwest::StatusCode as HttpStatus;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Every configured generative model failed. The prefix is stable so the
    /// HTTP layer (and log searches) can key off it.
    #[error("Failed to generate route: {0}")]
    GenerationExhausted(String),

    #[error("Invalid route skeleton: {0}")]
    InvalidRouteSkeleton(String),

    #[error("Geocoding failed: {0}")]
    GeocodingFailed(String),

    #[error("Routing failed: {0}")]
    RoutingFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = match self {
            AppError::GenerationExhausted(ref e) => {
                tracing::error!("Route generation exhausted: {}", e);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::InvalidRouteSkeleton(ref e) => {
                tracing::warn!("Invalid route skeleton: {}", e);
                StatusCode::BAD_GATEWAY
            }
            AppError::GeocodingFailed(ref e) => {
                tracing::warn!("Geocoding failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::RoutingFailed(ref e) => {
                tracing::warn!("Routing failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of a single call to an external collaborator (generative model,
/// geocoder, router, image search). Callers decide from the variant whether
/// to retry, skip to another provider, or give up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("provider not configured")]
    Unconfigured,

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("blocked by content policy: {0}")]
    ContentPolicy(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and its body to a provider error.
    pub fn from_status(status: HttpStatus, body: &str) -> Self {
        let detail = format!("HTTP {}: {}", status, truncate(body, 300));
        match status.as_u16() {
            401 | 403 => ProviderError::Auth(detail),
            404 => ProviderError::NotFound(detail),
            429 => ProviderError::Quota(detail),
            400 | 422 => ProviderError::InvalidRequest(detail),
            _ => ProviderError::Http(detail),
        }
    }

    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(format!("Request failed: {}", error))
        }
    }

    /// Whether the same call is worth repeating after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Quota(_)
                | ProviderError::Timeout
                | ProviderError::Http(_)
                | ProviderError::Parse(_)
        )
    }

    /// Failures that will repeat for every provider sharing the same
    /// credentials.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            ProviderError::Unconfigured | ProviderError::Auth(_) | ProviderError::Quota(_)
        )
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push('…');
        cut
    }
}
