use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error taxonomy (spec §7 "Error taxonomy"). Each variant maps to
/// exactly one HTTP status and `code` string (spec §4.J error mapping).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("missing or malformed Authorization header")]
    Unauthenticated,

    #[error("API key is unknown or inactive")]
    Forbidden,

    #[error("payload of {0} bytes exceeds the configured maximum of {1} bytes")]
    PayloadTooLarge(usize, usize),

    #[error("monthly quota exceeded")]
    QuotaExceeded { retry_after_secs: u64 },

    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    #[error("worker pool saturated")]
    Busy,

    #[error("pipeline error: {0}")]
    Pipeline(#[from] pipeline::PipelineError),

    #[error("cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("mbom error: {0}")]
    Mbom(#[from] mbom::MbomError),

    #[error("batch {0} was not found or has expired")]
    BatchNotFound(String),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found")]
    NotFound,
}

impl From<identity::IdentityError> for ServerError {
    fn from(err: identity::IdentityError) -> Self {
        match err {
            identity::IdentityError::Unauthenticated => ServerError::Unauthenticated,
            identity::IdentityError::Forbidden => ServerError::Forbidden,
            identity::IdentityError::QuotaExceeded { retry_after_secs } => ServerError::QuotaExceeded { retry_after_secs },
            identity::IdentityError::RateLimited { retry_after_secs } => ServerError::RateLimited { retry_after_secs },
            other => ServerError::Internal(other.to_string()),
        }
    }
}

/// Standardized API error body (spec §4.J "distinguished by response body `code`").
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden => StatusCode::FORBIDDEN,
            ServerError::PayloadTooLarge(..) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::QuotaExceeded { .. } | ServerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::NotFound | ServerError::BatchNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Pipeline(pipeline::PipelineError::BatchTooLarge(..))
            | ServerError::Pipeline(pipeline::PipelineError::DocumentTooLarge(..))
            | ServerError::Pipeline(pipeline::PipelineError::EmptyDocument) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(pipeline::PipelineError::Busy) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Mbom(mbom::MbomError::BatchNotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::Mbom(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServerError::InvalidInput(_) => "invalid_input",
            ServerError::Unauthenticated => "unauthenticated",
            ServerError::Forbidden => "forbidden_or_inactive_key",
            ServerError::PayloadTooLarge(..) => "payload_too_large",
            ServerError::QuotaExceeded { .. } => "quota_exceeded",
            ServerError::RateLimited { .. } => "rate_limited",
            ServerError::Busy => "busy",
            ServerError::NotFound | ServerError::BatchNotFound(_) => "not_found",
            ServerError::Pipeline(pipeline::PipelineError::BatchTooLarge(..))
            | ServerError::Pipeline(pipeline::PipelineError::DocumentTooLarge(..))
            | ServerError::Pipeline(pipeline::PipelineError::EmptyDocument) => "invalid_input",
            ServerError::Pipeline(pipeline::PipelineError::Busy) => "busy",
            ServerError::Pipeline(_) => "internal",
            ServerError::Cache(_) => "internal",
            ServerError::Mbom(_) => "internal",
            ServerError::Internal(_) | ServerError::Config(_) => "internal",
        }
    }

    fn retry_after_secs(&self) -> Option<u64> {
        match self {
            ServerError::QuotaExceeded { retry_after_secs } | ServerError::RateLimited { retry_after_secs } => {
                Some(*retry_after_secs)
            }
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after = self.retry_after_secs();
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert("retry-after", value);
            }
        }
        response
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::InvalidInput(format!("JSON parse error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
