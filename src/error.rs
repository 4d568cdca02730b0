//! Application error taxonomy and its HTTP mapping.
//!
//! Every failure the core can produce is a distinct [`AppError`] variant, so
//! callers branch on the variant rather than on message text.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::repositories::StoreError;
use crate::utils::url_validator::UrlValidationError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad or unsafe input. Not retried.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The derived code is already bound to a different URL.
    #[error("short code '{code}' is already bound to a different url")]
    Collision { code: String },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The record exists but its expiry has passed and expiry is enforced.
    #[error("short link '{code}' has expired")]
    Expired { code: String },

    /// Admission denied by the rate governor. The caller may retry later.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Transient backend failure or timeout. Safe to retry with backoff.
    #[error("storage backend unavailable: {0}")]
    StoreUnavailable(String),

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Returns true for failures a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::StoreUnavailable(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Collision { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Expired { .. } => StatusCode::GONE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into its serializable form.
    ///
    /// Backend details are not echoed to clients.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, details) = match self {
            Self::Validation { details, .. } => ("validation_error", details.clone()),
            Self::Collision { code } => ("collision", json!({ "code": code })),
            Self::NotFound { details, .. } => ("not_found", details.clone()),
            Self::Expired { code } => ("expired", json!({ "code": code })),
            Self::RateLimited => ("rate_limited", json!({})),
            Self::StoreUnavailable(_) => ("store_unavailable", json!({})),
            Self::Internal { details, .. } => ("internal_error", details.clone()),
        };

        let message = match self {
            Self::StoreUnavailable(_) => "storage backend unavailable, retry later".to_string(),
            Self::Internal { .. } => {
                "the server encountered a problem and could not process your request".to_string()
            }
            other => other.to_string(),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<UrlValidationError> for AppError {
    fn from(e: UrlValidationError) -> Self {
        AppError::bad_request("Input validation failed", json!({ "url": e.to_string() }))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(reason) => AppError::StoreUnavailable(reason),
            StoreError::DuplicateKey(code) => {
                AppError::internal("Unexpected duplicate key", json!({ "code": code }))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let fields: serde_json::Map<String, Value> = e
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let message = errors
                    .first()
                    .and_then(|err| err.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), Value::String(message))
            })
            .collect();

        AppError::bad_request("Input validation failed", Value::Object(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::bad_request("bad", json!({})).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Collision {
                code: "abc".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::not_found("missing", json!({})).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Expired { code: "abc".into() }.status_code(),
            StatusCode::GONE
        );
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::StoreUnavailable("timeout".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(AppError::RateLimited.is_retryable());
        assert!(AppError::StoreUnavailable("down".into()).is_retryable());
        assert!(!AppError::Collision { code: "x".into() }.is_retryable());
        assert!(!AppError::bad_request("bad", json!({})).is_retryable());
    }

    #[test]
    fn test_validation_error_conversion() {
        let err: AppError = UrlValidationError::TooLong.into();

        let info = err.to_error_info();
        assert_eq!(info.code, "validation_error");
        assert_eq!(info.details["url"], "url too long");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: AppError = StoreError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, AppError::StoreUnavailable(_)));

        let info = err.to_error_info();
        assert_eq!(info.code, "store_unavailable");
        assert!(!info.message.contains("connection refused"));
    }

    #[test]
    fn test_collision_info() {
        let info = AppError::Collision {
            code: "A8SlAtQ".into(),
        }
        .to_error_info();

        assert_eq!(info.code, "collision");
        assert_eq!(info.details["code"], "A8SlAtQ");
    }
}
