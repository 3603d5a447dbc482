//! Error types for named caches
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for caches, the registry and the admin API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A cache with this name is already registered
    #[error("cache already exists for {0}")]
    NameConflict(String),

    /// No cache registered under this name
    #[error("no cache found for {0}")]
    NotFound(String),

    /// Invalid key, value or option
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Cron expression could not be parsed
    #[error("Invalid schedule '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    /// A scheduled clearing or pruning run failed. Only ever logged.
    #[error("Maintenance failure: {0}")]
    MaintenanceFailure(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    pub(crate) fn invalid_schedule(expression: &str, reason: impl Into<String>) -> Self {
        CacheError::InvalidSchedule {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::NameConflict(_) => StatusCode::CONFLICT,
            CacheError::InvalidArgument(_) | CacheError::InvalidSchedule { .. } => {
                StatusCode::BAD_REQUEST
            }
            CacheError::MaintenanceFailure(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
