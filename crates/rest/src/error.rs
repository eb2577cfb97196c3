//! Error types for the REST API.
//!
//! Handler errors are rendered as problem details. Only client mistakes carry
//! a descriptive `detail`; internal faults are logged and answered with a
//! bare 500 so nothing about the failure leaks to the client.
//!
//! # Error Mapping
//!
//! | Source | HTTP Status |
//! |--------|-------------|
//! | Invalid request body | 400 |
//! | Unknown product id | 404 |
//! | No tenant bound / unroutable tenant | 500 |
//! | Database failure | 500 |
//!
//! Tenant header rejections are not a [`RestError`]; see
//! [`TenantRejection`](crate::tenant::TenantRejection).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tenantry_persistence::error::{BackendError, ConfigError, RoutingError, StorageError};
use thiserror::Error;
use tracing::error;

use crate::responses::ProblemDetail;

/// The primary error type for REST API operations.
#[derive(Debug, Error)]
pub enum RestError {
    /// Malformed request (HTTP 400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Request body failed validation (HTTP 400).
    #[error("Invalid request content: {}", errors.join("; "))]
    Validation {
        /// One message per violated constraint.
        errors: Vec<String>,
    },

    /// Resource not found (HTTP 404).
    #[error("Not found: {message}")]
    NotFound {
        /// Error message.
        message: String,
    },

    /// Internal server error (HTTP 500).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message. Logged, never sent to the client.
        message: String,
    },
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let problem = match self {
            RestError::BadRequest { message } => {
                ProblemDetail::for_status(StatusCode::BAD_REQUEST).with_detail(message)
            }
            RestError::Validation { errors } => ProblemDetail::for_status(StatusCode::BAD_REQUEST)
                .with_detail("Invalid request content.")
                .with_property("errors", errors),
            RestError::NotFound { message } => {
                ProblemDetail::for_status(StatusCode::NOT_FOUND).with_detail(message)
            }
            RestError::Internal { message } => {
                error!(error = %message, "Request failed with an internal error");
                ProblemDetail::for_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };
        problem.into_response()
    }
}

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Routing(e) => e.into(),
            StorageError::Backend(e) => e.into(),
            StorageError::Config(e) => e.into(),
        }
    }
}

impl From<RoutingError> for RestError {
    fn from(err: RoutingError) -> Self {
        // Any routing failure after the gate is a wiring defect, not a client error.
        RestError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<BackendError> for RestError {
    fn from(err: BackendError) -> Self {
        RestError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for RestError {
    fn from(err: ConfigError) -> Self {
        RestError::Internal {
            message: err.to_string(),
        }
    }
}

/// Result type alias for REST API operations.
pub type RestResult<T> = Result<T, RestError>;
