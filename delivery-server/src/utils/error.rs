//! Unified error handling for the HTTP layer
//!
//! Every failure leaves the service as `{ code, message }` with a status
//! that matches the failure class. Command rejections keep the code the
//! order machine assigned (`ORDER_ALREADY_CLAIMED`, `INVALID_TRANSITION`,
//! ...), so clients can switch on it.
//!
//! | Code | Status |
//! |------|--------|
//! | `UNAUTHORIZED` | 401 |
//! | `FORBIDDEN`, `ROLE_NOT_PERMITTED`, `NOT_ASSIGNED_DRIVER` | 403 |
//! | `NOT_FOUND`, `ORDER_NOT_FOUND` | 404 |
//! | `INVALID_TRANSITION`, `ORDER_ALREADY_CLAIMED` | 409 |
//! | `VALIDATION_ERROR`, `INVALID_ORDER` | 400 |
//! | `SYSTEM_BUSY` | 503 |
//! | everything else | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::orders::{ManagerError, ProjectionError};
use shared::order::{CommandError, CommandErrorCode};

/// Response envelope
///
/// ```json
/// { "code": "OK", "message": "Success", "data": { ... } }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Caller errors (4xx) ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Rejected by the order machine
    #[error("{}", .0.message)]
    Command(CommandError),

    // ========== Server errors (5xx) ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Command(err) => command_status(err.code),
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Command(err) => err.code.as_str(),
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

fn command_status(code: CommandErrorCode) -> StatusCode {
    match code {
        CommandErrorCode::OrderNotFound => StatusCode::NOT_FOUND,
        CommandErrorCode::InvalidTransition | CommandErrorCode::OrderAlreadyClaimed => {
            StatusCode::CONFLICT
        }
        CommandErrorCode::NotAssignedDriver | CommandErrorCode::RoleNotPermitted => {
            StatusCode::FORBIDDEN
        }
        CommandErrorCode::InvalidOrder => StatusCode::BAD_REQUEST,
        CommandErrorCode::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,
        CommandErrorCode::InternalError
        | CommandErrorCode::StorageFull
        | CommandErrorCode::StorageCorrupted => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
            AppError::Command(err) if status.is_server_error() => {
                error!(code = err.code.as_str(), error = %err.message, "Command failed in storage");
                err.message.clone()
            }
            other => other.to_string(),
        };

        let body = Json(AppResponse::<()> {
            code: self.code().to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        AppError::Command(err)
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::OrderNotFound(id) => AppError::NotFound(format!("Order {id} not found")),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<ProjectionError> for AppError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::PermissionDenied(msg) => AppError::Forbidden(msg),
            ProjectionError::Store(msg) => AppError::Database(msg),
            ProjectionError::FeedClosed => AppError::Internal("live feed closed".to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "OK".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}
