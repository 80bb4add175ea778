use super::super::storage::StorageError;
use super::super::traits::OrderError;
use shared::order::{CommandError, CommandErrorCode, InvariantViolation};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    AlreadyClaimed(String),

    #[error("{0}")]
    NotAssignedDriver(String),

    #[error("{0}")]
    RoleNotPermitted(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Map a storage error to an error code (clients localize the message)
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    match e {
        StorageError::Serialization(_) => return CommandErrorCode::InternalError,
        StorageError::OrderNotFound(_) => return CommandErrorCode::OrderNotFound,
        _ => {}
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    // Database/Transaction/Table/Storage/Commit errors
    CommandErrorCode::SystemBusy
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let (code, message) = match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                let message = e.to_string();
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                (code, message)
            }
            ManagerError::OrderNotFound(id) => (
                CommandErrorCode::OrderNotFound,
                format!("Order not found: {}", id),
            ),
            ManagerError::InvalidTransition(msg) => (CommandErrorCode::InvalidTransition, msg),
            ManagerError::AlreadyClaimed(msg) => (CommandErrorCode::OrderAlreadyClaimed, msg),
            ManagerError::NotAssignedDriver(msg) => (CommandErrorCode::NotAssignedDriver, msg),
            ManagerError::RoleNotPermitted(msg) => (CommandErrorCode::RoleNotPermitted, msg),
            ManagerError::InvalidOrder(msg) => (CommandErrorCode::InvalidOrder, msg),
            ManagerError::Invariant(v) => {
                tracing::error!(violation = %v, "Command would break an order invariant");
                (CommandErrorCode::InternalError, v.to_string())
            }
            ManagerError::Internal(msg) => (CommandErrorCode::InternalError, msg),
        };
        CommandError::new(code, message)
    }
}

impl From<OrderError> for ManagerError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::OrderNotFound(id) => ManagerError::OrderNotFound(id),
            OrderError::InvalidTransition { .. } => ManagerError::InvalidTransition(message),
            OrderError::AlreadyClaimed { .. } => ManagerError::AlreadyClaimed(message),
            OrderError::NotAssignedDriver(_) => ManagerError::NotAssignedDriver(message),
            OrderError::RoleNotPermitted { .. } => ManagerError::RoleNotPermitted(message),
            OrderError::InvalidOrder(msg) => ManagerError::InvalidOrder(msg),
            OrderError::Storage(msg) => ManagerError::Internal(msg),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
