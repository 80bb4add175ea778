use thiserror::Error;

use crate::orders::ManagerError;

/// Errors that stop the server from starting or running
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Order store error: {0}")]
    Orders(#[from] ManagerError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type for server lifecycle code
pub type Result<T> = std::result::Result<T, ServerError>;
