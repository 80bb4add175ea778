//! Utilities shared by the HTTP layer
//!
//! - [`AppError`] - application error with a stable code and HTTP status
//! - [`AppResponse`] - response envelope
//! - logging setup

pub mod error;
pub mod logger;
pub mod result;

pub use error::{AppError, AppResponse, ok};
pub use result::AppResult;
