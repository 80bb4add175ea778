//! Data models
//!
//! External entities the order lifecycle references but does not own:
//! catalog products and user identities.

pub mod product;
pub mod user;

// Re-exports
pub use product::*;
pub use user::*;
