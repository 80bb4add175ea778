//! Shared types for the delivery storefront
//!
//! Domain types used by the order service and its clients: the order status
//! machine, commands, events, snapshots, and the external product/user models.

pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{Actor, Role};
pub use order::{OrderSnapshot, OrderStatus, Transition};
