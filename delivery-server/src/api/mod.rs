//! API routes
//!
//! # Structure
//!
//! - [`health`] - health check (no identity)
//! - [`orders`] - checkout, transitions, single-order reads and feed
//! - [`customer`] - the caller's own orders
//! - [`driver`] - driver board and presence toggle
//! - [`owner`] - store-wide dashboard and purge
//!
//! Every `/api/` route runs behind `require_auth`; role routers add
//! `require_role` once at the router level.

pub mod live;

pub mod customer;
pub mod driver;
pub mod health;
pub mod orders;
pub mod owner;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
