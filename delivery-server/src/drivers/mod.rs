//! Driver presence
//!
//! Drivers toggle online/offline from their screen. The order machine never
//! writes presence; it only reads it to gate the driver projection.

mod presence;

pub use presence::{DriverPresence, PresenceChange};
