//! Order lifecycle module
//!
//! Types for the order event sourcing system:
//! - Status machine: canonical statuses, transitions and their timestamps
//! - Commands: requests from role views to modify orders
//! - Events: immutable facts recorded after command processing
//! - Snapshots: computed order state from event stream

pub mod command;
pub mod event;
pub mod snapshot;
pub mod status;
pub mod types;

// Re-exports
pub use command::{OrderCommand, OrderCommandPayload};
pub use event::{EventPayload, OrderEvent, OrderEventType};
pub use snapshot::{InvariantViolation, OrderSnapshot};
pub use status::{OrderStatus, StatusVocabulary, TimestampField, Transition};
pub use types::*;
