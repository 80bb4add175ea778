//! Order lifecycle module for the delivery server
//!
//! This module implements the order store and status machine using event
//! sourcing:
//!
//! - **manager**: Core OrdersManager for command processing and event generation
//! - **storage**: redb-based persistence layer for events, snapshots, and indices
//! - **projections**: per-role read queries over the snapshots
//! - **subscription**: live full-snapshot feeds for each projection
//!
//! # Architecture
//!
//! ```text
//! Command → OrdersManager → Event → Storage (redb)
//!                 ↓                      ↓
//!              Broadcast          Snapshot Update
//!                 ↓
//!        OrderFeed (re-query projection)
//!                 ↓
//!        Role views (customer / driver / owner)
//! ```
//!
//! # Data Flow
//!
//! 1. A role view sends an OrderCommand over HTTP
//! 2. OrdersManager checks role rules and the transition table
//! 3. OrderEvent is generated with global sequence
//! 4. Event is persisted to redb (transactional)
//! 5. Snapshot is updated
//! 6. Event is broadcast to all subscribers
//! 7. Every live projection touched by the event is re-queried and pushed
//!    as a full replacement

pub mod actions;
pub mod appliers;
pub mod manager;
pub mod money;
pub mod projections;
pub mod storage;
pub mod subscription;
pub mod traits;

pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use projections::{OrderProjections, ProjectionError, ProjectionKey, ProjectionSnapshot};
pub use storage::{OrderQuery, OrderStorage, StorageError};
pub use subscription::{FeedEvent, OrderFeed, ProjectionStream, ViewState, ViewSubscriptions};
