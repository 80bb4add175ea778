//! Core seams of the command pipeline
//!
//! - [`CommandHandler`]: one action per command, reads state through the
//!   [`CommandContext`] and returns the events it wants recorded
//! - [`EventApplier`]: one pure applier per event, folds an event into a
//!   snapshot

use std::collections::HashMap;

use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use thiserror::Error;

use super::appliers::{
    DeliveryProgressedApplier, EventAction, OrderCancelledApplier, OrderClaimedApplier,
    OrderCompletedApplier, OrderPlacedApplier, OrderPurgedApplier, PaymentConfirmedApplier,
};
use super::storage::{OrderStorage, StorageError};
use shared::models::{Actor, Role};
use shared::order::{OrderEvent, OrderSnapshot, OrderStatus, Transition};

/// Errors raised while executing a command
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Cannot {transition} order {order_id} from status {from}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        transition: Transition,
    },

    #[error("Order {order_id} already claimed by driver {driver_id}")]
    AlreadyClaimed { order_id: String, driver_id: String },

    #[error("Order {0} is not assigned to this driver")]
    NotAssignedDriver(String),

    #[error("Role {role} may not {action}")]
    RoleNotPermitted { role: Role, action: String },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for OrderError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::OrderNotFound(id) => OrderError::OrderNotFound(id),
            other => OrderError::Storage(other.to_string()),
        }
    }
}

/// Who issued the command and when
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub actor: Actor,
    /// Client timestamp, audit only
    pub timestamp: i64,
}

/// Execution context handed to every action
///
/// Reads go through the open write transaction, so an action always sees the
/// state it is about to overwrite. Sequence numbers are handed out locally
/// and persisted by the manager after the action returns.
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a OrderStorage,
    sequence: u64,
    snapshots: HashMap<String, OrderSnapshot>,
    modified: HashMap<String, OrderSnapshot>,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a OrderStorage, current_sequence: u64) -> Self {
        Self {
            txn,
            storage,
            sequence: current_sequence,
            snapshots: HashMap::new(),
            modified: HashMap::new(),
        }
    }

    /// Load a snapshot (cached for the lifetime of the command)
    pub fn load_snapshot(&mut self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        if let Some(snapshot) = self
            .modified
            .get(order_id)
            .or_else(|| self.snapshots.get(order_id))
        {
            return Ok(snapshot.clone());
        }
        let snapshot = self
            .storage
            .get_snapshot_txn(self.txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        self.snapshots
            .insert(order_id.to_string(), snapshot.clone());
        Ok(snapshot)
    }

    /// True if an order with this ID already exists
    pub fn order_exists(&self, order_id: &str) -> Result<bool, OrderError> {
        if self.modified.contains_key(order_id) || self.snapshots.contains_key(order_id) {
            return Ok(true);
        }
        Ok(self.storage.get_snapshot_txn(self.txn, order_id)?.is_some())
    }

    /// Stage a snapshot for persistence
    pub fn save_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.modified.insert(snapshot.order_id.clone(), snapshot);
    }

    /// Snapshots staged during this command
    pub fn modified_snapshots(&self) -> impl Iterator<Item = &OrderSnapshot> {
        self.modified.values()
    }

    /// Delete every order inside the transaction, returning the removed IDs
    pub fn purge_all_orders(&mut self) -> Result<Vec<String>, OrderError> {
        self.snapshots.clear();
        self.modified.clear();
        Ok(self.storage.purge_all(self.txn)?)
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Highest sequence handed out so far
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }
}

/// Command action: validate against current state and produce events
pub trait CommandHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError>;
}

/// Event applier: fold one event into a snapshot (pure, no I/O)
///
/// The dispatch impl for [`EventAction`] is generated here, so every applier
/// type is imported above.
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent);
}
