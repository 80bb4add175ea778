//! OrdersManager - Core command processing and event generation
//!
//! This module handles:
//! - Command validation against role rules and the transition table
//! - Event generation with global sequence numbers
//! - Persistence to redb (one write transaction per command)
//! - Snapshot updates
//! - Event broadcasting
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Create CommandContext
//!     ├─ 4. Convert command to action and execute
//!     ├─ 5. Apply events to snapshots via EventApplier
//!     ├─ 6. Check invariants, persist events and snapshots
//!     ├─ 7. Mark command processed
//!     ├─ 8. Commit transaction
//!     ├─ 9. Broadcast event(s)
//!     └─ 10. Return response
//! ```
//!
//! A command that fails at any step drops the transaction, so the store is
//! left exactly as it was.

mod error;
pub use error::*;

use super::actions::CommandAction;
use super::appliers::EventAction;
use super::storage::{OrderQuery, OrderStorage, StorageError};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier};
use shared::order::{
    CommandResponse, OrderCommand, OrderCommandPayload, OrderEvent, OrderEventType, OrderSnapshot,
};
use std::path::Path;
use tokio::sync::broadcast;

/// Default event broadcast channel capacity
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 4096;

/// OrdersManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Clients use it to detect server restarts and trigger a full refresh.
#[derive(Clone)]
pub struct OrdersManager {
    storage: OrderStorage,
    event_tx: broadcast::Sender<OrderEvent>,
    /// Server instance epoch - unique ID generated on startup
    epoch: String,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<OrderStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl OrdersManager {
    /// Create a new OrdersManager with the given database path
    pub fn new(db_path: impl AsRef<Path>) -> ManagerResult<Self> {
        Self::with_capacity(db_path, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    /// Create a new OrdersManager with an explicit broadcast capacity
    pub fn with_capacity(db_path: impl AsRef<Path>, capacity: usize) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        Ok(Self::from_storage(storage, capacity))
    }

    /// Create an OrdersManager with existing storage (for testing)
    #[cfg(test)]
    pub fn with_storage(storage: OrderStorage) -> Self {
        Self::from_storage(storage, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    fn from_storage(storage: OrderStorage, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "OrdersManager started with new epoch");
        Self {
            storage,
            event_tx,
            epoch,
        }
    }

    /// Get the server epoch (unique instance ID)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Number of live broadcast receivers (one per open feed)
    pub fn subscriber_count(&self) -> usize {
        self.event_tx.receiver_count()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    /// Execute a command and return the response
    pub fn execute_command(&self, cmd: OrderCommand) -> CommandResponse {
        self.execute_command_with_events(cmd).0
    }

    /// Execute a command and return both the response and generated events
    ///
    /// Events are broadcast internally either way; callers that need to
    /// forward them somewhere else get a copy.
    pub fn execute_command_with_events(
        &self,
        cmd: OrderCommand,
    ) -> (CommandResponse, Vec<OrderEvent>) {
        let command_id = cmd.command_id.clone();
        match self.process_command(cmd) {
            Ok((response, events)) => {
                // Broadcast events after successful commit
                for event in &events {
                    if self.event_tx.send(event.clone()).is_err() {
                        tracing::debug!("Event broadcast skipped: no active receivers");
                        break;
                    }
                }
                (response, events)
            }
            Err(err) => {
                tracing::warn!(command_id = %command_id, error = %err, "Command rejected");
                (CommandResponse::error(command_id, err.into()), vec![])
            }
        }
    }

    /// Process command and return response with events
    fn process_command(
        &self,
        cmd: OrderCommand,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        tracing::debug!(
            command_id = %cmd.command_id,
            actor_id = %cmd.actor.id,
            role = %cmd.actor.role,
            payload = ?cmd.payload,
            "Processing command"
        );

        // 1. Idempotency check (before transaction)
        if let Some(order_id) = self.storage.processed_command(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((CommandResponse::duplicate(cmd.command_id, order_id), vec![]));
        }

        // 2. Begin write transaction (serialized with every other writer)
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within transaction
        if let Some(order_id) = self
            .storage
            .processed_command_txn(&txn, &cmd.command_id)?
        {
            return Ok((CommandResponse::duplicate(cmd.command_id, order_id), vec![]));
        }

        let current_sequence = self.storage.get_current_sequence_txn(&txn)?;

        // 3. Create context and metadata
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            actor: cmd.actor.clone(),
            timestamp: cmd.timestamp,
        };

        // 4. Convert to action and execute
        let action = CommandAction::from(&cmd);
        let events = action.execute(&mut ctx, &metadata)?;

        // 5. Apply events to snapshots (purge events have nothing to fold into)
        for event in events
            .iter()
            .filter(|e| e.event_type != OrderEventType::OrderPurged)
        {
            let mut snapshot = ctx
                .load_snapshot(&event.order_id)
                .unwrap_or_else(|_| OrderSnapshot::new(event.order_id.clone()));
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
            ctx.save_snapshot(snapshot);
        }

        // 6. Check invariants and persist
        for snapshot in ctx.modified_snapshots() {
            snapshot.check_invariants()?;
            self.storage.store_snapshot(&txn, snapshot)?;
        }
        for event in events
            .iter()
            .filter(|e| e.event_type != OrderEventType::OrderPurged)
        {
            self.storage.store_event(&txn, event)?;
        }

        let max_sequence = ctx.current_sequence();
        if max_sequence > current_sequence {
            self.storage.set_sequence(&txn, max_sequence)?;
        }
        drop(ctx);

        let order_id = match &cmd.payload {
            OrderCommandPayload::PurgeOrders {} => None,
            _ => cmd
                .order_id()
                .map(str::to_string)
                .or_else(|| events.first().map(|e| e.order_id.clone())),
        };

        // 7. Mark command processed (a replay answers with the same order)
        self.storage
            .mark_command_processed(&txn, &cmd.command_id, order_id.as_deref())?;

        // 8. Commit transaction
        txn.commit().map_err(StorageError::from)?;

        tracing::debug!(
            command_id = %cmd.command_id,
            order_id = ?order_id,
            event_count = events.len(),
            sequence = max_sequence,
            "Command committed"
        );

        Ok((CommandResponse::success(cmd.command_id, order_id), events))
    }

    // ========== Public Query Methods ==========

    /// Get a snapshot by order ID
    pub fn get_snapshot(&self, order_id: &str) -> ManagerResult<Option<OrderSnapshot>> {
        Ok(self.storage.get_snapshot(order_id)?)
    }

    /// Run a projection query (placement time descending)
    pub fn query_orders(&self, query: &OrderQuery) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.storage.query_orders(query)?)
    }

    /// Get current sequence number
    pub fn get_current_sequence(&self) -> ManagerResult<u64> {
        Ok(self.storage.get_current_sequence()?)
    }

    /// Get all events for a specific order
    pub fn get_events_for_order(&self, order_id: &str) -> ManagerResult<Vec<OrderEvent>> {
        Ok(self.storage.get_events_for_order(order_id)?)
    }

    /// Rebuild a snapshot from events (for verification)
    ///
    /// Uses EventApplier to apply each event to build the snapshot.
    pub fn rebuild_snapshot(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let events = self.storage.get_events_for_order(order_id)?;
        if events.is_empty() {
            return Err(ManagerError::OrderNotFound(order_id.to_string()));
        }

        let mut snapshot = OrderSnapshot::new(order_id.to_string());
        for event in &events {
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests;
