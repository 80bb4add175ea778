//! redb-based storage layer for the order store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `events` | `(order_id, sequence)` | `OrderEvent` | Event stream (append-only) |
//! | `snapshots` | `order_id` | `OrderSnapshot` | Current order documents |
//! | `orders_by_placement` | `(placed_at, placed_sequence, order_id)` | `()` | Sort index for every projection |
//! | `processed_commands` | `command_id` | order id (`""` if none) | Idempotency check, replay answer |
//! | `sequence_counter` | `"seq"` | `u64` | Global sequence |
//!
//! # Durability
//!
//! redb commits are durable once `commit()` returns and write transactions
//! are serialized, so each command is applied as one atomic write.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::order::{OrderEvent, OrderSnapshot, OrderStatus};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for storing events: key = (order_id, sequence), value = JSON-serialized OrderEvent
const EVENTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("events");

/// Table for storing snapshots: key = order_id, value = JSON-serialized OrderSnapshot
const SNAPSHOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

/// Placement index: key = (placed_at, placed_sequence, order_id), value = empty
const PLACEMENT_TABLE: TableDefinition<(i64, u64, &str), ()> =
    TableDefinition::new("orders_by_placement");

/// Table for tracking processed commands: key = command_id, value = order id the command touched
const PROCESSED_COMMANDS_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("processed_commands");

/// Table for sequence counter: key = "seq", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";

fn stored_order_id(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// The one query shape the store supports
///
/// Equality filter on customer, membership filter on status, always sorted
/// by placement time descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub customer_id: Option<String>,
    pub statuses: Option<Vec<OrderStatus>>,
}

impl OrderQuery {
    /// Every order
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_customer(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: Some(customer_id.into()),
            statuses: None,
        }
    }

    pub fn with_statuses(mut self, statuses: &[OrderStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn matches(&self, order: &OrderSnapshot) -> bool {
        if let Some(customer_id) = &self.customer_id
            && order.customer_id != *customer_id
        {
            return false;
        }
        match &self.statuses {
            Some(statuses) => statuses.contains(&order.status),
            None => true,
        }
    }
}

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(EVENTS_TABLE)?;
            let _ = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(PLACEMENT_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_COMMANDS_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction (blocks while another writer is active)
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Sequence Operations ==========

    /// Get current sequence (read-only)
    pub fn get_current_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Get current sequence (within transaction)
    pub fn get_current_sequence_txn(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let table = txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Set sequence number (within transaction)
    pub fn set_sequence(&self, txn: &WriteTransaction, sequence: u64) -> StorageResult<()> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        table.insert(SEQUENCE_KEY, sequence)?;
        Ok(())
    }

    // ========== Command Idempotency ==========

    /// Look up a processed command
    ///
    /// `None` if the command never ran. Otherwise the order it touched, which
    /// is `Some(None)` for commands without one (purge).
    pub fn processed_command(&self, command_id: &str) -> StorageResult<Option<Option<String>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        Ok(table.get(command_id)?.map(|v| stored_order_id(v.value())))
    }

    /// Look up a processed command (within transaction)
    pub fn processed_command_txn(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
    ) -> StorageResult<Option<Option<String>>> {
        let table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        let order_id = table.get(command_id)?.map(|v| stored_order_id(v.value()));
        Ok(order_id)
    }

    /// Mark a command as processed, remembering the order it touched
    pub fn mark_command_processed(
        &self,
        txn: &WriteTransaction,
        command_id: &str,
        order_id: Option<&str>,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PROCESSED_COMMANDS_TABLE)?;
        table.insert(command_id, order_id.unwrap_or(""))?;
        Ok(())
    }

    // ========== Event Operations ==========

    /// Store an event
    pub fn store_event(&self, txn: &WriteTransaction, event: &OrderEvent) -> StorageResult<()> {
        let mut table = txn.open_table(EVENTS_TABLE)?;
        let key = (event.order_id.as_str(), event.sequence);
        let value = serde_json::to_vec(event)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Get all events for an order, in sequence order
    pub fn get_events_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;

        let mut events = Vec::new();
        for result in table.range((order_id, 0u64)..=(order_id, u64::MAX))? {
            let (_key, value) = result?;
            let event: OrderEvent = serde_json::from_slice(value.value())?;
            events.push(event);
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }

    // ========== Snapshot Operations ==========

    /// Store a snapshot and keep the placement index in step
    pub fn store_snapshot(
        &self,
        txn: &WriteTransaction,
        snapshot: &OrderSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SNAPSHOTS_TABLE)?;
        let value = serde_json::to_vec(snapshot)?;
        table.insert(snapshot.order_id.as_str(), value.as_slice())?;

        let mut index = txn.open_table(PLACEMENT_TABLE)?;
        index.insert(
            (
                snapshot.placed_at,
                snapshot.placed_sequence,
                snapshot.order_id.as_str(),
            ),
            (),
        )?;
        Ok(())
    }

    /// Get a snapshot by order ID
    pub fn get_snapshot(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Get a snapshot by order ID (within transaction)
    pub fn get_snapshot_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let table = txn.open_table(SNAPSHOTS_TABLE)?;

        match table.get(order_id)? {
            Some(value) => {
                let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    // ========== Queries ==========

    /// Run a query, newest placement first
    ///
    /// Walks the placement index backwards, so the order of the result is
    /// decided here and nowhere else.
    pub fn query_orders(&self, query: &OrderQuery) -> StorageResult<Vec<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(PLACEMENT_TABLE)?;
        let snapshots = read_txn.open_table(SNAPSHOTS_TABLE)?;

        let mut orders = Vec::new();
        for result in index.iter()?.rev() {
            let (key, _value) = result?;
            let (_placed_at, _placed_sequence, order_id) = key.value();
            let Some(value) = snapshots.get(order_id)? else {
                tracing::warn!(order_id = %order_id, "Placement index points at a missing snapshot");
                continue;
            };
            let snapshot: OrderSnapshot = serde_json::from_slice(value.value())?;
            if query.matches(&snapshot) {
                orders.push(snapshot);
            }
        }

        Ok(orders)
    }

    // ========== Administrative ==========

    /// Remove every order (events, snapshots, index) within the transaction
    ///
    /// Returns the removed order IDs. Sequence counter and processed commands
    /// are kept so replays of old commands stay no-ops.
    pub fn purge_all(&self, txn: &WriteTransaction) -> StorageResult<Vec<String>> {
        let mut snapshots = txn.open_table(SNAPSHOTS_TABLE)?;
        let order_ids: Vec<String> = snapshots
            .iter()?
            .map(|r| r.map(|(k, _)| k.value().to_string()))
            .collect::<Result<_, _>>()?;
        for order_id in &order_ids {
            snapshots.remove(order_id.as_str())?;
        }

        let mut index = txn.open_table(PLACEMENT_TABLE)?;
        let index_keys: Vec<(i64, u64, String)> = index
            .iter()?
            .map(|r| {
                r.map(|(k, _)| {
                    let (placed_at, placed_sequence, order_id) = k.value();
                    (placed_at, placed_sequence, order_id.to_string())
                })
            })
            .collect::<Result<_, _>>()?;
        for (placed_at, placed_sequence, order_id) in &index_keys {
            index.remove((*placed_at, *placed_sequence, order_id.as_str()))?;
        }

        let mut events = txn.open_table(EVENTS_TABLE)?;
        let event_keys: Vec<(String, u64)> = events
            .iter()?
            .map(|r| {
                r.map(|(k, _)| {
                    let (order_id, seq) = k.value();
                    (order_id.to_string(), seq)
                })
            })
            .collect::<Result<_, _>>()?;
        for (order_id, seq) in &event_keys {
            events.remove((order_id.as_str(), *seq))?;
        }

        Ok(order_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::Transition;

    fn snapshot(order_id: &str, customer_id: &str, placed_at: i64) -> OrderSnapshot {
        let mut s = OrderSnapshot::new(order_id.to_string());
        s.customer_id = customer_id.to_string();
        s.placed_at = placed_at;
        s
    }

    fn put(storage: &OrderStorage, snapshots: &[OrderSnapshot]) {
        let txn = storage.begin_write().unwrap();
        for s in snapshots {
            storage.store_snapshot(&txn, s).unwrap();
        }
        txn.commit().unwrap();
    }

    #[test]
    fn test_query_sorted_by_placement_desc() {
        let storage = OrderStorage::open_in_memory().unwrap();
        put(
            &storage,
            &[
                snapshot("a", "c1", 100),
                snapshot("b", "c2", 300),
                snapshot("c", "c1", 200),
            ],
        );

        let ids: Vec<_> = storage
            .query_orders(&OrderQuery::all())
            .unwrap()
            .into_iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_query_filters_customer_and_status() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let mut paid = snapshot("paid", "c1", 200);
        paid.record_transition(Transition::ConfirmPayment, 201);
        put(&storage, &[snapshot("a", "c1", 100), paid, snapshot("x", "c2", 300)]);

        let mine = storage.query_orders(&OrderQuery::for_customer("c1")).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|o| o.customer_id == "c1"));

        let only_paid = storage
            .query_orders(&OrderQuery::for_customer("c1").with_statuses(&[OrderStatus::Paid]))
            .unwrap();
        assert_eq!(only_paid.len(), 1);
        assert_eq!(only_paid[0].order_id, "paid");
    }

    #[test]
    fn test_restoring_snapshot_does_not_duplicate_index() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let s = snapshot("a", "c1", 100);
        put(&storage, &[s.clone()]);
        put(&storage, &[s]);
        assert_eq!(storage.query_orders(&OrderQuery::all()).unwrap().len(), 1);
    }

    #[test]
    fn test_processed_command_remembers_order() {
        let storage = OrderStorage::open_in_memory().unwrap();
        assert_eq!(storage.processed_command("cmd-1").unwrap(), None);

        let txn = storage.begin_write().unwrap();
        storage
            .mark_command_processed(&txn, "cmd-1", Some("order-9"))
            .unwrap();
        storage.mark_command_processed(&txn, "cmd-2", None).unwrap();
        assert_eq!(
            storage.processed_command_txn(&txn, "cmd-1").unwrap(),
            Some(Some("order-9".to_string()))
        );
        txn.commit().unwrap();

        assert_eq!(
            storage.processed_command("cmd-1").unwrap(),
            Some(Some("order-9".to_string()))
        );
        assert_eq!(storage.processed_command("cmd-2").unwrap(), Some(None));
    }

    #[test]
    fn test_purge_all_removes_everything_but_sequence() {
        let storage = OrderStorage::open_in_memory().unwrap();
        put(&storage, &[snapshot("a", "c1", 100), snapshot("b", "c2", 200)]);

        let txn = storage.begin_write().unwrap();
        storage.set_sequence(&txn, 42).unwrap();
        let mut removed = storage.purge_all(&txn).unwrap();
        txn.commit().unwrap();

        removed.sort();
        assert_eq!(removed, vec!["a", "b"]);
        assert!(storage.get_snapshot("a").unwrap().is_none());
        assert!(storage.query_orders(&OrderQuery::all()).unwrap().is_empty());
        assert_eq!(storage.get_current_sequence().unwrap(), 42);
    }
}
