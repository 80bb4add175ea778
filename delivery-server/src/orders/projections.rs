//! Per-role read projections
//!
//! Every projection is one `OrderQuery` against the placement index, so the
//! store decides the order of the result set (placement time descending).
//! Projections never write.
//!
//! | Key | Filter | Who may read |
//! |-----|--------|--------------|
//! | `Customer(id)` | `customer_id == id` | that customer, owner |
//! | `Driver(id)` | board statuses, empty while offline | that driver, owner |
//! | `Owner` | none | owner |
//! | `Order(id)` | one document | owner, its customer, its driver, any driver while `paid` |

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::manager::{ManagerError, OrdersManager};
use super::storage::OrderQuery;
use crate::drivers::{DriverPresence, PresenceChange};
use shared::models::{Actor, Role};
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// Statuses the driver board is built from
///
/// Pre-assignment statuses, every in-progress status and completed
/// deliveries. Cancelled orders never reach a driver.
pub const DRIVER_BOARD_STATUSES: [OrderStatus; 7] = OrderStatus::DELIVERY_PATH;

/// Identifies one live projection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProjectionKey {
    Customer(String),
    Driver(String),
    Owner,
    Order(String),
}

impl fmt::Display for ProjectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionKey::Customer(id) => write!(f, "customer:{id}"),
            ProjectionKey::Driver(id) => write!(f, "driver:{id}"),
            ProjectionKey::Owner => f.write_str("owner"),
            ProjectionKey::Order(id) => write!(f, "order:{id}"),
        }
    }
}

/// Projection failures
///
/// Cloneable so the last error can sit in a watch channel.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Order store unavailable: {0}")]
    Store(String),

    #[error("Live feed closed")]
    FeedClosed,
}

impl From<ManagerError> for ProjectionError {
    fn from(err: ManagerError) -> Self {
        ProjectionError::Store(err.to_string())
    }
}

/// Full result set of one projection at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionSnapshot {
    pub key: ProjectionKey,
    /// Placement time descending
    pub orders: Vec<OrderSnapshot>,
    /// Store sequence observed before the query ran
    pub sequence: u64,
}

impl ProjectionSnapshot {
    pub fn order_ids(&self) -> HashSet<String> {
        self.orders.iter().map(|o| o.order_id.clone()).collect()
    }
}

/// Read-only query surface over the order store
#[derive(Debug, Clone)]
pub struct OrderProjections {
    manager: OrdersManager,
    presence: DriverPresence,
}

impl OrderProjections {
    pub fn new(manager: OrdersManager, presence: DriverPresence) -> Self {
        Self { manager, presence }
    }

    pub fn manager(&self) -> &OrdersManager {
        &self.manager
    }

    pub fn presence(&self) -> &DriverPresence {
        &self.presence
    }

    // ========== Queries ==========

    /// Orders placed by one customer
    pub fn customer_orders(&self, customer_id: &str) -> Result<Vec<OrderSnapshot>, ProjectionError> {
        Ok(self
            .manager
            .query_orders(&OrderQuery::for_customer(customer_id))?)
    }

    /// The driver board; empty whenever the driver is offline
    pub fn driver_orders(&self, driver_id: &str) -> Result<Vec<OrderSnapshot>, ProjectionError> {
        if !self.presence.is_online(driver_id) {
            return Ok(Vec::new());
        }
        Ok(self
            .manager
            .query_orders(&OrderQuery::all().with_statuses(&DRIVER_BOARD_STATUSES))?)
    }

    /// Every order in the store
    pub fn owner_orders(&self) -> Result<Vec<OrderSnapshot>, ProjectionError> {
        Ok(self.manager.query_orders(&OrderQuery::all())?)
    }

    /// One order, `None` if it does not exist
    pub fn order(&self, order_id: &str) -> Result<Option<OrderSnapshot>, ProjectionError> {
        Ok(self.manager.get_snapshot(order_id)?)
    }

    // ========== Access ==========

    /// Check that `actor` may read the list projection `key`
    ///
    /// Single-order keys are checked against the loaded document in
    /// [`Self::evaluate`].
    pub fn authorize(&self, actor: &Actor, key: &ProjectionKey) -> Result<(), ProjectionError> {
        let allowed = match key {
            ProjectionKey::Customer(id) => {
                actor.is_owner() || (actor.role == Role::Customer && actor.id == *id)
            }
            ProjectionKey::Driver(id) => {
                actor.is_owner() || (actor.role == Role::Driver && actor.id == *id)
            }
            ProjectionKey::Owner => actor.is_owner(),
            ProjectionKey::Order(_) => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(denied(actor, key))
        }
    }

    /// Run the projection for `key` as seen by `actor`
    ///
    /// `Ok(None)` only for a single-order key whose order does not exist.
    pub fn evaluate(
        &self,
        actor: &Actor,
        key: &ProjectionKey,
    ) -> Result<Option<ProjectionSnapshot>, ProjectionError> {
        self.authorize(actor, key)?;
        let sequence = self.manager.get_current_sequence()?;

        let orders = match key {
            ProjectionKey::Customer(id) => self.customer_orders(id)?,
            ProjectionKey::Driver(id) => self.driver_orders(id)?,
            ProjectionKey::Owner => self.owner_orders()?,
            ProjectionKey::Order(id) => {
                let Some(order) = self.order(id)? else {
                    return Ok(None);
                };
                if !can_read_order(actor, &order) {
                    return Err(denied(actor, key));
                }
                vec![order]
            }
        };

        Ok(Some(ProjectionSnapshot {
            key: key.clone(),
            orders,
            sequence,
        }))
    }
}

fn denied(actor: &Actor, key: &ProjectionKey) -> ProjectionError {
    tracing::warn!(actor_id = %actor.id, role = %actor.role, key = %key, "Projection access denied");
    ProjectionError::PermissionDenied(format!("{} {} may not read {}", actor.role, actor.id, key))
}

fn can_read_order(actor: &Actor, order: &OrderSnapshot) -> bool {
    match actor.role {
        Role::Owner => true,
        Role::Customer => order.customer_id == actor.id,
        Role::Driver => order.is_assigned_to(&actor.id) || order.status.is_biddable(),
    }
}

// ========== Relevance ==========

/// Could `event` change the result of projection `key`?
///
/// `visible` holds the order IDs of the last emitted result. Over-reporting
/// only costs a re-query; under-reporting would leave a view stale.
pub fn event_touches(key: &ProjectionKey, event: &OrderEvent, visible: &HashSet<String>) -> bool {
    if matches!(event.payload, EventPayload::OrderPurged {}) {
        return true;
    }
    match key {
        ProjectionKey::Customer(customer_id) => match &event.payload {
            EventPayload::OrderPlaced {
                customer_id: placed_by,
                ..
            } => placed_by == customer_id,
            _ => visible.contains(&event.order_id),
        },
        ProjectionKey::Driver(_) | ProjectionKey::Owner => true,
        ProjectionKey::Order(order_id) => event.order_id == *order_id,
    }
}

/// Could a presence change alter projection `key`?
pub fn presence_touches(key: &ProjectionKey, change: &PresenceChange) -> bool {
    matches!(key, ProjectionKey::Driver(id) if *id == change.driver_id)
}
