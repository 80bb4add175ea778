//! Order snapshot - computed state from event stream
//!
//! The snapshot is the Order entity every projection hands out. It carries a
//! `state_checksum` for drift detection between server and cached copies.

use super::status::{OrderStatus, StatusVocabulary, TimestampField, Transition};
use super::types::{LineItem, OrderTimestamps};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use thiserror::Error;

/// Order snapshot - computed from event stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (assigned by the store)
    pub order_id: String,
    /// Customer who placed the order
    pub customer_id: String,
    /// Assigned driver, set by the claim transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    /// Order status
    pub status: OrderStatus,
    /// Line items (snapshot at placement)
    pub items: Vec<LineItem>,
    /// Total frozen at placement
    pub total: f64,
    /// Delivery address (free text)
    pub delivery_address: String,
    /// Payment method label
    pub payment_method: String,
    /// Proof-of-delivery reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_photo_url: Option<String>,
    /// Cancel reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// One timestamp per transition reached
    #[serde(default)]
    pub timestamps: OrderTimestamps,
    /// Placement time (sort key of every projection)
    pub placed_at: i64,
    /// Sequence of the placement event, breaks ties within one millisecond
    #[serde(default)]
    pub placed_sequence: u64,
    /// Last update timestamp
    pub updated_at: i64,
    /// Last applied event sequence
    pub last_sequence: u64,
    /// State checksum for drift detection (hex string)
    #[serde(default)]
    pub state_checksum: String,
}

/// Invariant violated by a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("order {0} has a driver before assignment")]
    DriverBeforeAssignment(String),
    #[error("order {0} is in delivery without a driver")]
    MissingDriver(String),
    #[error("order {order_id} reached {status} without {field:?}")]
    MissingTimestamp {
        order_id: String,
        status: OrderStatus,
        field: TimestampField,
    },
}

impl OrderSnapshot {
    /// Create a new empty order
    pub fn new(order_id: String) -> Self {
        let now = crate::util::now_millis();
        let mut snapshot = Self {
            order_id,
            customer_id: String::new(),
            driver_id: None,
            status: OrderStatus::Pending,
            items: Vec::new(),
            total: 0.0,
            delivery_address: String::new(),
            payment_method: String::new(),
            proof_photo_url: None,
            cancel_reason: None,
            timestamps: OrderTimestamps::default(),
            placed_at: now,
            placed_sequence: 0,
            updated_at: now,
            last_sequence: 0,
            state_checksum: String::new(),
        };
        snapshot.update_checksum();
        snapshot
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_assigned_to(&self, driver_id: &str) -> bool {
        self.driver_id.as_deref() == Some(driver_id)
    }

    /// Wire status in the requested vocabulary
    pub fn status_name(&self, vocabulary: StatusVocabulary) -> &'static str {
        self.status.wire_name(vocabulary)
    }

    /// Move along the status machine and stamp the side-effect timestamps
    ///
    /// Returns `false` (and changes nothing) if the transition is illegal from
    /// the current status. Timestamps already set are never moved.
    pub fn record_transition(&mut self, transition: Transition, at: i64) -> bool {
        let Some(next) = self.status.next(transition) else {
            return false;
        };
        self.status = next;
        for field in transition.stamps() {
            self.timestamps.stamp(*field, at);
        }
        true
    }

    /// Check the entity invariants
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.status.is_pre_assignment() && self.driver_id.is_some() {
            return Err(InvariantViolation::DriverBeforeAssignment(
                self.order_id.clone(),
            ));
        }
        if self.status.requires_driver() && self.driver_id.as_deref().is_none_or(str::is_empty) {
            return Err(InvariantViolation::MissingDriver(self.order_id.clone()));
        }

        // Every step before the current one on the happy path must be stamped
        if let Some(pos) = OrderStatus::DELIVERY_PATH
            .iter()
            .position(|s| *s == self.status)
        {
            let mut status = OrderStatus::Pending;
            for _ in 0..pos {
                let Some(transition) = status
                    .allowed_transitions()
                    .into_iter()
                    .find(|t| *t != Transition::Cancel)
                else {
                    break;
                };
                for field in transition.stamps() {
                    if self.timestamps.get(*field).is_none() {
                        return Err(InvariantViolation::MissingTimestamp {
                            order_id: self.order_id.clone(),
                            status: self.status,
                            field: *field,
                        });
                    }
                }
                status = status.next(transition).unwrap_or(status);
            }
        }
        if self.status == OrderStatus::Cancelled && self.timestamps.cancelled_at.is_none() {
            return Err(InvariantViolation::MissingTimestamp {
                order_id: self.order_id.clone(),
                status: self.status,
                field: TimestampField::CancelledAt,
            });
        }
        Ok(())
    }

    /// Compute state checksum for drift detection
    ///
    /// Fields included: item count, total (cents), driver, last sequence, status.
    pub fn compute_checksum(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher as _;

        let mut hasher = DefaultHasher::new();
        self.items.len().hash(&mut hasher);
        ((self.total * 100.0).round() as i64).hash(&mut hasher);
        self.driver_id.hash(&mut hasher);
        self.last_sequence.hash(&mut hasher);
        self.status.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// Update the state_checksum field based on current state
    pub fn update_checksum(&mut self) {
        self.state_checksum = self.compute_checksum();
    }

    /// Returns false if drift is detected
    pub fn verify_checksum(&self) -> bool {
        self.state_checksum == self.compute_checksum()
    }
}

impl Default for OrderSnapshot {
    fn default() -> Self {
        Self::new(String::new())
    }
}
