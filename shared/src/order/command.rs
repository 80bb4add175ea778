//! Order commands - requests from role views to change orders

use super::status::Transition;
use super::types::LineItemInput;
use crate::models::Actor;
use serde::{Deserialize, Serialize};

/// Order command
///
/// `command_id` is the idempotency key: replaying the same command is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
    /// Unique command ID
    pub command_id: String,
    /// Who issued the command (role claim trusted from the identity provider)
    pub actor: Actor,
    /// Client timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Command payload
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    pub fn new(actor: Actor, payload: OrderCommandPayload) -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor,
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    /// Shorthand for a status transition command
    pub fn transition(actor: Actor, order_id: impl Into<String>, transition: Transition) -> Self {
        Self::new(
            actor,
            OrderCommandPayload::ApplyTransition {
                order_id: order_id.into(),
                transition,
                proof_photo_url: None,
                reason: None,
            },
        )
    }

    /// Order this command targets (None for PlaceOrder/PurgeOrders)
    pub fn order_id(&self) -> Option<&str> {
        match &self.payload {
            OrderCommandPayload::ApplyTransition { order_id, .. } => Some(order_id),
            OrderCommandPayload::PlaceOrder { .. } | OrderCommandPayload::PurgeOrders {} => None,
        }
    }
}

/// Command payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    /// Customer checkout: creates the order in `pending`
    PlaceOrder {
        items: Vec<LineItemInput>,
        delivery_address: String,
        payment_method: String,
    },

    /// Move an order along the status machine
    ApplyTransition {
        order_id: String,
        transition: Transition,
        /// Proof-of-delivery reference (URL in binary storage), only for Complete
        #[serde(default, skip_serializing_if = "Option::is_none")]
        proof_photo_url: Option<String>,
        /// Free-text reason, only for Cancel
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Administrative bulk purge of every order
    PurgeOrders {},
}
