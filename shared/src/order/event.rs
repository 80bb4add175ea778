//! Order events - immutable facts recorded after command processing

use super::status::Transition;
use super::types::LineItem;
use crate::models::Role;
use serde::{Deserialize, Serialize};

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Global sequence number (for ordering and replay)
    pub sequence: u64,
    /// Order this event belongs to
    pub order_id: String,
    /// Server timestamp (Unix milliseconds) - authoritative for every `*_at` field
    pub timestamp: i64,
    /// Client timestamp (Unix milliseconds), kept for audit only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Actor who triggered this event
    pub actor_id: String,
    /// Actor role at the time of the command
    pub actor_role: Role,
    /// Command that triggered this event
    pub command_id: String,
    /// Event type
    pub event_type: OrderEventType,
    /// Event payload
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    OrderPlaced,
    PaymentConfirmed,
    OrderClaimed,
    DriverArrived,
    OrderPickedUp,
    OrderOnTheWay,
    OrderCompleted,
    OrderCancelled,
    OrderPurged,
}

impl OrderEventType {
    /// Event type recorded for a transition
    pub fn for_transition(transition: Transition) -> Self {
        match transition {
            Transition::ConfirmPayment => OrderEventType::PaymentConfirmed,
            Transition::Claim => OrderEventType::OrderClaimed,
            Transition::ArriveAtRestaurant => OrderEventType::DriverArrived,
            Transition::PickUp => OrderEventType::OrderPickedUp,
            Transition::Depart => OrderEventType::OrderOnTheWay,
            Transition::Complete => OrderEventType::OrderCompleted,
            Transition::Cancel => OrderEventType::OrderCancelled,
        }
    }
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderPlaced => write!(f, "ORDER_PLACED"),
            OrderEventType::PaymentConfirmed => write!(f, "PAYMENT_CONFIRMED"),
            OrderEventType::OrderClaimed => write!(f, "ORDER_CLAIMED"),
            OrderEventType::DriverArrived => write!(f, "DRIVER_ARRIVED"),
            OrderEventType::OrderPickedUp => write!(f, "ORDER_PICKED_UP"),
            OrderEventType::OrderOnTheWay => write!(f, "ORDER_ON_THE_WAY"),
            OrderEventType::OrderCompleted => write!(f, "ORDER_COMPLETED"),
            OrderEventType::OrderCancelled => write!(f, "ORDER_CANCELLED"),
            OrderEventType::OrderPurged => write!(f, "ORDER_PURGED"),
        }
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Lifecycle ==========
    OrderPlaced {
        customer_id: String,
        items: Vec<LineItem>,
        total: f64,
        delivery_address: String,
        payment_method: String,
    },

    PaymentConfirmed {},

    /// Driver attaches itself; written together with the status change
    OrderClaimed {
        driver_id: String,
    },

    // ========== Delivery ==========
    DriverArrived {},

    OrderPickedUp {},

    OrderOnTheWay {},

    OrderCompleted {
        #[serde(skip_serializing_if = "Option::is_none")]
        proof_photo_url: Option<String>,
    },

    // ========== Terminal / Admin ==========
    OrderCancelled {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Broadcast only, never stored: the order no longer exists
    OrderPurged {},
}

impl EventPayload {
    /// The status machine edge this payload records, if any
    pub fn transition(&self) -> Option<Transition> {
        match self {
            EventPayload::PaymentConfirmed {} => Some(Transition::ConfirmPayment),
            EventPayload::OrderClaimed { .. } => Some(Transition::Claim),
            EventPayload::DriverArrived {} => Some(Transition::ArriveAtRestaurant),
            EventPayload::OrderPickedUp {} => Some(Transition::PickUp),
            EventPayload::OrderOnTheWay {} => Some(Transition::Depart),
            EventPayload::OrderCompleted { .. } => Some(Transition::Complete),
            EventPayload::OrderCancelled { .. } => Some(Transition::Cancel),
            EventPayload::OrderPlaced { .. } | EventPayload::OrderPurged {} => None,
        }
    }
}

impl OrderEvent {
    /// Create a new event
    ///
    /// # Arguments
    /// * `sequence` - Global sequence number (authoritative ordering)
    /// * `order_id` - Order this event belongs to
    /// * `actor_id` / `actor_role` - Who triggered this event
    /// * `command_id` - Command that triggered this event
    /// * `client_timestamp` - Client-provided timestamp (audit only)
    /// * `event_type` - Event type
    /// * `payload` - Event payload
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        order_id: String,
        actor_id: String,
        actor_role: Role,
        command_id: String,
        client_timestamp: Option<i64>,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            sequence,
            order_id,
            timestamp: crate::util::now_millis(),
            client_timestamp,
            actor_id,
            actor_role,
            command_id,
            event_type,
            payload,
        }
    }

    /// Create event from command (extracts actor and client timestamp)
    pub fn from_command(
        sequence: u64,
        order_id: String,
        command: &super::OrderCommand,
        event_type: OrderEventType,
        payload: EventPayload,
    ) -> Self {
        Self::new(
            sequence,
            order_id,
            command.actor.id.clone(),
            command.actor.role,
            command.command_id.clone(),
            Some(command.timestamp),
            event_type,
            payload,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_matches_payload_transition() {
        for transition in Transition::ALL {
            let payload = match transition {
                Transition::ConfirmPayment => EventPayload::PaymentConfirmed {},
                Transition::Claim => EventPayload::OrderClaimed {
                    driver_id: "driver-1".to_string(),
                },
                Transition::ArriveAtRestaurant => EventPayload::DriverArrived {},
                Transition::PickUp => EventPayload::OrderPickedUp {},
                Transition::Depart => EventPayload::OrderOnTheWay {},
                Transition::Complete => EventPayload::OrderCompleted {
                    proof_photo_url: None,
                },
                Transition::Cancel => EventPayload::OrderCancelled { reason: None },
            };
            assert_eq!(payload.transition(), Some(transition));
        }
    }

    #[test]
    fn test_payload_is_tagged() {
        let json = serde_json::to_value(EventPayload::OrderClaimed {
            driver_id: "driver-7".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "ORDER_CLAIMED");
        assert_eq!(json["driver_id"], "driver-7");
    }
}
