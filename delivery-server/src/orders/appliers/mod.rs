//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific event type. Appliers are PURE functions.

use enum_dispatch::enum_dispatch;

use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

mod delivery_progressed;
mod order_cancelled;
mod order_claimed;
mod order_completed;
mod order_placed;
mod order_purged;
mod payment_confirmed;

pub use delivery_progressed::DeliveryProgressedApplier;
pub use order_cancelled::OrderCancelledApplier;
pub use order_claimed::OrderClaimedApplier;
pub use order_completed::OrderCompletedApplier;
pub use order_placed::OrderPlacedApplier;
pub use order_purged::OrderPurgedApplier;
pub use payment_confirmed::PaymentConfirmedApplier;

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderPlaced(OrderPlacedApplier),
    PaymentConfirmed(PaymentConfirmedApplier),
    OrderClaimed(OrderClaimedApplier),
    DeliveryProgressed(DeliveryProgressedApplier),
    OrderCompleted(OrderCompletedApplier),
    OrderCancelled(OrderCancelledApplier),
    OrderPurged(OrderPurgedApplier),
}

/// Convert OrderEvent reference to EventAction
///
/// This is the ONLY place with a match on EventPayload.
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderPlaced { .. } => EventAction::OrderPlaced(OrderPlacedApplier),
            EventPayload::PaymentConfirmed {} => {
                EventAction::PaymentConfirmed(PaymentConfirmedApplier)
            }
            EventPayload::OrderClaimed { .. } => EventAction::OrderClaimed(OrderClaimedApplier),
            EventPayload::DriverArrived {}
            | EventPayload::OrderPickedUp {}
            | EventPayload::OrderOnTheWay {} => {
                EventAction::DeliveryProgressed(DeliveryProgressedApplier)
            }
            EventPayload::OrderCompleted { .. } => {
                EventAction::OrderCompleted(OrderCompletedApplier)
            }
            EventPayload::OrderCancelled { .. } => {
                EventAction::OrderCancelled(OrderCancelledApplier)
            }
            EventPayload::OrderPurged {} => EventAction::OrderPurged(OrderPurgedApplier),
        }
    }
}

/// Move the snapshot along the edge the event records and stamp bookkeeping
///
/// Shared tail of every transition applier. An edge that is illegal from the
/// current status leaves the snapshot untouched apart from the sequence.
pub(crate) fn apply_transition(snapshot: &mut OrderSnapshot, event: &OrderEvent) {
    if let Some(transition) = event.payload.transition()
        && !snapshot.record_transition(transition, event.timestamp)
    {
        tracing::warn!(
            order_id = %event.order_id,
            status = %snapshot.status,
            transition = %transition,
            "Event does not fit the current status, skipped"
        );
    }
    snapshot.updated_at = event.timestamp;
    snapshot.last_sequence = event.sequence;
    snapshot.update_checksum();
}

#[cfg(test)]
pub(crate) mod test_support {
    use shared::models::Role;
    use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderSnapshot, Transition};

    pub fn event(sequence: u64, event_type: OrderEventType, payload: EventPayload) -> OrderEvent {
        let mut event = OrderEvent::new(
            sequence,
            "order-1".to_string(),
            "actor-1".to_string(),
            Role::Driver,
            format!("cmd-{sequence}"),
            None,
            event_type,
            payload,
        );
        event.timestamp = 1_000 * sequence as i64;
        event
    }

    /// An order walked along the happy path up to (and including) `until`
    pub fn order_through(until: Option<Transition>) -> OrderSnapshot {
        let mut order = OrderSnapshot::new("order-1".to_string());
        order.customer_id = "cust-1".to_string();
        order.placed_at = 1;
        let Some(until) = until else {
            return order;
        };
        for (i, transition) in Transition::ALL
            .into_iter()
            .filter(|t| *t != Transition::Cancel)
            .enumerate()
        {
            if transition == Transition::Claim {
                order.driver_id = Some("driver-1".to_string());
            }
            order.record_transition(transition, 10 + i as i64);
            if transition == until {
                break;
            }
        }
        order
    }
}
