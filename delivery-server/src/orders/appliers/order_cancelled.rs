//! OrderCancelled event applier

use super::apply_transition;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// OrderCancelled applier: any non-terminal status → `cancelled`
pub struct OrderCancelledApplier;

impl EventApplier for OrderCancelledApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCancelled { reason } = &event.payload {
            if !snapshot.is_terminal() {
                snapshot.cancel_reason = reason.clone();
            }
            apply_transition(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::appliers::test_support::{event, order_through};
    use shared::order::{OrderEventType, OrderStatus, Transition};

    fn cancelled(reason: Option<&str>) -> OrderEvent {
        event(
            7,
            OrderEventType::OrderCancelled,
            EventPayload::OrderCancelled {
                reason: reason.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_cancel_in_delivery_keeps_driver() {
        let mut snapshot = order_through(Some(Transition::PickUp));

        OrderCancelledApplier.apply(&mut snapshot, &cancelled(Some("restoran tutup")));

        assert_eq!(snapshot.status, OrderStatus::Cancelled);
        assert_eq!(snapshot.cancel_reason.as_deref(), Some("restoran tutup"));
        assert_eq!(snapshot.timestamps.cancelled_at, Some(7_000));
        assert_eq!(snapshot.driver_id.as_deref(), Some("driver-1"));
    }

    #[test]
    fn test_cancel_after_completion_is_skipped() {
        let mut snapshot = order_through(Some(Transition::Complete));

        OrderCancelledApplier.apply(&mut snapshot, &cancelled(None));

        assert_eq!(snapshot.status, OrderStatus::Completed);
        assert!(snapshot.timestamps.cancelled_at.is_none());
    }
}
