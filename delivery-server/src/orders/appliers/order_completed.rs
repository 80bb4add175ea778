//! OrderCompleted event applier
//!
//! Final driver step. Stamps both `completed_at` and `delivered_at` and
//! stores the proof-of-delivery reference verbatim.

use super::apply_transition;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderCompleted applier
pub struct OrderCompletedApplier;

impl EventApplier for OrderCompletedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderCompleted { proof_photo_url } = &event.payload {
            if snapshot.status == OrderStatus::OnTheWay && proof_photo_url.is_some() {
                snapshot.proof_photo_url = proof_photo_url.clone();
            }
            apply_transition(snapshot, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::appliers::test_support::{event, order_through};
    use shared::order::{OrderEventType, Transition};

    #[test]
    fn test_completed_sets_both_timestamps_and_photo() {
        let mut snapshot = order_through(Some(Transition::Depart));
        let event = event(
            9,
            OrderEventType::OrderCompleted,
            EventPayload::OrderCompleted {
                proof_photo_url: Some("https://files.example/proof/1.jpg".to_string()),
            },
        );

        OrderCompletedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.status, OrderStatus::Completed);
        assert_eq!(snapshot.timestamps.completed_at, Some(event.timestamp));
        assert_eq!(snapshot.timestamps.delivered_at, Some(event.timestamp));
        assert_eq!(
            snapshot.proof_photo_url.as_deref(),
            Some("https://files.example/proof/1.jpg")
        );
        assert!(snapshot.check_invariants().is_ok());
    }

    #[test]
    fn test_completed_without_photo() {
        let mut snapshot = order_through(Some(Transition::Depart));
        let event = event(
            9,
            OrderEventType::OrderCompleted,
            EventPayload::OrderCompleted { proof_photo_url: None },
        );

        OrderCompletedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.status, OrderStatus::Completed);
        assert!(snapshot.proof_photo_url.is_none());
    }
}
