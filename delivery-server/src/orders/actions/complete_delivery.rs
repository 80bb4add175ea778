//! CompleteDelivery command handler
//!
//! Final driver step `otw_menuju_lokasi → pesanan_selesai`. The photo itself
//! lives in binary storage; only its reference travels with the event, so
//! photo and status land in the same write.

use tracing::info;

use super::{ensure_assigned_driver, ensure_transition, new_event};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderEventType, Transition};

/// CompleteDelivery action
#[derive(Debug, Clone)]
pub struct CompleteDeliveryAction {
    pub order_id: String,
    pub proof_photo_url: Option<String>,
}

impl CommandHandler for CompleteDeliveryAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        ensure_assigned_driver(&metadata.actor, &snapshot, Transition::Complete)?;
        ensure_transition(&snapshot, Transition::Complete)?;

        let proof_photo_url = self
            .proof_photo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        info!(
            order_id = %self.order_id,
            driver_id = %metadata.actor.id,
            has_photo = proof_photo_url.is_some(),
            "Delivery completed"
        );

        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventType::OrderCompleted,
            EventPayload::OrderCompleted { proof_photo_url },
        );
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::{fold, run, seed};
    use crate::orders::appliers::test_support::order_through;
    use crate::orders::storage::OrderStorage;
    use shared::models::Actor;
    use shared::order::OrderStatus;

    #[test]
    fn test_complete_with_photo() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let on_the_way = order_through(Some(Transition::Depart));
        seed(&storage, &on_the_way);

        let action = CompleteDeliveryAction {
            order_id: "order-1".to_string(),
            proof_photo_url: Some(" https://files.example/pod/order-1.jpg ".to_string()),
        };
        let events = run(&storage, &action, Actor::driver("driver-1")).unwrap();
        let order = fold(on_the_way, &events);

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(
            order.proof_photo_url.as_deref(),
            Some("https://files.example/pod/order-1.jpg")
        );
        assert!(order.timestamps.completed_at.is_some());
        assert_eq!(order.timestamps.completed_at, order.timestamps.delivered_at);
    }

    #[test]
    fn test_blank_photo_is_dropped() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed(&storage, &order_through(Some(Transition::Depart)));

        let action = CompleteDeliveryAction {
            order_id: "order-1".to_string(),
            proof_photo_url: Some("  ".to_string()),
        };
        let events = run(&storage, &action, Actor::driver("driver-1")).unwrap();
        assert!(matches!(
            events[0].payload,
            EventPayload::OrderCompleted { proof_photo_url: None }
        ));
    }

    #[test]
    fn test_complete_before_departure_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed(&storage, &order_through(Some(Transition::PickUp)));

        let action = CompleteDeliveryAction {
            order_id: "order-1".to_string(),
            proof_photo_url: None,
        };
        let result = run(&storage, &action, Actor::driver("driver-1"));
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
    }
}
