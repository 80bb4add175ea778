//! AdvanceDelivery command handler
//!
//! The intermediate driver steps: arrive at the restaurant, pick up, depart.

use tracing::info;

use super::{ensure_assigned_driver, ensure_transition, new_event};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{EventPayload, OrderEvent, OrderEventType, Transition};

/// AdvanceDelivery action
#[derive(Debug, Clone)]
pub struct AdvanceDeliveryAction {
    pub order_id: String,
    /// One of `ArriveAtRestaurant`, `PickUp`, `Depart`
    pub transition: Transition,
}

impl AdvanceDeliveryAction {
    fn payload(&self) -> Result<EventPayload, OrderError> {
        match self.transition {
            Transition::ArriveAtRestaurant => Ok(EventPayload::DriverArrived {}),
            Transition::PickUp => Ok(EventPayload::OrderPickedUp {}),
            Transition::Depart => Ok(EventPayload::OrderOnTheWay {}),
            other => Err(OrderError::InvalidOrder(format!(
                "{} is not a delivery step",
                other
            ))),
        }
    }
}

impl CommandHandler for AdvanceDeliveryAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let payload = self.payload()?;
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        ensure_assigned_driver(&metadata.actor, &snapshot, self.transition)?;
        let next = ensure_transition(&snapshot, self.transition)?;

        info!(
            order_id = %self.order_id,
            driver_id = %metadata.actor.id,
            from = %snapshot.status,
            to = %next,
            "Delivery step"
        );

        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventType::for_transition(self.transition),
            payload,
        );
        Ok(vec![event])
    }
}
