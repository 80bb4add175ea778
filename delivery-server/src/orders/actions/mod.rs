//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type. Role rules and the transition table are
//! checked here, before any event exists.

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::models::{Actor, Role};
use shared::order::{
    EventPayload, OrderCommand, OrderCommandPayload, OrderEvent, OrderEventType, OrderSnapshot,
    OrderStatus, Transition,
};

mod advance_delivery;
mod cancel_order;
mod claim_order;
mod complete_delivery;
mod confirm_payment;
mod place_order;
mod purge_orders;

pub use advance_delivery::AdvanceDeliveryAction;
pub use cancel_order::CancelOrderAction;
pub use claim_order::ClaimOrderAction;
pub use complete_delivery::CompleteDeliveryAction;
pub use confirm_payment::ConfirmPaymentAction;
pub use place_order::PlaceOrderAction;
pub use purge_orders::PurgeOrdersAction;

/// CommandAction enum - dispatches to concrete action implementations
pub enum CommandAction {
    PlaceOrder(PlaceOrderAction),
    ConfirmPayment(ConfirmPaymentAction),
    ClaimOrder(ClaimOrderAction),
    AdvanceDelivery(AdvanceDeliveryAction),
    CompleteDelivery(CompleteDeliveryAction),
    CancelOrder(CancelOrderAction),
    PurgeOrders(PurgeOrdersAction),
}

/// Manual implementation of CommandHandler for CommandAction
impl CommandHandler for CommandAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self {
            CommandAction::PlaceOrder(action) => action.execute(ctx, metadata),
            CommandAction::ConfirmPayment(action) => action.execute(ctx, metadata),
            CommandAction::ClaimOrder(action) => action.execute(ctx, metadata),
            CommandAction::AdvanceDelivery(action) => action.execute(ctx, metadata),
            CommandAction::CompleteDelivery(action) => action.execute(ctx, metadata),
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata),
            CommandAction::PurgeOrders(action) => action.execute(ctx, metadata),
        }
    }
}

/// Convert OrderCommand to CommandAction
///
/// This is the ONLY place with a match on OrderCommandPayload.
impl From<&OrderCommand> for CommandAction {
    fn from(cmd: &OrderCommand) -> Self {
        match &cmd.payload {
            OrderCommandPayload::PlaceOrder {
                items,
                delivery_address,
                payment_method,
            } => CommandAction::PlaceOrder(PlaceOrderAction {
                items: items.clone(),
                delivery_address: delivery_address.clone(),
                payment_method: payment_method.clone(),
            }),
            OrderCommandPayload::ApplyTransition {
                order_id,
                transition,
                proof_photo_url,
                reason,
            } => {
                let order_id = order_id.clone();
                match transition {
                    Transition::ConfirmPayment => {
                        CommandAction::ConfirmPayment(ConfirmPaymentAction { order_id })
                    }
                    Transition::Claim => CommandAction::ClaimOrder(ClaimOrderAction { order_id }),
                    Transition::ArriveAtRestaurant | Transition::PickUp | Transition::Depart => {
                        CommandAction::AdvanceDelivery(AdvanceDeliveryAction {
                            order_id,
                            transition: *transition,
                        })
                    }
                    Transition::Complete => {
                        CommandAction::CompleteDelivery(CompleteDeliveryAction {
                            order_id,
                            proof_photo_url: proof_photo_url.clone(),
                        })
                    }
                    Transition::Cancel => CommandAction::CancelOrder(CancelOrderAction {
                        order_id,
                        reason: reason.clone(),
                    }),
                }
            }
            OrderCommandPayload::PurgeOrders {} => CommandAction::PurgeOrders(PurgeOrdersAction),
        }
    }
}

// ========== Shared checks ==========

/// Reject the transition unless the table allows it from the current status
pub(crate) fn ensure_transition(
    snapshot: &OrderSnapshot,
    transition: Transition,
) -> Result<OrderStatus, OrderError> {
    snapshot
        .status
        .next(transition)
        .ok_or_else(|| OrderError::InvalidTransition {
            order_id: snapshot.order_id.clone(),
            from: snapshot.status,
            transition,
        })
}

/// Only the assigned driver moves an order along the delivery path
pub(crate) fn ensure_assigned_driver(
    actor: &Actor,
    snapshot: &OrderSnapshot,
    transition: Transition,
) -> Result<(), OrderError> {
    if actor.role != Role::Driver {
        return Err(OrderError::RoleNotPermitted {
            role: actor.role,
            action: transition.to_string(),
        });
    }
    if !snapshot.is_assigned_to(&actor.id) {
        return Err(OrderError::NotAssignedDriver(snapshot.order_id.clone()));
    }
    Ok(())
}

/// Build an event for the command being executed
pub(crate) fn new_event(
    ctx: &mut CommandContext<'_>,
    metadata: &CommandMetadata,
    order_id: &str,
    event_type: OrderEventType,
    payload: EventPayload,
) -> OrderEvent {
    OrderEvent::new(
        ctx.next_sequence(),
        order_id.to_string(),
        metadata.actor.id.clone(),
        metadata.actor.role,
        metadata.command_id.clone(),
        Some(metadata.timestamp),
        event_type,
        payload,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::orders::appliers::EventAction;
    use crate::orders::storage::OrderStorage;
    use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError};
    use shared::models::Actor;
    use shared::order::{OrderEvent, OrderSnapshot};

    pub fn metadata(actor: Actor) -> CommandMetadata {
        CommandMetadata {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor,
            timestamp: shared::util::now_millis(),
        }
    }

    /// Store a snapshot as-is
    pub fn seed(storage: &OrderStorage, snapshot: &OrderSnapshot) {
        let txn = storage.begin_write().unwrap();
        storage.store_snapshot(&txn, snapshot).unwrap();
        txn.commit().unwrap();
    }

    /// Run one action against storage without committing
    pub fn run(
        storage: &OrderStorage,
        action: &impl CommandHandler,
        actor: Actor,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, storage, 0);
        action.execute(&mut ctx, &metadata(actor))
    }

    /// Fold events into a copy of the snapshot
    pub fn fold(mut snapshot: OrderSnapshot, events: &[OrderEvent]) -> OrderSnapshot {
        for event in events {
            EventAction::from(event).apply(&mut snapshot, event);
        }
        snapshot
    }
}
