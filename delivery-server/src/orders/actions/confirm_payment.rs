//! ConfirmPayment command handler
//!
//! Mock payment acknowledgment: `pending → paid`.

use tracing::info;

use super::{ensure_transition, new_event};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::models::Role;
use shared::order::{EventPayload, OrderEvent, OrderEventType, Transition};

/// ConfirmPayment action
#[derive(Debug, Clone)]
pub struct ConfirmPaymentAction {
    pub order_id: String,
}

impl CommandHandler for ConfirmPaymentAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        let actor = &metadata.actor;
        let permitted = match actor.role {
            Role::Owner => true,
            Role::Customer => snapshot.customer_id == actor.id,
            Role::Driver => false,
        };
        if !permitted {
            return Err(OrderError::RoleNotPermitted {
                role: actor.role,
                action: Transition::ConfirmPayment.to_string(),
            });
        }

        ensure_transition(&snapshot, Transition::ConfirmPayment)?;

        info!(order_id = %self.order_id, actor_id = %actor.id, "Payment confirmed");

        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventType::PaymentConfirmed,
            EventPayload::PaymentConfirmed {},
        );
        Ok(vec![event])
    }
}
