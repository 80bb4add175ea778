//! CancelOrder command handler
//!
//! | Actor | Allowed from |
//! |-------|--------------|
//! | customer (own order) | `pending`, `paid` |
//! | owner | any non-terminal status |
//! | driver | never |

use tracing::info;

use super::{ensure_transition, new_event};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::models::Role;
use shared::order::{EventPayload, OrderEvent, OrderEventType, OrderSnapshot, Transition};

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: Option<String>,
}

fn may_cancel(role: Role, actor_id: &str, snapshot: &OrderSnapshot) -> bool {
    match role {
        Role::Owner => true,
        Role::Customer => {
            snapshot.customer_id == actor_id
                && (snapshot.status.is_pre_assignment() || snapshot.is_terminal())
        }
        Role::Driver => false,
    }
}

impl CommandHandler for CancelOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let snapshot = ctx.load_snapshot(&self.order_id)?;
        let actor = &metadata.actor;

        // Terminal orders fall through to the transition check so the caller
        // gets InvalidTransition rather than a role error
        if !may_cancel(actor.role, &actor.id, &snapshot) {
            return Err(OrderError::RoleNotPermitted {
                role: actor.role,
                action: Transition::Cancel.to_string(),
            });
        }
        ensure_transition(&snapshot, Transition::Cancel)?;

        let reason = self
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        info!(
            order_id = %self.order_id,
            actor_id = %actor.id,
            role = %actor.role,
            from = %snapshot.status,
            reason = ?reason,
            "Order cancelled"
        );

        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventType::OrderCancelled,
            EventPayload::OrderCancelled { reason },
        );
        Ok(vec![event])
    }
}
