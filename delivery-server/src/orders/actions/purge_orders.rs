//! PurgeOrders command handler
//!
//! Owner-only bulk purge. Removes every order inside the command's write
//! transaction and emits one `OrderPurged` event per removed order so live
//! subscribers drop them. Purge events are broadcast, never stored.

use tracing::warn;

use super::new_event;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::models::Role;
use shared::order::{EventPayload, OrderEvent, OrderEventType};

/// PurgeOrders action
#[derive(Debug, Clone)]
pub struct PurgeOrdersAction;

impl CommandHandler for PurgeOrdersAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if metadata.actor.role != Role::Owner {
            return Err(OrderError::RoleNotPermitted {
                role: metadata.actor.role,
                action: "PURGE_ORDERS".to_string(),
            });
        }

        let order_ids = ctx.purge_all_orders()?;
        warn!(
            actor_id = %metadata.actor.id,
            purged = order_ids.len(),
            "All orders purged"
        );

        Ok(order_ids
            .iter()
            .map(|order_id| {
                new_event(
                    ctx,
                    metadata,
                    order_id,
                    OrderEventType::OrderPurged,
                    EventPayload::OrderPurged {},
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::actions::test_support::{run, seed};
    use crate::orders::appliers::test_support::order_through;
    use crate::orders::storage::OrderStorage;
    use shared::models::Actor;

    #[test]
    fn test_owner_purges() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed(&storage, &order_through(None));

        let events = run(&storage, &PurgeOrdersAction, Actor::owner("owner-1")).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, OrderEventType::OrderPurged);
        assert_eq!(events[0].order_id, "order-1");
    }

    #[test]
    fn test_customer_cannot_purge() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let result = run(&storage, &PurgeOrdersAction, Actor::customer("cust-1"));
        assert!(matches!(result, Err(OrderError::RoleNotPermitted { .. })));
    }
}
