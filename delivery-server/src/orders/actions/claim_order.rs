//! ClaimOrder command handler
//!
//! A driver attaches itself to a `paid` order. The driver ID and the
//! `paid → pesanan_dibuat` move are one event, written in one transaction.
//! Write transactions are serialized, so when two drivers race the second
//! one sees the order already claimed (first write wins).

use tracing::{info, warn};

use super::{ensure_transition, new_event};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::models::Role;
use shared::order::{EventPayload, OrderEvent, OrderEventType, Transition};

/// ClaimOrder action
#[derive(Debug, Clone)]
pub struct ClaimOrderAction {
    pub order_id: String,
}

impl CommandHandler for ClaimOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let actor = &metadata.actor;
        if actor.role != Role::Driver {
            return Err(OrderError::RoleNotPermitted {
                role: actor.role,
                action: Transition::Claim.to_string(),
            });
        }

        let snapshot = ctx.load_snapshot(&self.order_id)?;

        if let Some(driver_id) = &snapshot.driver_id {
            warn!(
                order_id = %self.order_id,
                claimed_by = %driver_id,
                attempted_by = %actor.id,
                "Claim lost: order already has a driver"
            );
            return Err(OrderError::AlreadyClaimed {
                order_id: self.order_id.clone(),
                driver_id: driver_id.clone(),
            });
        }

        ensure_transition(&snapshot, Transition::Claim)?;

        info!(order_id = %self.order_id, driver_id = %actor.id, "Order claimed");

        let event = new_event(
            ctx,
            metadata,
            &self.order_id,
            OrderEventType::OrderClaimed,
            EventPayload::OrderClaimed {
                driver_id: actor.id.clone(),
            },
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

    fn action() -> ClaimOrderAction {
        ClaimOrderAction {
            order_id: "order-1".to_string(),
        }
    }

    #[test]
    fn test_driver_claims_paid_order() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let paid = order_through(Some(Transition::ConfirmPayment));
        seed(&storage, &paid);

        let events = run(&storage, &action(), Actor::driver("driver-7")).unwrap();
        let order = fold(paid, &events);

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.driver_id.as_deref(), Some("driver-7"));
        assert!(order.check_invariants().is_ok());
    }

    #[test]
    fn test_claim_unpaid_order_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed(&storage, &order_through(None));

        let result = run(&storage, &action(), Actor::driver("driver-7"));
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
    }

    #[test]
    fn test_claim_claimed_order_rejected() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed(&storage, &order_through(Some(Transition::Claim)));

        let result = run(&storage, &action(), Actor::driver("driver-7"));
        assert_eq!(
            result.unwrap_err(),
            OrderError::AlreadyClaimed {
                order_id: "order-1".to_string(),
                driver_id: "driver-1".to_string(),
            }
        );
    }

    #[test]
    fn test_customer_cannot_claim() {
        let storage = OrderStorage::open_in_memory().unwrap();
        seed(&storage, &order_through(Some(Transition::ConfirmPayment)));

        let result = run(&storage, &action(), Actor::customer("cust-1"));
        assert!(matches!(result, Err(OrderError::RoleNotPermitted { .. })));
    }
}
