//! PlaceOrder command handler
//!
//! Customer checkout. Freezes the cart into line item snapshots, computes the
//! total once and creates the order in `pending`.

use tracing::info;
use uuid::Uuid;

use super::new_event;
use crate::orders::money;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::models::Role;
use shared::order::{EventPayload, LineItemInput, OrderEvent, OrderEventType};

/// PlaceOrder action
#[derive(Debug, Clone)]
pub struct PlaceOrderAction {
    pub items: Vec<LineItemInput>,
    pub delivery_address: String,
    pub payment_method: String,
}

impl CommandHandler for PlaceOrderAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if metadata.actor.role != Role::Customer {
            return Err(OrderError::RoleNotPermitted {
                role: metadata.actor.role,
                action: "PLACE_ORDER".to_string(),
            });
        }

        // 1. Validate input
        money::validate_cart(&self.items)?;
        let delivery_address = self.delivery_address.trim();
        if delivery_address.is_empty() {
            return Err(OrderError::InvalidOrder(
                "delivery address must not be empty".to_string(),
            ));
        }
        let payment_method = self.payment_method.trim();
        if payment_method.is_empty() {
            return Err(OrderError::InvalidOrder(
                "payment method must not be empty".to_string(),
            ));
        }

        // 2. Assign the order ID
        let order_id = Uuid::new_v4().to_string();
        if ctx.order_exists(&order_id)? {
            return Err(OrderError::InvalidOrder(format!(
                "order id collision: {}",
                order_id
            )));
        }

        // 3. Snapshot the lines and freeze the total
        let items = money::snapshot_lines(&self.items);
        let total = money::order_total(&items);

        info!(
            order_id = %order_id,
            customer_id = %metadata.actor.id,
            item_count = items.len(),
            total,
            "Placing order"
        );

        let event = new_event(
            ctx,
            metadata,
            &order_id,
            OrderEventType::OrderPlaced,
            EventPayload::OrderPlaced {
                customer_id: metadata.actor.id.clone(),
                items,
                total,
                delivery_address: delivery_address.to_string(),
                payment_method: payment_method.to_string(),
            },
        );

        Ok(vec![event])
    }
}
