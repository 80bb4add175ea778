//! OrderPlaced event applier
//!
//! Creates the initial snapshot state from the checkout payload.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderPlaced applier
pub struct OrderPlacedApplier;

impl EventApplier for OrderPlacedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderPlaced {
            customer_id,
            items,
            total,
            delivery_address,
            payment_method,
        } = &event.payload
        {
            // Set order_id from event (important for replay scenarios)
            snapshot.order_id = event.order_id.clone();
            snapshot.customer_id = customer_id.clone();
            snapshot.driver_id = None;
            snapshot.items = items.clone();
            snapshot.total = *total;
            snapshot.delivery_address = delivery_address.clone();
            snapshot.payment_method = payment_method.clone();
            snapshot.status = OrderStatus::Pending;
            snapshot.placed_at = event.timestamp;
            snapshot.placed_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.last_sequence = event.sequence;

            snapshot.update_checksum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::appliers::test_support::event;
    use shared::order::{LineItem, OrderEventType};

    #[test]
    fn test_order_placed_applier() {
        let mut snapshot = OrderSnapshot::new("order-1".to_string());
        let event = event(
            1,
            OrderEventType::OrderPlaced,
            EventPayload::OrderPlaced {
                customer_id: "cust-1".to_string(),
                items: vec![LineItem {
                    product_id: "p1".to_string(),
                    name: "Sate Ayam".to_string(),
                    price: 25000.0,
                    quantity: 2,
                    category: Some("Makanan".to_string()),
                    line_total: 50000.0,
                }],
                total: 50000.0,
                delivery_address: "Jl. Merdeka 1".to_string(),
                payment_method: "cod".to_string(),
            },
        );

        OrderPlacedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.customer_id, "cust-1");
        assert_eq!(snapshot.status, OrderStatus::Pending);
        assert_eq!(snapshot.total, 50000.0);
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.placed_at, event.timestamp);
        assert_eq!(snapshot.last_sequence, 1);
        assert!(snapshot.driver_id.is_none());
        assert!(snapshot.verify_checksum());
        assert!(snapshot.check_invariants().is_ok());
    }
}
