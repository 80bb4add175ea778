//! Derived view state for the three role screens
//!
//! Pure functions from projection results to what each screen renders.
//! Nothing here touches the store.

pub mod customer;
pub mod driver;
pub mod owner;

pub use customer::{CustomerOrderRow, CustomerTracking, TrackingStep};
pub use driver::{DriverAction, DriverBoard, DriverCard};
pub use owner::{OwnerDashboard, OwnerOrderDetail, OwnerRow, StatusCount, TimelineEntry};

use shared::order::{OrderSnapshot, OrderStatus, Transition};

/// When the order entered `status`, if it did
///
/// `pending` is entered at placement; every other status by the transition
/// leading into it.
pub(crate) fn reached_at(order: &OrderSnapshot, status: OrderStatus) -> Option<i64> {
    if status == OrderStatus::Pending {
        return Some(order.placed_at);
    }
    let transition = Transition::ALL.into_iter().find(|t| {
        OrderStatus::ALL
            .iter()
            .any(|from| !from.is_terminal() && from.next(*t) == Some(status))
    })?;
    transition
        .stamps()
        .first()
        .and_then(|field| order.timestamps.get(*field))
}

#[cfg(test)]
pub(crate) mod test_support {
    use shared::order::{LineItem, OrderSnapshot, Transition};

    /// An order with two lines, walked through `transitions` one second apart
    pub fn order(order_id: &str, driver: Option<&str>, transitions: &[Transition]) -> OrderSnapshot {
        let mut order = OrderSnapshot::new(order_id.to_string());
        order.customer_id = "cust-1".to_string();
        order.placed_at = 1_000;
        order.total = 50_000.0;
        order.items = vec![
            LineItem {
                product_id: "rendang".into(),
                name: "Rendang".into(),
                price: 17_500.0,
                quantity: 2,
                category: None,
                line_total: 35_000.0,
            },
            LineItem {
                product_id: "es-teh".into(),
                name: "Es Teh".into(),
                price: 15_000.0,
                quantity: 1,
                category: None,
                line_total: 15_000.0,
            },
        ];
        for (i, transition) in transitions.iter().enumerate() {
            if *transition == Transition::Claim {
                order.driver_id = driver.map(str::to_string);
            }
            assert!(order.record_transition(*transition, 2_000 + 1_000 * i as i64));
        }
        order
    }

    pub const TO_DELIVERED: [Transition; 6] = [
        Transition::ConfirmPayment,
        Transition::Claim,
        Transition::ArriveAtRestaurant,
        Transition::PickUp,
        Transition::Depart,
        Transition::Complete,
    ];
}
