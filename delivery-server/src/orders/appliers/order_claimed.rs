//! OrderClaimed event applier
//!
//! Attaches the driver and moves `paid → pesanan_dibuat` in one step, so no
//! snapshot ever shows one without the other.

use super::apply_transition;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

/// OrderClaimed applier
pub struct OrderClaimedApplier;

impl EventApplier for OrderClaimedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderClaimed { driver_id } = &event.payload {
            if snapshot.status == OrderStatus::Paid {
                snapshot.driver_id = Some(driver_id.clone());
            }
            apply_transition(snapshot, event);
        }
    }
}
