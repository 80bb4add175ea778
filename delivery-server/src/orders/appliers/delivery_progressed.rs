//! Driver progress appliers: DriverArrived, OrderPickedUp, OrderOnTheWay
//!
//! The three events carry no data of their own; the edge comes from the
//! payload and the status machine does the rest.

use super::apply_transition;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// Applier for the intermediate delivery steps
pub struct DeliveryProgressedApplier;

impl EventApplier for DeliveryProgressedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if matches!(
            event.payload,
            EventPayload::DriverArrived {}
                | EventPayload::OrderPickedUp {}
                | EventPayload::OrderOnTheWay {}
        ) {
            apply_transition(snapshot, event);
        }
    }
}
