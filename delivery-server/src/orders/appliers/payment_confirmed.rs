//! PaymentConfirmed event applier

use super::apply_transition;
use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderEvent, OrderSnapshot};

/// PaymentConfirmed applier: `pending → paid`
pub struct PaymentConfirmedApplier;

impl EventApplier for PaymentConfirmedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::PaymentConfirmed {} = &event.payload {
            apply_transition(snapshot, event);
        }
    }
}
