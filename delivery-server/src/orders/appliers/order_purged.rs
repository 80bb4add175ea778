//! OrderPurged event applier
//!
//! Purge events are only broadcast; the snapshot they refer to is gone by
//! the time anyone sees them, so there is nothing to fold.

use crate::orders::traits::EventApplier;
use shared::order::{OrderEvent, OrderSnapshot};

/// OrderPurged applier (no-op)
pub struct OrderPurgedApplier;

impl EventApplier for OrderPurgedApplier {
    fn apply(&self, _snapshot: &mut OrderSnapshot, _event: &OrderEvent) {}
}
