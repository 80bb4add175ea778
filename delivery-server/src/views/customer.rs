//! Customer screens: order history and the tracking timeline

use serde::Serialize;

use super::reached_at;
use shared::order::{OrderSnapshot, OrderStatus, StatusVocabulary};

/// One step of the tracking timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingStep {
    pub status: OrderStatus,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reached_at: Option<i64>,
    pub current: bool,
}

/// The tracking screen of one order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerTracking {
    pub order_id: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    /// The delivery path, always all seven steps
    pub steps: Vec<TrackingStep>,
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    pub total: f64,
    /// "I have paid" button
    pub can_confirm_payment: bool,
    pub can_cancel: bool,
}

impl CustomerTracking {
    pub fn from_order(order: &OrderSnapshot) -> Self {
        let steps = OrderStatus::DELIVERY_PATH
            .into_iter()
            .map(|status| TrackingStep {
                status,
                label: status.display_label(),
                reached_at: reached_at(order, status),
                current: status == order.status,
            })
            .collect();

        let cancelled = order.status == OrderStatus::Cancelled;
        Self {
            order_id: order.order_id.clone(),
            status: order.status,
            status_label: order.status.display_label(),
            steps,
            cancelled,
            cancelled_at: order.timestamps.cancelled_at,
            cancel_reason: order.cancel_reason.clone(),
            driver_id: order.driver_id.clone(),
            total: order.total,
            can_confirm_payment: order.status == OrderStatus::Pending,
            can_cancel: order.status.is_pre_assignment(),
        }
    }

    /// The step the order is on; `None` once cancelled
    pub fn current_step(&self) -> Option<&TrackingStep> {
        self.steps.iter().find(|s| s.current)
    }
}

/// One line of the order history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerOrderRow {
    pub order_id: String,
    /// Simplified vocabulary
    pub status: &'static str,
    pub status_label: &'static str,
    pub total: f64,
    pub item_count: i32,
    pub placed_at: i64,
}

impl CustomerOrderRow {
    pub fn from_order(order: &OrderSnapshot) -> Self {
        Self {
            order_id: order.order_id.clone(),
            status: order.status_name(StatusVocabulary::Simplified),
            status_label: order.status.display_label(),
            total: order.total,
            item_count: order.items.iter().map(|i| i.quantity).sum(),
            placed_at: order.placed_at,
        }
    }
}
