//! Owner management screen
//!
//! Rows speak the simplified vocabulary; the expanded detail shows the full
//! timeline and the proof-of-delivery reference.

use serde::Serialize;

use super::reached_at;
use crate::orders::money;
use shared::order::{LineItem, OrderSnapshot, OrderStatus, StatusVocabulary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerRow {
    pub order_id: String,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    pub status: &'static str,
    pub total: f64,
    pub item_count: i32,
    pub placed_at: i64,
}

impl OwnerRow {
    pub fn from_order(order: &OrderSnapshot) -> Self {
        Self {
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            driver_id: order.driver_id.clone(),
            status: order.status_name(StatusVocabulary::Simplified),
            total: order.total,
            item_count: order.items.iter().map(|i| i.quantity).sum(),
            placed_at: order.placed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: &'static str,
    pub count: usize,
}

/// The order table plus its header figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerDashboard {
    pub rows: Vec<OwnerRow>,
    /// One entry per simplified status, lifecycle order
    pub counts: Vec<StatusCount>,
    /// Sum of delivered order totals
    pub revenue: f64,
}

impl OwnerDashboard {
    pub fn build(orders: &[OrderSnapshot]) -> Self {
        let mut counts: Vec<StatusCount> = Vec::new();
        for status in OrderStatus::ALL {
            let name = status.wire_name(StatusVocabulary::Simplified);
            if !counts.iter().any(|c| c.status == name) {
                counts.push(StatusCount {
                    status: name,
                    count: 0,
                });
            }
        }
        for order in orders {
            let name = order.status_name(StatusVocabulary::Simplified);
            if let Some(entry) = counts.iter_mut().find(|c| c.status == name) {
                entry.count += 1;
            }
        }

        let revenue = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .map(|o| money::to_decimal(o.total))
            .sum();

        Self {
            rows: orders.iter().map(OwnerRow::from_order).collect(),
            counts,
            revenue: money::to_f64(revenue),
        }
    }

    /// Keep only the rows in `status`'s simplified tab; header figures stay store-wide
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        let name = status.wire_name(StatusVocabulary::Simplified);
        self.rows.retain(|row| row.status == name);
        self
    }

    pub fn count(&self, status: &str) -> usize {
        self.counts
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub label: &'static str,
    pub at: i64,
}

/// Expanded row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerOrderDetail {
    pub order_id: String,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    pub status: &'static str,
    pub status_label: &'static str,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub delivery_address: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// Only the steps the order actually went through
    pub timeline: Vec<TimelineEntry>,
}

impl OwnerOrderDetail {
    pub fn from_order(order: &OrderSnapshot) -> Self {
        let timeline = OrderStatus::ALL
            .into_iter()
            .filter_map(|status| {
                reached_at(order, status).map(|at| TimelineEntry {
                    status,
                    label: status.display_label(),
                    at,
                })
            })
            .collect();

        Self {
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            driver_id: order.driver_id.clone(),
            status: order.status_name(StatusVocabulary::Simplified),
            status_label: order.status.display_label(),
            items: order.items.clone(),
            total: order.total,
            delivery_address: order.delivery_address.clone(),
            payment_method: order.payment_method.clone(),
            proof_photo_url: order.proof_photo_url.clone(),
            cancel_reason: order.cancel_reason.clone(),
            timeline,
        }
    }
}
