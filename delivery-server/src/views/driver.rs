//! Driver board: the three tabs and the one button per order

use serde::Serialize;

use shared::order::{OrderSnapshot, OrderStatus, Transition};

/// The button a driver presses next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverAction {
    pub transition: Transition,
    pub label: &'static str,
}

impl From<Transition> for DriverAction {
    fn from(transition: Transition) -> Self {
        Self {
            transition,
            label: transition.action_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverCard {
    pub order_id: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub delivery_address: String,
    pub total: f64,
    pub item_count: i32,
    pub placed_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<DriverAction>,
}

impl DriverCard {
    fn new(order: &OrderSnapshot, next_action: Option<DriverAction>) -> Self {
        Self {
            order_id: order.order_id.clone(),
            status: order.status,
            status_label: order.status.display_label(),
            delivery_address: order.delivery_address.clone(),
            total: order.total,
            item_count: order.items.iter().map(|i| i.quantity).sum(),
            placed_at: order.placed_at,
            next_action,
        }
    }
}

/// What one driver's screen shows
///
/// Tabs keep the order of the projection they are cut from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverBoard {
    pub driver_id: String,
    pub online: bool,
    /// Unassigned and open for claims
    pub available: Vec<DriverCard>,
    /// Assigned to this driver, in delivery
    pub ongoing: Vec<DriverCard>,
    /// Assigned to this driver, delivered
    pub completed: Vec<DriverCard>,
}

impl DriverBoard {
    pub fn build(driver_id: &str, online: bool, orders: &[OrderSnapshot]) -> Self {
        let mut board = Self {
            driver_id: driver_id.to_string(),
            online,
            available: Vec::new(),
            ongoing: Vec::new(),
            completed: Vec::new(),
        };

        for order in orders {
            if order.driver_id.is_none() && order.status.is_biddable() {
                board
                    .available
                    .push(DriverCard::new(order, Some(Transition::Claim.into())));
            } else if order.is_assigned_to(driver_id) {
                if order.status.is_in_progress() {
                    board.ongoing.push(DriverCard::new(order, next_action(order)));
                } else if order.status == OrderStatus::Completed {
                    board.completed.push(DriverCard::new(order, None));
                }
            }
        }
        board
    }
}

/// The single progress step the assigned driver may take from here
pub fn next_action(order: &OrderSnapshot) -> Option<DriverAction> {
    order
        .status
        .allowed_transitions()
        .into_iter()
        .find(|t| t.is_driver_progress())
        .map(DriverAction::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::*;

    #[test]
    fn test_tabs() {
        let orders = vec![
            order("mine-done", Some("driver-1"), &TO_DELIVERED),
            order("mine-ongoing", Some("driver-1"), &TO_DELIVERED[..3]),
            order("theirs", Some("driver-2"), &TO_DELIVERED[..2]),
            order("open", None, &TO_DELIVERED[..1]),
            order("unpaid", None, &[]),
        ];
        let board = DriverBoard::build("driver-1", true, &orders);

        let ids = |cards: &[DriverCard]| cards.iter().map(|c| c.order_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&board.available), vec!["open"]);
        assert_eq!(ids(&board.ongoing), vec!["mine-ongoing"]);
        assert_eq!(ids(&board.completed), vec!["mine-done"]);
    }

    #[test]
    fn test_claim_moves_card_from_available_to_ongoing() {
        let open = order("o1", None, &TO_DELIVERED[..1]);
        let before = DriverBoard::build("driver-1", true, std::slice::from_ref(&open));
        assert_eq!(before.available.len(), 1);
        assert_eq!(
            before.available[0].next_action.map(|a| a.transition),
            Some(Transition::Claim)
        );

        let claimed = order("o1", Some("driver-1"), &TO_DELIVERED[..2]);
        let mine = DriverBoard::build("driver-1", true, std::slice::from_ref(&claimed));
        assert!(mine.available.is_empty());
        assert_eq!(mine.ongoing.len(), 1);

        let other = DriverBoard::build("driver-2", true, std::slice::from_ref(&claimed));
        assert!(other.available.is_empty());
        assert!(other.ongoing.is_empty());
    }

    #[test]
    fn test_next_action_walks_delivery_path() {
        let expected = [
            Some(Transition::ArriveAtRestaurant),
            Some(Transition::PickUp),
            Some(Transition::Depart),
            Some(Transition::Complete),
            None,
        ];
        for (n, want) in (2..=TO_DELIVERED.len()).zip(expected) {
            let o = order("o1", Some("driver-1"), &TO_DELIVERED[..n]);
            assert_eq!(next_action(&o).map(|a| a.transition), want, "after {n} steps");
        }
    }

    #[test]
    fn test_action_labels() {
        let action = DriverAction::from(Transition::Depart);
        assert_eq!(action.label, "Menuju Lokasi");
    }
}
