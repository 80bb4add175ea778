//! Order status machine
//!
//! One canonical status type for every view. Two historical vocabularies
//! exist on the wire:
//!
//! - **Detailed**: `pending → paid → pesanan_dibuat → driver_tiba_di_restoran
//!   → pesanan_diambil_driver → otw_menuju_lokasi → pesanan_selesai`
//! - **Simplified**: `pending → processing → on-delivery → delivered`
//!
//! Both deserialize into [`OrderStatus`]; [`StatusVocabulary`] maps back out.
//!
//! # Transition table
//!
//! | From | Transition | To | Stamps |
//! |------|------------|----|--------|
//! | `pending` | `ConfirmPayment` | `paid` | `paid_at` |
//! | `paid` | `Claim` | `pesanan_dibuat` | `confirmed_at` |
//! | `pesanan_dibuat` | `ArriveAtRestaurant` | `driver_tiba_di_restoran` | `arrived_at_resto_at` |
//! | `driver_tiba_di_restoran` | `PickUp` | `pesanan_diambil_driver` | `picked_up_at` |
//! | `pesanan_diambil_driver` | `Depart` | `otw_menuju_lokasi` | `on_the_way_at` |
//! | `otw_menuju_lokasi` | `Complete` | `pesanan_selesai` | `completed_at`, `delivered_at` |
//! | any non-terminal | `Cancel` | `cancelled` | `cancelled_at` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical order status (closed set)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    /// Placed, waiting for payment
    #[default]
    #[serde(rename = "pending")]
    Pending,
    /// Paid, waiting for a driver to claim it
    #[serde(rename = "paid")]
    Paid,
    /// Claimed by a driver, the restaurant is preparing it
    #[serde(rename = "pesanan_dibuat", alias = "processing")]
    Confirmed,
    /// Driver arrived at the restaurant
    #[serde(rename = "driver_tiba_di_restoran")]
    DriverAtRestaurant,
    /// Driver picked the order up
    #[serde(rename = "pesanan_diambil_driver")]
    PickedUp,
    /// Driver is on the way to the customer
    #[serde(rename = "otw_menuju_lokasi", alias = "on-delivery")]
    OnTheWay,
    /// Delivered (terminal)
    #[serde(rename = "pesanan_selesai", alias = "delivered")]
    Completed,
    /// Cancelled (terminal)
    #[serde(rename = "cancelled")]
    Cancelled,
}

/// Which wire vocabulary a view speaks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusVocabulary {
    #[default]
    Detailed,
    Simplified,
}

impl OrderStatus {
    /// Every status, in lifecycle order (cancelled last)
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Confirmed,
        OrderStatus::DriverAtRestaurant,
        OrderStatus::PickedUp,
        OrderStatus::OnTheWay,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// The happy path, as the customer tracking timeline shows it
    pub const DELIVERY_PATH: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Confirmed,
        OrderStatus::DriverAtRestaurant,
        OrderStatus::PickedUp,
        OrderStatus::OnTheWay,
        OrderStatus::Completed,
    ];

    /// Statuses a driver works on after claiming
    pub const IN_PROGRESS: [OrderStatus; 4] = [
        OrderStatus::Confirmed,
        OrderStatus::DriverAtRestaurant,
        OrderStatus::PickedUp,
        OrderStatus::OnTheWay,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// No driver may be attached yet
    pub fn is_pre_assignment(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }

    /// Open for drivers to claim
    pub fn is_biddable(self) -> bool {
        self == OrderStatus::Paid
    }

    pub fn is_in_progress(self) -> bool {
        Self::IN_PROGRESS.contains(&self)
    }

    /// A driver must be attached in this status
    pub fn requires_driver(self) -> bool {
        self.is_in_progress() || self == OrderStatus::Completed
    }

    /// Apply a transition against the table; `None` if illegal from here
    pub fn next(self, transition: Transition) -> Option<OrderStatus> {
        use OrderStatus::*;
        match (self, transition) {
            (Pending, Transition::ConfirmPayment) => Some(Paid),
            (Paid, Transition::Claim) => Some(Confirmed),
            (Confirmed, Transition::ArriveAtRestaurant) => Some(DriverAtRestaurant),
            (DriverAtRestaurant, Transition::PickUp) => Some(PickedUp),
            (PickedUp, Transition::Depart) => Some(OnTheWay),
            (OnTheWay, Transition::Complete) => Some(Completed),
            (s, Transition::Cancel) if !s.is_terminal() => Some(Cancelled),
            _ => None,
        }
    }

    /// Transitions legal from this status
    pub fn allowed_transitions(self) -> Vec<Transition> {
        Transition::ALL
            .into_iter()
            .filter(|t| self.next(*t).is_some())
            .collect()
    }

    /// Wire name in the requested vocabulary
    pub fn wire_name(self, vocabulary: StatusVocabulary) -> &'static str {
        match vocabulary {
            StatusVocabulary::Detailed => match self {
                OrderStatus::Pending => "pending",
                OrderStatus::Paid => "paid",
                OrderStatus::Confirmed => "pesanan_dibuat",
                OrderStatus::DriverAtRestaurant => "driver_tiba_di_restoran",
                OrderStatus::PickedUp => "pesanan_diambil_driver",
                OrderStatus::OnTheWay => "otw_menuju_lokasi",
                OrderStatus::Completed => "pesanan_selesai",
                OrderStatus::Cancelled => "cancelled",
            },
            StatusVocabulary::Simplified => match self {
                OrderStatus::Pending => "pending",
                OrderStatus::Paid => "paid",
                OrderStatus::Confirmed => "processing",
                OrderStatus::DriverAtRestaurant
                | OrderStatus::PickedUp
                | OrderStatus::OnTheWay => "on-delivery",
                OrderStatus::Completed => "delivered",
                OrderStatus::Cancelled => "cancelled",
            },
        }
    }

    /// Parse a wire name from either vocabulary
    pub fn from_wire(name: &str) -> Option<OrderStatus> {
        match name {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "pesanan_dibuat" | "processing" => Some(OrderStatus::Confirmed),
            "driver_tiba_di_restoran" => Some(OrderStatus::DriverAtRestaurant),
            "pesanan_diambil_driver" => Some(OrderStatus::PickedUp),
            "otw_menuju_lokasi" | "on-delivery" => Some(OrderStatus::OnTheWay),
            "pesanan_selesai" | "delivered" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Human label shown on tracking/owner screens
    pub fn display_label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Menunggu Pembayaran",
            OrderStatus::Paid => "Sudah Dibayar",
            OrderStatus::Confirmed => "Pesanan Dibuat",
            OrderStatus::DriverAtRestaurant => "Driver Tiba di Restoran",
            OrderStatus::PickedUp => "Pesanan Diambil Driver",
            OrderStatus::OnTheWay => "OTW Menuju Lokasi",
            OrderStatus::Completed => "Pesanan Selesai",
            OrderStatus::Cancelled => "Dibatalkan",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name(StatusVocabulary::Detailed))
    }
}

/// A status machine edge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transition {
    ConfirmPayment,
    Claim,
    ArriveAtRestaurant,
    PickUp,
    Depart,
    Complete,
    Cancel,
}

/// Timestamp fields a transition writes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimestampField {
    PaidAt,
    ConfirmedAt,
    ArrivedAtRestoAt,
    PickedUpAt,
    OnTheWayAt,
    CompletedAt,
    DeliveredAt,
    CancelledAt,
}

impl Transition {
    pub const ALL: [Transition; 7] = [
        Transition::ConfirmPayment,
        Transition::Claim,
        Transition::ArriveAtRestaurant,
        Transition::PickUp,
        Transition::Depart,
        Transition::Complete,
        Transition::Cancel,
    ];

    /// Side-effect timestamps recorded when this transition is applied
    pub fn stamps(self) -> &'static [TimestampField] {
        match self {
            Transition::ConfirmPayment => &[TimestampField::PaidAt],
            Transition::Claim => &[TimestampField::ConfirmedAt],
            Transition::ArriveAtRestaurant => &[TimestampField::ArrivedAtRestoAt],
            Transition::PickUp => &[TimestampField::PickedUpAt],
            Transition::Depart => &[TimestampField::OnTheWayAt],
            Transition::Complete => &[TimestampField::CompletedAt, TimestampField::DeliveredAt],
            Transition::Cancel => &[TimestampField::CancelledAt],
        }
    }

    /// Transitions only the assigned driver performs
    pub fn is_driver_progress(self) -> bool {
        matches!(
            self,
            Transition::ArriveAtRestaurant
                | Transition::PickUp
                | Transition::Depart
                | Transition::Complete
        )
    }

    /// Button caption on the driver screen
    pub fn action_label(self) -> &'static str {
        match self {
            Transition::ConfirmPayment => "Saya Sudah Bayar",
            Transition::Claim => "Ambil Pesanan",
            Transition::ArriveAtRestaurant => "Tiba di Restoran",
            Transition::PickUp => "Pesanan Diambil",
            Transition::Depart => "Menuju Lokasi",
            Transition::Complete => "Selesaikan Pesanan",
            Transition::Cancel => "Batalkan",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::ConfirmPayment => "CONFIRM_PAYMENT",
            Transition::Claim => "CLAIM",
            Transition::ArriveAtRestaurant => "ARRIVE_AT_RESTAURANT",
            Transition::PickUp => "PICK_UP",
            Transition::Depart => "DEPART",
            Transition::Complete => "COMPLETE",
            Transition::Cancel => "CANCEL",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_walks_every_status() {
        let path = [
            Transition::ConfirmPayment,
            Transition::Claim,
            Transition::ArriveAtRestaurant,
            Transition::PickUp,
            Transition::Depart,
            Transition::Complete,
        ];
        let mut status = OrderStatus::Pending;
        for (i, t) in path.iter().enumerate() {
            status = status.next(*t).expect("legal transition");
            assert_eq!(status, OrderStatus::DELIVERY_PATH[i + 1]);
        }
        assert!(status.is_terminal());
    }

    #[test]
    fn test_next_never_leaves_closed_set() {
        for status in OrderStatus::ALL {
            for t in Transition::ALL {
                if let Some(next) = status.next(t) {
                    assert!(OrderStatus::ALL.contains(&next));
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for t in Transition::ALL {
            assert_eq!(OrderStatus::Completed.next(t), None);
            assert_eq!(OrderStatus::Cancelled.next(t), None);
        }
    }

    #[test]
    fn test_cancel_reachable_from_every_non_terminal() {
        for status in OrderStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert_eq!(status.next(Transition::Cancel), Some(OrderStatus::Cancelled));
        }
    }

    #[test]
    fn test_reapplying_a_transition_is_illegal() {
        assert_eq!(OrderStatus::Paid.next(Transition::ConfirmPayment), None);
        assert_eq!(OrderStatus::Confirmed.next(Transition::Claim), None);
        assert_eq!(OrderStatus::OnTheWay.next(Transition::Depart), None);
    }

    #[test]
    fn test_claim_only_from_paid() {
        assert_eq!(OrderStatus::Pending.next(Transition::Claim), None);
        assert_eq!(OrderStatus::Paid.next(Transition::Claim), Some(OrderStatus::Confirmed));
        assert_eq!(OrderStatus::Paid.allowed_transitions(), vec![Transition::Claim, Transition::Cancel]);
    }

    #[test]
    fn test_driver_requirement_partitions_statuses() {
        for status in OrderStatus::ALL {
            if status.is_pre_assignment() {
                assert!(!status.requires_driver());
            }
        }
        assert!(OrderStatus::Completed.requires_driver());
        assert!(!OrderStatus::Cancelled.requires_driver());
    }

    #[test]
    fn test_complete_stamps_both_timestamps() {
        assert_eq!(
            Transition::Complete.stamps(),
            &[TimestampField::CompletedAt, TimestampField::DeliveredAt]
        );
    }

    #[test]
    fn test_serde_accepts_both_vocabularies() {
        let detailed: OrderStatus = serde_json::from_str("\"pesanan_dibuat\"").unwrap();
        let simplified: OrderStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(detailed, simplified);

        let delivered: OrderStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(delivered, OrderStatus::Completed);
        assert_eq!(serde_json::to_string(&delivered).unwrap(), "\"pesanan_selesai\"");

        assert!(serde_json::from_str::<OrderStatus>("\"shipped\"").is_err());
    }

    #[test]
    fn test_wire_names_round_trip_through_from_wire() {
        for vocabulary in [StatusVocabulary::Detailed, StatusVocabulary::Simplified] {
            for status in OrderStatus::ALL {
                let parsed = OrderStatus::from_wire(status.wire_name(vocabulary)).unwrap();
                assert_eq!(
                    parsed.wire_name(vocabulary),
                    status.wire_name(vocabulary)
                );
            }
        }
    }

    #[test]
    fn test_simplified_vocabulary_collapses_delivery_leg() {
        let names: Vec<_> = [
            OrderStatus::DriverAtRestaurant,
            OrderStatus::PickedUp,
            OrderStatus::OnTheWay,
        ]
        .iter()
        .map(|s| s.wire_name(StatusVocabulary::Simplified))
        .collect();
        assert_eq!(names, vec!["on-delivery"; 3]);
    }
}
