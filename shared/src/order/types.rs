//! Shared types for the order lifecycle

use super::status::TimestampField;
use serde::{Deserialize, Serialize};

// ============================================================================
// Line Items
// ============================================================================

/// Line item snapshot - the catalog product frozen at placement time
///
/// Later catalog price changes never touch this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Catalog product ID
    pub product_id: String,
    /// Product name snapshot
    pub name: String,
    /// Unit price snapshot
    pub price: f64,
    /// Quantity
    pub quantity: i32,
    /// Category name snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Line total (price * quantity)
    pub line_total: f64,
}

/// Line item input - what the customer puts in the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemInput {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LineItemInput {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, price: f64, quantity: i32) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
            category: None,
        }
    }
}

impl From<&crate::models::Product> for LineItemInput {
    fn from(product: &crate::models::Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity: 1,
            category: Some(product.category.clone()),
        }
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// One optional timestamp per transition reached (Unix milliseconds)
///
/// A field is set iff the order passed through the matching transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OrderTimestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrived_at_resto_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_the_way_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
}

impl OrderTimestamps {
    pub fn get(&self, field: TimestampField) -> Option<i64> {
        match field {
            TimestampField::PaidAt => self.paid_at,
            TimestampField::ConfirmedAt => self.confirmed_at,
            TimestampField::ArrivedAtRestoAt => self.arrived_at_resto_at,
            TimestampField::PickedUpAt => self.picked_up_at,
            TimestampField::OnTheWayAt => self.on_the_way_at,
            TimestampField::CompletedAt => self.completed_at,
            TimestampField::DeliveredAt => self.delivered_at,
            TimestampField::CancelledAt => self.cancelled_at,
        }
    }

    /// Record a timestamp; an already-set field is left untouched
    pub fn stamp(&mut self, field: TimestampField, at: i64) {
        let slot = match field {
            TimestampField::PaidAt => &mut self.paid_at,
            TimestampField::ConfirmedAt => &mut self.confirmed_at,
            TimestampField::ArrivedAtRestoAt => &mut self.arrived_at_resto_at,
            TimestampField::PickedUpAt => &mut self.picked_up_at,
            TimestampField::OnTheWayAt => &mut self.on_the_way_at,
            TimestampField::CompletedAt => &mut self.completed_at,
            TimestampField::DeliveredAt => &mut self.delivered_at,
            TimestampField::CancelledAt => &mut self.cancelled_at,
        };
        if slot.is_none() {
            *slot = Some(at);
        }
    }
}

// ============================================================================
// Command Response
// ============================================================================

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Order ID touched by the command (new ID for PlaceOrder)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            order_id,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            error: Some(error),
        }
    }

    /// Replay of an already processed command, answering with the order it touched
    pub fn duplicate(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            order_id,
            error: None,
        }
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    OrderNotFound,
    InvalidTransition,
    OrderAlreadyClaimed,
    NotAssignedDriver,
    RoleNotPermitted,
    InvalidOrder,
    InternalError,
    // Storage errors
    StorageFull,
    StorageCorrupted,
    SystemBusy,
}

impl CommandErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            CommandErrorCode::InvalidTransition => "INVALID_TRANSITION",
            CommandErrorCode::OrderAlreadyClaimed => "ORDER_ALREADY_CLAIMED",
            CommandErrorCode::NotAssignedDriver => "NOT_ASSIGNED_DRIVER",
            CommandErrorCode::RoleNotPermitted => "ROLE_NOT_PERMITTED",
            CommandErrorCode::InvalidOrder => "INVALID_ORDER",
            CommandErrorCode::InternalError => "INTERNAL_ERROR",
            CommandErrorCode::StorageFull => "STORAGE_FULL",
            CommandErrorCode::StorageCorrupted => "STORAGE_CORRUPTED",
            CommandErrorCode::SystemBusy => "SYSTEM_BUSY",
        }
    }
}
