//! Money calculation utilities using rust_decimal for precision
//!
//! Line totals and the order total are computed in `Decimal` and converted
//! back to `f64` (2 decimal places, half away from zero) for storage. The
//! total is frozen at placement; nothing here ever recomputes it later.

use crate::orders::traits::OrderError;
use rust_decimal::prelude::*;
use shared::order::{LineItem, LineItemInput};

const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price
const MAX_PRICE: f64 = 100_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: i32 = 999;
/// Maximum number of lines per order
const MAX_LINES: usize = 200;

#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), OrderError> {
    if !value.is_finite() {
        return Err(OrderError::InvalidOrder(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate one cart line before it is frozen into the order
pub fn validate_line_item(item: &LineItemInput) -> Result<(), OrderError> {
    if item.product_id.trim().is_empty() {
        return Err(OrderError::InvalidOrder(
            "product_id must not be empty".to_string(),
        ));
    }

    require_finite(item.price, "price")?;
    if item.price < 0.0 {
        return Err(OrderError::InvalidOrder(format!(
            "price must be non-negative, got {}",
            item.price
        )));
    }
    if item.price > MAX_PRICE {
        return Err(OrderError::InvalidOrder(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, item.price
        )));
    }

    if item.quantity <= 0 {
        return Err(OrderError::InvalidOrder(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(OrderError::InvalidOrder(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }

    Ok(())
}

/// Validate a whole cart
pub fn validate_cart(items: &[LineItemInput]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::InvalidOrder(
            "order must contain at least one item".to_string(),
        ));
    }
    if items.len() > MAX_LINES {
        return Err(OrderError::InvalidOrder(format!(
            "order exceeds maximum of {} lines",
            MAX_LINES
        )));
    }
    items.iter().try_for_each(validate_line_item)
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// `price * quantity`
pub fn line_total(price: f64, quantity: i32) -> Decimal {
    to_decimal(price) * Decimal::from(quantity)
}

/// Freeze cart lines into line item snapshots
pub fn snapshot_lines(items: &[LineItemInput]) -> Vec<LineItem> {
    items
        .iter()
        .map(|item| LineItem {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            category: item.category.clone(),
            line_total: to_f64(line_total(item.price, item.quantity)),
        })
        .collect()
}

/// Sum of `price * quantity` over the snapshot lines
pub fn order_total(items: &[LineItem]) -> f64 {
    let total: Decimal = items
        .iter()
        .map(|item| line_total(item.price, item.quantity))
        .sum();
    to_f64(total)
}
