//! Product Model

use serde::{Deserialize, Serialize};

/// Catalog product
///
/// Copied into each order's line items at placement time; the order never
/// follows later changes to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub rating: f32,
    /// Number of servings per portion
    #[serde(default = "default_servings")]
    pub servings: i32,
}

fn default_servings() -> i32 {
    1
}
