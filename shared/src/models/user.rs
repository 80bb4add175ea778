//! User identity model
//!
//! Identities come from the external identity provider. The order service
//! trusts the role claim it is handed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actor role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Driver,
    Owner,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Driver => "driver",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "driver" => Ok(Role::Driver),
            // "admin" is the legacy name of the owner dashboard role
            "owner" | "admin" => Ok(Role::Owner),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self::new(id, Role::Customer)
    }

    pub fn driver(id: impl Into<String>) -> Self {
        Self::new(id, Role::Driver)
    }

    pub fn owner(id: impl Into<String>) -> Self {
        Self::new(id, Role::Owner)
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

/// Geographic point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Driver presence: online flag plus last known location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverStatus {
    pub driver_id: String,
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub updated_at: i64,
}

impl DriverStatus {
    /// A driver that has never reported, or has gone offline
    pub fn offline(driver_id: impl Into<String>, updated_at: i64) -> Self {
        Self {
            driver_id: driver_id.into(),
            online: false,
            location: None,
            updated_at,
        }
    }
}
