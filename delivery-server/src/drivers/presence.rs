use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

use shared::models::{DriverStatus, GeoPoint};

/// Default presence broadcast capacity
const PRESENCE_CHANNEL_CAPACITY: usize = 256;

/// A driver went online or offline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceChange {
    pub driver_id: String,
    pub online: bool,
}

/// In-memory presence registry (driver ID -> status)
///
/// Only online/offline transitions are broadcast. Location updates from an
/// already-online driver are stored silently.
#[derive(Debug, Clone)]
pub struct DriverPresence {
    drivers: Arc<DashMap<String, DriverStatus>>,
    tx: broadcast::Sender<PresenceChange>,
}

impl Default for DriverPresence {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverPresence {
    pub fn new() -> Self {
        Self::with_capacity(PRESENCE_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            drivers: Arc::new(DashMap::new()),
            tx,
        }
    }

    /// Record a driver's presence; returns the stored status
    ///
    /// The previous value is read under the same entry lock as the update, so
    /// concurrent toggles for one driver broadcast each real change once.
    pub fn set_status(
        &self,
        driver_id: &str,
        online: bool,
        location: Option<GeoPoint>,
    ) -> DriverStatus {
        let now = shared::util::now_millis();

        let (was_online, status) = {
            let mut entry = self
                .drivers
                .entry(driver_id.to_string())
                .or_insert_with(|| DriverStatus::offline(driver_id, now));
            let was_online = entry.online;
            entry.online = online;
            if location.is_some() {
                entry.location = location;
            }
            entry.updated_at = now;
            (was_online, entry.clone())
        };

        if was_online != online {
            tracing::info!(driver_id = %driver_id, online, "Driver presence changed");
            // No receivers just means no driver screen is open
            let _ = self.tx.send(PresenceChange {
                driver_id: driver_id.to_string(),
                online,
            });
        }

        status
    }

    pub fn go_online(&self, driver_id: &str) -> DriverStatus {
        self.set_status(driver_id, true, None)
    }

    pub fn go_offline(&self, driver_id: &str) -> DriverStatus {
        self.set_status(driver_id, false, None)
    }

    /// Unknown drivers are offline
    pub fn is_online(&self, driver_id: &str) -> bool {
        self.drivers
            .get(driver_id)
            .map(|s| s.online)
            .unwrap_or(false)
    }

    /// Current status; unknown drivers read as offline
    pub fn status(&self, driver_id: &str) -> DriverStatus {
        self.drivers
            .get(driver_id)
            .map(|s| s.clone())
            .unwrap_or_else(|| DriverStatus::offline(driver_id, 0))
    }

    /// Every online driver
    pub fn online_drivers(&self) -> Vec<DriverStatus> {
        self.drivers
            .iter()
            .filter(|s| s.online)
            .map(|s| s.clone())
            .collect()
    }

    /// Subscribe to online/offline changes
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceChange> {
        self.tx.subscribe()
    }
}
