use std::path::PathBuf;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::core::{Config, Result};
use crate::drivers::DriverPresence;
use crate::orders::{OrderFeed, OrderProjections, OrdersManager};

/// Shared service handles, cloned into every request
///
/// | Field | Type | Purpose |
/// |-------|------|---------|
/// | config | Config | immutable configuration |
/// | orders | OrdersManager | command processing + order store |
/// | presence | DriverPresence | driver online/offline registry |
/// | projections | OrderProjections | per-role read queries |
/// | feed | OrderFeed | live projection streams |
/// | shutdown | CancellationToken | ends live streams on shutdown |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub orders: OrdersManager,
    pub presence: DriverPresence,
    pub projections: OrderProjections,
    pub feed: OrderFeed,
    pub shutdown: CancellationToken,
    started_at: Instant,
}

impl ServerState {
    /// Wire up state around an existing manager
    pub fn new(config: Config, orders: OrdersManager) -> Self {
        let presence = DriverPresence::new();
        let projections = OrderProjections::new(orders.clone(), presence.clone());
        let feed = OrderFeed::new(projections.clone());
        Self {
            config,
            orders,
            presence,
            projections,
            feed,
            shutdown: CancellationToken::new(),
            started_at: Instant::now(),
        }
    }

    /// Initialize server state
    ///
    /// 1. Work directory structure
    /// 2. Order store (work_dir/database/orders.redb)
    /// 3. Presence, projections and feeds
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_path();
        let orders = OrdersManager::with_capacity(&db_path, config.event_channel_capacity)?;
        tracing::info!(
            path = %db_path.display(),
            sequence = orders.get_current_sequence()?,
            "Order store opened"
        );

        Ok(Self::new(config.clone(), orders))
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
