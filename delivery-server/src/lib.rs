//! Delivery Server - storefront order service
//!
//! # Overview
//!
//! Owns the order store and runs the order status machine server-side.
//! Customers, drivers and the owner read role projections of the same
//! orders and receive full-snapshot updates over live feeds.
//!
//! - **Orders** (`orders`): redb-backed command pipeline, projections, feeds
//! - **Drivers** (`drivers`): in-memory online/offline registry
//! - **Views** (`views`): what each role screen renders
//! - **HTTP API** (`api`): REST + Server-Sent Events
//!
//! # Module layout
//!
//! ```text
//! delivery-server/src/
//! ├── core/          # config, state, errors, server
//! ├── auth/          # identity headers, role guard
//! ├── api/           # HTTP routes and handlers
//! ├── routes/        # router assembly and middleware
//! ├── orders/        # event-sourced order store
//! ├── drivers/       # driver presence
//! ├── views/         # derived view state per role
//! └── utils/         # errors, logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod drivers;
pub mod orders;
pub mod routes;
pub mod utils;
pub mod views;

// Re-export public types
pub use auth::CurrentActor;
pub use core::{Config, Server, ServerState};
pub use drivers::DriverPresence;
pub use orders::{OrderFeed, OrderProjections, OrderStorage, OrdersManager};
pub use routes::build_app;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env` and start logging
///
/// File logging is enabled outside development, under `work_dir/logs`.
pub fn setup_environment() -> anyhow::Result<Config> {
    // A missing .env is normal in production
    dotenv::dotenv().ok();

    let config = Config::from_env();
    let log_dir = (!config.is_development())
        .then(|| config.log_dir().to_string_lossy().into_owned());
    init_logger_with_file(&config.log_level, config.log_json, log_dir.as_deref())?;
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
     _      _ _
  __| | ___| (_)_   _____ _ __ _   _
 / _` |/ _ \ | \ \ / / _ \ '__| | | |
| (_| |  __/ | |\ V /  __/ |  | |_| |
 \__,_|\___|_|_| \_/ \___|_|   \__, |
                               |___/
    "#
    );
}
