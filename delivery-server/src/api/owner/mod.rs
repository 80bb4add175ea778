//! Owner API Module
//!
//! Store-wide dashboard. Every route is owner-only. `GET /orders?status=`
//! narrows the rows to one simplified status tab.

mod handler;

pub use handler::{DashboardQuery, PurgeResult};

use axum::{Router, middleware, routing::get};

use crate::auth::require_role;
use crate::core::ServerState;
use shared::models::Role;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/owner", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::dashboard).delete(handler::purge))
        .route("/orders/stream", get(handler::stream))
        .route("/orders/{id}", get(handler::detail))
        .layer(middleware::from_fn(require_role(Role::Owner)))
}
