//! Customer API Module
//!
//! The caller's own order history and its live feed.

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_role;
use crate::core::ServerState;
use shared::models::Role;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/customer", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::list))
        .route("/orders/stream", get(handler::stream))
        .layer(middleware::from_fn(require_role(Role::Customer)))
}
