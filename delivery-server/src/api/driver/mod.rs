//! Driver API Module
//!
//! | Path | Method | Notes |
//! |------|--------|-------|
//! | /api/driver/orders | GET | board: available / ongoing / completed |
//! | /api/driver/orders/stream | GET | SSE feed of the board's orders |
//! | /api/driver/presence | GET | current toggle state |
//! | /api/driver/presence | PUT | go online/offline, report location |

mod handler;

pub use handler::{LocationInput, PresenceRequest};

use axum::{Router, middleware, routing::get};

use crate::auth::require_role;
use crate::core::ServerState;
use shared::models::Role;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/driver", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::board))
        .route("/orders/stream", get(handler::stream))
        .route("/presence", get(handler::presence).put(handler::set_presence))
        .layer(middleware::from_fn(require_role(Role::Driver)))
}
