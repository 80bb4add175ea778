//! Order API Module
//!
//! Role-neutral order routes. Who may do what is decided by the order
//! machine (commands) and by the projections (reads), so no role guard is
//! layered here.
//!
//! | Path | Method | Notes |
//! |------|--------|-------|
//! | /api/orders | POST | checkout, customers only |
//! | /api/orders/{id} | GET | single order |
//! | /api/orders/{id}/transitions | POST | move along the status machine |
//! | /api/orders/{id}/tracking | GET | customer tracking timeline |
//! | /api/orders/{id}/stream | GET | SSE feed of the single order |

mod handler;

pub use handler::{CartItem, PlaceOrderRequest, PlacedOrder, TransitionRequest};

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::place))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/transitions", post(handler::apply_transition))
        .route("/{id}/tracking", get(handler::tracking))
        .route("/{id}/stream", get(handler::stream))
}
