//! Health check route
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /health | GET | none |
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "epoch": "9b1c...",
//!   "sequence": 42,
//!   "uptime_seconds": 3600,
//!   "online_drivers": 3,
//!   "live_feeds": 5
//! }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// healthy | degraded
    status: &'static str,
    version: &'static str,
    /// Changes on every restart; clients refetch when it does
    epoch: String,
    /// Last committed event sequence (None if the store is unreadable)
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence: Option<u64>,
    uptime_seconds: u64,
    online_drivers: usize,
    live_feeds: usize,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let sequence = match state.orders.get_current_sequence() {
        Ok(seq) => Some(seq),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read the order store");
            None
        }
    };

    Json(HealthResponse {
        status: if sequence.is_some() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        epoch: state.orders.epoch().to_string(),
        sequence,
        uptime_seconds: state.uptime_seconds(),
        online_drivers: state.presence.online_drivers().len(),
        live_feeds: state.orders.subscriber_count(),
    })
}
