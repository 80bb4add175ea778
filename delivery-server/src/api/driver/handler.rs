//! Driver API Handlers

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::live::sse_response;
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::orders::ProjectionKey;
use crate::utils::{AppResponse, AppResult, ok};
use crate::views::DriverBoard;
use shared::models::{DriverStatus, GeoPoint};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct LocationInput {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PresenceRequest {
    pub online: bool,
    #[validate(nested)]
    #[serde(default)]
    pub location: Option<LocationInput>,
}

pub async fn board(
    State(state): State<ServerState>,
    actor: CurrentActor,
) -> AppResult<Json<AppResponse<DriverBoard>>> {
    let online = state.presence.is_online(&actor.id);
    let orders = state.projections.driver_orders(&actor.id)?;
    Ok(ok(DriverBoard::build(&actor.id, online, &orders)))
}

pub async fn stream(State(state): State<ServerState>, actor: CurrentActor) -> impl IntoResponse {
    let key = ProjectionKey::Driver(actor.id.clone());
    let feed = state.feed.stream(actor.into_inner(), key);
    sse_response(&state, feed)
}

pub async fn presence(
    State(state): State<ServerState>,
    actor: CurrentActor,
) -> AppResult<Json<AppResponse<DriverStatus>>> {
    Ok(ok(state.presence.status(&actor.id)))
}

/// Online/offline toggle
pub async fn set_presence(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Json(req): Json<PresenceRequest>,
) -> AppResult<Json<AppResponse<DriverStatus>>> {
    req.validate()?;

    let location = req.location.map(|l| GeoPoint {
        lat: l.lat,
        lng: l.lng,
    });
    Ok(ok(state.presence.set_status(&actor.id, req.online, location)))
}
