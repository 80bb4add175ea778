//! Customer API Handlers

use axum::{Json, extract::State, response::IntoResponse};

use crate::api::live::sse_response;
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::orders::ProjectionKey;
use crate::utils::{AppResponse, AppResult, ok};
use crate::views::CustomerOrderRow;

/// Order history, newest first
pub async fn list(
    State(state): State<ServerState>,
    actor: CurrentActor,
) -> AppResult<Json<AppResponse<Vec<CustomerOrderRow>>>> {
    let orders = state.projections.customer_orders(&actor.id)?;
    Ok(ok(orders.iter().map(CustomerOrderRow::from_order).collect()))
}

pub async fn stream(State(state): State<ServerState>, actor: CurrentActor) -> impl IntoResponse {
    let key = ProjectionKey::Customer(actor.id.clone());
    let feed = state.feed.stream(actor.into_inner(), key);
    sse_response(&state, feed)
}
