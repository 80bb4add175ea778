//! Owner API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::api::live::sse_response;
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::orders::ProjectionKey;
use crate::security_log;
use crate::utils::{AppError, AppResponse, AppResult, ok};
use crate::views::{OwnerDashboard, OwnerOrderDetail};
use shared::order::{OrderCommand, OrderCommandPayload, OrderStatus};

#[derive(Debug, Serialize)]
pub struct PurgeResult {
    pub command_id: String,
    pub purged: usize,
}

/// Dashboard filter; `status` takes a name from either vocabulary
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub status: Option<String>,
}

pub async fn dashboard(
    State(state): State<ServerState>,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<AppResponse<OwnerDashboard>>> {
    let status = query
        .status
        .as_deref()
        .map(|name| {
            OrderStatus::from_wire(name)
                .ok_or_else(|| AppError::validation(format!("Unknown order status: {name}")))
        })
        .transpose()?;

    let orders = state.projections.owner_orders()?;
    let dashboard = OwnerDashboard::build(&orders);
    Ok(ok(match status {
        Some(status) => dashboard.with_status(status),
        None => dashboard,
    }))
}

/// Expanded row
pub async fn detail(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<OwnerOrderDetail>>> {
    let order = state
        .projections
        .order(&id)?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
    Ok(ok(OwnerOrderDetail::from_order(&order)))
}

pub async fn stream(State(state): State<ServerState>, actor: CurrentActor) -> impl IntoResponse {
    let feed = state.feed.stream(actor.into_inner(), ProjectionKey::Owner);
    sse_response(&state, feed)
}

/// Delete every order
pub async fn purge(
    State(state): State<ServerState>,
    actor: CurrentActor,
) -> AppResult<Json<AppResponse<PurgeResult>>> {
    let cmd = OrderCommand::new(actor.0.clone(), OrderCommandPayload::PurgeOrders {});
    let (response, events) = state.orders.execute_command_with_events(cmd);
    if let Some(err) = response.error {
        return Err(err.into());
    }

    security_log!(
        "WARN",
        "orders_purged",
        actor_id = actor.id.clone(),
        count = events.len()
    );
    Ok(ok(PurgeResult {
        command_id: response.command_id,
        purged: events.len(),
    }))
}
