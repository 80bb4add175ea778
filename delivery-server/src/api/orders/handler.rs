//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::live::sse_response;
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::orders::ProjectionKey;
use crate::utils::{AppError, AppResponse, AppResult, ok};
use crate::views::CustomerTracking;
use shared::order::{
    CommandResponse, LineItemInput, OrderCommand, OrderCommandPayload, OrderSnapshot, Transition,
};

// ========== Requests ==========

/// One cart line as sent by the storefront
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CartItem {
    #[validate(length(min = 1, max = 64))]
    pub product_id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 1, max = 999))]
    pub quantity: i32,
    #[serde(default)]
    pub category: Option<String>,
}

impl From<CartItem> for LineItemInput {
    fn from(item: CartItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name,
            price: item.price,
            quantity: item.quantity,
            category: item.category,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, message = "cart is empty"))]
    #[validate(nested)]
    pub items: Vec<CartItem>,
    #[validate(length(min = 1, max = 500))]
    pub delivery_address: String,
    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,
    /// Client-chosen idempotency key; retries with the same key are no-ops
    #[serde(default)]
    pub command_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransitionRequest {
    pub transition: Transition,
    /// Proof-of-delivery photo, already uploaded to binary storage
    #[validate(url)]
    #[serde(default)]
    pub proof_photo_url: Option<String>,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub command_id: Option<String>,
}

/// Command outcome plus the order as it stands after the write
#[derive(Debug, Serialize)]
pub struct PlacedOrder {
    #[serde(flatten)]
    pub response: CommandResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderSnapshot>,
}

// ========== Helpers ==========

fn command(
    actor: &CurrentActor,
    command_id: Option<String>,
    payload: OrderCommandPayload,
) -> OrderCommand {
    let mut cmd = OrderCommand::new(actor.0.clone(), payload);
    if let Some(id) = command_id.filter(|id| !id.trim().is_empty()) {
        cmd.command_id = id;
    }
    cmd
}

/// Run a command, turning a rejection into an error response
fn execute(state: &ServerState, cmd: OrderCommand) -> AppResult<CommandResponse> {
    let response = state.orders.execute_command(cmd);
    match response.error {
        Some(err) => Err(err.into()),
        None => Ok(response),
    }
}

fn with_order(
    state: &ServerState,
    response: CommandResponse,
    order_id: Option<&str>,
) -> AppResult<PlacedOrder> {
    let order = match order_id.or(response.order_id.as_deref()) {
        Some(id) => state.orders.get_snapshot(id)?,
        None => None,
    };
    Ok(PlacedOrder { response, order })
}

/// Read one order through the projection layer (same access rules as the feed)
fn visible_order(state: &ServerState, actor: &CurrentActor, id: &str) -> AppResult<OrderSnapshot> {
    let key = ProjectionKey::Order(id.to_string());
    state
        .projections
        .evaluate(actor, &key)?
        .and_then(|snapshot| snapshot.orders.into_iter().next())
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))
}

// ========== Handlers ==========

/// Checkout
pub async fn place(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Json(req): Json<PlaceOrderRequest>,
) -> AppResult<Json<AppResponse<PlacedOrder>>> {
    req.validate()?;

    let payload = OrderCommandPayload::PlaceOrder {
        items: req.items.into_iter().map(LineItemInput::from).collect(),
        delivery_address: req.delivery_address,
        payment_method: req.payment_method,
    };
    let response = execute(&state, command(&actor, req.command_id, payload))?;

    tracing::info!(
        customer_id = %actor.id,
        order_id = ?response.order_id,
        "Order placed"
    );
    Ok(ok(with_order(&state, response, None)?))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<OrderSnapshot>>> {
    Ok(ok(visible_order(&state, &actor, &id)?))
}

/// Apply one status machine transition
pub async fn apply_transition(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> AppResult<Json<AppResponse<PlacedOrder>>> {
    req.validate()?;

    let payload = OrderCommandPayload::ApplyTransition {
        order_id: id.clone(),
        transition: req.transition,
        proof_photo_url: req.proof_photo_url,
        reason: req.reason,
    };
    let response = execute(&state, command(&actor, req.command_id, payload))?;

    tracing::info!(
        order_id = %id,
        actor_id = %actor.id,
        role = %actor.role,
        transition = %req.transition,
        "Transition applied"
    );
    Ok(ok(with_order(&state, response, Some(&id))?))
}

pub async fn tracking(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<CustomerTracking>>> {
    let order = visible_order(&state, &actor, &id)?;
    Ok(ok(CustomerTracking::from_order(&order)))
}

/// Live feed of one order (SSE)
pub async fn stream(
    State(state): State<ServerState>,
    actor: CurrentActor,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let feed = state
        .feed
        .stream(actor.into_inner(), ProjectionKey::Order(id));
    sse_response(&state, feed)
}
