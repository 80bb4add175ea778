use super::*;
use shared::models::Actor;
use shared::order::types::CommandErrorCode;
use shared::order::{LineItemInput, OrderStatus, Transition};

fn create_test_manager() -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    OrdersManager::with_storage(storage)
}

fn customer() -> Actor {
    Actor::customer("cust-1")
}

fn driver(id: &str) -> Actor {
    Actor::driver(id)
}

fn owner() -> Actor {
    Actor::owner("owner-1")
}

fn place_order_cmd(actor: Actor, items: Vec<LineItemInput>) -> OrderCommand {
    OrderCommand::new(
        actor,
        OrderCommandPayload::PlaceOrder {
            items,
            delivery_address: "Jl. Kebon Jeruk 5, Jakarta Barat".to_string(),
            payment_method: "transfer".to_string(),
        },
    )
}

fn simple_item(product_id: &str, name: &str, price: f64, quantity: i32) -> LineItemInput {
    LineItemInput::new(product_id, name, price, quantity)
}

// ========================================================================
// Helper: place an order and walk it along the status machine
// ========================================================================

fn place_order(manager: &OrdersManager, actor: Actor) -> String {
    let resp = manager.execute_command(place_order_cmd(
        actor,
        vec![
            simple_item("ayam-bakar", "Ayam Bakar", 17500.0, 2),
            simple_item("es-jeruk", "Es Jeruk", 15000.0, 1),
        ],
    ));
    assert!(resp.success, "Failed to place order: {:?}", resp.error);
    resp.order_id.unwrap()
}

fn apply(manager: &OrdersManager, actor: Actor, order_id: &str, transition: Transition) -> CommandResponse {
    manager.execute_command(OrderCommand::transition(actor, order_id, transition))
}

fn assert_applied(resp: &CommandResponse) {
    assert!(resp.success, "Command failed: {:?}", resp.error);
}

fn assert_rejected(resp: &CommandResponse, code: CommandErrorCode) {
    assert!(!resp.success, "Command unexpectedly succeeded");
    assert_eq!(resp.error.as_ref().map(|e| e.code), Some(code));
}

/// Place, pay and claim with `driver_id`
fn claimed_order(manager: &OrdersManager, driver_id: &str) -> String {
    let order_id = place_order(manager, customer());
    assert_applied(&apply(manager, customer(), &order_id, Transition::ConfirmPayment));
    assert_applied(&apply(manager, driver(driver_id), &order_id, Transition::Claim));
    order_id
}

fn snapshot(manager: &OrdersManager, order_id: &str) -> OrderSnapshot {
    manager.get_snapshot(order_id).unwrap().unwrap()
}

mod test_flows;
