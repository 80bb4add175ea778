use super::*;

#[test]
fn test_full_delivery_flow() {
    let manager = create_test_manager();
    let order_id = claimed_order(&manager, "driver-1");

    let order = snapshot(&manager, &order_id);
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.driver_id.as_deref(), Some("driver-1"));

    for transition in [
        Transition::ArriveAtRestaurant,
        Transition::PickUp,
        Transition::Depart,
    ] {
        assert_applied(&apply(&manager, driver("driver-1"), &order_id, transition));
        assert!(snapshot(&manager, &order_id).check_invariants().is_ok());
    }

    let resp = manager.execute_command(OrderCommand::new(
        driver("driver-1"),
        OrderCommandPayload::ApplyTransition {
            order_id: order_id.clone(),
            transition: Transition::Complete,
            proof_photo_url: Some("https://files.example/pod/abc.jpg".to_string()),
            reason: None,
        },
    ));
    assert_applied(&resp);

    let order = snapshot(&manager, &order_id);
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.proof_photo_url.as_deref(), Some("https://files.example/pod/abc.jpg"));
    let ts = order.timestamps;
    assert!(ts.paid_at <= ts.confirmed_at);
    assert!(ts.confirmed_at <= ts.arrived_at_resto_at);
    assert!(ts.arrived_at_resto_at <= ts.picked_up_at);
    assert!(ts.picked_up_at <= ts.on_the_way_at);
    assert!(ts.on_the_way_at <= ts.completed_at);
    assert!(ts.completed_at.is_some());
    assert_eq!(ts.completed_at, ts.delivered_at);
    assert!(ts.cancelled_at.is_none());
    assert!(order.check_invariants().is_ok());
    assert_eq!(manager.get_events_for_order(&order_id).unwrap().len(), 7);
}

#[test]
fn test_completed_order_is_terminal() {
    let manager = create_test_manager();
    let order_id = claimed_order(&manager, "driver-1");
    for transition in [
        Transition::ArriveAtRestaurant,
        Transition::PickUp,
        Transition::Depart,
        Transition::Complete,
    ] {
        assert_applied(&apply(&manager, driver("driver-1"), &order_id, transition));
    }

    assert_rejected(
        &apply(&manager, owner(), &order_id, Transition::Cancel),
        CommandErrorCode::InvalidTransition,
    );
    assert_rejected(
        &apply(&manager, driver("driver-1"), &order_id, Transition::Complete),
        CommandErrorCode::InvalidTransition,
    );
    assert_eq!(snapshot(&manager, &order_id).status, OrderStatus::Completed);
}

#[test]
fn test_cancelled_order_is_terminal() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, customer());
    assert_applied(&apply(&manager, customer(), &order_id, Transition::Cancel));

    let order = snapshot(&manager, &order_id);
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(order.timestamps.cancelled_at.is_some());

    for transition in [Transition::ConfirmPayment, Transition::Claim, Transition::Cancel] {
        let actor = if transition == Transition::Claim { driver("driver-1") } else { owner() };
        assert_rejected(
            &apply(&manager, actor, &order_id, transition),
            CommandErrorCode::InvalidTransition,
        );
    }
}

#[test]
fn test_driver_progress_requires_assignment() {
    let manager = create_test_manager();
    let order_id = claimed_order(&manager, "driver-1");

    assert_rejected(
        &apply(&manager, driver("driver-2"), &order_id, Transition::ArriveAtRestaurant),
        CommandErrorCode::NotAssignedDriver,
    );
    assert_rejected(
        &apply(&manager, customer(), &order_id, Transition::ArriveAtRestaurant),
        CommandErrorCode::RoleNotPermitted,
    );
    assert_eq!(snapshot(&manager, &order_id).status, OrderStatus::Confirmed);
}

#[test]
fn test_claim_requires_payment() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, customer());

    assert_rejected(
        &apply(&manager, driver("driver-1"), &order_id, Transition::Claim),
        CommandErrorCode::InvalidTransition,
    );
    let order = snapshot(&manager, &order_id);
    assert!(order.driver_id.is_none());
    assert!(order.check_invariants().is_ok());
}

#[test]
fn test_cancel_rules_by_role() {
    let manager = create_test_manager();

    // Customer may cancel while paid
    let paid = place_order(&manager, customer());
    assert_applied(&apply(&manager, customer(), &paid, Transition::ConfirmPayment));
    assert_applied(&apply(&manager, customer(), &paid, Transition::Cancel));

    // ...but not once a driver has claimed it
    let claimed = claimed_order(&manager, "driver-1");
    assert_rejected(
        &apply(&manager, customer(), &claimed, Transition::Cancel),
        CommandErrorCode::RoleNotPermitted,
    );
    assert_rejected(
        &apply(&manager, driver("driver-1"), &claimed, Transition::Cancel),
        CommandErrorCode::RoleNotPermitted,
    );

    // Owner may cancel mid-delivery; the driver stays on record
    assert_applied(&apply(&manager, owner(), &claimed, Transition::Cancel));
    let order = snapshot(&manager, &claimed);
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.driver_id.as_deref(), Some("driver-1"));
}

#[test]
fn test_other_customer_cannot_touch_order() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, customer());
    let stranger = Actor::customer("cust-2");

    assert_rejected(
        &apply(&manager, stranger.clone(), &order_id, Transition::ConfirmPayment),
        CommandErrorCode::RoleNotPermitted,
    );
    assert_rejected(
        &apply(&manager, stranger, &order_id, Transition::Cancel),
        CommandErrorCode::RoleNotPermitted,
    );
}

#[test]
fn test_invariants_hold_at_every_step() {
    let manager = create_test_manager();
    let order_id = place_order(&manager, customer());

    let steps = [
        (customer(), Transition::ConfirmPayment),
        (driver("driver-1"), Transition::Claim),
        (driver("driver-1"), Transition::ArriveAtRestaurant),
        (driver("driver-1"), Transition::PickUp),
        (driver("driver-1"), Transition::Depart),
        (driver("driver-1"), Transition::Complete),
    ];
    for (actor, transition) in steps {
        assert_applied(&apply(&manager, actor, &order_id, transition));
        let order = snapshot(&manager, &order_id);
        assert!(OrderStatus::ALL.contains(&order.status));
        assert!(order.check_invariants().is_ok(), "broken after {transition}");
        assert_eq!(order.status.is_pre_assignment(), order.driver_id.is_none());
    }
}
