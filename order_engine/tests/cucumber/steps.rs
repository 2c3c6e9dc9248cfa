use cucumber::{given, then, when};
use order_engine::{
    db_types::{AddressId, Money, OrderItem, UserId},
    order_objects::{CheckoutRedirect, NewOrderRequest},
    OrderManagement,
    PaymentEvent,
    PaymentEventKind,
    ReconcileOutcome,
};

use crate::cucumber::{storefront_world::OrderManagementSystem, StorefrontWorld};

fn address_for(customer: &str) -> AddressId {
    AddressId::from(format!("addr-{customer}"))
}

#[given("a seeded storefront")]
async fn seeded_storefront(world: &mut StorefrontWorld) {
    world.system = Some(OrderManagementSystem::new().await);
}

#[when(expr = "'{word}' places a COD order [{word}] for {int} x {word}")]
async fn place_cod_order(world: &mut StorefrontWorld, customer: String, label: String, qty: i64, product: String) {
    let request = NewOrderRequest::new(vec![OrderItem::new(product, qty)], Some(address_for(&customer)));
    let placed = world.system().flow.place_cod_order(&UserId::from(customer), request).await.expect("COD order failed");
    world.orders.insert(label, placed.order.id);
}

#[when(expr = "'{word}' places an online order [{word}] for {int} x {word}")]
async fn place_online_order(world: &mut StorefrontWorld, customer: String, label: String, qty: i64, product: String) {
    let request = NewOrderRequest::new(vec![OrderItem::new(product, qty)], Some(address_for(&customer)));
    let redirect = CheckoutRedirect::for_origin("https://shop.example.com");
    let placed = world
        .system()
        .flow
        .place_online_order(&UserId::from(customer), request, redirect)
        .await
        .expect("Online order failed");
    world.orders.insert(label, placed.order.id);
}

#[when(expr = "'{word}' places a COD order without an address")]
async fn place_order_without_address(world: &mut StorefrontWorld, customer: String) {
    let request = NewOrderRequest::new(vec![OrderItem::new("P1", 1)], None);
    let result = world.system().flow.place_cod_order(&UserId::from(customer), request).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "'{word}' places a COD order with no items")]
async fn place_order_without_items(world: &mut StorefrontWorld, customer: String) {
    let request = NewOrderRequest::new(vec![], Some(address_for(&customer)));
    let result = world.system().flow.place_cod_order(&UserId::from(customer), request).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "the payment for order [{word}] succeeds")]
async fn payment_succeeds(world: &mut StorefrontWorld, label: String) {
    let order_id = world.order_id(&label);
    let sys = world.system();
    let payment_intent = sys.gateway.attach_payment_intent(&order_id).expect("No checkout session for order");
    let event = PaymentEvent::new(format!("evt_{label}"), PaymentEventKind::Succeeded { payment_intent });
    let outcome = sys.reconciler.reconcile(event).await.expect("Reconciliation failed");
    world.last_outcome = Some(outcome);
}

#[when(expr = "the payment for order [{word}] fails")]
async fn payment_fails(world: &mut StorefrontWorld, label: String) {
    let order_id = world.order_id(&label);
    let sys = world.system();
    let payment_intent = sys.gateway.attach_payment_intent(&order_id).expect("No checkout session for order");
    let event = PaymentEvent::new(format!("evt_{label}"), PaymentEventKind::Failed { payment_intent });
    let outcome = sys.reconciler.reconcile(event).await.expect("Reconciliation failed");
    world.last_outcome = Some(outcome);
}

#[then(expr = "order [{word}] has an amount of {int}")]
async fn check_amount(world: &mut StorefrontWorld, label: String, amount: i64) {
    let order_id = world.order_id(&label);
    let order = world.system().db.fetch_order(&order_id).await.expect("Error fetching order").expect("No such order");
    assert_eq!(order.amount, Money::from_major(amount).expect("Amount out of range"));
}

#[then(expr = "order [{word}] is paid")]
async fn check_paid(world: &mut StorefrontWorld, label: String) {
    let order_id = world.order_id(&label);
    let order = world.system().db.fetch_order(&order_id).await.expect("Error fetching order").expect("No such order");
    assert!(order.is_paid, "Order {label} is not paid");
}

#[then(expr = "order [{word}] is unpaid")]
async fn check_unpaid(world: &mut StorefrontWorld, label: String) {
    let order_id = world.order_id(&label);
    let order = world.system().db.fetch_order(&order_id).await.expect("Error fetching order").expect("No such order");
    assert!(!order.is_paid, "Order {label} is paid");
}

#[then(expr = "order [{word}] no longer exists")]
async fn check_deleted(world: &mut StorefrontWorld, label: String) {
    let order_id = world.order_id(&label);
    let order = world.system().db.fetch_order(&order_id).await.expect("Error fetching order");
    assert!(order.is_none(), "Order {label} still exists");
}

#[then(expr = "'{word}' sees {int} order(s) in their order list")]
async fn check_listing(world: &mut StorefrontWorld, customer: String, count: usize) {
    let orders = world.system().queries.list_for_user(&UserId::from(customer)).await.expect("Error listing orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "the seller sees {int} order(s)")]
async fn check_seller_listing(world: &mut StorefrontWorld, count: usize) {
    let orders = world.system().queries.list_all().await.expect("Error listing orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "the cart of '{word}' is empty")]
async fn check_cart_empty(world: &mut StorefrontWorld, customer: String) {
    let cart = world.system().db.fetch_cart(&UserId::from(customer)).await.expect("Error fetching cart");
    assert_eq!(cart.map(|c| c.len()), Some(0));
}

#[then(expr = "the cart of '{word}' still has {int} product(s)")]
async fn check_cart_size(world: &mut StorefrontWorld, customer: String, count: usize) {
    let cart = world.system().db.fetch_cart(&UserId::from(customer)).await.expect("Error fetching cart");
    assert_eq!(cart.map(|c| c.len()), Some(count));
}

#[then(expr = "the order is rejected with {string}")]
async fn check_rejection(world: &mut StorefrontWorld, message: String) {
    assert_eq!(world.last_error.as_deref(), Some(message.as_str()));
}

#[then("the event changed nothing")]
async fn check_no_change(world: &mut StorefrontWorld) {
    let outcome = world.last_outcome.as_ref().expect("No event was reconciled");
    assert!(
        matches!(
            outcome,
            ReconcileOutcome::AlreadyPaid(_) | ReconcileOutcome::AlreadyDeleted(_) | ReconcileOutcome::Ignored { .. }
        ),
        "Unexpected outcome {outcome:?}"
    );
}
