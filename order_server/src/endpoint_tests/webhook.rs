use std::collections::BTreeMap;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use checkout_tools::WebhookVerifier;
use order_engine::{
    db_types::{AddressId, Money, NewOrder, OrderId, OrderItem, PaymentType, UserId},
    events::EventProducers,
    traits::{CheckoutGatewayError, HostedSession, MarkPaidResult},
    PaymentReconciler,
};
use shop_common::Secret;

use super::{
    helpers::post_webhook,
    mocks::{stored, MockGateway, MockStore},
};
use crate::routes::PaymentWebhookRoute;

const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";
const SUCCEEDED: &str = r#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;

fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(Secret::new(WEBHOOK_SECRET.to_string()), 300)
}

fn sign(body: &str) -> String {
    verifier().sign(body.as_bytes(), Utc::now().timestamp()).unwrap()
}

fn configure(store: MockStore, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let reconciler = PaymentReconciler::new(store, gateway, EventProducers::default());
        cfg.app_data(web::Data::new(reconciler))
            .app_data(web::Data::new(verifier()))
            .service(PaymentWebhookRoute::<MockStore, MockGateway>::new());
    }
}

fn session_for(order_id: &str) -> HostedSession {
    HostedSession {
        id: "cs_test_1".into(),
        url: None,
        metadata: BTreeMap::from([
            ("order_id".to_string(), order_id.to_string()),
            ("user_id".to_string(), "alice".to_string()),
        ]),
    }
}

#[actix_web::test]
async fn webhook_without_signature() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_webhook(SUCCEEDED, None, configure(MockStore::new(), MockGateway::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("error"), "{body}");
}

#[actix_web::test]
async fn webhook_with_forged_signature() {
    let _ = env_logger::try_init().ok();
    let forged = format!("t={},v1={}", Utc::now().timestamp(), "ab".repeat(32));
    let (status, _) = post_webhook(SUCCEEDED, Some(&forged), configure(MockStore::new(), MockGateway::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn webhook_signature_covers_the_body() {
    let _ = env_logger::try_init().ok();
    let signature = sign(SUCCEEDED);
    let tampered = SUCCEEDED.replace("pi_1", "pi_2");
    let (status, _) = post_webhook(&tampered, Some(&signature), configure(MockStore::new(), MockGateway::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn payment_succeeded() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_sessions_by_payment_intent()
        .withf(|pi| pi == "pi_1")
        .times(1)
        .returning(|_| Ok(vec![session_for("order-1")]));
    let mut store = MockStore::new();
    store.expect_mark_order_paid().withf(|id| id == &OrderId::from("order-1")).times(1).returning(|id| {
        let order = NewOrder::new(
            UserId::from("alice"),
            vec![OrderItem::new("P1", 2)],
            AddressId::from("addr-alice"),
            Money::from(20_400),
            PaymentType::Online,
        )
        .with_id(id.clone());
        let mut order = stored(order);
        order.is_paid = true;
        Ok(MarkPaidResult::Updated(order))
    });
    store.expect_clear_cart().withf(|user| user == &UserId::from("alice")).times(1).returning(|_| Ok(true));
    let signature = sign(SUCCEEDED);
    let (status, body) =
        post_webhook(SUCCEEDED, Some(&signature), configure(store, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
}

#[actix_web::test]
async fn payment_for_a_missing_order_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_list_sessions_by_payment_intent().returning(|_| Ok(vec![session_for("gone")]));
    let mut store = MockStore::new();
    store.expect_mark_order_paid().times(1).returning(|_| Ok(MarkPaidResult::NotFound));
    let signature = sign(SUCCEEDED);
    let (status, body) =
        post_webhook(SUCCEEDED, Some(&signature), configure(store, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
}

#[actix_web::test]
async fn unknown_payment_intent_is_retried() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway.expect_list_sessions_by_payment_intent().times(1).returning(|_| Ok(vec![]));
    let signature = sign(SUCCEEDED);
    let (status, body) =
        post_webhook(SUCCEEDED, Some(&signature), configure(MockStore::new(), gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("No checkout session exists for payment intent pi_1"), "{body}");
}

#[actix_web::test]
async fn session_lookup_failure_is_retried() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_sessions_by_payment_intent()
        .times(1)
        .returning(|_| Err(CheckoutGatewayError::Unavailable("timeout".into())));
    let signature = sign(SUCCEEDED);
    let (status, _) =
        post_webhook(SUCCEEDED, Some(&signature), configure(MockStore::new(), gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn unrelated_events_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let event = r#"{"id":"evt_9","type":"charge.refunded","data":{"object":{"id":"ch_1"}}}"#;
    let signature = sign(event);
    let (status, body) = post_webhook(event, Some(&signature), configure(MockStore::new(), MockGateway::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"received":true}"#);
}

#[actix_web::test]
async fn payment_event_without_intent_is_rejected() {
    let _ = env_logger::try_init().ok();
    let event = r#"{"id":"evt_2","type":"payment_intent.payment_failed","data":{"object":{}}}"#;
    let signature = sign(event);
    let (status, _) = post_webhook(event, Some(&signature), configure(MockStore::new(), MockGateway::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
