use actix_web::{cookie::Cookie, http::StatusCode, test, web, web::ServiceConfig, App};
use chrono::{Days, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use order_engine::{
    db_types::{AddressId, Money, NewOrder, OrderItem, PaymentType, UserId},
    events::EventProducers,
    test_utils::seed::product,
    traits::{CheckoutGatewayError, HostedSession, OrderDetails},
    OrderFlowApi,
    OrderQueryApi,
    PricingPolicy,
};
use serde_json::Value;

use super::{
    helpers::{get_auth_config, get_request, issue_token, post_request, valid_token},
    mocks::{stored, MockGateway, MockStore},
};
use crate::{
    auth::{JwtClaims, Role, TokenVerifier},
    config::ServerOptions,
    middleware::JwtMiddlewareFactory,
    routes::{AllOrdersRoute, MyOrdersRoute, PlaceCodOrderRoute, PlaceOnlineOrderRoute},
};

const COD_ORDER: &str = r#"{"items":[{"product":"P1","quantity":2}],"address":"addr-alice"}"#;
const STOREFRONT: &str = "https://shop.example";

fn configure_flow(
    store: MockStore,
    gateway: MockGateway,
    options: ServerOptions,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(store, gateway, PricingPolicy::default(), EventProducers::default());
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(options))
            .service(PlaceCodOrderRoute::<MockStore, MockGateway>::new())
            .service(PlaceOnlineOrderRoute::<MockStore, MockGateway>::new());
    }
}

fn configure_queries(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderQueryApi::new(store)))
            .service(MyOrdersRoute::<MockStore>::new())
            .service(AllOrdersRoute::<MockStore>::new());
    }
}

/// A store whose catalog holds apples at 100 per unit, and which accepts any order.
fn catalog_store(payment_type: PaymentType) -> MockStore {
    let mut store = MockStore::new();
    store.expect_fetch_product().returning(|id| Ok(Some(product(id.as_str(), "Apples (1kg)", 120, 100))));
    store
        .expect_insert_order()
        .withf(move |o| {
            o.user_id == UserId::from("alice") && o.amount == Money::from(20_400) && o.payment_type == payment_type
        })
        .times(1)
        .returning(|o| Ok(stored(o)));
    store
}

fn listed_order(user: &str) -> OrderDetails {
    let order = NewOrder::new(
        UserId::from(user),
        vec![OrderItem::new("P1", 2)],
        AddressId::from("addr-alice"),
        Money::from(20_400),
        PaymentType::Cod,
    );
    OrderDetails::from_order(stored(order), vec![], None)
}

#[actix_web::test]
async fn place_order_no_token() {
    let _ = env_logger::try_init().ok();
    let configure = configure_flow(MockStore::new(), MockGateway::new(), ServerOptions::default());
    let err = post_request("", "/api/order/cod", COD_ORDER, None, configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. No access token was provided.");
}

#[actix_web::test]
async fn place_order_with_foreign_token() {
    let _ = env_logger::try_init().ok();
    let expiry = (Utc::now() + Days::new(1)).timestamp();
    let claims = JwtClaims { sub: UserId::from("alice"), roles: vec![Role::User], exp: expiry };
    let key = EncodingKey::from_secret(b"some other storefront");
    let token = encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();
    let configure = configure_flow(MockStore::new(), MockGateway::new(), ServerOptions::default());
    let err = post_request(&token, "/api/order/cod", COD_ORDER, None, configure).await.expect_err("Expected error");
    assert!(err.starts_with("Authentication Error. Access token signature is invalid."), "{err}");
}

#[actix_web::test]
async fn place_order_with_expired_token() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", vec![Role::User], Utc::now() - Days::new(1));
    let configure = configure_flow(MockStore::new(), MockGateway::new(), ServerOptions::default());
    let err = post_request(&token, "/api/order/cod", COD_ORDER, None, configure).await.expect_err("Expected error");
    assert!(err.starts_with("Authentication Error. Access token signature is invalid."), "{err}");
}

#[actix_web::test]
async fn place_order_with_garbage_token() {
    let _ = env_logger::try_init().ok();
    let configure = configure_flow(MockStore::new(), MockGateway::new(), ServerOptions::default());
    let err =
        post_request("not-a-jwt", "/api/order/cod", COD_ORDER, None, configure).await.expect_err("Expected error");
    assert!(err.starts_with("Authentication Error. Access token is not in the correct format."), "{err}");
}

#[actix_web::test]
async fn place_cod_order() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let configure = configure_flow(catalog_store(PaymentType::Cod), MockGateway::new(), ServerOptions::default());
    let (status, body) =
        post_request(&token, "/api/order/cod", COD_ORDER, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Order Placed Successfully!"}"#);
}

#[actix_web::test]
async fn place_cod_order_without_address() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let configure = configure_flow(MockStore::new(), MockGateway::new(), ServerOptions::default());
    let order = r#"{"items":[{"product":"P1","quantity":2}]}"#;
    let (status, body) = post_request(&token, "/api/order/cod", order, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Please select address!"}"#);
}

#[actix_web::test]
async fn place_cod_order_without_items() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let configure = configure_flow(MockStore::new(), MockGateway::new(), ServerOptions::default());
    let order = r#"{"items":[],"address":"addr-alice"}"#;
    let (status, body) = post_request(&token, "/api/order/cod", order, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Please select at least 1 item!"}"#);
}

#[actix_web::test]
async fn place_online_order() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_checkout_session()
        .withf(|r| {
            r.success_url == "https://shop.example/loader?next=my-orders" &&
                r.cancel_url == "https://shop.example/cart" &&
                r.line_items.len() == 2 &&
                r.line_items.iter().map(|l| l.unit_amount.value() * l.quantity).sum::<i64>() == 20_400 &&
                r.metadata.get("user_id").map(String::as_str) == Some("alice") &&
                r.metadata.contains_key("order_id")
        })
        .times(1)
        .returning(|_| {
            Ok(HostedSession {
                id: "cs_test_1".into(),
                url: Some("https://checkout.test/pay/cs_test_1".into()),
                metadata: Default::default(),
            })
        });
    let configure = configure_flow(catalog_store(PaymentType::Online), gateway, ServerOptions::default());
    let (status, body) = post_request(&token, "/api/order/online", COD_ORDER, Some(STOREFRONT), configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"{"success":true,"url":"https://checkout.test/pay/cs_test_1","message":"Order Placed Successfully!"}"#
    );
}

#[actix_web::test]
async fn place_online_order_falls_back_to_storefront_url() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_checkout_session()
        .withf(|r| r.cancel_url == "https://store.example/cart")
        .times(1)
        .returning(|_| {
            Ok(HostedSession {
                id: "cs_test_2".into(),
                url: Some("https://checkout.test/pay/cs_test_2".into()),
                metadata: Default::default(),
            })
        });
    let options = ServerOptions { storefront_url: Some("https://store.example".into()) };
    let configure = configure_flow(catalog_store(PaymentType::Online), gateway, options);
    let (status, body) =
        post_request(&token, "/api/order/online", COD_ORDER, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["url"], "https://checkout.test/pay/cs_test_2");
}

#[actix_web::test]
async fn place_online_order_without_origin() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let configure = configure_flow(MockStore::new(), MockGateway::new(), ServerOptions::default());
    let (status, body) =
        post_request(&token, "/api/order/online", COD_ORDER, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Could not determine the storefront address"}"#);
}

#[actix_web::test]
async fn place_online_order_without_address_or_origin() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let configure = configure_flow(MockStore::new(), MockGateway::new(), ServerOptions::default());
    let order = r#"{"items":[{"product":"P1","quantity":2}]}"#;
    let (status, body) =
        post_request(&token, "/api/order/online", order, None, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Please select address!"}"#);
}

#[actix_web::test]
async fn place_online_order_gateway_down() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_checkout_session()
        .times(1)
        .returning(|_| Err(CheckoutGatewayError::Unavailable("connection refused".into())));
    let configure = configure_flow(catalog_store(PaymentType::Online), gateway, ServerOptions::default());
    let (status, body) = post_request(&token, "/api/order/online", COD_ORDER, Some(STOREFRONT), configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"{"success":false,"message":"The checkout provider could not be reached: connection refused"}"#
    );
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let mut store = MockStore::new();
    store
        .expect_fetch_order_details()
        .withf(|q| q.visible_only && q.user_id == Some(UserId::from("alice")))
        .times(1)
        .returning(|_| Ok(vec![listed_order("alice")]));
    let (status, body) =
        get_request(&token, "/api/order/user", configure_queries(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    debug!("{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["orders"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["orders"][0]["user_id"], "alice");
    assert_eq!(body["orders"][0]["payment_type"], "COD");
}

#[actix_web::test]
async fn fetch_my_orders_from_cookie() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("bob", vec![Role::User]);
    let mut store = MockStore::new();
    store
        .expect_fetch_order_details()
        .withf(|q| q.user_id == Some(UserId::from("bob")))
        .times(1)
        .returning(|_| Ok(vec![]));
    let req = test::TestRequest::get().uri("/api/order/user").cookie(Cookie::new("token", token)).to_request();
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new()
        .service(web::scope("/api").wrap(JwtMiddlewareFactory::new(verifier)).configure(configure_queries(store)));
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = test::read_body(res).await;
    assert_eq!(body.as_ref(), br#"{"success":true,"orders":[]}"#);
}

#[actix_web::test]
async fn fetch_all_orders_as_user() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice", vec![Role::User]);
    let err = get_request(&token, "/api/order/seller", configure_queries(MockStore::new()))
        .await
        .expect_err("Request should have failed");
    assert!(err.starts_with("Authentication Error. Insufficient Permissions."), "{err}");
}

#[actix_web::test]
async fn fetch_all_orders_as_seller() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("seller", vec![Role::User, Role::Seller]);
    let mut store = MockStore::new();
    store
        .expect_fetch_order_details()
        .withf(|q| q.visible_only && q.user_id.is_none())
        .times(1)
        .returning(|_| Ok(vec![listed_order("alice"), listed_order("bob")]));
    let (status, body) =
        get_request(&token, "/api/order/seller", configure_queries(store)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["orders"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["orders"][1]["user_id"], "bob");
}
