use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{DateTime, Days, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use order_engine::db_types::UserId;

use crate::{
    auth::{JwtClaims, Role, TokenVerifier},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
};

// Only ever used to sign tokens in these tests.
pub const TEST_JWT_SECRET: &str = "3b1cf0a1d5e27c44b4e1a9f07e8d6c35";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn issue_token(user: &str, roles: Vec<Role>, expiry: DateTime<Utc>) -> String {
    let claims = JwtClaims { sub: UserId::from(user), roles, exp: expiry.timestamp() };
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key).expect("Failed to sign token")
}

pub fn valid_token(user: &str, roles: Vec<Role>) -> String {
    issue_token(user, roles, Utc::now() + Days::new(1))
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::get().uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    call_api(req, configure).await
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: &str,
    origin: Option<&str>,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req =
        TestRequest::post().uri(path).insert_header(("Content-Type", "application/json")).set_payload(body.to_string());
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    if let Some(origin) = origin {
        req = req.insert_header(("Origin", origin));
    }
    call_api(req, configure).await
}

/// Sends the request through the `/api` scope with the JWT middleware in place, as the server does.
async fn call_api(
    req: TestRequest,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new().service(web::scope("/api").wrap(JwtMiddlewareFactory::new(verifier)).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?;
    let status = res.status();
    let body = test::read_body(res).await;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

/// Sends a webhook delivery. The webhook route is not behind the JWT middleware.
pub async fn post_webhook(
    body: &str,
    signature: Option<&str>,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post()
        .uri("/checkout/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string());
    if let Some(signature) = signature {
        req = req.insert_header((checkout_tools::SIGNATURE_HEADER, signature));
    }
    let service = test::init_service(App::new().configure(configure)).await;
    debug!("Delivering webhook");
    let res = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?;
    let status = res.status();
    let body = test::read_body(res).await;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}
