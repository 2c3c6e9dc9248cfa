use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use checkout_tools::{CheckoutApi, WebhookVerifier};
use futures::FutureExt;
use log::*;
use order_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    OrderFlowApi,
    OrderQueryApi,
    PaymentReconciler,
    SqliteDatabase,
};

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    integrations::checkout::CheckoutAdapter,
    middleware::JwtMiddlewareFactory,
    routes::{health, AllOrdersRoute, MyOrdersRoute, PaymentWebhookRoute, PlaceCodOrderRoute, PlaceOnlineOrderRoute},
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
        info!("🚀️ Database migrations are up to date");
    }
    let gateway = CheckoutApi::new(config.checkout.clone())
        .map(CheckoutAdapter::new)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Order lifecycle hooks that only write to the log. Downstream integrations (emails, fulfilment) hang off the same
/// events.
fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_placed(|ev| {
            let order = ev.order;
            async move { info!("📬️ Order {} placed by {} ({})", order.id, order.user_id, order.payment_type) }.boxed()
        })
        .on_order_paid(|ev| async move { info!("📬️ Order {} has been paid", ev.order.id) }.boxed())
        .on_order_annulled(|ev| {
            async move { info!("📬️ Order {} was annulled. {}", ev.order.id, ev.reason) }.boxed()
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: CheckoutAdapter,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let webhook_secret = config.checkout.webhook_secret.clone();
    let webhook_tolerance = config.checkout.webhook_tolerance_secs;
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), config.pricing.clone(), producers.clone());
        let query_api = OrderQueryApi::new(db.clone());
        let reconciler = PaymentReconciler::new(db.clone(), gateway.clone(), producers.clone());
        let verifier = WebhookVerifier::new(webhook_secret.clone(), webhook_tolerance);
        let token_verifier = TokenVerifier::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("oms::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(reconciler))
            .app_data(web::Data::new(verifier))
            .app_data(web::Data::new(config.server_options()));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(token_verifier))
            .service(PlaceCodOrderRoute::<SqliteDatabase, CheckoutAdapter>::new())
            .service(PlaceOnlineOrderRoute::<SqliteDatabase, CheckoutAdapter>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(AllOrdersRoute::<SqliteDatabase>::new());
        app.service(auth_scope).service(health).service(PaymentWebhookRoute::<SqliteDatabase, CheckoutAdapter>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
