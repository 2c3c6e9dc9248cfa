//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two should delegate to the order engine. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database and gateway call in here is therefore async.
//!
//! A note about responses:
//! Business outcomes (validation failures, unknown products, gateway trouble) are always reported as HTTP 200 with
//! `success: false` and a message the storefront can show. Non-200 statuses are reserved for authentication failures
//! and for webhook deliveries that the gateway should retry or give up on.
use actix_web::{get, http::header::ORIGIN, web, HttpRequest, HttpResponse, Responder};
use checkout_tools::{WebhookVerifier, SIGNATURE_HEADER};
use log::*;
use order_engine::{
    order_objects::{CheckoutRedirect, NewOrderRequest},
    pricing::validate_request,
    traits::{CheckoutGateway, OrderManagement, PaymentGatewayDatabase},
    OrderFlowApi,
    OrderQueryApi,
    PaymentReconciler,
    ReconcileOutcome,
};

use crate::{
    auth::{JwtClaims, Role},
    config::ServerOptions,
    data_objects::{CheckoutResponse, JsonResponse, OrdersResponse, WebhookAck},
    errors::ServerError,
    integrations::checkout::payment_event_from_webhook,
};

pub const ORDER_PLACED_MESSAGE: &str = "Order Placed Successfully!";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $bound:ty where requires [$($roles:expr),+])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $bound + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_cod_order => Post "/order/cod" impl PaymentGatewayDatabase, CheckoutGateway);
pub async fn place_cod_order<B, G>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> HttpResponse
where
    B: PaymentGatewayDatabase,
    G: CheckoutGateway,
{
    let user_id = claims.user_id();
    debug!("💻️ POST COD order for {user_id}");
    let result = match api.place_cod_order(user_id, body.into_inner()).await {
        Ok(placed) => {
            info!("💻️ COD order {} placed for {user_id}", placed.order.id);
            JsonResponse::success(ORDER_PLACED_MESSAGE)
        },
        Err(e) => {
            info!("💻️ Could not place COD order for {user_id}. {e}");
            JsonResponse::failure(e)
        },
    };
    HttpResponse::Ok().json(result)
}

route!(place_online_order => Post "/order/online" impl PaymentGatewayDatabase, CheckoutGateway);
pub async fn place_online_order<B, G>(
    req: HttpRequest,
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse
where
    B: PaymentGatewayDatabase,
    G: CheckoutGateway,
{
    let user_id = claims.user_id();
    debug!("💻️ POST online order for {user_id}");
    if let Err(e) = validate_request(body.address.as_ref(), &body.items) {
        info!("💻️ Could not place online order for {user_id}. {e}");
        return HttpResponse::Ok().json(JsonResponse::failure(e));
    }
    let Some(origin) = request_origin(&req, options.as_ref()) else {
        warn!("💻️ Online order from {user_id} has no Origin header, and no storefront URL is configured");
        return HttpResponse::Ok().json(JsonResponse::failure("Could not determine the storefront address"));
    };
    let redirect = CheckoutRedirect::for_origin(&origin);
    match api.place_online_order(user_id, body.into_inner(), redirect).await {
        Ok(placed) => match placed.redirect_url() {
            Some(url) => {
                info!("💻️ Online order {} placed for {user_id}", placed.order.id);
                HttpResponse::Ok().json(CheckoutResponse::new(url.to_string(), ORDER_PLACED_MESSAGE))
            },
            None => {
                warn!("💻️ Checkout session {} for order {} has no URL", placed.session.id, placed.order.id);
                HttpResponse::Ok().json(JsonResponse::failure("The payment page could not be created"))
            },
        },
        Err(e) => {
            info!("💻️ Could not place online order for {user_id}. {e}");
            HttpResponse::Ok().json(JsonResponse::failure(e))
        },
    }
}

/// The storefront origin for checkout redirects: the `Origin` header if present, otherwise the configured URL.
fn request_origin(req: &HttpRequest, options: &ServerOptions) -> Option<String> {
    req.headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .map(String::from)
        .or_else(|| options.storefront_url.clone())
}

route!(my_orders => Get "/order/user" impl OrderManagement);
pub async fn my_orders<B: OrderManagement>(claims: JwtClaims, api: web::Data<OrderQueryApi<B>>) -> HttpResponse {
    let user_id = claims.user_id();
    debug!("💻️ GET orders for {user_id}");
    match api.list_for_user(user_id).await {
        Ok(orders) => HttpResponse::Ok().json(OrdersResponse::new(orders)),
        Err(e) => {
            warn!("💻️ Could not fetch orders for {user_id}. {e}");
            HttpResponse::Ok().json(JsonResponse::failure(e))
        },
    }
}

route!(all_orders => Get "/order/seller" impl OrderManagement where requires [Role::Seller]);
pub async fn all_orders<B: OrderManagement>(claims: JwtClaims, api: web::Data<OrderQueryApi<B>>) -> HttpResponse {
    debug!("💻️ GET all orders for seller {}", claims.sub);
    match api.list_all().await {
        Ok(orders) => HttpResponse::Ok().json(OrdersResponse::new(orders)),
        Err(e) => {
            warn!("💻️ Could not fetch orders. {e}");
            HttpResponse::Ok().json(JsonResponse::failure(e))
        },
    }
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(payment_webhook => Post "/checkout/webhook" impl PaymentGatewayDatabase, CheckoutGateway);
/// Route handler for payment lifecycle events from the checkout gateway.
///
/// The raw body is needed to check the signature, so it is taken as bytes and only parsed once verified.
/// * A delivery that fails verification gets 400 and is not looked at any further.
/// * A verified event that cannot be tied to an order gets 500, so that the gateway delivers it again later.
/// * Everything else, including events for orders that are already settled, is acknowledged with
///   `{"received": true}`.
pub async fn payment_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    verifier: web::Data<WebhookVerifier>,
    reconciler: web::Data<PaymentReconciler<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: CheckoutGateway,
{
    trace!("💻️ Received webhook request: {}", req.uri());
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let event = verifier.verify_and_parse(body.as_ref(), signature).map_err(|e| {
        warn!("💻️ Rejected webhook delivery. {e}");
        e
    })?;
    debug!("💻️ Webhook event {} ({}) verified", event.id, event.event_type);
    let event = payment_event_from_webhook(event)?;
    let event_id = event.id.clone();
    let outcome = reconciler.reconcile(event).await.map_err(|e| {
        warn!("💻️ Could not reconcile webhook event {event_id}. {e}");
        e
    })?;
    match &outcome {
        ReconcileOutcome::Paid { order, .. } => info!("💻️ Event {event_id}: order {} is paid", order.id),
        ReconcileOutcome::Deleted(order) => info!("💻️ Event {event_id}: order {} was deleted", order.id),
        other => debug!("💻️ Event {event_id}: {other:?}"),
    }
    Ok(HttpResponse::Ok().json(WebhookAck::received()))
}
