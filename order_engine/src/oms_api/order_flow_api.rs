use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{AddressId, NewOrder, PaymentType, UserId},
    events::{EventProducers, OrderPlacedEvent},
    oms_api::{
        errors::OrderFlowError,
        order_objects::{
            CheckoutRedirect,
            NewOrderRequest,
            PlacedOnlineOrder,
            PlacedOrder,
            ORDER_ID_METADATA_KEY,
            USER_ID_METADATA_KEY,
        },
    },
    pricing::{resolve_lines, validate_request, PriceBreakdown, PricingPolicy},
    traits::{CheckoutGateway, CheckoutRequest, PaymentGatewayDatabase},
};

/// `OrderFlowApi` prices incoming orders and stores them, creating a hosted checkout session for online orders.
#[derive(Clone)]
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    policy: PricingPolicy,
    producers: EventProducers,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.policy)
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, policy: PricingPolicy, producers: EventProducers) -> Self {
        Self { db, gateway, policy, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: PaymentGatewayDatabase,
    G: CheckoutGateway,
{
    /// Validates the request and prices it against the current catalog. Nothing is written.
    pub async fn price_order(&self, request: &NewOrderRequest) -> Result<(AddressId, PriceBreakdown), OrderFlowError> {
        let address = validate_request(request.address.as_ref(), &request.items)?;
        let lines = resolve_lines(&self.db, &request.items).await?;
        let breakdown = self.policy.price(lines)?;
        Ok((address, breakdown))
    }

    /// Places a cash-on-delivery order. It is visible in listings straight away, unpaid.
    pub async fn place_cod_order(
        &self,
        user_id: &UserId,
        request: NewOrderRequest,
    ) -> Result<PlacedOrder, OrderFlowError> {
        let (address, pricing) = self.price_order(&request).await?;
        let new_order = NewOrder::new(user_id.clone(), request.items, address, pricing.total, PaymentType::Cod);
        let order = self.db.insert_order(new_order).await?;
        info!("🛒️ COD order {} of {} placed for user {user_id}", order.id, order.amount);
        self.producers.publish_order_placed(OrderPlacedEvent::new(order.clone())).await;
        Ok(PlacedOrder { order, pricing })
    }

    /// Places an online order and opens a hosted checkout session for it.
    ///
    /// The order is stored unpaid before the session is requested. If the session cannot be created, the stored
    /// order stays behind; it is never listed and no payment event will ever reference it.
    pub async fn place_online_order(
        &self,
        user_id: &UserId,
        request: NewOrderRequest,
        redirect: CheckoutRedirect,
    ) -> Result<PlacedOnlineOrder, OrderFlowError> {
        let (address, pricing) = self.price_order(&request).await?;
        let line_items = pricing.checkout_lines()?;
        pricing.verify_checkout_total(&line_items)?;
        let new_order = NewOrder::new(user_id.clone(), request.items, address, pricing.total, PaymentType::Online);
        let order = self.db.insert_order(new_order).await?;
        debug!(
            "🛒️ Online order {} of {} stored for user {user_id}. Requesting checkout session.",
            order.id, order.amount
        );
        let checkout = CheckoutRequest {
            line_items,
            currency: self.policy.currency.clone(),
            success_url: redirect.success_url,
            cancel_url: redirect.cancel_url,
            metadata: [
                (ORDER_ID_METADATA_KEY.to_string(), order.id.to_string()),
                (USER_ID_METADATA_KEY.to_string(), user_id.to_string()),
            ]
            .into_iter()
            .collect(),
        };
        let session = self.gateway.create_checkout_session(checkout).await.map_err(|e| {
            warn!("🛒️ Could not create a checkout session for order {}: {e}", order.id);
            e
        })?;
        info!("🛒️ Online order {} placed for user {user_id}. Checkout session {}", order.id, session.id);
        self.producers.publish_order_placed(OrderPlacedEvent::new(order.clone())).await;
        Ok(PlacedOnlineOrder { order, pricing, session })
    }
}
