//! Applies payment lifecycle events from the checkout provider to stored orders.
//!
//! | Event     | Order state          | Result                                        |
//! |-----------|----------------------|-----------------------------------------------|
//! | Succeeded | online, unpaid       | marked paid, cart cleared                     |
//! | Succeeded | already paid         | nothing changes ([`ReconcileOutcome::AlreadyPaid`]) |
//! | Failed    | unpaid               | deleted                                       |
//! | Failed    | already gone         | nothing changes ([`ReconcileOutcome::AlreadyDeleted`]) |
//! | Failed    | paid                 | kept ([`ReconcileOutcome::Ignored`])          |
//! | Other     | any                  | nothing changes                               |
//!
//! Every transition is a single conditional statement in the store, so redelivered or concurrent events for the same
//! order are safe.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderId, UserId},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    oms_api::{
        errors::ReconciliationError,
        order_objects::{ORDER_ID_METADATA_KEY, USER_ID_METADATA_KEY},
    },
    traits::{CheckoutGateway, DiscardResult, MarkPaidResult, PaymentGatewayDatabase},
};

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    Succeeded { payment_intent: String },
    Failed { payment_intent: String },
    /// Any event type this service does not act on
    Other(String),
}

impl PaymentEventKind {
    /// Classifies a provider event. Returns `None` for a payment event that doesn't say which payment intent it is
    /// about.
    pub fn classify(event_type: &str, object_id: Option<&str>) -> Option<Self> {
        match event_type {
            PAYMENT_SUCCEEDED => object_id.map(|id| Self::Succeeded { payment_intent: id.to_string() }),
            PAYMENT_FAILED => object_id.map(|id| Self::Failed { payment_intent: id.to_string() }),
            other => Some(Self::Other(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    /// The provider's event id, for logging
    pub id: String,
    pub kind: PaymentEventKind,
}

impl PaymentEvent {
    pub fn new<S: Into<String>>(id: S, kind: PaymentEventKind) -> Self {
        Self { id: id.into(), kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The order is now paid. `cart_cleared` is false if the customer could not be found.
    Paid { order: Order, cart_cleared: bool },
    AlreadyPaid(OrderId),
    Deleted(Order),
    AlreadyDeleted(OrderId),
    /// The event references an order that does not exist.
    OrderMissing(OrderId),
    /// The event was valid, but applying it would break an invariant, so it was skipped.
    Ignored { order_id: OrderId, reason: String },
    Unhandled(String),
}

pub struct PaymentReconciler<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for PaymentReconciler<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentReconciler")
    }
}

impl<B: Clone, G: Clone> Clone for PaymentReconciler<B, G> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), gateway: self.gateway.clone(), producers: self.producers.clone() }
    }
}

impl<B, G> PaymentReconciler<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

struct SessionRef {
    order_id: OrderId,
    user_id: Option<UserId>,
}

impl<B, G> PaymentReconciler<B, G>
where
    B: PaymentGatewayDatabase,
    G: CheckoutGateway,
{
    pub async fn reconcile(&self, event: PaymentEvent) -> Result<ReconcileOutcome, ReconciliationError> {
        match event.kind {
            PaymentEventKind::Succeeded { payment_intent } => {
                debug!("🔄️ Event {}: payment {payment_intent} succeeded", event.id);
                let session = self.resolve_session(&payment_intent).await?;
                self.settle(session).await
            },
            PaymentEventKind::Failed { payment_intent } => {
                debug!("🔄️ Event {}: payment {payment_intent} failed", event.id);
                let session = self.resolve_session(&payment_intent).await?;
                self.annul(session).await
            },
            PaymentEventKind::Other(event_type) => {
                info!("🔄️ Event {}: unhandled event type {event_type}", event.id);
                Ok(ReconcileOutcome::Unhandled(event_type))
            },
        }
    }

    async fn resolve_session(&self, payment_intent: &str) -> Result<SessionRef, ReconciliationError> {
        let sessions = self.gateway.list_sessions_by_payment_intent(payment_intent).await.map_err(|source| {
            ReconciliationError::SessionLookup { payment_intent: payment_intent.to_string(), source }
        })?;
        let session = sessions
            .into_iter()
            .next()
            .ok_or_else(|| ReconciliationError::NoSessionForPaymentIntent(payment_intent.to_string()))?;
        let order_id = session
            .metadata
            .get(ORDER_ID_METADATA_KEY)
            .map(|id| OrderId::from(id.as_str()))
            .ok_or(ReconciliationError::MissingMetadata {
                payment_intent: payment_intent.to_string(),
                key: ORDER_ID_METADATA_KEY,
            })?;
        let user_id = session.metadata.get(USER_ID_METADATA_KEY).map(|id| UserId::from(id.as_str()));
        trace!("🔄️ Payment {payment_intent} belongs to checkout session {} for order {order_id}", session.id);
        Ok(SessionRef { order_id, user_id })
    }

    async fn settle(&self, session: SessionRef) -> Result<ReconcileOutcome, ReconciliationError> {
        let order_id = session.order_id;
        match self.db.mark_order_paid(&order_id).await? {
            MarkPaidResult::Updated(order) => {
                if let Some(user) = session.user_id.as_ref().filter(|u| **u != order.user_id) {
                    warn!(
                        "🔄️ Checkout session for order {order_id} names user {user}, but the order belongs to {}. \
                         Clearing the order owner's cart.",
                        order.user_id
                    );
                }
                let cart_cleared = match self.db.clear_cart(&order.user_id).await {
                    Ok(true) => true,
                    Ok(false) => {
                        let user_id = &order.user_id;
                        warn!("🔄️ Order {order_id} is paid, but user {user_id} does not exist. No cart to clear.");
                        false
                    },
                    Err(e) => {
                        let user_id = &order.user_id;
                        error!("🔄️ Order {order_id} is paid, but the cart of user {user_id} was not cleared: {e}");
                        false
                    },
                };
                info!("🔄️ Order {order_id} of {} is paid", order.amount);
                self.producers.publish_order_paid(OrderPaidEvent::new(order.clone())).await;
                Ok(ReconcileOutcome::Paid { order, cart_cleared })
            },
            MarkPaidResult::AlreadyPaid(_) => {
                debug!("🔄️ Order {order_id} was already paid. Nothing to do.");
                Ok(ReconcileOutcome::AlreadyPaid(order_id))
            },
            MarkPaidResult::NotEligible(order) => {
                let payment_type = order.payment_type;
                warn!("🔄️ Payment succeeded for {payment_type} order {order_id}, which is not paid online. Ignoring.");
                let reason = format!("{payment_type} orders are not paid online");
                Ok(ReconcileOutcome::Ignored { order_id, reason })
            },
            MarkPaidResult::NotFound => {
                warn!("🔄️ Payment succeeded for order {order_id}, but the order does not exist");
                Ok(ReconcileOutcome::OrderMissing(order_id))
            },
        }
    }

    async fn annul(&self, session: SessionRef) -> Result<ReconcileOutcome, ReconciliationError> {
        let order_id = session.order_id;
        match self.db.discard_unpaid_order(&order_id).await? {
            DiscardResult::Deleted(order) => {
                info!("🔄️ Payment for order {order_id} failed. The order has been deleted.");
                let event = OrderAnnulledEvent::new(order.clone(), "Payment failed");
                self.producers.publish_order_annulled(event).await;
                Ok(ReconcileOutcome::Deleted(order))
            },
            DiscardResult::RetainedPaid(_) => {
                warn!("🔄️ Received a payment failure for order {order_id}, which is already paid. Keeping it.");
                Ok(ReconcileOutcome::Ignored { order_id, reason: "The order has already been paid".to_string() })
            },
            DiscardResult::NotFound => {
                debug!("🔄️ Order {order_id} was already deleted. Nothing to do.");
                Ok(ReconcileOutcome::AlreadyDeleted(order_id))
            },
        }
    }
}
