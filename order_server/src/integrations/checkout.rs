//! Glue between the order engine and the hosted checkout gateway client.
use checkout_tools::{
    CheckoutApi,
    CheckoutApiError,
    CheckoutLineItem,
    CheckoutSession,
    NewCheckoutSession,
    WebhookError,
    WebhookEvent,
};
use log::*;
use order_engine::{
    traits::{CheckoutGateway, CheckoutGatewayError, CheckoutRequest, HostedSession},
    PaymentEvent,
    PaymentEventKind,
};

/// Implements the engine's [`CheckoutGateway`] on top of [`CheckoutApi`].
#[derive(Clone)]
pub struct CheckoutAdapter {
    api: CheckoutApi,
}

impl CheckoutAdapter {
    pub fn new(api: CheckoutApi) -> Self {
        Self { api }
    }
}

impl CheckoutGateway for CheckoutAdapter {
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<HostedSession, CheckoutGatewayError> {
        let session = new_session_from_request(request);
        let result = self.api.create_checkout_session(&session).await.map_err(gateway_error)?;
        Ok(hosted_session(result))
    }

    async fn list_sessions_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Vec<HostedSession>, CheckoutGatewayError> {
        let sessions = self.api.list_sessions_by_payment_intent(payment_intent).await.map_err(gateway_error)?;
        Ok(sessions.into_iter().map(hosted_session).collect())
    }
}

pub fn new_session_from_request(request: CheckoutRequest) -> NewCheckoutSession {
    let CheckoutRequest { line_items, currency, success_url, cancel_url, metadata } = request;
    let session = line_items
        .into_iter()
        .map(|l| CheckoutLineItem::new(l.name, l.unit_amount, l.quantity))
        .fold(NewCheckoutSession::new(currency), |s, item| s.with_line_item(item))
        .with_urls(success_url, cancel_url);
    metadata.into_iter().fold(session, |s, (k, v)| s.with_metadata(k, v))
}

fn hosted_session(session: CheckoutSession) -> HostedSession {
    HostedSession { id: session.id, url: session.url, metadata: session.metadata }
}

fn gateway_error(e: CheckoutApiError) -> CheckoutGatewayError {
    warn!("💳️ Checkout gateway call failed. {e}");
    match e {
        CheckoutApiError::Initialization(s) | CheckoutApiError::RestRequestError(s) => {
            CheckoutGatewayError::Unavailable(s)
        },
        CheckoutApiError::QueryError { status, message } => {
            CheckoutGatewayError::Rejected(format!("Error {status}. {message}"))
        },
        CheckoutApiError::RestResponseError(s) | CheckoutApiError::JsonError(s) => {
            CheckoutGatewayError::InvalidResponse(s)
        },
        CheckoutApiError::MissingRedirectUrl(id) => {
            CheckoutGatewayError::InvalidResponse(format!("Session {id} has no redirect URL"))
        },
    }
}

/// Maps a verified webhook delivery onto the engine's payment event. A payment event that doesn't name its payment
/// intent is treated as a malformed payload.
pub fn payment_event_from_webhook(event: WebhookEvent) -> Result<PaymentEvent, WebhookError> {
    let kind = PaymentEventKind::classify(&event.event_type, event.object_id()).ok_or_else(|| {
        WebhookError::InvalidPayload(format!("{} event {} has no payment intent id", event.event_type, event.id))
    })?;
    Ok(PaymentEvent::new(event.id, kind))
}
