//! An in-memory checkout provider.
//!
//! Sessions created through [`FakeCheckoutGateway`] are recorded. Tests then "pay" for a session with
//! [`FakeCheckoutGateway::attach_payment_intent`], which makes the session discoverable by payment intent just as the
//! real provider does after a customer completes the hosted page.
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex},
};

use crate::{
    db_types::OrderId,
    oms_api::order_objects::ORDER_ID_METADATA_KEY,
    traits::{CheckoutGateway, CheckoutGatewayError, CheckoutRequest, HostedSession},
};

#[derive(Default)]
struct GatewayState {
    requests: Vec<CheckoutRequest>,
    sessions: Vec<HostedSession>,
    by_payment_intent: HashMap<String, Vec<HostedSession>>,
    fail_creation: bool,
    fail_lookups: bool,
}

#[derive(Clone, Default)]
pub struct FakeCheckoutGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl Debug for FakeCheckoutGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FakeCheckoutGateway")
    }
}

impl FakeCheckoutGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every checkout request received so far, oldest first.
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.state.lock().expect("Gateway lock poisoned").requests.clone()
    }

    pub fn sessions(&self) -> Vec<HostedSession> {
        self.state.lock().expect("Gateway lock poisoned").sessions.clone()
    }

    pub fn fail_creation(&self, fail: bool) {
        self.state.lock().expect("Gateway lock poisoned").fail_creation = fail;
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.state.lock().expect("Gateway lock poisoned").fail_lookups = fail;
    }

    /// Links the session created for `order_id` to a new payment intent and returns the payment intent id.
    pub fn attach_payment_intent(&self, order_id: &OrderId) -> Option<String> {
        let mut state = self.state.lock().expect("Gateway lock poisoned");
        let session = state
            .sessions
            .iter()
            .find(|s| s.metadata.get(ORDER_ID_METADATA_KEY).map(String::as_str) == Some(order_id.as_str()))
            .cloned()?;
        let payment_intent = format!("pi_{}", session.id.trim_start_matches("cs_"));
        state.by_payment_intent.entry(payment_intent.clone()).or_default().push(session);
        Some(payment_intent)
    }

    /// Registers an arbitrary session for a payment intent, e.g. one with broken metadata.
    pub fn register_session(&self, payment_intent: &str, session: HostedSession) {
        let mut state = self.state.lock().expect("Gateway lock poisoned");
        state.by_payment_intent.entry(payment_intent.to_string()).or_default().push(session);
    }
}

impl CheckoutGateway for FakeCheckoutGateway {
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<HostedSession, CheckoutGatewayError> {
        let mut state = self.state.lock().expect("Gateway lock poisoned");
        if state.fail_creation {
            return Err(CheckoutGatewayError::Unavailable("fake gateway is offline".into()));
        }
        let id = format!("cs_test_{}", state.sessions.len() + 1);
        let session = HostedSession {
            url: Some(format!("https://checkout.test/pay/{id}")),
            id,
            metadata: request.metadata.clone(),
        };
        state.requests.push(request);
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn list_sessions_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Vec<HostedSession>, CheckoutGatewayError> {
        let state = self.state.lock().expect("Gateway lock poisoned");
        if state.fail_lookups {
            return Err(CheckoutGatewayError::Unavailable("fake gateway is offline".into()));
        }
        Ok(state.by_payment_intent.get(payment_intent).cloned().unwrap_or_default())
    }
}
