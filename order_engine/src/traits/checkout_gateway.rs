use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::Money;

/// A line on the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub name: String,
    pub unit_amount: Money,
    pub quantity: i64,
}

impl CheckoutLine {
    pub fn new<S: Into<String>>(name: S, unit_amount: Money, quantity: i64) -> Self {
        Self { name: name.into(), unit_amount, quantity }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub line_items: Vec<CheckoutLine>,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

/// A checkout session as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedSession {
    pub id: String,
    pub url: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutGatewayError {
    #[error("The checkout provider could not be reached: {0}")]
    Unavailable(String),
    #[error("The checkout provider rejected the request: {0}")]
    Rejected(String),
    #[error("The checkout provider returned an unexpected response: {0}")]
    InvalidResponse(String),
}

#[allow(async_fn_in_trait)]
pub trait CheckoutGateway {
    /// Creates a hosted payment page for the given lines. The returned session carries the redirect URL.
    async fn create_checkout_session(&self, request: CheckoutRequest) -> Result<HostedSession, CheckoutGatewayError>;

    /// Fetches the checkout sessions that produced the given payment intent. Usually there is exactly one.
    async fn list_sessions_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Vec<HostedSession>, CheckoutGatewayError>;
}
