use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_common::Money;

/// One line on the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLineItem {
    pub name: String,
    /// Price of a single unit, in currency subunits.
    pub unit_amount: Money,
    pub quantity: i64,
}

impl CheckoutLineItem {
    pub fn new<S: Into<String>>(name: S, unit_amount: Money, quantity: i64) -> Self {
        Self { name: name.into(), unit_amount, quantity }
    }
}

/// The parameters for a new hosted checkout session in `payment` mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCheckoutSession {
    pub line_items: Vec<CheckoutLineItem>,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: BTreeMap<String, String>,
}

impl NewCheckoutSession {
    pub fn new<S: Into<String>>(currency: S) -> Self {
        Self { currency: currency.into(), ..Default::default() }
    }

    pub fn with_line_item(mut self, item: CheckoutLineItem) -> Self {
        self.line_items.push(item);
        self
    }

    pub fn with_urls<S1: Into<String>, S2: Into<String>>(mut self, success_url: S1, cancel_url: S2) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionList {
    pub data: Vec<CheckoutSession>,
    #[serde(default)]
    pub has_more: bool,
}

/// A webhook delivery, after its signature has been checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEventData {
    pub object: Value,
}

impl WebhookEvent {
    /// The id of the object the event is about. For `payment_intent.*` events this is the payment intent id.
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(Value::as_str)
    }
}
