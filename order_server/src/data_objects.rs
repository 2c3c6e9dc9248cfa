use std::fmt::Display;

use order_engine::traits::OrderDetails;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The result of placing an online order. `url` is the hosted checkout page the customer must be sent to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub url: String,
    pub message: String,
}

impl CheckoutResponse {
    pub fn new<S: Display>(url: String, message: S) -> Self {
        Self { success: true, url, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub success: bool,
    pub orders: Vec<OrderDetails>,
}

impl OrdersResponse {
    pub fn new(orders: Vec<OrderDetails>) -> Self {
        Self { success: true, orders }
    }
}

/// Acknowledges a webhook delivery, so that the gateway stops retrying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}
