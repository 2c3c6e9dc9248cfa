use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{AddressId, Order, OrderId, OrderItem, PaymentType, UserId},
    pricing::PriceBreakdown,
    traits::HostedSession,
};

/// Metadata keys attached to every checkout session, used to map payment events back to orders.
pub const ORDER_ID_METADATA_KEY: &str = "order_id";
pub const USER_ID_METADATA_KEY: &str = "user_id";

/// What a customer submits at checkout. The user is never part of the request; it comes from the authenticated
/// session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub address: Option<AddressId>,
}

impl NewOrderRequest {
    pub fn new(items: Vec<OrderItem>, address: Option<AddressId>) -> Self {
        Self { items, address }
    }
}

/// Where the hosted checkout sends the customer afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRedirect {
    /// Builds the standard storefront redirects: the order list on success, and the cart on cancellation.
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self { success_url: format!("{origin}/loader?next=my-orders"), cancel_url: format!("{origin}/cart") }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order: Order,
    pub pricing: PriceBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOnlineOrder {
    pub order: Order,
    pub pricing: PriceBreakdown,
    pub session: HostedSession,
}

impl PlacedOnlineOrder {
    pub fn redirect_url(&self) -> Option<&str> {
        self.session.url.as_deref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub user_id: Option<UserId>,
    pub payment_type: Option<PaymentType>,
    pub is_paid: Option<bool>,
    /// Restrict results to orders that are COD or paid
    #[serde(default)]
    pub visible_only: bool,
}

impl OrderQueryFilter {
    /// A filter matching only orders that may appear in listings.
    pub fn visible() -> Self {
        Self { visible_only: true, ..Default::default() }
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    pub fn with_paid(mut self, is_paid: bool) -> Self {
        self.is_paid = Some(is_paid);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.user_id.is_none() &&
            self.payment_type.is_none() &&
            self.is_paid.is_none() &&
            !self.visible_only
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(user_id) = &self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(payment_type) = &self.payment_type {
            write!(f, "payment_type: {payment_type}. ")?;
        }
        if let Some(is_paid) = &self.is_paid {
            write!(f, "is_paid: {is_paid}. ")?;
        }
        if self.visible_only {
            write!(f, "visible only. ")?;
        }
        Ok(())
    }
}
