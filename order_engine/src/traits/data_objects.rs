use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Address, AddressId, Money, Order, OrderId, PaymentType, Product, ProductId, UserId};

/// Result of the unpaid-to-paid transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkPaidResult {
    /// The order was unpaid and has now been marked as paid.
    Updated(Order),
    /// The order had already been marked as paid. Nothing changed.
    AlreadyPaid(Order),
    /// The order is not an online order, so it cannot be settled by the payment provider. Nothing changed.
    NotEligible(Order),
    NotFound,
}

/// Result of discarding an order whose payment failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardResult {
    Deleted(Order),
    /// The order has been paid, so it was kept.
    RetainedPaid(Order),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineDetails {
    pub product_id: ProductId,
    /// `None` if the product has since been removed from the catalog
    pub product: Option<Product>,
    pub quantity: i64,
}

/// An order with its products and address resolved, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderLineDetails>,
    pub address_id: AddressId,
    pub address: Option<Address>,
    pub amount: Money,
    pub payment_type: PaymentType,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDetails {
    pub fn from_order(order: Order, items: Vec<OrderLineDetails>, address: Option<Address>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            items,
            address_id: order.address_id,
            address,
            amount: order.amount,
            payment_type: order.payment_type,
            is_paid: order.is_paid,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
