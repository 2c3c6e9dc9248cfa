use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use shop_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Opaque order identifier, assigned when the order is created.
    OrderId
);
string_id!(ProductId);
string_id!(UserId);
string_id!(AddressId);

impl OrderId {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

//--------------------------------------     PaymentType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    /// Cash on delivery. Visible in listings from the moment it is placed.
    #[serde(rename = "COD")]
    Cod,
    /// Paid through the hosted checkout. Only visible once the payment has been confirmed.
    Online,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentType::Cod => write!(f, "COD"),
            PaymentType::Online => write!(f, "Online"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid payment type: {0}")]
pub struct ConversionError(String);

impl FromStr for PaymentType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(Self::Cod),
            "Online" => Ok(Self::Online),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for PaymentType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment type: {value}. But this conversion cannot fail. Defaulting to Online");
            PaymentType::Online
        })
    }
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub quantity: i64,
}

impl OrderItem {
    pub fn new<P: Into<ProductId>>(product_id: P, quantity: i64) -> Self {
        Self { product_id: product_id.into(), quantity }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub address_id: AddressId,
    pub amount: Money,
    pub payment_type: PaymentType,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether the order may appear in a listing: COD orders always do, online orders only once they are paid.
    pub fn is_visible(&self) -> bool {
        self.payment_type == PaymentType::Cod || self.is_paid
    }
}

/// The `orders` row without its line items.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub address_id: AddressId,
    pub amount: Money,
    #[sqlx(try_from = "String")]
    pub payment_type: PaymentType,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn with_items(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            items,
            address_id: self.address_id,
            amount: self.amount,
            payment_type: self.payment_type,
            is_paid: self.is_paid,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub address_id: AddressId,
    /// The total, including tax, in currency subunits
    pub amount: Money,
    pub payment_type: PaymentType,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(
        user_id: UserId,
        items: Vec<OrderItem>,
        address_id: AddressId,
        amount: Money,
        payment_type: PaymentType,
    ) -> Self {
        Self { id: OrderId::random(), user_id, items, address_id, amount, payment_type, created_at: Utc::now() }
    }

    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = id;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------      OrderUpdate      ---------------------------------------------------------
/// The subset of order fields that may be changed after creation.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub is_paid: Option<bool>,
    pub address_id: Option<AddressId>,
}

impl OrderUpdate {
    pub fn with_paid(mut self, is_paid: bool) -> Self {
        self.is_paid = Some(is_paid);
        self
    }

    pub fn with_address(mut self, address_id: AddressId) -> Self {
        self.address_id = Some(address_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.is_paid.is_none() && self.address_id.is_none()
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: String,
    /// List price, in whole currency units
    pub price: i64,
    /// The price the customer actually pays per unit, in whole currency units
    pub offer_price: i64,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Address        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}
