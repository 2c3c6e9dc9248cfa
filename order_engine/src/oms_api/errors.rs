use std::fmt::Display;

use thiserror::Error;

use crate::{
    db_types::{Money, ProductId},
    traits::{CheckoutGatewayError, PaymentGatewayError},
};

/// A required field that was absent from an order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Address,
    Items,
}

impl Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingField::Address => write!(f, "address"),
            MissingField::Items => write!(f, "items"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}", missing_field_message(.0))]
    Missing(MissingField),
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },
}

fn missing_field_message(field: &MissingField) -> &'static str {
    match field {
        MissingField::Address => "Please select address!",
        MissingField::Items => "Please select at least 1 item!",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("The order total is too large to represent")]
    Overflow,
    #[error("Checkout lines add up to {actual}, but the order total is {expected}")]
    CheckoutTotalMismatch { expected: Money, actual: Money },
    #[error("Tax rate of {0} basis points is out of range")]
    InvalidTaxRate(i64),
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("{0}")]
    Pricing(#[from] PricingError),
    #[error("{0}")]
    Database(#[from] PaymentGatewayError),
    #[error("{0}")]
    Checkout(#[from] CheckoutGatewayError),
}

/// A payment event could not be tied back to an order. No state was changed.
#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Could not look up the checkout session for payment intent {payment_intent}: {source}")]
    SessionLookup { payment_intent: String, source: CheckoutGatewayError },
    #[error("No checkout session exists for payment intent {0}")]
    NoSessionForPaymentIntent(String),
    #[error("The checkout session for payment intent {payment_intent} has no '{key}' metadata")]
    MissingMetadata { payment_intent: String, key: &'static str },
    #[error("{0}")]
    Database(#[from] PaymentGatewayError),
}
