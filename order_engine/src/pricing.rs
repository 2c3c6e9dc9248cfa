//! # Pricing
//!
//! Orders are priced in two passes:
//! 1. [`resolve_lines`] looks every item up in the catalog, in order, and captures a [`PricedLine`] snapshot of the
//!    name and unit price.
//! 2. [`PricingPolicy::price`] folds the snapshot into a [`PriceBreakdown`] holding the subtotal, tax and total.
//!
//! Both the persisted order amount and the hosted checkout lines are derived from the same breakdown, so they cannot
//! disagree even if the catalog changes in between.
//!
//! Catalog prices are whole currency units. The subtotal and tax are worked out in those units, with tax being
//! `subtotal * tax_rate_bps / 10_000` rounded down. Only then is every amount converted to subunits with
//! [`Money::from_major`], once, for both the stored total and the checkout lines.
use log::*;
use serde::{Deserialize, Serialize};
use shop_common::DEFAULT_CURRENCY;

use crate::{
    db_types::{AddressId, Money, OrderItem, ProductId},
    oms_api::errors::{MissingField, OrderFlowError, PricingError, ValidationError},
    traits::{CheckoutLine, PaymentGatewayDatabase},
};

pub const DEFAULT_TAX_RATE_BPS: i64 = 200;
pub const BPS_PER_UNIT: i64 = 10_000;
pub const TAX_LINE_NAME: &str = "Tax";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Tax rate in basis points (1/100th of a percent)
    pub tax_rate_bps: i64,
    pub currency: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { tax_rate_bps: DEFAULT_TAX_RATE_BPS, currency: DEFAULT_CURRENCY.to_string() }
    }
}

/// A catalog item captured at the moment the order was priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub name: String,
    /// Catalog price per unit, in whole currency units
    pub unit_price: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub lines: Vec<PricedLine>,
    /// Sum of the lines, converted to subunits
    pub subtotal: Money,
    /// Tax due, rounded down in whole units and converted to subunits
    pub tax: Money,
    /// `subtotal + tax`. This is the amount stored on the order.
    pub total: Money,
}

impl PricingPolicy {
    pub fn new<S: Into<String>>(tax_rate_bps: i64, currency: S) -> Result<Self, PricingError> {
        if !(0..=BPS_PER_UNIT).contains(&tax_rate_bps) {
            return Err(PricingError::InvalidTaxRate(tax_rate_bps));
        }
        Ok(Self { tax_rate_bps, currency: currency.into() })
    }

    /// Tax on a subtotal of whole currency units, rounded down to a whole unit.
    pub fn tax_for(&self, subtotal: i64) -> Result<i64, PricingError> {
        let tax = i128::from(subtotal) * i128::from(self.tax_rate_bps) / i128::from(BPS_PER_UNIT);
        i64::try_from(tax).map_err(|_| PricingError::Overflow)
    }

    pub fn price(&self, lines: Vec<PricedLine>) -> Result<PriceBreakdown, PricingError> {
        let subtotal = lines.iter().try_fold(0i64, |acc, line| {
            line.unit_price.checked_mul(line.quantity).and_then(|t| acc.checked_add(t)).ok_or(PricingError::Overflow)
        })?;
        let tax = self.tax_for(subtotal)?;
        let total = subtotal.checked_add(tax).ok_or(PricingError::Overflow)?;
        let subtotal = to_subunits(subtotal)?;
        let tax = to_subunits(tax)?;
        let total = to_subunits(total)?;
        trace!("🧮️ Priced {} lines. Subtotal {subtotal}, tax {tax}, total {total}", lines.len());
        Ok(PriceBreakdown { lines, subtotal, tax, total })
    }
}

impl PriceBreakdown {
    /// The hosted checkout lines for this breakdown, in subunits: one per product, plus a tax line if any tax is due.
    pub fn checkout_lines(&self) -> Result<Vec<CheckoutLine>, PricingError> {
        let mut lines = self
            .lines
            .iter()
            .map(|l| to_subunits(l.unit_price).map(|amount| CheckoutLine::new(&l.name, amount, l.quantity)))
            .collect::<Result<Vec<_>, _>>()?;
        if !self.tax.is_zero() {
            lines.push(CheckoutLine::new(TAX_LINE_NAME, self.tax, 1));
        }
        Ok(lines)
    }

    /// Checks that the checkout lines add up to exactly the stored total.
    pub fn verify_checkout_total(&self, lines: &[CheckoutLine]) -> Result<(), PricingError> {
        let charged = lines.iter().try_fold(Money::default(), |acc, l| {
            l.unit_amount.checked_mul(l.quantity).and_then(|t| acc.checked_add(t)).ok_or(PricingError::Overflow)
        })?;
        if charged == self.total {
            Ok(())
        } else {
            error!("🧮️ Checkout lines add up to {charged}, but the order total is {}", self.total);
            Err(PricingError::CheckoutTotalMismatch { expected: self.total, actual: charged })
        }
    }
}

fn to_subunits(units: i64) -> Result<Money, PricingError> {
    Money::from_major(units).ok_or(PricingError::Overflow)
}

/// Checks the request shape before anything is looked up. The address is checked first, then the items.
/// Returns the shipping address on success.
pub fn validate_request(address: Option<&AddressId>, items: &[OrderItem]) -> Result<AddressId, ValidationError> {
    let address = match address {
        Some(a) if !a.as_str().trim().is_empty() => a.clone(),
        _ => return Err(ValidationError::Missing(MissingField::Address)),
    };
    if items.is_empty() {
        return Err(ValidationError::Missing(MissingField::Items));
    }
    if let Some(item) = items.iter().find(|i| i.quantity <= 0) {
        return Err(ValidationError::InvalidQuantity { product_id: item.product_id.clone(), quantity: item.quantity });
    }
    Ok(address)
}

/// First pricing pass. Every product must exist, or the whole operation fails.
pub async fn resolve_lines<B: PaymentGatewayDatabase>(
    db: &B,
    items: &[OrderItem],
) -> Result<Vec<PricedLine>, OrderFlowError> {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let product = db
            .fetch_product(&item.product_id)
            .await?
            .ok_or_else(|| OrderFlowError::ProductNotFound(item.product_id.clone()))?;
        lines.push(PricedLine {
            product_id: product.id,
            name: product.name,
            unit_price: product.offer_price,
            quantity: item.quantity,
        });
    }
    Ok(lines)
}
