use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderUpdate, Product, ProductId, UserId},
    traits::{DiscardResult, MarkPaidResult, OrderQueryError},
};

/// This trait defines the write side of the storage backend.
///
/// This behaviour includes:
/// * Looking up catalog prices so that orders can be priced
/// * Persisting new orders together with their line items
/// * The order state transitions that payment events drive
/// * Clearing a customer's cart once their order is paid
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches a product from the catalog. Returns `None` if the product does not exist.
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, PaymentGatewayError>;

    /// Stores the order and its line items in a single atomic transaction.
    ///
    /// Returns the stored order. If an order with the same id already exists, nothing is written and
    /// [`PaymentGatewayError::OrderAlreadyExists`] is returned.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    /// Applies the update to the order and returns the new record.
    ///
    /// Fails with [`PaymentGatewayError::OrderNotFound`] if the order does not exist.
    async fn update_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<Order, PaymentGatewayError>;

    /// Unconditionally deletes the order and its line items, returning the deleted order.
    ///
    /// Fails with [`PaymentGatewayError::OrderNotFound`] if the order does not exist.
    async fn delete_order(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError>;

    /// Marks an unpaid online order as paid.
    ///
    /// The check and the update happen in a single statement, so concurrent calls for the same order cannot both
    /// observe it as unpaid.
    async fn mark_order_paid(&self, order_id: &OrderId) -> Result<MarkPaidResult, PaymentGatewayError>;

    /// Deletes the order, but only while it is still unpaid. A paid order is never removed by this call.
    async fn discard_unpaid_order(&self, order_id: &OrderId) -> Result<DiscardResult, PaymentGatewayError>;

    /// Empties the user's cart. Returns `false` if there is no such user.
    async fn clear_cart(&self, user_id: &UserId) -> Result<bool, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("{0}")]
    QueryError(#[from] OrderQueryError),
    #[error("Corrupt data in the store: {0}")]
    DataIntegrityError(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
