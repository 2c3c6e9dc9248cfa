use thiserror::Error;

use crate::{
    db_types::{Order, OrderId},
    oms_api::order_objects::OrderQueryFilter,
    traits::OrderDetails,
};

#[derive(Debug, Clone, Error)]
pub enum OrderQueryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderQueryError {
    fn from(e: sqlx::Error) -> Self {
        OrderQueryError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the read-only queries over orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches a single order, with its line items. Returns `None` if there is no order with that id.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError>;

    /// Fetches every order matching the filter, newest first.
    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError>;

    /// Like [`Self::fetch_orders`], but with each line's product and the shipping address resolved.
    async fn fetch_order_details(&self, query: OrderQueryFilter) -> Result<Vec<OrderDetails>, OrderQueryError>;
}
