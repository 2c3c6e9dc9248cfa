use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderId, UserId},
    oms_api::order_objects::OrderQueryFilter,
    traits::{OrderDetails, OrderManagement, OrderQueryError},
};

/// Read-only order listings. Only orders that are COD, or that have been paid, are ever listed.
#[derive(Clone)]
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi")
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// The customer's listed orders, newest first.
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<OrderDetails>, OrderQueryError> {
        let filter = OrderQueryFilter::visible().with_user_id(user_id.clone());
        let orders = self.db.fetch_order_details(filter).await?;
        debug!("💻️ {} orders listed for user {user_id}", orders.len());
        Ok(orders)
    }

    /// Every listed order in the store, newest first.
    pub async fn list_all(&self) -> Result<Vec<OrderDetails>, OrderQueryError> {
        let orders = self.db.fetch_order_details(OrderQueryFilter::visible()).await?;
        debug!("💻️ {} orders listed for all users", orders.len());
        Ok(orders)
    }

    /// Looks up a single order, whatever its visibility.
    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn search(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError> {
        trace!("💻️ Searching orders. {query}");
        self.db.fetch_orders(query).await
    }
}
