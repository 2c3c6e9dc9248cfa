//! `SqliteDatabase` is the concrete storage backend of the order engine.
//!
//! It implements both [`PaymentGatewayDatabase`] and [`OrderManagement`] on top of a single connection pool.
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
};

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{catalog, db_url, new_pool, orders, users};
use crate::{
    db_types::{Address, NewOrder, Order, OrderId, OrderUpdate, Product, ProductId, UserId},
    oms_api::order_objects::OrderQueryFilter,
    traits::{
        DiscardResult,
        MarkPaidResult,
        OrderDetails,
        OrderLineDetails,
        OrderManagement,
        OrderQueryError,
        PaymentGatewayDatabase,
        PaymentGatewayError,
    },
};

const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let product = catalog::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn update_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        trace!("🗃️ Order {order_id} updating with new values: {update:?}");
        let record = orders::update_order(order_id, update, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Order {order_id} has been updated.");
        Ok(record.with_items(items))
    }

    async fn delete_order(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        let record = orders::delete_order(order_id, false, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} has been deleted");
        Ok(record.with_items(items))
    }

    async fn mark_order_paid(&self, order_id: &OrderId) -> Result<MarkPaidResult, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let result = match orders::mark_online_order_paid(order_id, &mut tx).await? {
            Some(record) => {
                let items = orders::fetch_order_items(order_id, &mut tx).await?;
                debug!("🗃️ Order {order_id} is now paid");
                MarkPaidResult::Updated(record.with_items(items))
            },
            None => match orders::fetch_order(order_id, &mut tx).await? {
                Some(order) if order.is_paid => MarkPaidResult::AlreadyPaid(order),
                Some(order) => MarkPaidResult::NotEligible(order),
                None => MarkPaidResult::NotFound,
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn discard_unpaid_order(&self, order_id: &OrderId) -> Result<DiscardResult, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        let result = match orders::delete_order(order_id, true, &mut tx).await? {
            Some(record) => {
                debug!("🗃️ Unpaid order {order_id} has been discarded");
                DiscardResult::Deleted(record.with_items(items))
            },
            None => match orders::fetch_order_record(order_id, &mut tx).await? {
                Some(record) => DiscardResult::RetainedPaid(record.with_items(items)),
                None => DiscardResult::NotFound,
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<bool, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let found = users::clear_cart(user_id, &mut conn).await?;
        Ok(found)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        trace!("🗃️ Fetching orders. {query}");
        let orders = orders::fetch_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order_details(&self, query: OrderQueryFilter) -> Result<Vec<OrderDetails>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders(query, &mut conn).await?;
        let mut products = HashMap::<ProductId, Option<Product>>::new();
        let mut addresses = HashMap::<_, Option<Address>>::new();
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let mut lines = Vec::with_capacity(order.items.len());
            for item in &order.items {
                if !products.contains_key(&item.product_id) {
                    let product = catalog::fetch_product(&item.product_id, &mut conn).await?;
                    products.insert(item.product_id.clone(), product);
                }
                let product = products.get(&item.product_id).cloned().flatten();
                lines.push(OrderLineDetails { product_id: item.product_id.clone(), product, quantity: item.quantity });
            }
            if !addresses.contains_key(&order.address_id) {
                let address = catalog::fetch_address(&order.address_id, &mut conn).await?;
                addresses.insert(order.address_id.clone(), address);
            }
            let address = addresses.get(&order.address_id).cloned().flatten();
            result.push(OrderDetails::from_order(order, lines, address));
        }
        Ok(result)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `OMS_DATABASE_URL`
    pub async fn new() -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts or replaces a product in the local catalog mirror.
    pub async fn upsert_product(&self, product: &Product) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        catalog::upsert_product(product, &mut conn).await?;
        Ok(())
    }

    pub async fn upsert_address(&self, address: &Address) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        catalog::upsert_address(address, &mut conn).await?;
        Ok(())
    }

    pub async fn upsert_user(
        &self,
        user_id: &UserId,
        name: &str,
        email: &str,
        cart: &BTreeMap<String, i64>,
    ) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        users::upsert_user(user_id, name, email, cart, &mut conn).await?;
        Ok(())
    }

    /// The user's cart, or `None` if there is no such user.
    pub async fn fetch_cart(&self, user_id: &UserId) -> Result<Option<BTreeMap<String, i64>>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let cart = users::fetch_cart(user_id, &mut conn).await?;
        cart.map(|c| serde_json::from_str(&c))
            .transpose()
            .map_err(|e| PaymentGatewayError::DataIntegrityError(format!("Cart of user {user_id} is not valid: {e}")))
    }
}
