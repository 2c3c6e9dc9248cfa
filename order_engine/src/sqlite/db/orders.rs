use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderRecord, OrderUpdate, PaymentType},
    oms_api::order_objects::OrderQueryFilter,
    traits::PaymentGatewayError,
};

/// Inserts the order and its line items. This is not atomic on its own; run it inside a transaction and pass
/// `&mut *tx` as the connection.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    if fetch_order_record(&order.id, conn).await?.is_some() {
        return Err(PaymentGatewayError::OrderAlreadyExists(order.id));
    }
    let record: OrderRecord = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                user_id,
                address_id,
                amount,
                payment_type,
                is_paid,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, 0, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(order.id.as_str())
    .bind(order.user_id.as_str())
    .bind(order.address_id.as_str())
    .bind(order.amount.value())
    .bind(order.payment_type.to_string())
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await?;
    for (position, item) in order.items.iter().enumerate() {
        sqlx::query("INSERT INTO order_items (order_id, position, product_id, quantity) VALUES ($1, $2, $3, $4)")
            .bind(order.id.as_str())
            .bind(position as i64)
            .bind(item.product_id.as_str())
            .bind(item.quantity)
            .execute(&mut *conn)
            .await?;
    }
    debug!("🗃️ Order {} inserted with {} line items", record.id, order.items.len());
    Ok(record.with_items(order.items))
}

pub async fn fetch_order_record(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRecord>, sqlx::Error> {
    let record =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(record)
}

/// The line items of the order, in the order they were submitted.
pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT product_id, quantity FROM order_items WHERE order_id = $1 ORDER BY position ASC")
            .bind(order_id.as_str())
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().map(|(product_id, quantity)| OrderItem::new(product_id, quantity)).collect())
}

pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    match fetch_order_record(order_id, conn).await? {
        Some(record) => {
            let items = fetch_order_items(order_id, conn).await?;
            Ok(Some(record.with_items(items)))
        },
        None => Ok(None),
    }
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are sorted newest first. Orders created in the same instant are sorted by insertion order, newest
/// first.
pub async fn fetch_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("id = ");
        where_clause.push_bind_unseparated(order_id.0);
    }
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id.0);
    }
    if let Some(payment_type) = query.payment_type {
        where_clause.push("payment_type = ");
        where_clause.push_bind_unseparated(payment_type.to_string());
    }
    if let Some(is_paid) = query.is_paid {
        where_clause.push("is_paid = ");
        where_clause.push_bind_unseparated(is_paid);
    }
    if query.visible_only {
        where_clause.push("(payment_type = ");
        where_clause.push_bind_unseparated(PaymentType::Cod.to_string());
        where_clause.push_unseparated(" OR is_paid = 1)");
    }
    builder.push(" ORDER BY created_at DESC, rowid DESC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let records = builder.build_query_as::<OrderRecord>().fetch_all(&mut *conn).await?;
    trace!("🗃️ Result of fetch_orders: {}", records.len());
    let mut orders = Vec::with_capacity(records.len());
    for record in records {
        let items = fetch_order_items(&record.id, conn).await?;
        orders.push(record.with_items(items));
    }
    Ok(orders)
}

/// Applies the update and returns the updated record, or `None` if the order does not exist.
pub async fn update_order(
    order_id: &OrderId,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRecord>, sqlx::Error> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for order {order_id}. Update request skipped.");
        return fetch_order_record(order_id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET ");
    let mut set_clause = builder.separated(", ");
    set_clause.push("updated_at = ");
    set_clause.push_bind_unseparated(Utc::now());
    if let Some(is_paid) = update.is_paid {
        set_clause.push("is_paid = ");
        set_clause.push_bind_unseparated(is_paid);
    }
    if let Some(address_id) = update.address_id {
        set_clause.push("address_id = ");
        set_clause.push_bind_unseparated(address_id.0);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(order_id.as_str());
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let record = builder.build_query_as::<OrderRecord>().fetch_optional(conn).await?;
    Ok(record)
}

/// Flips `is_paid` on an unpaid online order. Returns `None` if no row satisfied all three conditions.
pub async fn mark_online_order_paid(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRecord>, sqlx::Error> {
    let record = sqlx::query_as(
        r#"
            UPDATE orders SET is_paid = 1, updated_at = $1
            WHERE id = $2 AND payment_type = $3 AND is_paid = 0
            RETURNING *;
        "#,
    )
    .bind(Utc::now())
    .bind(order_id.as_str())
    .bind(PaymentType::Online.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

/// Deletes the order row. If `only_unpaid` is set, a paid order is left alone and `None` is returned.
///
/// Line items are removed along with the order.
pub async fn delete_order(
    order_id: &OrderId,
    only_unpaid: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRecord>, sqlx::Error> {
    let sql = if only_unpaid {
        "DELETE FROM orders WHERE id = $1 AND is_paid = 0 RETURNING *"
    } else {
        "DELETE FROM orders WHERE id = $1 RETURNING *"
    };
    let record: Option<OrderRecord> = sqlx::query_as(sql).bind(order_id.as_str()).fetch_optional(&mut *conn).await?;
    if record.is_some() {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id.as_str()).execute(conn).await?;
        trace!("🗃️ Order {order_id} and its line items have been deleted");
    }
    Ok(record)
}
