use std::collections::BTreeMap;

use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::UserId;

pub const EMPTY_CART: &str = "{}";

/// Empties the user's cart. Returns `false` if the user does not exist.
pub async fn clear_cart(user_id: &UserId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET cart_items = $1 WHERE id = $2")
        .bind(EMPTY_CART)
        .bind(user_id.as_str())
        .execute(conn)
        .await?;
    let found = result.rows_affected() > 0;
    trace!("🗃️ Cart clear for user {user_id}: {}", if found { "done" } else { "no such user" });
    Ok(found)
}

/// The raw cart (product id to quantity) of the user, or `None` if the user does not exist.
pub async fn fetch_cart(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let cart: Option<(String,)> = sqlx::query_as("SELECT cart_items FROM users WHERE id = $1")
        .bind(user_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(cart.map(|(c,)| c))
}

pub async fn upsert_user(
    user_id: &UserId,
    name: &str,
    email: &str,
    cart: &BTreeMap<String, i64>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    let cart = serde_json::to_string(cart).map_err(|e| sqlx::Error::Protocol(format!("Cart is not valid JSON: {e}")))?;
    sqlx::query(
        r#"
            INSERT INTO users (id, name, email, cart_items) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                cart_items = excluded.cart_items
        "#,
    )
    .bind(user_id.as_str())
    .bind(name)
    .bind(email)
    .bind(cart)
    .execute(conn)
    .await?;
    debug!("🗃️ User {user_id} stored");
    Ok(())
}
