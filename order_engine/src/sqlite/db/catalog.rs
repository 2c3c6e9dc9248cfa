use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Address, AddressId, Product, ProductId};

pub async fn fetch_product(id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(product)
}

/// Inserts or replaces a product in the local catalog mirror.
pub async fn upsert_product(product: &Product, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO products (id, name, description, category, price, offer_price, in_stock, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                category = excluded.category,
                price = excluded.price,
                offer_price = excluded.offer_price,
                in_stock = excluded.in_stock
        "#,
    )
    .bind(product.id.as_str())
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.offer_price)
    .bind(product.in_stock)
    .bind(product.created_at)
    .execute(conn)
    .await?;
    trace!("🗃️ Product {} ({}) stored at {}", product.id, product.name, product.offer_price);
    Ok(())
}

pub async fn fetch_address(id: &AddressId, conn: &mut SqliteConnection) -> Result<Option<Address>, sqlx::Error> {
    let address =
        sqlx::query_as("SELECT * FROM addresses WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(address)
}

pub async fn upsert_address(address: &Address, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT OR REPLACE INTO addresses
                (id, user_id, first_name, last_name, email, street, city, state, zipcode, country, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(address.id.as_str())
    .bind(address.user_id.as_str())
    .bind(&address.first_name)
    .bind(&address.last_name)
    .bind(&address.email)
    .bind(&address.street)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.zipcode)
    .bind(&address.country)
    .bind(&address.phone)
    .execute(conn)
    .await?;
    trace!("🗃️ Address {} stored for user {}", address.id, address.user_id);
    Ok(())
}
