//! A small storefront catalog with a couple of customers.
//!
//! | Product | Offer price | Name            |
//! |---------|-------------|-----------------|
//! | P1      | 100         | Apples (1kg)    |
//! | P2      | 250         | Basmati Rice    |
//! | P3      | 4999        | Organic Honey   |
//! | P4      | 49          | Sea Salt        |
use std::collections::BTreeMap;

use chrono::Utc;

use crate::{
    db_types::{Address, AddressId, Product, ProductId, UserId},
    SqliteDatabase,
};

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const ALICE_ADDRESS: &str = "addr-alice";
pub const BOB_ADDRESS: &str = "addr-bob";

pub fn product(id: &str, name: &str, price: i64, offer_price: i64) -> Product {
    Product {
        id: ProductId::from(id),
        name: name.to_string(),
        description: format!("{name}, fresh from the farm"),
        category: "Groceries".to_string(),
        price,
        offer_price,
        in_stock: true,
        created_at: Utc::now(),
    }
}

pub fn catalog() -> Vec<Product> {
    vec![
        product("P1", "Apples (1kg)", 120, 100),
        product("P2", "Basmati Rice", 300, 250),
        product("P3", "Organic Honey", 5499, 4999),
        product("P4", "Sea Salt", 49, 49),
    ]
}

pub fn address(id: &str, user_id: &str) -> Address {
    Address {
        id: AddressId::from(id),
        user_id: UserId::from(user_id),
        first_name: user_id.to_string(),
        last_name: "Tester".to_string(),
        email: format!("{user_id}@example.com"),
        street: "12 Market Road".to_string(),
        city: "Pune".to_string(),
        state: "MH".to_string(),
        zipcode: "411001".to_string(),
        country: "India".to_string(),
        phone: "+91 20 5555 0100".to_string(),
    }
}

/// Seeds the catalog, Alice and Bob (each with a non-empty cart), and an address for each.
pub async fn seed_storefront(db: &SqliteDatabase) {
    for p in catalog() {
        db.upsert_product(&p).await.expect("Error seeding product");
    }
    for (user, addr) in [(ALICE, ALICE_ADDRESS), (BOB, BOB_ADDRESS)] {
        let cart = BTreeMap::from([("P1".to_string(), 2), ("P2".to_string(), 1)]);
        let user_id = UserId::from(user);
        db.upsert_user(&user_id, user, &format!("{user}@example.com"), &cart).await.expect("Error seeding user");
        db.upsert_address(&address(addr, user)).await.expect("Error seeding address");
    }
}
