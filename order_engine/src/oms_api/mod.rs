//! # Order engine public API
//!
//! The API is split by concern, so that callers can pick the pieces they need:
//!
//! * [`order_flow_api`] prices and places COD and online orders.
//! * [`reconciler`] applies payment events from the checkout provider to stored orders.
//! * [`order_query_api`] lists orders for customers and sellers.
//!
//! Every API is created by handing it a backend that implements the relevant traits from [`crate::traits`]:
//!
//! ```rust,ignore
//! use order_engine::{OrderQueryApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/storefront.db", 5).await?;
//! let api = OrderQueryApi::new(db);
//! let orders = api.list_for_user(&user_id).await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_query_api;
pub mod reconciler;
