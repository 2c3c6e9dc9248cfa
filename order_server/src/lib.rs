//! # Order service server
//!
//! The HTTP front end of the storefront order service. It is responsible for:
//! * Accepting COD and online orders from authenticated customers, and handing them to the order engine.
//! * Listing orders for customers, and for sellers.
//! * Receiving payment webhooks from the checkout gateway, verifying their signatures and reconciling the orders they
//!   refer to.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/order/cod`, `/api/order/online`: Place an order. Requires a valid access token.
//! * `/api/order/user`: The caller's orders. Requires a valid access token.
//! * `/api/order/seller`: Every order. Requires an access token with the `seller` role.
//! * `/checkout/webhook`: Payment lifecycle events from the checkout gateway. Authenticated by signature.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
