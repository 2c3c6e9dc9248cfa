//! # Backend and collaborator contracts
//!
//! The engine never talks to a database or a payment provider directly. It goes through these traits instead:
//!
//! * [`PaymentGatewayDatabase`] is the write side of the store: catalog lookups for pricing, order persistence, and
//!   the atomic state transitions that payment events drive.
//! * [`OrderManagement`] is the read side, used for listings and lookups.
//! * [`CheckoutGateway`] is the hosted checkout provider. It creates payment pages and resolves payment intents back to
//!   the session (and hence the order) that produced them.
mod checkout_gateway;
mod data_objects;
mod order_management;
mod payment_gateway_database;

pub use checkout_gateway::{CheckoutGateway, CheckoutGatewayError, CheckoutLine, CheckoutRequest, HostedSession};
pub use data_objects::{DiscardResult, MarkPaidResult, OrderDetails, OrderLineDetails};
pub use order_management::{OrderManagement, OrderQueryError};
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
