//! Order Engine
//!
//! The order engine holds the core logic of the storefront order service. It is independent of the web layer and of
//! any particular payment provider.
//!
//! The library is divided into these main sections:
//! 1. Storage ([`SqliteDatabase`]). SQLite is the supported backend. You should not need to touch the database
//!    directly; use the public APIs instead. The data types that are stored are public and live in [`mod@db_types`].
//! 2. Pricing ([`mod@pricing`]). Turns a basket into a subtotal, tax and total in integer currency subunits.
//! 3. The public API ([`mod@oms_api`]): placing orders, reconciling payment events and listing orders. Backends and
//!    payment providers plug in through the traits in [`mod@traits`].
//!
//! The engine also emits events when orders are placed, paid or annulled. Hook into them with
//! [`events::EventHooks`].
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod oms_api;
pub mod pricing;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use oms_api::{
    errors::{OrderFlowError, PricingError, ReconciliationError, ValidationError},
    order_flow_api::OrderFlowApi,
    order_objects,
    order_query_api::OrderQueryApi,
    reconciler::{PaymentEvent, PaymentEventKind, PaymentReconciler, ReconcileOutcome},
};
pub use pricing::{PriceBreakdown, PricingPolicy};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{CheckoutGateway, OrderManagement, PaymentGatewayDatabase};
