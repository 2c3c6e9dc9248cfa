//! Tools for talking to a Stripe-compatible hosted checkout gateway.
//!
//! * [`CheckoutApi`] creates hosted checkout sessions and looks them up by payment intent.
//! * [`WebhookVerifier`] authenticates incoming webhook deliveries and parses them into [`WebhookEvent`]s.
mod api;
mod config;
mod data_objects;
mod error;
mod helpers;
mod webhook;

pub use api::CheckoutApi;
pub use config::CheckoutConfig;
pub use data_objects::{
    CheckoutLineItem,
    CheckoutSession,
    NewCheckoutSession,
    SessionList,
    WebhookEvent,
    WebhookEventData,
};
pub use error::{CheckoutApiError, WebhookError};
pub use webhook::{WebhookVerifier, DEFAULT_TOLERANCE_SECS, SIGNATURE_HEADER};
