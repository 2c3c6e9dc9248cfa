use log::*;
use shop_common::Secret;

use crate::webhook::DEFAULT_TOLERANCE_SECS;

pub const DEFAULT_API_URL: &str = "https://api.stripe.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default)]
pub struct CheckoutConfig {
    /// Base URL of the gateway REST API, without a trailing slash.
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub webhook_tolerance_secs: u64,
    pub timeout_secs: u64,
}

impl CheckoutConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("OMS_CHECKOUT_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("🪛️ OMS_CHECKOUT_API_URL not set, using {DEFAULT_API_URL}");
                DEFAULT_API_URL.to_string()
            });
        let secret_key = Secret::new(std::env::var("OMS_CHECKOUT_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ OMS_CHECKOUT_SECRET_KEY not set, using (probably useless) default");
            "sk_test_0000000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("OMS_CHECKOUT_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!(
                "🪛️ OMS_CHECKOUT_WEBHOOK_SECRET not set. Every webhook delivery will fail signature verification \
                 until it is configured."
            );
            String::default()
        }));
        let webhook_tolerance_secs = parse_secs("OMS_CHECKOUT_WEBHOOK_TOLERANCE_SECS", DEFAULT_TOLERANCE_SECS);
        let timeout_secs = parse_secs("OMS_CHECKOUT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self { api_url, secret_key, webhook_secret, webhook_tolerance_secs, timeout_secs }
    }
}

fn parse_secs(var: &str, default: u64) -> u64 {
    match std::env::var(var) {
        Ok(s) => s.parse::<u64>().unwrap_or_else(|e| {
            warn!("🪛️ {var} is not a valid number of seconds ({e}). Using {default}s instead.");
            default
        }),
        Err(_) => default,
    }
}
