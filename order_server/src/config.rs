use std::env;

use checkout_tools::CheckoutConfig;
use log::*;
use order_engine::{pricing::DEFAULT_TAX_RATE_BPS, PricingPolicy};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use shop_common::{parse_boolean_flag, Secret, DEFAULT_CURRENCY};

use crate::errors::ServerError;

const DEFAULT_OMS_HOST: &str = "127.0.0.1";
const DEFAULT_OMS_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const RANDOM_SECRET_LENGTH: usize = 48;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, pending database migrations are applied when the server starts.
    pub auto_migrate: bool,
    /// The storefront origin. Checkout redirects use the request's `Origin` header, and fall back to this value.
    pub storefront_url: Option<String>,
    pub pricing: PricingPolicy,
    pub auth: AuthConfig,
    pub checkout: CheckoutConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OMS_HOST.to_string(),
            port: DEFAULT_OMS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auto_migrate: true,
            storefront_url: None,
            pricing: PricingPolicy::default(),
            auth: AuthConfig::default(),
            checkout: CheckoutConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OMS_HOST").ok().unwrap_or_else(|| DEFAULT_OMS_HOST.into());
        let port = env::var("OMS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OMS_PORT. {e} Using the default, {DEFAULT_OMS_PORT}, instead."
                    );
                    DEFAULT_OMS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OMS_PORT);
        let database_url = env::var("OMS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ OMS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auto_migrate = parse_boolean_flag(env::var("OMS_AUTO_MIGRATE").ok(), true);
        let storefront_url = env::var("OMS_STOREFRONT_URL").ok().map(|s| s.trim_end_matches('/').to_string());
        if storefront_url.is_none() {
            warn!(
                "🪛️ OMS_STOREFRONT_URL is not set. Online orders from clients that don't send an Origin header will \
                 be rejected."
            );
        }
        let pricing = configure_pricing();
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the authentication configuration. {e}. Reverting to the default configuration.");
            AuthConfig::default()
        });
        let checkout = CheckoutConfig::new_from_env_or_default();
        Self { host, port, database_url, auto_migrate, storefront_url, pricing, auth, checkout }
    }

    pub fn server_options(&self) -> ServerOptions {
        ServerOptions { storefront_url: self.storefront_url.clone() }
    }
}

fn configure_pricing() -> PricingPolicy {
    let tax_rate_bps = env::var("OMS_TAX_RATE_BPS")
        .map_err(|_| info!("🪛️ OMS_TAX_RATE_BPS is not set. Using the default of {DEFAULT_TAX_RATE_BPS} bps."))
        .and_then(|s| {
            s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid configuration value for OMS_TAX_RATE_BPS. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_TAX_RATE_BPS);
    let currency = env::var("OMS_CURRENCY").map(|s| s.to_lowercase()).unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());
    PricingPolicy::new(tax_rate_bps, currency).unwrap_or_else(|e| {
        warn!("🪛️ {e}. Using the default pricing policy instead.");
        PricingPolicy::default()
    })
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret that customer access tokens are signed with. The storefront's auth service holds the same
    /// secret.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No access token \
             issued elsewhere will be accepted. DO NOT operate in production like this. 🚨️🚨️🚨️"
        );
        let secret: String =
            thread_rng().sample_iter(&Alphanumeric).take(RANDOM_SECRET_LENGTH).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("OMS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [OMS_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("OMS_JWT_SECRET is empty".to_string()));
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The part of the configuration that request handlers need. Contains no secrets.
#[derive(Clone, Debug, Default)]
pub struct ServerOptions {
    pub storefront_url: Option<String>,
}
