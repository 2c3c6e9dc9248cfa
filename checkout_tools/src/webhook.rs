use chrono::Utc;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use shop_common::Secret;

use crate::{data_objects::WebhookEvent, WebhookError};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Authenticates webhook deliveries signed with the `t=<unix time>,v1=<hex hmac>` scheme.
///
/// The signed payload is `"{t}.{raw body}"`, keyed with the endpoint's webhook secret. A delivery is accepted if any
/// `v1` entry matches and `t` is within `tolerance_secs` of the current time.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Secret<String>,
    tolerance_secs: u64,
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>, tolerance_secs: u64) -> Self {
        Self { secret, tolerance_secs }
    }

    pub fn verify_and_parse(&self, payload: &[u8], header: Option<&str>) -> Result<WebhookEvent, WebhookError> {
        self.verify_at(payload, header, Utc::now().timestamp())?;
        serde_json::from_slice::<WebhookEvent>(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    /// Checks the signature header against `payload`, treating `now` as the current unix time.
    pub fn verify_at(&self, payload: &[u8], header: Option<&str>, now: i64) -> Result<(), WebhookError> {
        let header = header.ok_or(WebhookError::MissingHeader)?;
        let header = parse_header(header)?;
        if now.abs_diff(header.timestamp) > self.tolerance_secs {
            warn!("🔐️ Webhook timestamp {} is more than {}s from now ({now})", header.timestamp, self.tolerance_secs);
            return Err(WebhookError::TimestampOutsideTolerance);
        }
        if self.secret.reveal().is_empty() {
            warn!("🔐️ No webhook secret is configured. Rejecting the delivery.");
            return Err(WebhookError::SignatureMismatch);
        }
        let mac = self.mac_for(header.timestamp, payload)?;
        let matched = header.signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
        if matched {
            trace!("🔐️ Webhook signature verified");
            Ok(())
        } else {
            warn!("🔐️ Webhook signature verification failed");
            Err(WebhookError::SignatureMismatch)
        }
    }

    /// Produces a valid signature header for `payload` at time `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, WebhookError> {
        let mac = self.mac_for(timestamp, payload)?;
        Ok(format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes())))
    }

    fn mac_for(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.reveal().as_bytes())
            .map_err(|e| WebhookError::MalformedHeader(e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

fn parse_header(header: &str) -> Result<SignatureHeader, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|_| WebhookError::MalformedHeader(format!("invalid timestamp '{value}'")))?;
                timestamp = Some(t);
            },
            // Other schemes (e.g. v0) are ignored
            "v1" => match hex::decode(value) {
                Ok(sig) => signatures.push(sig),
                Err(_) => debug!("🔐️ Ignoring non-hex v1 signature in webhook header"),
            },
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or_else(|| WebhookError::MalformedHeader("no timestamp".into()))?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader("no v1 signature".into()));
    }
    Ok(SignatureHeader { timestamp, signatures })
}
