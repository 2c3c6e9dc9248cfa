//! Access tokens
//!
//! Customers authenticate against the storefront, which issues them an HS256-signed JWT. This server only verifies
//! those tokens; it never issues them. The token's `sub` claim is the customer's user id, and `roles` lists what the
//! bearer may do.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use log::*;
use order_engine::db_types::UserId;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Seller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: UserId,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> &UserId {
        &self.sub
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Handlers take `JwtClaims` as an argument to get at the authenticated user. The claims are placed in the request
/// by [`crate::middleware::JwtMiddlewareFactory`].
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or_else(|| {
            debug!("🔐️ No JWT claims found in request extensions");
            ServerError::AuthenticationError(AuthError::MissingToken)
        }))
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                AuthError::ValidationError(e.to_string())
            },
            _ => AuthError::PoorlyFormattedToken(e.to_string()),
        })?;
        trace!("🔐️ Access token validated for {}", data.claims.sub);
        Ok(data.claims)
    }
}
