//! JWT authentication middleware.
//!
//! Looks for an access token in the `Authorization: Bearer <token>` header, falling back to the `token` cookie that
//! the storefront sets. A verified token's [`JwtClaims`] are stored in the request extensions, where handlers (via
//! `JwtClaims: FromRequest`) and [`super::AclMiddlewareFactory`] pick them up.
//!
//! Requests without a token, or with one that fails verification, are refused with 401 Unauthorized.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::*;

use crate::{
    auth::{JwtClaims, TokenVerifier, ACCESS_TOKEN_COOKIE},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    verifier: Rc<TokenVerifier>,
}

impl JwtMiddlewareFactory {
    pub fn new(verifier: TokenVerifier) -> Self {
        JwtMiddlewareFactory { verifier: Rc::new(verifier) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService { verifier: Rc::clone(&self.verifier), service: Rc::new(service) }))
    }
}

pub struct JwtMiddlewareService<S> {
    verifier: Rc<TokenVerifier>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Rc::clone(&self.verifier);
        Box::pin(async move {
            trace!("🔐️ Checking access token for {}", req.path());
            let token = extract_token(&req).ok_or_else(|| {
                debug!("🔐️ No access token in request to {}", req.path());
                ServerError::AuthenticationError(AuthError::MissingToken)
            })?;
            let claims = verifier.verify(&token).map_err(|e| {
                debug!("🔐️ Access token rejected. {e}");
                ServerError::AuthenticationError(e)
            })?;
            req.extensions_mut().insert::<JwtClaims>(claims);
            service.call(req).await
        })
    }
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    from_header.or_else(|| req.cookie(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()))
}
