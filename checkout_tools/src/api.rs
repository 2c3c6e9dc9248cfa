use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::CheckoutConfig,
    data_objects::{CheckoutSession, NewCheckoutSession, SessionList},
    helpers::session_form_params,
    CheckoutApiError,
};

#[derive(Clone)]
pub struct CheckoutApi {
    config: CheckoutConfig,
    client: Arc<Client>,
}

impl CheckoutApi {
    pub fn new(config: CheckoutConfig) -> Result<Self, CheckoutApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| CheckoutApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| CheckoutApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Sends a request to the gateway. Query parameters go in `params`; `form` becomes a url-encoded body.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        form: Option<&[(String, String)]>,
    ) -> Result<T, CheckoutApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(form) = form {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| CheckoutApiError::RestRequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| CheckoutApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| CheckoutApiError::RestResponseError(e.to_string()))?;
            Err(CheckoutApiError::QueryError { status, message })
        }
    }

    /// Creates a hosted checkout session. The returned session is guaranteed to carry a redirect URL.
    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, CheckoutApiError> {
        let form = session_form_params(session);
        debug!("💳️ Creating checkout session with {} line items", session.line_items.len());
        let result = self.rest_query::<CheckoutSession>(Method::POST, "/checkout/sessions", &[], Some(&form)).await?;
        if result.url.is_none() {
            return Err(CheckoutApiError::MissingRedirectUrl(result.id));
        }
        info!("💳️ Created checkout session {}", result.id);
        Ok(result)
    }

    pub async fn list_sessions_by_payment_intent(
        &self,
        payment_intent: &str,
    ) -> Result<Vec<CheckoutSession>, CheckoutApiError> {
        debug!("💳️ Fetching checkout sessions for payment intent {payment_intent}");
        let params = [("payment_intent", payment_intent)];
        let result = self.rest_query::<SessionList>(Method::GET, "/checkout/sessions", &params, None).await?;
        debug!("💳️ Found {} checkout sessions for payment intent {payment_intent}", result.data.len());
        Ok(result.data)
    }
}
