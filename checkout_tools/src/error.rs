use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The gateway did not return a redirect URL for session {0}")]
    MissingRedirectUrl(String),
}

/// Reasons a webhook delivery is rejected before its payload is looked at.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("The signature header is missing")]
    MissingHeader,
    #[error("The signature header is malformed: {0}")]
    MalformedHeader(String),
    #[error("The webhook timestamp is outside the allowed tolerance")]
    TimestampOutsideTolerance,
    #[error("No signature in the header matches the payload")]
    SignatureMismatch,
    #[error("The webhook payload is not a valid event: {0}")]
    InvalidPayload(String),
}
