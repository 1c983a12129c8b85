// --- File: crates/trackpro_stripe/src/error.rs ---
use thiserror::Error;
use trackpro_common::{BoxedError, HttpStatusCode};

/// Stripe-specific error types.
#[derive(Error, Debug)]
pub enum StripeError {
    /// Error occurred during a Stripe API request
    #[error("Stripe API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the Stripe API. Displays Stripe's own message so callers
    /// can pass it through to the client.
    #[error("{message}")]
    ApiError { status_code: u16, message: String },

    /// Error parsing Stripe API response
    #[error("Failed to parse Stripe API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Identifier that cannot be a Stripe object id
    #[error("Invalid Stripe object id: {0}")]
    InvalidIdentifier(String),

    /// Webhook signature verification failed
    #[error("Stripe webhook signature verification failed: {0}")]
    WebhookSignatureError(String),

    /// Signed webhook payload is not a Stripe event
    #[error("Invalid Stripe webhook payload: {0}")]
    WebhookPayloadError(String),
}

impl HttpStatusCode for StripeError {
    fn status_code(&self) -> u16 {
        match self {
            StripeError::RequestError(_) => 502,
            StripeError::ApiError { status_code, .. } => *status_code,
            StripeError::ParseError(_) => 502,
            StripeError::InvalidIdentifier(_) => 400,
            StripeError::WebhookSignatureError(_) => 400,
            StripeError::WebhookPayloadError(_) => 400,
        }
    }
}

impl From<StripeError> for BoxedError {
    fn from(err: StripeError) -> Self {
        BoxedError(Box::new(err))
    }
}
