// --- File: crates/trackpro_common/src/services.rs ---
//! Service abstractions for external services.
//!
//! The payment handlers talk to the payment processor, the document store and the
//! identity provider only through these traits, so they can be exercised against
//! in-memory or mocked implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use crate::models::{Document, Fields};

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl BoxedError {
    /// Wraps a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        BoxedError(message.into().into())
    }
}

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// Lifecycle state of a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

/// The subset of a payment intent the handlers care about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Parameters for creating a payment intent.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIntentParams {
    /// Minor currency units, already converted from the client's major-unit amount.
    pub amount_minor: i64,
    /// ISO currency code, lowercase.
    pub currency: String,
    pub description: String,
    pub metadata: Vec<(String, String)>,
}

/// A verified processor event.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    pub created: i64,
    pub livemode: bool,
    /// The `data.object` payload, left untyped since its shape depends on `event_type`.
    pub object: Value,
}

impl WebhookEvent {
    /// The `id` of the event's object, if it has one.
    pub fn object_id(&self) -> Option<&str> {
        self.object.get("id").and_then(Value::as_str)
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub uid: String,
}

/// Payment processor operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent with automatic payment methods enabled.
    async fn create_intent(&self, params: CreateIntentParams) -> Result<PaymentIntent, BoxedError>;

    /// Fetch the current state of a payment intent.
    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, BoxedError>;

    /// Verify a webhook signature header value and parse the event.
    fn construct_event(
        &self,
        payload: &[u8],
        signature: &str,
        secret: &str,
        tolerance_secs: i64,
    ) -> Result<WebhookEvent, BoxedError>;
}

/// Schemaless document storage organized in named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document; `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BoxedError>;

    /// Create the document or merge `fields` into it, leaving other fields untouched.
    async fn upsert_merge(&self, collection: &str, id: &str, fields: Fields)
        -> Result<(), BoxedError>;

    /// Add a new document with a store-generated id and return that id.
    async fn append(&self, collection: &str, fields: Fields) -> Result<String, BoxedError>;
}

/// Verifies bearer tokens issued by the identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, BoxedError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_deserializes_unknown_status() {
        let intent: PaymentIntent = serde_json::from_value(json!({
            "id": "pi_1",
            "status": "some_future_state",
            "amount": 499,
            "currency": "usd"
        }))
        .unwrap();
        assert_eq!(intent.status, PaymentIntentStatus::Unknown);
        assert!(intent.customer.is_none());
        assert!(intent.metadata.is_empty());
    }

    #[test]
    fn test_event_object_id() {
        let event = WebhookEvent {
            id: "evt_1".into(),
            event_type: "payment_intent.succeeded".into(),
            created: 0,
            livemode: false,
            object: json!({"id": "pi_1"}),
        };
        assert_eq!(event.object_id(), Some("pi_1"));
    }

    #[test]
    fn test_boxed_error_display() {
        assert_eq!(BoxedError::msg("boom").to_string(), "boom");
    }
}
