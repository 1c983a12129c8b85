// --- File: crates/trackpro_payments/src/models.rs ---
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// `data` of a `createPaymentIntent` call.
///
/// Fields stay untyped until validation: the app has sent amounts both as numbers
/// and as numeric strings.
#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreatePaymentIntentRequest {
    /// Amount in major currency units, e.g. 4.99
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>, example = 4.99))]
    pub amount: Option<Value>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "usd"))]
    pub currency: Option<Value>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "TrackPro upgrade"))]
    pub description: Option<Value>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ConfirmPaymentResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProStatusResponse {
    pub is_pro: bool,
    /// RFC 3339; omitted when the user was never activated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pro_activated_at: Option<String>,
}

impl ProStatusResponse {
    pub fn not_pro() -> Self {
        Self::default()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WebhookAck {
    pub received: bool,
}
