// --- File: crates/trackpro_stripe/src/logic.rs ---
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::error::StripeError;
use trackpro_common::{CreateIntentParams, PaymentIntent, WebhookEvent};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";
/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

// --- Data Structures ---

/// Envelope of a Stripe webhook event. Only the fields we dispatch on are typed.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String, // e.g., "payment_intent.succeeded"
    #[serde(default)]
    pub created: i64, // Unix timestamp
    #[serde(default)]
    pub livemode: bool,
    pub data: StripeEventData,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StripeEventData {
    pub object: Value,
}

impl From<StripeEvent> for WebhookEvent {
    fn from(event: StripeEvent) -> Self {
        WebhookEvent {
            id: event.id,
            event_type: event.event_type,
            created: event.created,
            livemode: event.livemode,
            object: event.data.object,
        }
    }
}

// --- Webhook Processing Logic ---

/// Verifies the signature of an incoming Stripe webhook request.
///
/// # Arguments
/// * `payload_bytes` - The raw request body bytes.
/// * `sig_header` - The value of the 'Stripe-Signature' header.
/// * `secret` - The webhook signing secret (whsec_...).
/// * `tolerance_secs` - Maximum age of the signed timestamp.
///
/// Returns Ok(()) if the signature is valid, otherwise StripeError::WebhookSignatureError.
pub fn verify_stripe_signature(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
) -> Result<(), StripeError> {
    verify_stripe_signature_at(
        payload_bytes,
        sig_header,
        secret,
        tolerance_secs,
        Utc::now().timestamp(),
    )
}

/// Same as [`verify_stripe_signature`] with an explicit current time.
pub fn verify_stripe_signature_at(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), StripeError> {
    let sig_header_value = sig_header.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing Stripe-Signature header".to_string())
    })?;
    let mut timestamp_str: Option<&str> = None;
    let mut v1_signatures_hex: Vec<&str> = Vec::new();

    for item in sig_header_value.split(',') {
        if let Some((key, value)) = item.trim().split_once('=') {
            match key {
                "t" => timestamp_str = Some(value),
                "v1" => v1_signatures_hex.push(value),
                _ => {} // Ignore other schemes like v0
            }
        }
    }

    let timestamp_str = timestamp_str.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing timestamp 't' in Stripe-Signature".to_string())
    })?;
    let parsed_timestamp = timestamp_str.parse::<i64>().map_err(|_| {
        StripeError::WebhookSignatureError(
            "Invalid timestamp format in Stripe-Signature".to_string(),
        )
    })?;

    if v1_signatures_hex.is_empty() {
        return Err(StripeError::WebhookSignatureError(
            "Missing v1 signature in Stripe-Signature".to_string(),
        ));
    }
    debug!(
        "Stripe-Signature t={} with {} v1 signature(s)",
        parsed_timestamp,
        v1_signatures_hex.len()
    );

    // Only stale events are rejected; a timestamp ahead of our clock is accepted,
    // as the Stripe SDKs do. An unrepresentable age counts as stale.
    let stale = match now.checked_sub(parsed_timestamp) {
        Some(age) => age > tolerance_secs,
        None => true,
    };
    if stale {
        warn!(
            "Webhook timestamp outside tolerance. Current: {}, Event: {}",
            now, parsed_timestamp
        );
        return Err(StripeError::WebhookSignatureError(
            "Timestamp outside the tolerance zone".to_string(),
        ));
    }

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        StripeError::WebhookSignatureError("Invalid webhook secret format for HMAC".to_string())
    })?;
    // Signed payload is "<t>.<raw body>", using the header's timestamp text verbatim
    mac.update(timestamp_str.as_bytes());
    mac.update(b".");
    mac.update(payload_bytes);
    let calculated_signature_hex = hex::encode(mac.finalize().into_bytes());

    if v1_signatures_hex.iter().any(|provided| {
        constant_time_eq(calculated_signature_hex.as_bytes(), provided.as_bytes())
    }) {
        return Ok(());
    }
    warn!("Stripe signature mismatch; no v1 signature in the header matched");
    Err(StripeError::WebhookSignatureError(
        "No signatures found matching the expected signature for payload".to_string(),
    ))
}

/// Helper for constant-time string comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Verifies the signature and parses the body as a Stripe event.
pub fn construct_event(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
    tolerance_secs: i64,
) -> Result<StripeEvent, StripeError> {
    verify_stripe_signature(payload_bytes, sig_header, secret, tolerance_secs)?;
    serde_json::from_slice(payload_bytes)
        .map_err(|e| StripeError::WebhookPayloadError(e.to_string()))
}

// --- Payment Intent API ---

/// Stripe ids are ASCII alphanumerics and underscores; anything else would change the
/// request path.
fn validate_object_id(id: &str) -> Result<(), StripeError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(StripeError::InvalidIdentifier(id.to_string()))
    }
}

/// Form body for `POST /v1/payment_intents`.
pub fn payment_intent_form(params: &CreateIntentParams) -> Vec<(String, String)> {
    let mut form_body = vec![
        ("amount".to_string(), params.amount_minor.to_string()),
        ("currency".to_string(), params.currency.to_lowercase()),
        ("description".to_string(), params.description.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    for (key, value) in &params.metadata {
        form_body.push((format!("metadata[{}]", key), value.clone()));
    }
    form_body
}

/// Creates a payment intent.
pub async fn create_payment_intent(
    client: &Client,
    api_base: &str,
    secret_key: &str,
    params: &CreateIntentParams,
) -> Result<PaymentIntent, StripeError> {
    let api_url = format!("{}/v1/payment_intents", api_base.trim_end_matches('/'));
    info!(
        "[Stripe Logic] Creating payment intent: {} {}",
        params.amount_minor, params.currency
    );

    let response = client
        .post(&api_url)
        .basic_auth(secret_key, None::<&str>)
        .form(&payment_intent_form(params))
        .send()
        .await?;

    let intent: PaymentIntent = read_stripe_response(response).await?;
    info!("[Stripe Logic] Payment intent created: {}", intent.id);
    Ok(intent)
}

/// Retrieves a payment intent by id.
pub async fn retrieve_payment_intent(
    client: &Client,
    api_base: &str,
    secret_key: &str,
    payment_intent_id: &str,
) -> Result<PaymentIntent, StripeError> {
    validate_object_id(payment_intent_id)?;
    let api_url = format!(
        "{}/v1/payment_intents/{}",
        api_base.trim_end_matches('/'),
        payment_intent_id
    );
    debug!("[Stripe Logic] Retrieving payment intent {}", payment_intent_id);

    let response = client
        .get(&api_url)
        .basic_auth(secret_key, None::<&str>)
        .send()
        .await?;

    read_stripe_response(response).await
}

/// Parses a successful response body, or turns Stripe's error object into an ApiError.
async fn read_stripe_response<T: DeserializeOwned>(response: Response) -> Result<T, StripeError> {
    let status = response.status();
    let body_text = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body_text)?);
    }

    let error_message = match serde_json::from_str::<Value>(&body_text) {
        Ok(json_body) => json_body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or(&body_text)
            .to_string(),
        Err(_) => body_text,
    };
    warn!(
        "[Stripe Logic] Stripe API request failed with HTTP status: {}. Message: {}",
        status, error_message
    );
    Err(StripeError::ApiError {
        status_code: status.as_u16(),
        message: error_message,
    })
}
