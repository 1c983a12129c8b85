// --- File: crates/trackpro_payments/src/logic.rs ---
//! The payment flows, independent of HTTP.
//!
//! Each function takes its collaborators as trait objects and returns either the
//! callable result payload or a [`TrackProError`] whose kind the client sees.

use axum::http::HeaderMap;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::{error, info, warn};
use trackpro_common::{
    bearer_token, failed_precondition, internal_error, invalid_argument, unauthenticated,
    CallerIdentity, Context, CreateIntentParams, DocumentStore, EntitlementRecord,
    IdentityVerifier, PaymentGateway, PaymentIntentStatus, PaymentLogEntry, ProActivation,
    TrackProError, WebhookEvent,
};
use trackpro_stripe::to_minor_units;

use crate::models::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreatePaymentIntentRequest,
    CreatePaymentIntentResponse, ProStatusResponse,
};

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: amount, currency, description";
pub const NOT_AUTHENTICATED_MESSAGE: &str = "User must be authenticated";
pub const PAYMENT_NOT_COMPLETED_MESSAGE: &str = "Payment not completed";
pub const ACTIVATED_MESSAGE: &str = "Pro account activated successfully";
pub const STRIPE_DISABLED_MESSAGE: &str = "Stripe service is disabled";
/// `userId` metadata value for intents created without a signed-in user.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Where the two record kinds live in the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub users: String,
    pub payments: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            users: trackpro_config::DEFAULT_USERS_COLLECTION.to_string(),
            payments: trackpro_config::DEFAULT_PAYMENTS_COLLECTION.to_string(),
        }
    }
}

/// The gateway, or the internal error callers see while Stripe is disabled.
fn require_gateway(
    gateway: Option<&dyn PaymentGateway>,
) -> Result<&dyn PaymentGateway, TrackProError> {
    gateway.ok_or_else(|| internal_error(STRIPE_DISABLED_MESSAGE))
}

// --- Caller resolution ---

/// Resolves the caller from the `Authorization` header.
///
/// No header means an anonymous caller. A header that fails verification is an
/// error so that a stale session is never silently treated as anonymous.
pub async fn resolve_caller(
    verifier: Option<&dyn IdentityVerifier>,
    headers: &HeaderMap,
) -> Result<Option<CallerIdentity>, TrackProError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    let Some(verifier) = verifier else {
        warn!("Bearer token presented but no identity verifier is configured; treating caller as anonymous");
        return Ok(None);
    };
    match verifier.verify(token).await {
        Ok(identity) => Ok(Some(identity)),
        Err(e) => {
            warn!("Rejected ID token: {}", e);
            Err(unauthenticated("Invalid authentication token"))
        }
    }
}

// --- createPaymentIntent ---

/// JavaScript-style falsiness: the app historically omitted fields by sending
/// `null`, `""` or `0`.
fn is_missing(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

fn parse_amount(value: &Value) -> Result<f64, TrackProError> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match amount {
        Some(a) if a.is_finite() && a > 0.0 => Ok(a),
        _ => Err(invalid_argument("Amount must be a positive number")),
    }
}

fn parse_currency(value: &Value) -> Result<String, TrackProError> {
    match value.as_str() {
        Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
            Ok(code.to_ascii_lowercase())
        }
        _ => Err(invalid_argument(format!("Invalid currency code: {}", value))),
    }
}

fn parse_description(value: &Value) -> Result<String, TrackProError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid_argument("Description must be a string"))
}

/// Creates a payment intent for the requested amount.
///
/// Input is validated before the gateway is required, so a disabled gateway never
/// masks a bad request.
pub async fn create_payment_intent(
    gateway: Option<&dyn PaymentGateway>,
    caller: Option<&CallerIdentity>,
    request: CreatePaymentIntentRequest,
) -> Result<CreatePaymentIntentResponse, TrackProError> {
    if is_missing(&request.amount) || is_missing(&request.currency) || is_missing(&request.description)
    {
        return Err(invalid_argument(MISSING_FIELDS_MESSAGE));
    }
    let (Some(amount), Some(currency), Some(description)) =
        (&request.amount, &request.currency, &request.description)
    else {
        return Err(invalid_argument(MISSING_FIELDS_MESSAGE));
    };

    let amount = parse_amount(amount)?;
    let currency = parse_currency(currency)?;
    let description = parse_description(description)?;
    let amount_minor = match to_minor_units(amount, &currency) {
        Some(minor) if minor > 0 => minor,
        _ => return Err(invalid_argument("Amount must be a positive number")),
    };

    let gateway = require_gateway(gateway)?;

    let user_id = caller
        .map(|c| c.uid.clone())
        .unwrap_or_else(|| ANONYMOUS_USER.to_string());
    let params = CreateIntentParams {
        amount_minor,
        currency,
        description,
        metadata: vec![
            ("userId".to_string(), user_id.clone()),
            (
                "timestamp".to_string(),
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ],
    };

    let intent = gateway
        .create_intent(params)
        .await
        .map_err(|e| {
            error!("Error creating payment intent: {}", e);
            e
        })
        .context("Failed to create payment intent")?;

    let client_secret = intent.client_secret.ok_or_else(|| {
        error!("Payment intent {} was returned without a client secret", intent.id);
        internal_error("Failed to create payment intent: missing client secret")
    })?;
    info!("Created payment intent {} for user {}", intent.id, user_id);

    Ok(CreatePaymentIntentResponse {
        client_secret,
        payment_intent_id: intent.id,
    })
}

// --- confirmPayment ---

/// Grants the Pro entitlement for a succeeded payment intent.
///
/// Not idempotent: each call with a succeeded intent appends a payment log entry.
pub async fn confirm_payment(
    gateway: Option<&dyn PaymentGateway>,
    store: &dyn DocumentStore,
    collections: &Collections,
    caller: Option<&CallerIdentity>,
    request: ConfirmPaymentRequest,
) -> Result<ConfirmPaymentResponse, TrackProError> {
    let caller = caller.ok_or_else(|| unauthenticated(NOT_AUTHENTICATED_MESSAGE))?;
    let payment_intent_id = request
        .payment_intent_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| invalid_argument("Missing required field: paymentIntentId"))?;
    let gateway = require_gateway(gateway)?;

    let result = activate_pro(gateway, store, collections, caller, &payment_intent_id).await;
    if let Err(e) = &result {
        error!(
            "Error confirming payment {} for user {}: {}",
            payment_intent_id, caller.uid, e
        );
    }
    result
}

async fn activate_pro(
    gateway: &dyn PaymentGateway,
    store: &dyn DocumentStore,
    collections: &Collections,
    caller: &CallerIdentity,
    payment_intent_id: &str,
) -> Result<ConfirmPaymentResponse, TrackProError> {
    const CONTEXT: &str = "Failed to confirm payment";

    let intent = gateway
        .retrieve_intent(payment_intent_id)
        .await
        .context(CONTEXT)?;
    if intent.status != PaymentIntentStatus::Succeeded {
        info!(
            "Payment intent {} not succeeded (status {:?})",
            intent.id, intent.status
        );
        return Err(failed_precondition(PAYMENT_NOT_COMPLETED_MESSAGE));
    }

    let existing = store
        .get(&collections.users, &caller.uid)
        .await
        .context(CONTEXT)?
        .map(|doc| EntitlementRecord::from_document(&doc));
    let first_activation = existing.map_or(true, |record| record.pro_activated_at.is_none());

    let activation = ProActivation {
        payment_intent_id: intent.id.clone(),
        stripe_customer_id: intent.customer.clone(),
        first_activation,
    };
    store
        .upsert_merge(&collections.users, &caller.uid, activation.into_fields())
        .await
        .context(CONTEXT)?;

    let entry = PaymentLogEntry {
        user_id: caller.uid.clone(),
        payment_intent_id: intent.id.clone(),
        amount: intent.amount,
        currency: intent.currency.clone(),
    };
    store
        .append(&collections.payments, entry.into_fields())
        .await
        .context(CONTEXT)?;

    info!("Pro activated for user {} via {}", caller.uid, intent.id);
    Ok(ConfirmPaymentResponse {
        success: true,
        message: ACTIVATED_MESSAGE.to_string(),
    })
}

// --- checkProStatus ---

/// Reports the caller's entitlement. Fails closed: anything but a readable record
/// with `isPro: true` reports not-Pro.
pub async fn check_pro_status(
    store: &dyn DocumentStore,
    collections: &Collections,
    caller: Option<&CallerIdentity>,
) -> ProStatusResponse {
    let Some(caller) = caller else {
        return ProStatusResponse::not_pro();
    };
    match store.get(&collections.users, &caller.uid).await {
        Ok(Some(doc)) => {
            let record = EntitlementRecord::from_document(&doc);
            ProStatusResponse {
                is_pro: record.is_pro,
                pro_activated_at: record
                    .pro_activated_at
                    .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            }
        }
        Ok(None) => ProStatusResponse::not_pro(),
        Err(e) => {
            error!("Error checking pro status for user {}: {}", caller.uid, e);
            ProStatusResponse::not_pro()
        }
    }
}

// --- stripeWebhook ---

/// What a verified webhook event was dispatched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDispatch {
    PaymentSucceeded(String),
    PaymentFailed(String),
    Unhandled(String),
}

/// Dispatches a verified event. Log-only; no state changes.
pub fn dispatch_webhook_event(event: &WebhookEvent) -> WebhookDispatch {
    let object_id = event.object_id().unwrap_or_default().to_string();
    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            info!("PaymentIntent was successful: {}", object_id);
            WebhookDispatch::PaymentSucceeded(object_id)
        }
        "payment_intent.payment_failed" => {
            warn!("PaymentIntent failed: {}", object_id);
            WebhookDispatch::PaymentFailed(object_id)
        }
        other => {
            info!("Unhandled event type {}", other);
            WebhookDispatch::Unhandled(other.to_string())
        }
    }
}
