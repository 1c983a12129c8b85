// --- File: crates/trackpro_payments/src/handlers.rs ---
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};
use trackpro_common::{
    callable_payload, CallableResult, CallerIdentity, DocumentStore, IdentityVerifier,
    PaymentGateway, TrackProError,
};
use trackpro_config::StripeConfig;
use trackpro_stripe::SIGNATURE_HEADER;

use crate::logic::{self, Collections, STRIPE_DISABLED_MESSAGE};
use crate::models::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreatePaymentIntentRequest,
    CreatePaymentIntentResponse, ProStatusResponse, WebhookAck,
};

/// Signing secret and clock tolerance for incoming webhooks.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub secret: String,
    pub tolerance_secs: i64,
}

impl From<&StripeConfig> for WebhookSettings {
    fn from(config: &StripeConfig) -> Self {
        Self {
            secret: config.webhook_secret.clone(),
            tolerance_secs: config.webhook_tolerance_secs(),
        }
    }
}

// --- State for Payment Handlers ---
pub struct PaymentsState {
    /// `None` when Stripe is disabled.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub store: Arc<dyn DocumentStore>,
    /// `None` when no Firebase project is configured; every caller is then anonymous.
    pub verifier: Option<Arc<dyn IdentityVerifier>>,
    pub webhook: Option<WebhookSettings>,
    pub collections: Collections,
}

impl PaymentsState {
    async fn caller(&self, headers: &HeaderMap) -> Result<Option<CallerIdentity>, TrackProError> {
        logic::resolve_caller(self.verifier.as_deref(), headers).await
    }
}

/// Axum handler for the `createPaymentIntent` callable.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/createPaymentIntent", // Path relative to /api
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent created", body = CreatePaymentIntentResponse),
        (status = 400, description = "Missing or invalid amount, currency or description"),
        (status = 401, description = "Invalid ID token"),
        (status = 500, description = "Stripe disabled or Stripe API error")
    ),
    tag = "Payments"
))]
pub async fn create_payment_intent_handler(
    State(state): State<Arc<PaymentsState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<CallableResult<CreatePaymentIntentResponse>, TrackProError> {
    let request: CreatePaymentIntentRequest = callable_payload(&body)?;
    let caller = state.caller(&headers).await?;
    logic::create_payment_intent(state.gateway.as_deref(), caller.as_ref(), request)
        .await
        .map(CallableResult::new)
}

/// Axum handler for the `confirmPayment` callable.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/confirmPayment", // Path relative to /api
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Pro entitlement granted", body = ConfirmPaymentResponse),
        (status = 400, description = "Missing paymentIntentId, or payment not completed"),
        (status = 401, description = "Caller not authenticated"),
        (status = 500, description = "Stripe or Firestore failure")
    ),
    tag = "Payments"
))]
pub async fn confirm_payment_handler(
    State(state): State<Arc<PaymentsState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<CallableResult<ConfirmPaymentResponse>, TrackProError> {
    let caller = state.caller(&headers).await?;
    let request: ConfirmPaymentRequest = callable_payload(&body)?;
    logic::confirm_payment(
        state.gateway.as_deref(),
        state.store.as_ref(),
        &state.collections,
        caller.as_ref(),
        request,
    )
    .await
    .map(CallableResult::new)
}

/// Axum handler for the `checkProStatus` callable. Never fails.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/checkProStatus", // Path relative to /api
    responses(
        (status = 200, description = "Entitlement of the caller; isPro is false on any problem", body = ProStatusResponse)
    ),
    tag = "Payments"
))]
pub async fn check_pro_status_handler(
    State(state): State<Arc<PaymentsState>>,
    headers: HeaderMap,
) -> CallableResult<ProStatusResponse> {
    let caller = match state.caller(&headers).await {
        Ok(caller) => caller,
        Err(_) => return CallableResult::new(ProStatusResponse::not_pro()),
    };
    CallableResult::new(
        logic::check_pro_status(state.store.as_ref(), &state.collections, caller.as_ref()).await,
    )
}

/// Axum handler for Stripe webhooks. Needs the raw body for signature verification.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/stripeWebhook", // Path relative to /api
    responses(
        (status = 200, description = "Webhook received and acknowledged", body = WebhookAck),
        (status = 400, description = "Invalid signature or payload", content_type = "text/plain"),
        (status = 503, description = "Stripe service is disabled")
    ),
    tag = "Stripe Webhooks"
))]
pub async fn stripe_webhook_handler(
    State(state): State<Arc<PaymentsState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (Some(gateway), Some(settings)) = (state.gateway.as_deref(), state.webhook.as_ref()) else {
        return (StatusCode::SERVICE_UNAVAILABLE, STRIPE_DISABLED_MESSAGE).into_response();
    };

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok()) else {
        warn!("Webhook request without {} header", SIGNATURE_HEADER);
        return webhook_error("Missing Stripe-Signature header");
    };

    let event = match gateway.construct_event(
        &body,
        signature,
        &settings.secret,
        settings.tolerance_secs,
    ) {
        Ok(event) => event,
        Err(e) => {
            warn!("Webhook signature verification failed: {}", e);
            return webhook_error(e);
        }
    };
    debug!("Verified webhook event {} ({})", event.id, event.event_type);

    logic::dispatch_webhook_event(&event);
    Json(WebhookAck { received: true }).into_response()
}

fn webhook_error(message: impl std::fmt::Display) -> Response {
    (StatusCode::BAD_REQUEST, format!("Webhook Error: {}", message)).into_response()
}
