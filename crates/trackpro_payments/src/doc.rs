// --- File: crates/trackpro_payments/src/doc.rs ---
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::models::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreatePaymentIntentRequest,
    CreatePaymentIntentResponse, ProStatusResponse, WebhookAck,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::create_payment_intent_handler,
        crate::handlers::confirm_payment_handler,
        crate::handlers::check_pro_status_handler,
        crate::handlers::stripe_webhook_handler
    ),
    components(
        schemas(
            CreatePaymentIntentRequest, CreatePaymentIntentResponse,
            ConfirmPaymentRequest, ConfirmPaymentResponse,
            ProStatusResponse, WebhookAck
        )
    ),
    tags(
        (name = "Payments", description = "Callable endpoints; bodies are wrapped as {\"data\": ...} and replies as {\"result\": ...}"),
        (name = "Stripe Webhooks", description = "Stripe Server-to-Server Webhooks")
    )
)]
pub struct PaymentsApiDoc;
