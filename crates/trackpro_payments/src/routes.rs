// --- File: crates/trackpro_payments/src/routes.rs ---

use crate::handlers::{
    check_pro_status_handler, confirm_payment_handler, create_payment_intent_handler,
    stripe_webhook_handler, PaymentsState,
};
use axum::{routing::post, Router};
use std::sync::Arc;

/// Creates a router containing the payment callables and the Stripe webhook.
pub fn routes(state: Arc<PaymentsState>) -> Router {
    Router::new()
        .route("/createPaymentIntent", post(create_payment_intent_handler))
        .route("/confirmPayment", post(confirm_payment_handler))
        .route("/checkProStatus", post(check_pro_status_handler))
        // Server-to-server, raw body
        .route("/stripeWebhook", post(stripe_webhook_handler))
        .with_state(state)
}
