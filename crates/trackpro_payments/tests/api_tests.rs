use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use trackpro_common::{
    BoxedError, CallerIdentity, CreateIntentParams, IdentityVerifier, MemoryDocumentStore,
    PaymentGateway, PaymentIntent, PaymentIntentStatus, WebhookEvent,
};
use trackpro_payments::{routes, Collections, PaymentsState, WebhookSettings};

const WEBHOOK_SECRET: &str = "whsec_api_tests";
const GOOD_TOKEN: &str = "good-token";

/// Gateway double: intents named `pi_succeeded*` have succeeded, everything else awaits payment.
struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(&self, params: CreateIntentParams) -> Result<PaymentIntent, BoxedError> {
        Ok(PaymentIntent {
            id: "pi_test_1".into(),
            status: PaymentIntentStatus::RequiresPaymentMethod,
            amount: params.amount_minor,
            currency: params.currency,
            client_secret: Some("pi_test_1_secret_abc".into()),
            customer: None,
            metadata: params.metadata.into_iter().collect(),
        })
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, BoxedError> {
        let succeeded = id.starts_with("pi_succeeded");
        Ok(PaymentIntent {
            id: id.to_string(),
            status: if succeeded {
                PaymentIntentStatus::Succeeded
            } else {
                PaymentIntentStatus::RequiresPaymentMethod
            },
            amount: 499,
            currency: "usd".into(),
            client_secret: None,
            customer: succeeded.then(|| "cus_test".to_string()),
            metadata: HashMap::new(),
        })
    }

    fn construct_event(
        &self,
        payload: &[u8],
        signature: &str,
        secret: &str,
        tolerance_secs: i64,
    ) -> Result<WebhookEvent, BoxedError> {
        Ok(
            trackpro_stripe::logic::construct_event(payload, Some(signature), secret, tolerance_secs)?
                .into(),
        )
    }
}

struct FakeVerifier;

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, BoxedError> {
        if token == GOOD_TOKEN {
            Ok(CallerIdentity {
                uid: "uid-api".into(),
            })
        } else {
            Err(BoxedError::msg("token expired"))
        }
    }
}

fn app_with(gateway: Option<Arc<dyn PaymentGateway>>) -> Router {
    let state = PaymentsState {
        webhook: gateway.as_ref().map(|_| WebhookSettings {
            secret: WEBHOOK_SECRET.into(),
            tolerance_secs: 300,
        }),
        gateway,
        store: Arc::new(MemoryDocumentStore::new()),
        verifier: Some(Arc::new(FakeVerifier)),
        collections: Collections::default(),
    };
    routes(Arc::new(state))
}

fn app() -> Router {
    app_with(Some(Arc::new(FakeGateway)))
}

fn callable(uri: &str, token: Option<&str>, data: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(json!({ "data": data }).to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn signed_webhook(payload: &str, secret: &str, timestamp: i64) -> Request<Body> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    Request::builder()
        .method("POST")
        .uri("/stripeWebhook")
        .header("Stripe-Signature", format!("t={},v1={}", timestamp, signature))
        .body(Body::from(payload.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_create_payment_intent_missing_fields() {
    let (status, body) = send_json(
        &app(),
        callable("/createPaymentIntent", None, json!({"amount": 4.99, "currency": "usd"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": {
            "status": "INVALID_ARGUMENT",
            "message": "Missing required fields: amount, currency, description"
        }})
    );
}

#[tokio::test]
async fn test_create_payment_intent_anonymous() {
    let (status, body) = send_json(
        &app(),
        callable(
            "/createPaymentIntent",
            None,
            json!({"amount": 4.99, "currency": "usd", "description": "TrackPro upgrade"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"result": {"clientSecret": "pi_test_1_secret_abc", "paymentIntentId": "pi_test_1"}})
    );
}

#[tokio::test]
async fn test_create_payment_intent_with_invalid_token() {
    let (status, body) = send_json(
        &app(),
        callable(
            "/createPaymentIntent",
            Some("stale-token"),
            json!({"amount": 4.99, "currency": "usd", "description": "TrackPro upgrade"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["status"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_bad_envelope_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/createPaymentIntent")
        .body(Body::from("{\"amount\": 4.99}"))
        .unwrap();
    let (status, body) = send_json(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_confirm_payment_requires_auth() {
    let (status, body) = send_json(
        &app(),
        callable("/confirmPayment", None, json!({"paymentIntentId": "pi_succeeded_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"error": {"status": "UNAUTHENTICATED", "message": "User must be authenticated"}})
    );
}

#[tokio::test]
async fn test_confirm_payment_not_completed() {
    let (status, body) = send_json(
        &app(),
        callable("/confirmPayment", Some(GOOD_TOKEN), json!({"paymentIntentId": "pi_pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": {"status": "FAILED_PRECONDITION", "message": "Payment not completed"}})
    );
}

#[tokio::test]
async fn test_confirm_then_check_status() {
    let app = app();

    let (_, before) = send_json(&app, callable("/checkProStatus", Some(GOOD_TOKEN), json!({}))).await;
    assert_eq!(before, json!({"result": {"isPro": false}}));

    let (status, body) = send_json(
        &app,
        callable("/confirmPayment", Some(GOOD_TOKEN), json!({"paymentIntentId": "pi_succeeded_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"result": {"success": true, "message": "Pro account activated successfully"}})
    );

    let (status, after) =
        send_json(&app, callable("/checkProStatus", Some(GOOD_TOKEN), json!(null))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["result"]["isPro"], true);
    assert!(after["result"]["proActivatedAt"].is_string());

    // Other callers are unaffected, and bad tokens fail closed
    let (_, anonymous) = send_json(&app, callable("/checkProStatus", None, json!({}))).await;
    assert_eq!(anonymous, json!({"result": {"isPro": false}}));
    let (status, stale) =
        send_json(&app, callable("/checkProStatus", Some("stale-token"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stale, json!({"result": {"isPro": false}}));
}

#[tokio::test]
async fn test_webhook_valid_signature() {
    let payload = json!({
        "id": "evt_1",
        "object": "event",
        "type": "payment_intent.succeeded",
        "created": 1_700_000_000,
        "livemode": false,
        "data": {"object": {"id": "pi_succeeded_1", "object": "payment_intent"}}
    })
    .to_string();
    let (status, body) = send_json(
        &app(),
        signed_webhook(&payload, WEBHOOK_SECRET, Utc::now().timestamp()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"received": true}));
}

#[tokio::test]
async fn test_webhook_unhandled_type_is_acknowledged() {
    let payload = json!({
        "id": "evt_2",
        "type": "customer.created",
        "data": {"object": {"id": "cus_1"}}
    })
    .to_string();
    let (status, _) = send(
        &app(),
        signed_webhook(&payload, WEBHOOK_SECRET, Utc::now().timestamp()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_bad_signature() {
    let payload = json!({"id": "evt_1", "type": "payment_intent.succeeded", "data": {"object": {}}})
        .to_string();
    let (status, body) = send(
        &app(),
        signed_webhook(&payload, "whsec_wrong", Utc::now().timestamp()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8(body).unwrap().starts_with("Webhook Error: "));
}

#[tokio::test]
async fn test_webhook_stale_timestamp() {
    let payload = json!({"id": "evt_1", "type": "payment_intent.succeeded", "data": {"object": {}}})
        .to_string();
    let (status, _) = send(
        &app(),
        signed_webhook(&payload, WEBHOOK_SECRET, Utc::now().timestamp() - 3600),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_missing_signature() {
    let request = Request::builder()
        .method("POST")
        .uri("/stripeWebhook")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "Webhook Error: Missing Stripe-Signature header"
    );
}

#[tokio::test]
async fn test_stripe_disabled() {
    let app = app_with(None);

    let (status, body) = send_json(
        &app,
        callable(
            "/createPaymentIntent",
            None,
            json!({"amount": 4.99, "currency": "usd", "description": "TrackPro upgrade"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": {"status": "INTERNAL", "message": "Stripe service is disabled"}})
    );

    let (status, _) = send(
        &app,
        signed_webhook("{}", WEBHOOK_SECRET, Utc::now().timestamp()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_stripe_disabled_keeps_validation_and_auth_errors() {
    let app = app_with(None);

    let (status, body) = send_json(
        &app,
        callable("/confirmPayment", None, json!({"paymentIntentId": "pi_succeeded_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"error": {"status": "UNAUTHENTICATED", "message": "User must be authenticated"}})
    );

    let (status, body) = send_json(
        &app,
        callable("/createPaymentIntent", None, json!({"amount": 4.99})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": {
            "status": "INVALID_ARGUMENT",
            "message": "Missing required fields: amount, currency, description"
        }})
    );

    let (status, body) = send_json(
        &app,
        callable("/confirmPayment", Some(GOOD_TOKEN), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], "INVALID_ARGUMENT");
}
