use serde_json::json;
use std::collections::HashMap;
use trackpro_common::{CreateIntentParams, PaymentGateway, PaymentIntentStatus};
use trackpro_stripe::StripePaymentGateway;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> StripePaymentGateway {
    StripePaymentGateway::new("sk_test_123").with_base_url(server.uri())
}

#[tokio::test]
async fn test_create_intent_sends_form_encoded_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(basic_auth("sk_test_123", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "object": "payment_intent",
            "status": "requires_payment_method",
            "amount": 499,
            "currency": "usd",
            "client_secret": "pi_123_secret_abc",
            "customer": null,
            "metadata": {"userId": "uid-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let intent = gateway(&server)
        .create_intent(CreateIntentParams {
            amount_minor: 499,
            currency: "USD".into(),
            description: "TrackPro upgrade".into(),
            metadata: vec![
                ("userId".into(), "uid-1".into()),
                ("timestamp".into(), "2025-01-01T00:00:00.000Z".into()),
            ],
        })
        .await
        .unwrap();

    assert_eq!(intent.id, "pi_123");
    assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
    assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);

    let requests = server.received_requests().await.unwrap();
    let form: HashMap<String, String> = serde_urlencoded::from_bytes(&requests[0].body).unwrap();
    assert_eq!(form["amount"], "499");
    assert_eq!(form["currency"], "usd");
    assert_eq!(form["description"], "TrackPro upgrade");
    assert_eq!(form["automatic_payment_methods[enabled]"], "true");
    assert_eq!(form["metadata[userId]"], "uid-1");
    assert_eq!(form["metadata[timestamp]"], "2025-01-01T00:00:00.000Z");
}

#[tokio::test]
async fn test_retrieve_intent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/payment_intents/pi_456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_456",
            "status": "succeeded",
            "amount": 1500,
            "currency": "kwd",
            "customer": "cus_789"
        })))
        .mount(&server)
        .await;

    let intent = gateway(&server).retrieve_intent("pi_456").await.unwrap();
    assert_eq!(intent.status, PaymentIntentStatus::Succeeded);
    assert_eq!(intent.customer.as_deref(), Some("cus_789"));
    assert_eq!(intent.amount, 1500);
}

#[tokio::test]
async fn test_api_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/payment_intents/pi_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "message": "No such payment_intent: 'pi_missing'"
            }
        })))
        .mount(&server)
        .await;

    let err = gateway(&server).retrieve_intent("pi_missing").await.unwrap_err();
    assert_eq!(err.to_string(), "No such payment_intent: 'pi_missing'");
}

#[tokio::test]
async fn test_invalid_id_never_reaches_stripe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(gateway(&server).retrieve_intent("../v1/customers").await.is_err());
}
