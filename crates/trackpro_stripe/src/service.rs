// --- File: crates/trackpro_stripe/src/service.rs ---
use async_trait::async_trait;
use reqwest::Client;
use trackpro_common::{
    BoxedError, CreateIntentParams, PaymentGateway, PaymentIntent, WebhookEvent, HTTP_CLIENT,
};
use trackpro_config::StripeConfig;

use crate::logic::{self, DEFAULT_API_BASE};

/// Stripe implementation of [`PaymentGateway`].
#[derive(Clone)]
pub struct StripePaymentGateway {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl StripePaymentGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            secret_key: secret_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn from_config(config: &StripeConfig) -> Self {
        let gateway = Self::new(config.secret_key.clone());
        match config.api_base.as_deref() {
            Some(base) => gateway.with_base_url(base),
            None => gateway,
        }
    }

    /// Point the gateway at another API origin (mock servers in tests).
    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn create_intent(&self, params: CreateIntentParams) -> Result<PaymentIntent, BoxedError> {
        Ok(
            logic::create_payment_intent(&self.client, &self.api_base, &self.secret_key, &params)
                .await?,
        )
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, BoxedError> {
        Ok(
            logic::retrieve_payment_intent(&self.client, &self.api_base, &self.secret_key, id)
                .await?,
        )
    }

    fn construct_event(
        &self,
        payload: &[u8],
        signature: &str,
        secret: &str,
        tolerance_secs: i64,
    ) -> Result<WebhookEvent, BoxedError> {
        Ok(logic::construct_event(payload, Some(signature), secret, tolerance_secs)?.into())
    }
}
