// --- File: crates/services/trackpro_backend/src/app_state.rs ---
use std::sync::Arc;
use tracing::{info, warn};
use trackpro_common::{DocumentStore, IdentityVerifier, MemoryDocumentStore, PaymentGateway};
use trackpro_config::AppConfig;
use trackpro_firebase::{FirebaseError, FirebaseIdTokenVerifier, FirestoreClient};
use trackpro_payments::{Collections, PaymentsState, WebhookSettings};
use trackpro_stripe::StripePaymentGateway;

/// Builds the handler state from configuration.
///
/// Stripe and the identity verifier are optional; Firestore, when enabled, must be
/// fully configured or startup fails.
pub fn build_payments_state(config: &AppConfig) -> Result<PaymentsState, FirebaseError> {
    let (gateway, webhook) = match config.stripe_enabled() {
        Some(stripe) => {
            info!("Stripe enabled");
            let gateway: Arc<dyn PaymentGateway> =
                Arc::new(StripePaymentGateway::from_config(stripe));
            (Some(gateway), Some(WebhookSettings::from(stripe)))
        }
        None => {
            warn!("Stripe is disabled; payment callables will fail and webhooks answer 503");
            (None, None)
        }
    };

    let store: Arc<dyn DocumentStore> = if config.use_firestore {
        let firebase = config.firebase.as_ref().ok_or_else(|| {
            FirebaseError::ConfigError("use_firestore requires a [firebase] section".to_string())
        })?;
        info!(
            "Using Firestore database {} in project {}",
            firebase.database_id(),
            firebase.project_id
        );
        Arc::new(FirestoreClient::from_config(firebase)?)
    } else {
        warn!("Firestore is disabled; entitlements are kept in memory and lost on restart");
        Arc::new(MemoryDocumentStore::new())
    };

    let verifier: Option<Arc<dyn IdentityVerifier>> = match config.firebase.as_ref() {
        Some(firebase) => Some(Arc::new(FirebaseIdTokenVerifier::new(
            firebase.project_id.clone(),
        ))),
        None => {
            warn!("No Firebase project configured; every caller is treated as anonymous");
            None
        }
    };

    Ok(PaymentsState {
        gateway,
        store,
        verifier,
        webhook,
        collections: Collections {
            users: config.users_collection().to_string(),
            payments: config.payments_collection().to_string(),
        },
    })
}
