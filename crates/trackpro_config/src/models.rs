// --- File: crates/trackpro_config/src/models.rs ---

use serde::{Deserialize, Serialize};

use crate::env_vars::SECRET_MARKER;

pub const DEFAULT_USERS_COLLECTION: &str = "users";
pub const DEFAULT_PAYMENTS_COLLECTION: &str = "payments";
pub const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
/// Matches the tolerance the official Stripe SDKs apply when constructing events.
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

// --- Stripe Config ---
// Both keys are normally "secret_from_env" in the config files and resolved from
// TRACKPRO_SECRET_STRIPE_* (or the legacy STRIPE_*) variables at load time.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    /// Override for the Stripe API origin, e.g. a local mock server.
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub webhook_tolerance_secs: Option<i64>,
}

impl StripeConfig {
    /// Both keys are set and neither is still the unresolved marker.
    pub fn has_credentials(&self) -> bool {
        [&self.secret_key, &self.webhook_secret]
            .iter()
            .all(|key| !key.trim().is_empty() && key.as_str() != SECRET_MARKER)
    }

    pub fn webhook_tolerance_secs(&self) -> i64 {
        self.webhook_tolerance_secs
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS)
    }
}

// --- Firebase Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    /// Path to the service account JSON used for Firestore access.
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub database_id: Option<String>,
    /// Override for the Firestore REST origin (emulator or tests).
    #[serde(default)]
    pub firestore_base: Option<String>,
    #[serde(default)]
    pub users_collection: Option<String>,
    #[serde(default)]
    pub payments_collection: Option<String>,
}

impl FirebaseConfig {
    pub fn database_id(&self) -> &str {
        self.database_id
            .as_deref()
            .unwrap_or(DEFAULT_FIRESTORE_DATABASE)
    }

    pub fn users_collection(&self) -> &str {
        self.users_collection
            .as_deref()
            .unwrap_or(DEFAULT_USERS_COLLECTION)
    }

    pub fn payments_collection(&self) -> &str {
        self.payments_collection
            .as_deref()
            .unwrap_or(DEFAULT_PAYMENTS_COLLECTION)
    }
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Minimum level for the `trackpro` targets, e.g. "info" or "debug".
    #[serde(default)]
    pub level: Option<String>,
    /// When set, logs are additionally written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub journald: bool,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_stripe: bool,
    #[serde(default)]
    pub use_firestore: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub stripe: Option<StripeConfig>,
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl AppConfig {
    /// Stripe settings, only when the runtime flag is on and the section carries
    /// usable credentials.
    pub fn stripe_enabled(&self) -> Option<&StripeConfig> {
        self.stripe
            .as_ref()
            .filter(|stripe| self.use_stripe && stripe.has_credentials())
    }

    pub fn users_collection(&self) -> &str {
        self.firebase
            .as_ref()
            .map(FirebaseConfig::users_collection)
            .unwrap_or(DEFAULT_USERS_COLLECTION)
    }

    pub fn payments_collection(&self) -> &str {
        self.firebase
            .as_ref()
            .map(FirebaseConfig::payments_collection)
            .unwrap_or(DEFAULT_PAYMENTS_COLLECTION)
    }
}
