//! OAuth2 access tokens for the Firestore REST API.
//!
//! Tokens are minted from a service account key file and cached until shortly
//! before Google would expire them.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};

use crate::error::FirebaseError;

/// OAuth scope for Cloud Firestore.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Google issues one-hour tokens; refresh a little early.
const TOKEN_LIFETIME: Duration = Duration::from_secs(50 * 60);

/// Source of bearer tokens for outbound Firestore requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, FirebaseError>;
}

/// Obtains tokens for a service account key file.
pub struct ServiceAccountTokenProvider {
    key_path: PathBuf,
    cached: Mutex<Option<(String, Instant)>>,
}

impl ServiceAccountTokenProvider {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch_token(&self) -> Result<String, FirebaseError> {
        let sa_key = read_service_account_key(Path::new(&self.key_path))
            .await
            .map_err(|e| {
                FirebaseError::AuthError(format!(
                    "Failed to read service account key {}: {}",
                    self.key_path.display(),
                    e
                ))
            })?;

        let auth = ServiceAccountAuthenticator::builder(sa_key)
            .build()
            .await
            .map_err(|e| FirebaseError::AuthError(e.to_string()))?;

        let auth_token = auth
            .token(&[DATASTORE_SCOPE])
            .await
            .map_err(|e| FirebaseError::AuthError(e.to_string()))?;

        match auth_token.token() {
            Some(token) => Ok(token.to_string()),
            None => Err(FirebaseError::AuthError("No token available".to_string())),
        }
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String, FirebaseError> {
        // Held across the fetch so concurrent requests don't all hit the token endpoint
        let mut cached = self.cached.lock().await;
        if let Some((token, fetched_at)) = cached.as_ref() {
            if fetched_at.elapsed() < TOKEN_LIFETIME {
                return Ok(token.clone());
            }
        }
        debug!("Refreshing Firestore access token");
        let token = self.fetch_token().await?;
        *cached = Some((token.clone(), Instant::now()));
        Ok(token)
    }
}

/// A fixed token, for the Firestore emulator and tests.
pub struct StaticTokenProvider(pub String);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, FirebaseError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_file_is_auth_error() {
        let provider = ServiceAccountTokenProvider::new("/nonexistent/service-account.json");
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, FirebaseError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticTokenProvider("owner".into());
        assert_eq!(provider.access_token().await.unwrap(), "owner");
    }
}
