//! Verification of Firebase Auth ID tokens presented by the mobile app.
//!
//! ID tokens are RS256 JWTs signed by `securetoken@system.gserviceaccount.com`. The
//! public keys are published as a JWK set and rotated regularly, so they are cached
//! and refetched when a token names an unknown key.

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};
use trackpro_common::{BoxedError, CallerIdentity, IdentityVerifier, HTTP_CLIENT};

use crate::error::FirebaseError;

pub const GOOGLE_SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const JWKS_TTL: Duration = Duration::from_secs(60 * 60);
/// Minimum age of the cached key set before an unknown `kid` may trigger a refetch.
const JWKS_MIN_REFRESH: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
}

pub struct FirebaseIdTokenVerifier {
    client: Client,
    project_id: String,
    jwks_url: String,
    keys: RwLock<Option<(JwkSet, Instant)>>,
}

impl FirebaseIdTokenVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            project_id: project_id.into(),
            jwks_url: GOOGLE_SECURETOKEN_JWKS_URL.to_string(),
            keys: RwLock::new(None),
        }
    }

    pub fn with_jwks_url(mut self, jwks_url: impl Into<String>) -> Self {
        self.jwks_url = jwks_url.into();
        self
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    async fn fetch_keys(&self) -> Result<JwkSet, FirebaseError> {
        info!("Fetching Firebase signing keys from {}", self.jwks_url);
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<JwkSet>().await?)
    }

    /// Returns the cached key set, refreshing it when stale.
    ///
    /// With `force`, a set younger than [`JWKS_MIN_REFRESH`] still counts as fresh,
    /// so tokens naming unknown keys cause at most one fetch per interval.
    async fn key_set(&self, force: bool) -> Result<JwkSet, FirebaseError> {
        let max_age = if force { JWKS_MIN_REFRESH } else { JWKS_TTL };
        if let Some((keys, fetched_at)) = self.keys.read().await.as_ref() {
            if fetched_at.elapsed() < max_age {
                return Ok(keys.clone());
            }
        }

        let mut cache = self.keys.write().await;
        // Another request may have refreshed while we waited for the lock
        if let Some((keys, fetched_at)) = cache.as_ref() {
            if fetched_at.elapsed() < max_age {
                return Ok(keys.clone());
            }
        }
        let keys = self.fetch_keys().await?;
        *cache = Some((keys.clone(), Instant::now()));
        Ok(keys)
    }

    pub async fn verify_token(&self, token: &str) -> Result<CallerIdentity, FirebaseError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(FirebaseError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| FirebaseError::InvalidToken("missing kid".to_string()))?;

        let jwk = match self.key_set(false).await?.find(&kid) {
            Some(jwk) => jwk.clone(),
            None => {
                debug!("Unknown signing key {}, refreshing key set", kid);
                self.key_set(true)
                    .await?
                    .find(&kid)
                    .cloned()
                    .ok_or_else(|| FirebaseError::InvalidToken(format!("unknown kid {}", kid)))?
            }
        };
        let key = DecodingKey::from_jwk(&jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let claims = decode::<IdTokenClaims>(token, &key, &validation)?.claims;
        if claims.sub.is_empty() || claims.sub.len() > 128 {
            return Err(FirebaseError::InvalidToken("invalid subject".to_string()));
        }
        Ok(CallerIdentity { uid: claims.sub })
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseIdTokenVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, BoxedError> {
        Ok(self.verify_token(token).await?)
    }
}
