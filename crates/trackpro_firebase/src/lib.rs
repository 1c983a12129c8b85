//! Firebase integration for TrackPro
//!
//! This crate provides the two Firebase services the payment handlers depend on:
//!
//! - A Cloud Firestore client speaking the v1 REST API, implementing
//!   [`trackpro_common::DocumentStore`]. Requests are authenticated with OAuth2
//!   tokens minted from a service account key file.
//! - A Firebase Auth ID token verifier implementing
//!   [`trackpro_common::IdentityVerifier`], checking RS256 signatures against
//!   Google's published keys plus audience and issuer for the project.
//!
//! # Example
//!
//! ```rust,no_run
//! use trackpro_config::FirebaseConfig;
//! use trackpro_firebase::{FirebaseIdTokenVerifier, FirestoreClient};
//!
//! fn build(config: &FirebaseConfig) -> Result<(), trackpro_firebase::FirebaseError> {
//!     let store = FirestoreClient::from_config(config)?;
//!     let verifier = FirebaseIdTokenVerifier::new(config.project_id.clone());
//!     # let _ = (store, verifier);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod firestore;
pub mod id_token;
pub mod value;

pub use auth::{ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
pub use error::FirebaseError;
pub use firestore::FirestoreClient;
pub use id_token::FirebaseIdTokenVerifier;
