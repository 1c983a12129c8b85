use thiserror::Error;
use trackpro_common::BoxedError;

/// Errors that can occur when talking to Firestore or verifying Firebase ID tokens
#[derive(Error, Debug)]
pub enum FirebaseError {
    /// Error during authentication with Google
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error during HTTP request to a Google API
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Missing required configuration
    #[error("Missing configuration: {0}")]
    ConfigError(String),

    /// Error returned by the Firestore API
    #[error("Firestore API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// Unexpected response shape
    #[error("Failed to parse Firestore response: {0}")]
    ParseError(String),

    /// Document or collection id that would escape its path segment
    #[error("Invalid document path segment: {0:?}")]
    InvalidPath(String),

    /// The presented ID token is not valid for this project
    #[error("Invalid ID token: {0}")]
    InvalidToken(String),
}

impl From<serde_json::Error> for FirebaseError {
    fn from(err: serde_json::Error) -> Self {
        FirebaseError::ParseError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for FirebaseError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        FirebaseError::InvalidToken(err.to_string())
    }
}

impl From<FirebaseError> for BoxedError {
    fn from(err: FirebaseError) -> Self {
        BoxedError(Box::new(err))
    }
}
