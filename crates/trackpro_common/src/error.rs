// --- File: crates/trackpro_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The error type returned by every callable handler.
///
/// Variants follow the canonical status codes of the callable protocol; the
/// message is what the mobile client receives verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackProError {
    /// A required request field is missing or malformed
    #[error("{0}")]
    InvalidArgument(String),

    /// The handler requires a caller identity and none (or an invalid one) was presented
    #[error("{0}")]
    Unauthenticated(String),

    /// The request is well-formed but the system is not in the required state
    #[error("{0}")]
    FailedPrecondition(String),

    /// Unexpected failure in a collaborator (payment gateway, document store, ...)
    #[error("{0}")]
    Internal(String),
}

impl TrackProError {
    /// Canonical status string used in the callable error envelope.
    pub fn status(&self) -> &'static str {
        match self {
            TrackProError::InvalidArgument(_) => "INVALID_ARGUMENT",
            TrackProError::Unauthenticated(_) => "UNAUTHENTICATED",
            TrackProError::FailedPrecondition(_) => "FAILED_PRECONDITION",
            TrackProError::Internal(_) => "INTERNAL",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TrackProError::InvalidArgument(m)
            | TrackProError::Unauthenticated(m)
            | TrackProError::FailedPrecondition(m)
            | TrackProError::Internal(m) => m,
        }
    }
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for TrackProError {
    fn status_code(&self) -> u16 {
        match self {
            TrackProError::InvalidArgument(_) => 400,
            TrackProError::FailedPrecondition(_) => 400,
            TrackProError::Unauthenticated(_) => 401,
            TrackProError::Internal(_) => 500,
        }
    }
}

/// Re-signal a collaborator failure as an internal error, keeping its message.
pub trait Context<T> {
    fn context<C>(self, context: C) -> Result<T, TrackProError>
    where
        C: fmt::Display;
}

impl<T, E: fmt::Display> Context<T> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, TrackProError>
    where
        C: fmt::Display,
    {
        self.map_err(|error| TrackProError::Internal(format!("{}: {}", context, error)))
    }
}

pub fn invalid_argument<T: fmt::Display>(message: T) -> TrackProError {
    TrackProError::InvalidArgument(message.to_string())
}

pub fn unauthenticated<T: fmt::Display>(message: T) -> TrackProError {
    TrackProError::Unauthenticated(message.to_string())
}

pub fn failed_precondition<T: fmt::Display>(message: T) -> TrackProError {
    TrackProError::FailedPrecondition(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> TrackProError {
    TrackProError::Internal(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(invalid_argument("x").status_code(), 400);
        assert_eq!(failed_precondition("x").status_code(), 400);
        assert_eq!(unauthenticated("x").status_code(), 401);
        assert_eq!(internal_error("x").status_code(), 500);
        assert_eq!(failed_precondition("x").status(), "FAILED_PRECONDITION");
    }

    #[test]
    fn test_context_keeps_original_message() {
        let result: Result<(), String> = Err("card_declined".to_string());
        let err = result.context("Failed to create payment intent").unwrap_err();
        assert_eq!(
            err,
            TrackProError::Internal("Failed to create payment intent: card_declined".to_string())
        );
    }
}
