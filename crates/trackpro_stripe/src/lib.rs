// --- File: crates/trackpro_stripe/src/lib.rs ---

pub mod currency;
pub mod error;
pub mod logic;
pub mod service;

pub use currency::to_minor_units;
pub use error::StripeError; // Re-export the error type
pub use logic::SIGNATURE_HEADER;
pub use service::StripePaymentGateway; // Re-export the payment gateway
