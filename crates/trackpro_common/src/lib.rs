// --- File: crates/trackpro_common/src/lib.rs ---

pub mod error; // Error handling
pub mod http; // Callable wire protocol
pub mod logging; // Logging utilities
pub mod memory_store; // In-memory document store
pub mod models; // Stored records
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    failed_precondition, internal_error, invalid_argument, unauthenticated, Context,
    HttpStatusCode, TrackProError,
};

// Re-export HTTP utilities for easier access
pub use http::{
    bearer_token, callable_data, callable_payload,
    client::{create_client, HTTP_CLIENT},
    CallableResult,
};

pub use memory_store::MemoryDocumentStore;
pub use models::{Document, EntitlementRecord, FieldValue, Fields, PaymentLogEntry, ProActivation};
pub use services::{
    BoxedError, CallerIdentity, CreateIntentParams, DocumentStore, IdentityVerifier,
    PaymentGateway, PaymentIntent, PaymentIntentStatus, WebhookEvent,
};
