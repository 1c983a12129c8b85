// --- File: crates/trackpro_payments/src/lib.rs ---

pub mod doc;
pub mod handlers;
pub mod logic;
pub mod models;
pub mod routes;

// Re-export for main backend
pub use handlers::{PaymentsState, WebhookSettings};
pub use logic::Collections;
pub use routes::routes;
