// --- File: crates/trackpro_common/src/models.rs ---
//! Document-store records written and read by the payment handlers.
//!
//! Field names are camelCase because the mobile app reads the same documents
//! directly.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A single typed value in a stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Write-only sentinel; the store replaces it with its own commit time.
    ServerTimestamp,
}

impl FieldValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// Named fields of a document, ordered for stable encoding.
pub type Fields = BTreeMap<String, FieldValue>;

/// A document as read back from the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// Stored field names.
pub mod field {
    pub const IS_PRO: &str = "isPro";
    pub const PRO_ACTIVATED_AT: &str = "proActivatedAt";
    pub const PAYMENT_INTENT_ID: &str = "paymentIntentId";
    pub const STRIPE_CUSTOMER_ID: &str = "stripeCustomerId";
    pub const LAST_UPDATED: &str = "lastUpdated";

    pub const USER_ID: &str = "userId";
    pub const AMOUNT: &str = "amount";
    pub const CURRENCY: &str = "currency";
    pub const STATUS: &str = "status";
    pub const TIMESTAMP: &str = "timestamp";
}

/// Literal status stored on every payment log entry.
pub const PAYMENT_STATUS_SUCCEEDED: &str = "succeeded";

/// Per-user entitlement, keyed by the authenticated user id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntitlementRecord {
    pub is_pro: bool,
    pub pro_activated_at: Option<DateTime<Utc>>,
    pub payment_intent_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl EntitlementRecord {
    /// Reads a record leniently: missing or mistyped fields fall back to defaults,
    /// so `is_pro` is false unless the document holds a literal `true`.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            is_pro: doc
                .get(field::IS_PRO)
                .and_then(FieldValue::as_bool)
                .unwrap_or(false),
            pro_activated_at: doc
                .get(field::PRO_ACTIVATED_AT)
                .and_then(FieldValue::as_timestamp),
            payment_intent_id: doc
                .get(field::PAYMENT_INTENT_ID)
                .and_then(FieldValue::as_str)
                .map(str::to_string),
            stripe_customer_id: doc
                .get(field::STRIPE_CUSTOMER_ID)
                .and_then(FieldValue::as_str)
                .map(str::to_string),
            last_updated: doc
                .get(field::LAST_UPDATED)
                .and_then(FieldValue::as_timestamp),
        }
    }
}

/// The merge-upsert applied to an entitlement record when a payment is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProActivation {
    pub payment_intent_id: String,
    pub stripe_customer_id: Option<String>,
    /// Writes `proActivatedAt` only when true.
    pub first_activation: bool,
}

impl ProActivation {
    pub fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(field::IS_PRO.into(), FieldValue::Bool(true));
        fields.insert(
            field::PAYMENT_INTENT_ID.into(),
            FieldValue::String(self.payment_intent_id),
        );
        if let Some(customer) = self.stripe_customer_id {
            fields.insert(field::STRIPE_CUSTOMER_ID.into(), FieldValue::String(customer));
        }
        if self.first_activation {
            fields.insert(field::PRO_ACTIVATED_AT.into(), FieldValue::ServerTimestamp);
        }
        fields.insert(field::LAST_UPDATED.into(), FieldValue::ServerTimestamp);
        fields
    }
}

/// Append-only audit entry, one per successful confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLogEntry {
    pub user_id: String,
    pub payment_intent_id: String,
    /// Minor units, as reported by the payment processor.
    pub amount: i64,
    pub currency: String,
}

impl PaymentLogEntry {
    pub fn into_fields(self) -> Fields {
        Fields::from([
            (field::USER_ID.to_string(), FieldValue::String(self.user_id)),
            (
                field::PAYMENT_INTENT_ID.to_string(),
                FieldValue::String(self.payment_intent_id),
            ),
            (field::AMOUNT.to_string(), FieldValue::Integer(self.amount)),
            (field::CURRENCY.to_string(), FieldValue::String(self.currency)),
            (
                field::STATUS.to_string(),
                FieldValue::from(PAYMENT_STATUS_SUCCEEDED),
            ),
            (field::TIMESTAMP.to_string(), FieldValue::ServerTimestamp),
        ])
    }
}
