//! Firestore REST client implementing [`DocumentStore`].

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode, Url};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use trackpro_common::{BoxedError, Document, DocumentStore, FieldValue, Fields, HTTP_CLIENT};
use trackpro_config::FirebaseConfig;

use crate::auth::{ServiceAccountTokenProvider, TokenProvider};
use crate::error::FirebaseError;
use crate::value::{decode_document, encode_fields, field_path};

pub const DEFAULT_FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";

/// Client for the Firestore v1 REST API of a single database.
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    database_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl FirestoreClient {
    pub fn new(
        project_id: impl Into<String>,
        database_id: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            base_url: DEFAULT_FIRESTORE_BASE.to_string(),
            project_id: project_id.into(),
            database_id: database_id.into(),
            tokens,
        }
    }

    /// Builds a client authenticated with the configured service account key.
    pub fn from_config(config: &FirebaseConfig) -> Result<Self, FirebaseError> {
        let key_path = config.key_path.as_deref().ok_or_else(|| {
            FirebaseError::ConfigError("Missing key_path in FirebaseConfig".to_string())
        })?;
        let client = Self::new(
            config.project_id.clone(),
            config.database_id(),
            Arc::new(ServiceAccountTokenProvider::new(key_path)),
        );
        Ok(match config.firestore_base.as_deref() {
            Some(base) => client.with_base_url(base),
            None => client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `projects/{p}/databases/{db}/documents`
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    fn document_name(&self, collection: &str, id: &str) -> Result<String, FirebaseError> {
        for segment in [collection, id] {
            if segment.is_empty() || segment.contains('/') || segment == "." || segment == ".." {
                return Err(FirebaseError::InvalidPath(segment.to_string()));
            }
        }
        Ok(format!("{}/{}/{}", self.documents_root(), collection, id))
    }

    /// REST URL of a document. Each path segment is percent-encoded, so ids
    /// containing `?`, `#`, `%` or spaces stay inside their segment.
    fn document_url(&self, collection: &str, id: &str) -> Result<Url, FirebaseError> {
        self.document_name(collection, id)?;
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            FirebaseError::ConfigError(format!("Invalid Firestore base URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FirebaseError::ConfigError(format!("Firestore base URL {} cannot have a path", self.base_url))
            })?
            .pop_if_empty()
            .extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                self.database_id.as_str(),
                "documents",
                collection,
                id,
            ]);
        Ok(url)
    }

    async fn bearer(&self) -> Result<String, FirebaseError> {
        Ok(format!("Bearer {}", self.tokens.access_token().await?))
    }

    /// Reads a document, `None` on 404.
    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, FirebaseError> {
        let url = self.document_url(collection, id)?;
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, self.bearer().await?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Firestore document {}/{} not found", collection, id);
            return Ok(None);
        }
        let resource = read_json(response).await?;
        decode_document(&resource).map(Some)
    }

    /// Applies a single write through `documents:commit`.
    pub async fn commit(&self, write: Value) -> Result<(), FirebaseError> {
        let url = format!("{}/{}:commit", self.base_url, self.documents_root());
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, self.bearer().await?)
            .json(&json!({ "writes": [write] }))
            .send()
            .await?;
        read_json(response).await.map(|_| ())
    }
}

/// Merge write: only the named fields are touched, sentinels become REQUEST_TIME transforms.
pub fn merge_write(name: String, fields: &Fields) -> Value {
    let mask: Vec<String> = fields
        .iter()
        .filter(|(_, value)| !matches!(value, FieldValue::ServerTimestamp))
        .map(|(field_name, _)| field_path(field_name))
        .collect();
    let mut write = json!({
        "update": { "name": name, "fields": encode_fields(fields) },
        "updateMask": { "fieldPaths": mask },
    });
    let transforms = server_timestamp_transforms(fields);
    if !transforms.is_empty() {
        write["updateTransforms"] = Value::Array(transforms);
    }
    write
}

/// Create-only write of a complete document.
pub fn create_write(name: String, fields: &Fields) -> Value {
    let mut write = json!({
        "update": { "name": name, "fields": encode_fields(fields) },
        "currentDocument": { "exists": false },
    });
    let transforms = server_timestamp_transforms(fields);
    if !transforms.is_empty() {
        write["updateTransforms"] = Value::Array(transforms);
    }
    write
}

fn server_timestamp_transforms(fields: &Fields) -> Vec<Value> {
    fields
        .iter()
        .filter(|(_, value)| matches!(value, FieldValue::ServerTimestamp))
        .map(|(name, _)| json!({ "fieldPath": field_path(name), "setToServerValue": "REQUEST_TIME" }))
        .collect()
}

async fn read_json(response: Response) -> Result<Value, FirebaseError> {
    let status = response.status();
    let body_text = response.text().await?;
    if status.is_success() {
        return Ok(serde_json::from_str(&body_text)?);
    }
    let message = serde_json::from_str::<Value>(&body_text)
        .ok()
        .and_then(|body| {
            body.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body_text);
    warn!("Firestore request failed with HTTP status {}: {}", status, message);
    Err(FirebaseError::ApiError {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BoxedError> {
        Ok(self.get_document(collection, id).await?)
    }

    async fn upsert_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), BoxedError> {
        let name = self.document_name(collection, id)?;
        Ok(self.commit(merge_write(name, &fields)).await?)
    }

    async fn append(&self, collection: &str, fields: Fields) -> Result<String, BoxedError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let name = self.document_name(collection, &id)?;
        self.commit(create_write(name, &fields)).await?;
        Ok(id)
    }
}
