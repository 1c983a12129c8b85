// --- File: crates/trackpro_common/src/http.rs ---
//! Callable wire protocol.
//!
//! Requests are `POST {"data": ...}`; replies are `{"result": ...}` on success and
//! `{"error": {"status": "...", "message": "..."}}` otherwise.

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::error::{invalid_argument, HttpStatusCode, TrackProError};

pub mod client;

impl IntoResponse for TrackProError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": {
                "status": self.status(),
                "message": self.message(),
            }
        }));
        (status_code, body).into_response()
    }
}

/// Successful callable reply, serialized as `{"result": T}`.
#[derive(Debug, Serialize)]
pub struct CallableResult<T: Serialize> {
    pub result: T,
}

impl<T: Serialize> CallableResult<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

impl<T: Serialize> IntoResponse for CallableResult<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Extracts the `data` member of a callable request body.
///
/// A `null` payload is normalized to an empty object so that handlers see
/// "missing field" rather than "wrong type".
pub fn callable_data(body: &[u8]) -> Result<Value, TrackProError> {
    let envelope: Value = serde_json::from_slice(body)
        .map_err(|e| invalid_argument(format!("Bad Request: body is not valid JSON ({e})")))?;
    match envelope {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Null) => Ok(Value::Object(Default::default())),
            Some(data) => Ok(data),
            None => Err(invalid_argument("Bad Request: missing \"data\" in request body")),
        },
        _ => Err(invalid_argument("Bad Request: request body must be an object")),
    }
}

/// Extracts and deserializes the `data` member of a callable request body.
pub fn callable_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, TrackProError> {
    let data = callable_data(body)?;
    serde_json::from_value(data).map_err(|e| invalid_argument(format!("Bad Request: {e}")))
}

/// Returns the bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
