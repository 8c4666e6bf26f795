//! Per-call request configuration.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::{Headers, HttpMethod};

/// Query parameters in insertion order.
pub type Params = Map<String, Value>;

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Sent exactly as given.
    Raw(String),
    /// Encoded to JSON text when the request is built. `Value::Null` sends no
    /// body; a `Value::String` is already text and is sent unquoted.
    Json(Value),
}

/// Options for a single `ApiClient::fetch` call.
///
/// Every field is optional; `RequestOptions::default()` is a bare GET.
/// - `method`: HTTP verb, GET when not set.
/// - `headers`: caller headers. `Content-Type`, `Accept`, `App-Domain` and
///   `API-TOKEN` are always overwritten by the client.
/// - `body`: see [`Body`].
/// - `params`: flattened into the query string by [`crate::query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Option<Headers>,
    pub body: Option<Body>,
    pub params: Option<Params>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(Headers::new).set(name, value);
        self
    }

    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::Raw(body.into()));
        self
    }

    pub fn json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.body = Some(Body::Json(value));
        Ok(self)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }
}

impl Body {
    /// Text to put on the wire, if any.
    pub fn encode(&self) -> Result<Option<String>, ApiError> {
        match self {
            Body::Raw(text) => Ok(Some(text.clone())),
            Body::Json(Value::Null) => Ok(None),
            Body::Json(Value::String(text)) => Ok(Some(text.clone())),
            Body::Json(value) => serde_json::to_string(value)
                .map(Some)
                .map_err(|e| ApiError::Serialization(e.to_string())),
        }
    }
}
