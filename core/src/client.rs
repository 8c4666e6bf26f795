//! Authenticated HTTP client for the storefront API.
//!
//! # Design
//! `ApiClient` owns its configuration, a `Transport` and a shared
//! `SessionProvider`, and keeps no state between calls. Every request goes
//! through `build_request`, which produces a plain `HttpRequest`:
//!
//! 1. caller headers are kept (an empty collection if none were given);
//! 2. `API-TOKEN` is set from the session's token or API key, if any;
//! 3. `Content-Type`, `Accept` and `App-Domain` are always set;
//! 4. JSON bodies are encoded to text, raw bodies are left alone;
//! 5. `params` are flattened onto the URI and the URI joined onto `base_url`.
//!
//! `try_fetch` reports every failure. `fetch` keeps the app's historical
//! contract of dropping authorization failures: they are logged and come back
//! as `Ok(None)`.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use serde_json::Value;
use ureq::http::StatusCode;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};
use crate::options::RequestOptions;
use crate::query::build_query_string;
use crate::session::SessionProvider;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Collection, Invoice, NewInvoice, OrderQuery, Product, SalesOrder};

/// Structured linked-data JSON.
pub const LD_JSON: &str = "application/ld+json";
pub const TOKEN_HEADER: &str = "API-TOKEN";
pub const DOMAIN_HEADER: &str = "App-Domain";

/// Bytes that may not appear raw in a request target. `%` is left alone so
/// values the caller already encoded go out unchanged.
const URI_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// Body fields the API puts human-readable error messages in, by priority.
const MESSAGE_FIELDS: [&str; 4] = ["hydra:description", "message", "detail", "error"];

pub struct ApiClient<T> {
    base_url: String,
    domain: String,
    transport: T,
    sessions: Arc<dyn SessionProvider>,
}

impl ApiClient<UreqTransport> {
    /// Client over the default blocking transport, honouring `timeout_secs`.
    pub fn from_config(config: &ClientConfig, sessions: Arc<dyn SessionProvider>) -> Self {
        Self::new(config, UreqTransport::new(config.timeout()), sessions)
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: &ClientConfig, transport: T, sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            domain: config.domain.clone(),
            transport,
            sessions,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The credential to send as `API-TOKEN`, if a session is available.
    pub async fn get_token(&self) -> Option<String> {
        let session = self.sessions.session().await?;
        session.credential().map(str::to_string)
    }

    pub async fn build_request(
        &self,
        uri: &str,
        mut options: RequestOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = options.headers.take().unwrap_or_else(Headers::new);

        if let Some(token) = self.get_token().await {
            headers.set(TOKEN_HEADER, token);
        }
        headers.set("Content-Type", LD_JSON);
        headers.set("Accept", LD_JSON);
        headers.set(DOMAIN_HEADER, self.domain.as_str());

        let body = match &options.body {
            Some(body) => body.encode()?,
            None => None,
        };

        let uri = build_query_string(uri, &options);

        Ok(HttpRequest {
            method: options.method,
            path: self.resolve(&uri),
            headers,
            body,
        })
    }

    /// Send a request; non-2xx responses become errors.
    pub async fn try_fetch(
        &self,
        uri: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(uri, options).await?;
        tracing::debug!(method = request.method.as_str(), path = %request.path, "dispatching request");

        let response = self.transport.request(request).await?;
        if response.is_success() {
            return Ok(response);
        }
        let message = rejection_message(&response);
        Err(ApiError::from_rejection(response.status, message, response.body))
    }

    /// Like `try_fetch`, but authorization failures resolve to `Ok(None)`.
    pub async fn fetch(
        &self,
        uri: &str,
        options: RequestOptions,
    ) -> Result<Option<HttpResponse>, ApiError> {
        match self.try_fetch(uri, options).await {
            Ok(response) => Ok(Some(response)),
            Err(ApiError::Unauthorized { status, message }) => {
                tracing::warn!(uri, status, %message, "request rejected as unauthorized; dropping response");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// POST `body` as JSON through `fetch`.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        uri: &str,
        body: &B,
    ) -> Result<Option<HttpResponse>, ApiError> {
        let options = post_options(body)?;
        self.fetch(uri, options).await
    }

    /// POST an empty JSON object through `fetch`.
    pub async fn post_empty(&self, uri: &str) -> Result<Option<HttpResponse>, ApiError> {
        self.post(uri, &serde_json::json!({})).await
    }

    /// POST `body` as JSON through `try_fetch`.
    pub async fn try_post<B: Serialize + ?Sized>(
        &self,
        uri: &str,
        body: &B,
    ) -> Result<HttpResponse, ApiError> {
        let options = post_options(body)?;
        self.try_fetch(uri, options).await
    }

    /// Hand a raw request straight to the transport. No headers, token or
    /// base URL are applied.
    pub async fn execute(&self, raw: T::Raw) -> Result<T::RawResponse, ApiError> {
        Ok(self.transport.execute(raw).await?)
    }

    pub async fn list_products(&self) -> Result<Collection<Product>, ApiError> {
        self.try_fetch("/products", RequestOptions::new()).await?.json()
    }

    pub async fn list_sales_orders(
        &self,
        query: &OrderQuery,
    ) -> Result<Collection<SalesOrder>, ApiError> {
        let mut options = RequestOptions::new()
            .param("page", query.page)
            .param("itemsPerPage", query.items_per_page);
        if let Some(provider) = &query.provider {
            options = options.param("provider", provider.as_str());
        }
        for (i, status) in query.statuses.iter().enumerate() {
            options = options.param(format!("status[{i}]"), *status);
        }
        self.try_fetch("/orders", options).await?.json()
    }

    pub async fn create_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, ApiError> {
        self.try_post("/invoices", invoice).await?.json()
    }

    /// Join `uri` onto the base URL and percent-encode what a URI cannot
    /// carry raw (spaces, non-ASCII). Brackets, `/` and `=` stay literal.
    fn resolve(&self, uri: &str) -> String {
        let target = if uri.starts_with("http://") || uri.starts_with("https://") {
            uri.to_string()
        } else {
            format!("{}/{}", self.base_url, uri.trim_start_matches('/'))
        };
        utf8_percent_encode(&target, URI_UNSAFE).to_string()
    }
}

fn post_options<B: Serialize + ?Sized>(body: &B) -> Result<RequestOptions, ApiError> {
    RequestOptions::new().method(HttpMethod::Post).json_body(body)
}

/// Pull an error message out of a rejected response, falling back to the
/// status' reason phrase.
fn rejection_message(response: &HttpResponse) -> String {
    let from_body = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|value| {
            MESSAGE_FIELDS
                .iter()
                .find_map(|field| value.get(*field).and_then(Value::as_str).map(str::to_string))
        });
    from_body.unwrap_or_else(|| {
        StatusCode::from_u16(response.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown Status")
            .to_string()
    })
}
