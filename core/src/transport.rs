//! The I/O seam between `ApiClient` and the network.
//!
//! # Design
//! A `Transport` turns an `HttpRequest` into an `HttpResponse` and reports
//! only failures where no response exists (connection refused, timeout,
//! unreadable body). Status codes are data; interpreting them is the
//! client's job.
//!
//! `execute` is the raw escape hatch: it takes and returns whatever the
//! underlying HTTP library speaks, bypassing header and token handling.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use ureq::http::{Request, Response};
use ureq::{Agent, RequestBuilder};

use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};

/// Failures that prevented a response from being received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be formed, e.g. its URI is not valid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("transport worker failed: {0}")]
    Join(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Request type accepted by `execute`.
    type Raw: Send + 'static;
    /// Response type produced by `execute`.
    type RawResponse: Send + 'static;

    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    async fn execute(&self, raw: Self::Raw) -> Result<Self::RawResponse, TransportError>;
}

/// Blocking `ureq` agent driven from tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Transport for UreqTransport {
    type Raw = Request<String>;
    type RawResponse = Response<String>;

    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || send_blocking(&agent, request))
            .await
            .map_err(|e| TransportError::Join(e.to_string()))?
    }

    async fn execute(&self, raw: Request<String>) -> Result<Response<String>, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || {
            let response = agent.run(raw).map_err(classify)?;
            let (parts, mut body) = response.into_parts();
            let text = body
                .read_to_string()
                .map_err(|e| TransportError::Body(e.to_string()))?;
            Ok(Response::from_parts(parts, text))
        })
        .await
        .map_err(|e| TransportError::Join(e.to_string()))?
    }
}

fn classify(error: ureq::Error) -> TransportError {
    match error {
        ureq::Error::Http(_) | ureq::Error::BadUri(_) => {
            TransportError::InvalidRequest(error.to_string())
        }
        other => TransportError::Network(other.to_string()),
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &Headers) -> RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

fn send_blocking(agent: &Agent, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let HttpRequest {
        method,
        path,
        headers,
        body,
    } = request;

    let result = match method {
        HttpMethod::Get => with_headers(agent.get(&path), &headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&path), &headers).call(),
        HttpMethod::Post => {
            let builder = with_headers(agent.post(&path), &headers);
            match body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
        HttpMethod::Put => {
            let builder = with_headers(agent.put(&path), &headers);
            match body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
        HttpMethod::Patch => {
            let builder = with_headers(agent.patch(&path), &headers);
            match body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
    };
    let mut response = result.map_err(classify)?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| TransportError::Body(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
