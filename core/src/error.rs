//! Error types for the storefront API client.
//!
//! # Design
//! `Unauthorized` gets a dedicated variant because `ApiClient::fetch` treats
//! it differently from every other failure. `NotFound` is split out for the
//! same reason as any REST client: callers branch on it. All other non-2xx
//! responses land in `Http` with the status, the extracted message and the
//! raw body.

use thiserror::Error;

use crate::transport::TransportError;

/// Messages the API uses to reject a request for authorization reasons.
pub const AUTH_FAILURE_MESSAGES: [&str; 2] = ["Unauthorized", "Invalid credentials."];

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the credentials (or their absence).
    #[error("unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned any other non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Classify a rejected response by its status and extracted message.
    pub(crate) fn from_rejection(status: u16, message: String, body: String) -> Self {
        if AUTH_FAILURE_MESSAGES.contains(&message.as_str()) {
            return ApiError::Unauthorized { status, message };
        }
        if status == 404 {
            return ApiError::NotFound;
        }
        ApiError::Http {
            status,
            message,
            body,
        }
    }
}

/// Errors raised while loading or validating `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to extract configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("base_url must start with http:// or https://, got {0}")]
    InvalidBaseUrl(String),

    #[error("domain cannot be empty")]
    EmptyDomain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_messages_classify_as_unauthorized() {
        for message in AUTH_FAILURE_MESSAGES {
            let err = ApiError::from_rejection(401, message.to_string(), String::new());
            assert!(err.is_auth_failure(), "{message}");
        }
    }

    #[test]
    fn message_wins_over_status() {
        let err = ApiError::from_rejection(403, "Invalid credentials.".to_string(), String::new());
        assert!(matches!(err, ApiError::Unauthorized { status: 403, .. }));

        let err = ApiError::from_rejection(401, "Token expired".to_string(), "{}".to_string());
        assert!(matches!(err, ApiError::Http { status: 401, .. }));
    }

    #[test]
    fn not_found_and_other_statuses() {
        let err = ApiError::from_rejection(404, "Not Found".to_string(), String::new());
        assert!(matches!(err, ApiError::NotFound));

        let err = ApiError::from_rejection(500, "boom".to_string(), "boom".to_string());
        assert_eq!(err.to_string(), "HTTP 500: boom");
        assert!(!err.is_auth_failure());
    }
}
