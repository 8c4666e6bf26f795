//! Session resolution.
//!
//! The client never reads ambient storage itself; it is handed a
//! `SessionProvider`. `StoredSession` is the provider that reads the
//! persisted session blob from a `KeyValueStore`, which is how the mobile
//! app keeps its login.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Key the session blob is persisted under.
pub const SESSION_KEY: &str = "session";

/// Marker some storage layers put in front of serialized objects.
pub const SESSION_PREFIX: &str = "__q_objt|";

/// Persisted authentication record. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Session {
    /// Decode a persisted blob, with or without the `SESSION_PREFIX` marker.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        let json = raw.strip_prefix(SESSION_PREFIX).unwrap_or(raw);
        serde_json::from_str(json)
    }

    /// Encode in the prefixed form the app persists.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        Ok(format!("{SESSION_PREFIX}{}", serde_json::to_string(self)?))
    }

    /// The value to send as `API-TOKEN`: `token`, falling back to `api_key`.
    /// Empty strings count as absent.
    pub fn credential(&self) -> Option<&str> {
        [self.token.as_deref(), self.api_key.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
    }
}

/// Read side of a persistent key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
}

/// Source of the current session, consulted once per request.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn session(&self) -> Option<Session>;
}

/// In-memory `KeyValueStore`. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: &str, value: impl Into<String>) {
        self.entries.write().await.insert(key.to_string(), value.into());
    }

    pub async fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().await.remove(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }
}

/// Reads the session blob stored under `SESSION_KEY`.
///
/// A blob that fails to decode is logged and treated as "logged out".
#[derive(Debug, Clone)]
pub struct StoredSession<S> {
    store: S,
}

impl<S: KeyValueStore> StoredSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: KeyValueStore> SessionProvider for StoredSession<S> {
    async fn session(&self) -> Option<Session> {
        let raw = self.store.get(SESSION_KEY).await?;
        match Session::decode(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::error!(error = %e, "failed to parse persisted session");
                None
            }
        }
    }
}

/// A fixed session, for service accounts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<Session>);

#[async_trait]
impl SessionProvider for StaticSession {
    async fn session(&self) -> Option<Session> {
        self.0.clone()
    }
}
