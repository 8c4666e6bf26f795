//! Async API client core for the storefront REST/JSON-LD service.
//!
//! # Overview
//! `ApiClient` composes authenticated requests (fixed JSON-LD headers, tenant
//! domain, session token, encoded body, flattened query string) and
//! dispatches them through a pluggable `Transport`.
//!
//! # Design
//! - The session is injected as a `SessionProvider`; the client never reaches
//!   into ambient storage.
//! - Request building is separate from dispatch (`build_request` vs
//!   `try_fetch`), so header and body rules are testable without I/O.
//! - Query flattening is a pure function over an ordered map (`query`).
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod options;
pub mod query;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{ApiClient, DOMAIN_HEADER, LD_JSON, TOKEN_HEADER};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse};
pub use options::{Body, Params, RequestOptions};
pub use query::{build_query_string, flatten};
pub use session::{
    KeyValueStore, MemoryStore, Session, SessionProvider, StaticSession, StoredSession,
    SESSION_KEY, SESSION_PREFIX,
};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    Collection, Invoice, NewInvoice, OrderClient, OrderQuery, OrderStatus, Product, SalesOrder,
};
