//! Wormhole Data - Cross-domain request tunneling and REST data adapter.
//!
//! This library lets an application perform authenticated CRUD and query
//! operations against a remote API server on a different origin, by
//! tunneling requests through a wormhole channel to a gateway on that
//! origin, and by translating the django-tastypie wire conventions into
//! a uniform internal record representation.
//!
//! # Architecture
//!
//! - **Channel** - one WebSocket connection to the gateway, with a
//!   `ready` handshake, FIFO pre-link queueing, and request/response
//!   correlation by monotonic request ID
//! - **Adapter** - maps store operations to HTTP verbs (unpluralized
//!   resources, forced trailing slashes, `set/{ids}/` batching, api-key
//!   auth) and demultiplexes outcomes into store lifecycle hooks
//! - **Serializer** - decodes `{objects, meta}` list envelopes and
//!   resource-URI relationships; sideloading is unsupported
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use wormhole_data::{
//!     AdapterConfig, Channel, DataAdapter, Record, RecordStore, RestAdapter, Result,
//! };
//!
//! struct AppStore;
//! impl RecordStore for AppStore {}
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Tunnel through the gateway on the API origin
//!     let channel = Channel::connect("wss://api.example.com/wormhole/").await?;
//!
//!     let config = AdapterConfig::builder()
//!         .namespace("api/v1")
//!         .server_domain("https://api.example.com")
//!         .credentials("alice", "s3cr3t")
//!         .build()?;
//!     let adapter = RestAdapter::new(config, Arc::new(channel));
//!
//!     let store = AppStore;
//!     let mut record = Record::new();
//!     record.set("name", json!("a"));
//!     adapter.create(&store, "item", &mut record).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapter`] | REST adapter, configuration, pagination cursors |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Channel wire message types |
//! | [`record`] | Record and collection representation |
//! | [`serializer`] | Wire envelope and relationship codec |
//! | [`store`] | Collaborator store contract |
//! | [`transport`] | Channel and direct HTTP transports |
//!
//! # Delivery Semantics
//!
//! - Requests queued before the channel links flush in FIFO submission
//!   order; completion order across in-flight requests is unspecified
//! - Request IDs increase strictly from 1 and are never reused
//! - Per request: success or failure fires exactly once, the always
//!   callback after it; remote failures keep the `{status, responseText}`
//!   shape whether the transport or the server failed
//! - Cancellation is unsupported; timeouts belong to the remote end

// ============================================================================
// Modules
// ============================================================================

/// REST adapter, configuration, and pagination cursors.
///
/// Use [`AdapterConfig::builder`] and [`RestAdapter::new`] to construct
/// a configured adapter around a transport.
pub mod adapter;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for channel requests and records.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Channel wire protocol message types.
///
/// Internal module defining request/response envelope structures.
pub mod protocol;

/// Record and collection representation.
pub mod record;

/// Wire envelope and relationship codec.
pub mod serializer;

/// Collaborator store contract.
pub mod store;

/// Channel transport layer.
///
/// The wormhole channel and the direct same-origin HTTP fallback.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Adapter types
pub use adapter::{
    AdapterConfig, AdapterConfigBuilder, DataAdapter, LoadingHooks, RestAdapter, next_page_query,
    offset_from_next,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RecordId, RequestId};

// Protocol types
pub use protocol::{AjaxParams, ChannelMessage, Method, RequestEnvelope, ResponseEnvelope};

// Record types
pub use record::{Collection, Record};

// Serializer types
pub use serializer::WireSerializer;

// Store contract
pub use store::RecordStore;

// Transport types
pub use transport::{AjaxCallbacks, AjaxFuture, Channel, DirectHttp, Transport};
