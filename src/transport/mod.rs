//! Channel transport layer.
//!
//! This module provides the asynchronous request primitive the adapter
//! dispatches through, with two implementations: the wormhole channel
//! (cross-domain, tunneled through a remote gateway) and direct HTTP
//! (same-origin).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Local (Rust)   │                              │  Gateway        │
//! │                 │      WebSocket (JSON)        │  (remote origin)│
//! │  Channel        │◄────────────────────────────►│                 │
//! │  └ correlation  │   {requestId, params}        │  executes HTTP  │
//! │  └ ready queue  │   {type: response, ...}      │  relays result  │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Channel Lifecycle
//!
//! 1. [`Channel::connect`] - Dial the gateway, spawn the event loop
//! 2. Requests submitted before the `ready` handshake queue in FIFO order
//! 3. `ready` arrives - the queue flushes, the channel is linked
//! 4. Steady state - concurrent requests correlate by `requestId`
//! 5. [`Channel::shutdown`] - Close; outstanding requests fail
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Wormhole channel: event loop, handshake, correlation |
//! | `direct` | Direct same-origin HTTP dispatch |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::protocol::AjaxParams;

// ============================================================================
// Submodules
// ============================================================================

/// Wormhole channel and its event loop.
pub mod channel;

/// Direct same-origin HTTP dispatch.
pub mod direct;

// ============================================================================
// Transport
// ============================================================================

/// The asynchronous request primitive the adapter dispatches through.
///
/// Implementations resolve with the response payload or fail with the
/// normalized `{status, responseText}` error shape
/// ([`Error::Remote`](crate::Error::Remote)); callers cannot distinguish
/// a transport failure from a server-reported error, by contract.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatches one request and awaits its payload.
    async fn ajax(&self, params: AjaxParams) -> Result<Value>;
}

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{AjaxCallbacks, AjaxFuture, Channel};
pub use direct::DirectHttp;
