//! Request and response envelope types.
//!
//! Defines the message format for tunneled requests and their tagged
//! responses on the wormhole channel.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::RequestId;

// ============================================================================
// Method
// ============================================================================

/// HTTP verb carried in the `type` field of request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read operations: find, find-many, find-all, find-query.
    Get,
    /// Record creation.
    Post,
    /// Record update.
    Put,
    /// Record deletion.
    Delete,
}

impl Method {
    /// Returns the verb as its wire string.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` if this verb carries a JSON body.
    ///
    /// Body verbs take auth fields in the payload; the others take them
    /// as URL query parameters.
    #[inline]
    #[must_use]
    pub const fn sends_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// AjaxParams
// ============================================================================

/// Parameters of one tunneled request.
///
/// # Format
///
/// ```json
/// {
///   "url": "/api/v1/items/",
///   "type": "GET",
///   "data": { ... },
///   "dataType": "json",
///   "contentType": "application/json"
/// }
/// ```
///
/// `data` is the query-parameter object for GET requests and the JSON
/// body for POST/PUT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AjaxParams {
    /// Target URL (path, or absolute when a server domain is set).
    pub url: String,

    /// HTTP verb.
    #[serde(rename = "type")]
    pub method: Method,

    /// Query parameters (GET) or JSON body (POST/PUT).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Expected response format.
    #[serde(rename = "dataType")]
    pub data_type: String,

    /// Content type of the request body.
    #[serde(rename = "contentType")]
    pub content_type: String,
}

impl AjaxParams {
    /// Creates request parameters with the default JSON data/content types.
    #[inline]
    #[must_use]
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            data: None,
            data_type: "json".to_string(),
            content_type: "application/json".to_string(),
        }
    }

    /// Attaches a data object (query parameters or body).
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

// ============================================================================
// RequestEnvelope
// ============================================================================

/// An outbound request tagged with its correlation ID.
///
/// # Format
///
/// ```json
/// {
///   "requestId": 1,
///   "params": { "url": "...", "type": "GET", ... }
/// }
/// ```
///
/// Immutable once constructed; serialized to JSON text for transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation key, allocated by the channel.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,

    /// The tunneled request parameters.
    pub params: AjaxParams,
}

impl RequestEnvelope {
    /// Wraps request parameters with their correlation ID.
    #[inline]
    #[must_use]
    pub fn new(request_id: RequestId, params: AjaxParams) -> Self {
        Self { request_id, params }
    }
}

// ============================================================================
// ResponseEnvelope
// ============================================================================

/// The tagged outcome of one tunneled request.
///
/// # Format
///
/// Success:
/// ```json
/// {
///   "type": "response",
///   "requestId": 1,
///   "success": true,
///   "data": { ... },
///   "textStatus": "success"
/// }
/// ```
///
/// Failure (`data` carries the error detail):
/// ```json
/// {
///   "type": "response",
///   "requestId": 1,
///   "success": false,
///   "data": { "status": 404, "responseText": "not found" },
///   "textStatus": "error",
///   "errorThrown": "Not Found"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Matches the originating request's ID.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,

    /// Whether the tunneled request succeeded.
    pub success: bool,

    /// Response payload (success) or error detail (failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Transport status string.
    #[serde(rename = "textStatus", default, skip_serializing_if = "Option::is_none")]
    pub text_status: Option<String>,

    /// Error description from the remote transport.
    #[serde(rename = "errorThrown", default, skip_serializing_if = "Option::is_none")]
    pub error_thrown: Option<String>,
}

impl ResponseEnvelope {
    /// Extracts the HTTP status from the error detail.
    ///
    /// Returns 0 when absent, the convention for requests that never
    /// reached a server.
    #[inline]
    #[must_use]
    pub fn status(&self) -> u16 {
        self.data
            .as_ref()
            .and_then(|v| v.get("status"))
            .and_then(|v| v.as_u64())
            .unwrap_or_default() as u16
    }

    /// Extracts the response text from the error detail.
    ///
    /// Falls back to `errorThrown`, then `textStatus`, then empty.
    #[must_use]
    pub fn response_text(&self) -> String {
        self.data
            .as_ref()
            .and_then(|v| v.get("responseText"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| self.error_thrown.clone())
            .or_else(|| self.text_status.clone())
            .unwrap_or_default()
    }
}

// ============================================================================
// ChannelMessage
// ============================================================================

/// An inbound channel message, dispatched by its `type` field.
///
/// Any other `type` value fails to parse and must be dropped with a loud
/// log: the channel contract is fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelMessage {
    /// Handshake: the gateway finished loading and the channel is linked.
    #[serde(rename = "ready")]
    Ready,

    /// Outcome of one tunneled request.
    #[serde(rename = "response")]
    Response(ResponseEnvelope),
}

// ============================================================================
// Tests
// ============================================================================
