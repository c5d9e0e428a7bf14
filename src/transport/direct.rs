//! Direct same-origin HTTP dispatch.
//!
//! When no wormhole is configured the adapter falls back to plain HTTP:
//! the same request parameters are executed directly instead of being
//! tunneled through a gateway.
//!
//! Failure normalization matches the channel: transport failures and
//! non-2xx responses both surface as the `{status, responseText}` shape,
//! with status 0 when the request never reached a server.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{AjaxParams, Method};
use crate::transport::Transport;

// ============================================================================
// DirectHttp
// ============================================================================

/// Same-origin HTTP transport.
///
/// Executes [`AjaxParams`] as a plain HTTP request: `data` becomes query
/// parameters for GET/DELETE and the JSON body for POST/PUT.
#[derive(Debug, Clone, Default)]
pub struct DirectHttp {
    client: reqwest::Client,
}

impl DirectHttp {
    /// Creates a transport with a default HTTP client.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport reusing an existing HTTP client.
    #[inline]
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for DirectHttp {
    async fn ajax(&self, params: AjaxParams) -> Result<Value> {
        debug!(url = %params.url, method = %params.method, "direct dispatch");

        let mut request = match params.method {
            Method::Get => self.client.get(&params.url),
            Method::Post => self.client.post(&params.url),
            Method::Put => self.client.put(&params.url),
            Method::Delete => self.client.delete(&params.url),
        };

        if let Some(data) = &params.data {
            if params.method.sends_body() {
                request = request.json(data);
            } else {
                request = request.query(&query_pairs(data));
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::remote(0, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::remote(0, e.to_string()))?;

        if !status.is_success() {
            return Err(Error::remote(status.as_u16(), body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(Error::from)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Flattens a JSON object into query key/value pairs.
///
/// Non-string scalars keep their JSON rendering (`limit=20`, `open=true`).
fn query_pairs(data: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = data else {
        warn!("non-object query data ignored");
        return Vec::new();
    };

    map.iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
