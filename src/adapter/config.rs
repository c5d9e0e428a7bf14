//! Adapter configuration and builder.
//!
//! Provides a validated configuration for [`RestAdapter`]: the remote
//! server domain, the mandatory API namespace, optional api-key
//! authentication, and optional loading hooks.
//!
//! # Example
//!
//! ```ignore
//! use wormhole_data::AdapterConfig;
//!
//! let config = AdapterConfig::builder()
//!     .namespace("api/v1")
//!     .server_domain("https://api.example.com")
//!     .credentials("alice", "s3cr3t")
//!     .build()?;
//! ```
//!
//! [`RestAdapter`]: crate::adapter::RestAdapter

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

// ============================================================================
// LoadingHooks
// ============================================================================

/// Optional callbacks fired around each dispatched request.
///
/// `on_loading` runs before dispatch, `on_loaded` after either outcome -
/// the request's "always" moment. Both are set together or not at all.
#[derive(Clone)]
pub struct LoadingHooks {
    pub(crate) on_loading: Arc<dyn Fn() + Send + Sync>,
    pub(crate) on_loaded: Arc<dyn Fn() + Send + Sync>,
}

impl fmt::Debug for LoadingHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingHooks").finish_non_exhaustive()
    }
}

// ============================================================================
// AdapterConfig
// ============================================================================

/// Validated adapter configuration.
///
/// Use [`AdapterConfig::builder`] to construct one; construction fails
/// fast when the mandatory namespace is absent.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    server_domain: Option<String>,
    namespace: String,
    username: Option<String>,
    api_key: Option<String>,
    loading_hooks: Option<LoadingHooks>,
}

impl AdapterConfig {
    /// Creates a new configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::default()
    }

    /// Returns the server domain, without a trailing slash.
    #[inline]
    #[must_use]
    pub fn server_domain(&self) -> Option<&str> {
        self.server_domain.as_deref()
    }

    /// Returns the API namespace, without surrounding slashes.
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns `(username, api_key)` when authentication is active.
    ///
    /// Authentication requires both values; a lone username or key is
    /// ignored.
    #[inline]
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.api_key.as_deref()) {
            (Some(username), Some(api_key)) => Some((username, api_key)),
            _ => None,
        }
    }

    /// Returns the loading hooks, if configured.
    #[inline]
    #[must_use]
    pub fn loading_hooks(&self) -> Option<&LoadingHooks> {
        self.loading_hooks.as_ref()
    }
}

// ============================================================================
// AdapterConfigBuilder
// ============================================================================

/// Builder for [`AdapterConfig`].
#[derive(Default)]
pub struct AdapterConfigBuilder {
    server_domain: Option<String>,
    namespace: Option<String>,
    username: Option<String>,
    api_key: Option<String>,
    loading_hooks: Option<LoadingHooks>,
}

impl AdapterConfigBuilder {
    /// Sets the origin prepended to all built URLs.
    ///
    /// A trailing slash is stripped.
    #[inline]
    #[must_use]
    pub fn server_domain(mut self, domain: impl Into<String>) -> Self {
        self.server_domain = Some(domain.into());
        self
    }

    /// Sets the mandatory URL path namespace, e.g. `"api/v1"`.
    #[inline]
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets api-key authentication credentials.
    ///
    /// They ride as query parameters on GET/DELETE and as body fields on
    /// POST/PUT.
    #[inline]
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the loading hooks fired around each dispatched request.
    #[inline]
    #[must_use]
    pub fn loading_hooks(
        mut self,
        on_loading: impl Fn() + Send + Sync + 'static,
        on_loaded: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.loading_hooks = Some(LoadingHooks {
            on_loading: Arc::new(on_loading),
            on_loaded: Arc::new(on_loaded),
        });
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the namespace is missing or empty.
    pub fn build(self) -> Result<AdapterConfig> {
        let namespace = self
            .namespace
            .as_deref()
            .map(|ns| ns.trim_matches('/'))
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| Error::config("namespace parameter is mandatory"))?
            .to_string();

        let server_domain = self
            .server_domain
            .map(|domain| domain.trim_end_matches('/').to_string());

        Ok(AdapterConfig {
            server_domain,
            namespace,
            username: self.username,
            api_key: self.api_key,
            loading_hooks: self.loading_hooks,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_namespace_fails_fast() {
        let result = AdapterConfig::builder().build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_empty_namespace_fails_fast() {
        let result = AdapterConfig::builder().namespace("/").build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_namespace_normalization() {
        let config = AdapterConfig::builder()
            .namespace("/api/v1/")
            .build()
            .expect("valid config");
        assert_eq!(config.namespace(), "api/v1");
    }

    #[test]
    fn test_server_domain_trailing_slash_stripped() {
        let config = AdapterConfig::builder()
            .namespace("api/v1")
            .server_domain("https://api.example.com/")
            .build()
            .expect("valid config");
        assert_eq!(config.server_domain(), Some("https://api.example.com"));
    }

    #[test]
    fn test_credentials_require_both() {
        let config = AdapterConfig::builder()
            .namespace("api/v1")
            .credentials("alice", "s3cr3t")
            .build()
            .expect("valid config");
        assert_eq!(config.credentials(), Some(("alice", "s3cr3t")));

        let bare = AdapterConfig::builder()
            .namespace("api/v1")
            .build()
            .expect("valid config");
        assert!(bare.credentials().is_none());
    }

    #[test]
    fn test_loading_hooks_configured() {
        let config = AdapterConfig::builder()
            .namespace("api/v1")
            .loading_hooks(|| {}, || {})
            .build()
            .expect("valid config");
        assert!(config.loading_hooks().is_some());
    }
}
