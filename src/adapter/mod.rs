//! REST data adapter.
//!
//! Bridges a document store's abstract CRUD/query operations to HTTP
//! verbs in django-tastypie conventions, dispatching through a
//! constructor-passed [`Transport`](crate::Transport) - the wormhole
//! channel for cross-domain configurations, direct HTTP otherwise.
//!
//! # Operation Mapping
//!
//! | Operation | Verb | URL |
//! |-----------|------|-----|
//! | `create` | POST | `/{ns}/{resource}/` |
//! | `update` | PUT | `/{ns}/{resource}/{id}/` |
//! | `delete` | DELETE | `/{ns}/{resource}/{id}/` |
//! | `find_one` | GET | `/{ns}/{resource}/{id}/` |
//! | `find_many` | GET | `/{ns}/{resource}/set/{id1};{id2};/` |
//! | `find_all` | GET | `/{ns}/{resource}/` |
//! | `find_query` | GET | `/{ns}/{resource}/` + query params |
//!
//! Resource roots are never pluralized; every built URL ends in exactly
//! one trailing slash.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Validated configuration and builder |
//! | `pagination` | Continuation cursor (`next` offset) handling |
//! | `rest` | `DataAdapter` trait and the Tastypie implementation |

// ============================================================================
// Submodules
// ============================================================================

/// Adapter configuration and builder.
pub mod config;

/// Continuation cursor handling.
pub mod pagination;

/// The `DataAdapter` capability and its REST implementation.
pub mod rest;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{AdapterConfig, AdapterConfigBuilder, LoadingHooks};
pub use pagination::{next_page_query, offset_from_next};
pub use rest::{DataAdapter, RestAdapter};
