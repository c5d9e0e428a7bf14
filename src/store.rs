//! Collaborator contract with the owning document store.
//!
//! The adapter signals operation outcomes exclusively through these
//! hooks; it never returns payloads to CRUD callers. The store owns
//! record identity management and any UI invalidation - this crate never
//! touches rendering.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::identifiers::RecordId;
use crate::record::{Collection, Record};

// ============================================================================
// RecordStore
// ============================================================================

/// Lifecycle hooks the adapter calls back into.
///
/// All hooks default to no-ops so a store only implements the
/// notifications it cares about. Hooks run after the adapter has already
/// updated the record itself (identity adoption, merged fields, attached
/// error detail).
pub trait RecordStore: Send + Sync {
    /// A record was created; `payload` is the decoded server response.
    fn did_create_record(&self, resource: &str, record: &mut Record, payload: &Value) {
        let _ = (resource, record, payload);
    }

    /// A record was updated.
    fn did_save_record(&self, resource: &str, record: &mut Record, payload: &Value) {
        let _ = (resource, record, payload);
    }

    /// A record was deleted.
    fn did_delete_record(&self, resource: &str, record: &mut Record, payload: &Value) {
        let _ = (resource, record, payload);
    }

    /// A single record lookup resolved.
    fn did_find_record(&self, resource: &str, id: RecordId, payload: &Value) {
        let _ = (resource, id, payload);
    }

    /// A batched id lookup resolved.
    fn did_find_many(&self, resource: &str, collection: &Collection) {
        let _ = (resource, collection);
    }

    /// An unfiltered listing resolved.
    fn did_find_all(&self, resource: &str, collection: &Collection) {
        let _ = (resource, collection);
    }

    /// A filtered query resolved.
    fn did_find_query(&self, resource: &str, collection: &Collection) {
        let _ = (resource, collection);
    }

    /// A save operation failed; the raw error detail is already attached
    /// to the record's error slot.
    fn record_was_error(&self, resource: &str, record: &mut Record) {
        let _ = (resource, record);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct SilentStore;
    impl RecordStore for SilentStore {}

    #[test]
    fn test_default_hooks_are_noops() {
        let store = SilentStore;
        let mut record = Record::new();
        store.did_create_record("item", &mut record, &Value::Null);
        store.record_was_error("item", &mut record);
        store.did_find_all("item", &Collection::new());
    }
}
