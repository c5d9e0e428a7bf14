//! Internal record representation.
//!
//! Records are untyped field maps with an optional identity; collections
//! carry the server-reported total and continuation cursor alongside the
//! decoded records. Identity management beyond "adopt the server's id"
//! belongs to the collaborating store, not to this crate.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::identifiers::RecordId;

// ============================================================================
// Record
// ============================================================================

/// One record: identity, field set, and an error slot.
///
/// The error slot holds the raw `responseText` of a failed save, attached
/// by the adapter before it hands the record to the store's error hook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    id: Option<RecordId>,
    fields: Map<String, Value>,
    errors: Option<String>,
}

impl Record {
    /// Creates an empty, id-less record.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record with a known identity.
    #[inline]
    #[must_use]
    pub fn with_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Builds a record from a wire object, adopting its `id` field.
    #[must_use]
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let id = object.get("id").and_then(Value::as_u64).map(RecordId::new);
        Self {
            id,
            fields: object.clone(),
            errors: None,
        }
    }

    /// Returns the record's identity, if assigned.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Assigns the record's identity.
    #[inline]
    pub fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    /// Returns a field value.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets a field value.
    #[inline]
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Returns the full field set.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Merges wire fields into the record, overwriting existing keys.
    pub fn merge_fields(&mut self, object: &Map<String, Value>) {
        for (key, value) in object {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Returns the attached error detail, if any.
    #[inline]
    #[must_use]
    pub fn errors(&self) -> Option<&str> {
        self.errors.as_deref()
    }

    /// Attaches raw error detail from a failed operation.
    #[inline]
    pub fn set_errors(&mut self, detail: impl Into<String>) {
        self.errors = Some(detail.into());
    }

    /// Serializes the record into an outgoing JSON body.
    ///
    /// The identity rides along as `id` when assigned; for new records
    /// the server assigns one and the body carries none.
    #[must_use]
    pub fn serialize_payload(&self) -> Value {
        let mut object = self.fields.clone();
        if let Some(id) = self.id {
            object.insert("id".to_string(), Value::from(id.value()));
        }
        Value::Object(object)
    }
}

// ============================================================================
// Collection
// ============================================================================

/// An ordered set of decoded records plus list metadata.
///
/// `total_count` is the server's count of all matching records, not just
/// this page; `next` is the opaque continuation URL, `None` on the last
/// page.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: Vec<Record>,
    total_count: Option<u64>,
    next: Option<String>,
}

impl Collection {
    /// Creates an empty collection.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection from decoded parts.
    #[inline]
    #[must_use]
    pub fn from_parts(records: Vec<Record>, total_count: Option<u64>, next: Option<String>) -> Self {
        Self {
            records,
            total_count,
            next,
        }
    }

    /// Returns the records in server order.
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the number of records loaded so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records are loaded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the server-reported total, if known.
    #[inline]
    #[must_use]
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Returns the continuation cursor, if the server provided one.
    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    /// Returns `true` when more pages exist.
    ///
    /// Termination is content-length based: more pages exist only while
    /// the known total exceeds what is already loaded. An unknown total
    /// means no further fetches.
    #[inline]
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.total_count
            .is_some_and(|total| (self.records.len() as u64) < total)
    }

    /// Returns the offset for the next page: the current content length.
    #[inline]
    #[must_use]
    pub fn next_offset(&self) -> u64 {
        self.records.len() as u64
    }

    /// Appends a follow-up page, adopting its metadata.
    pub fn append_page(&mut self, page: Collection) {
        self.records.extend(page.records);
        self.total_count = page.total_count;
        self.next = page.next;
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_from_object_adopts_id() {
        let record = Record::from_object(&object(json!({"id": 3, "name": "a"})));
        assert_eq!(record.id(), Some(RecordId::new(3)));
        assert_eq!(record.get("name").and_then(Value::as_str), Some("a"));
    }

    #[test]
    fn test_serialize_payload_includes_id_when_assigned() {
        let mut record = Record::new();
        record.set("name", json!("a"));
        assert!(record.serialize_payload().get("id").is_none());

        record.set_id(RecordId::new(7));
        let payload = record.serialize_payload();
        assert_eq!(payload.get("id").and_then(Value::as_u64), Some(7));
        assert_eq!(payload.get("name").and_then(Value::as_str), Some("a"));
    }

    #[test]
    fn test_merge_fields_overwrites() {
        let mut record = Record::new();
        record.set("name", json!("a"));
        record.merge_fields(&object(json!({"name": "b", "rank": 2})));
        assert_eq!(record.get("name").and_then(Value::as_str), Some("b"));
        assert_eq!(record.get("rank").and_then(Value::as_u64), Some(2));
    }

    #[test]
    fn test_error_slot() {
        let mut record = Record::new();
        assert!(record.errors().is_none());
        record.set_errors("boom");
        assert_eq!(record.errors(), Some("boom"));
    }

    #[test]
    fn test_has_more_content_length_check() {
        let records = vec![Record::new(), Record::new()];

        let partial = Collection::from_parts(records.clone(), Some(5), None);
        assert!(partial.has_more());
        assert_eq!(partial.next_offset(), 2);

        let complete = Collection::from_parts(records.clone(), Some(2), None);
        assert!(!complete.has_more());

        // Unknown total is terminal, never retried.
        let unknown = Collection::from_parts(records, None, None);
        assert!(!unknown.has_more());
    }

    #[test]
    fn test_append_page_adopts_metadata() {
        let mut collection = Collection::from_parts(
            vec![Record::new()],
            Some(3),
            Some("/api/v1/items/?offset=1".to_string()),
        );

        collection.append_page(Collection::from_parts(
            vec![Record::new(), Record::new()],
            Some(3),
            None,
        ));

        assert_eq!(collection.len(), 3);
        assert!(collection.next().is_none());
        assert!(!collection.has_more());
    }
}
