//! Wire serializer for the Tastypie envelope conventions.
//!
//! Converts between the wire formats - one record as a bare object, lists
//! as `{objects: [...], meta: {total_count, next}}` - and the internal
//! [`Record`]/[`Collection`] representation.
//!
//! # Relationship Encoding
//!
//! A belongs-to relation serializes to a canonical item URL
//! (`/{namespace}/{resource}/{id}/`); a has-many relation to an ordered
//! list of such URLs. Decoding splits the path and takes the numeric
//! segment before the trailing slash. Sideloading is unsupported:
//! embedded related-object bodies are never interpreted, only URI
//! references.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::RecordId;
use crate::record::{Collection, Record};

// ============================================================================
// WireSerializer
// ============================================================================

/// Encoder/decoder between the wire envelope and the record graph.
///
/// Holds the API namespace so item URLs round-trip: for any resource `r`
/// and id `i`, `decode_item_url(item_url(r, i)) == Some(i)`.
#[derive(Debug, Clone)]
pub struct WireSerializer {
    namespace: String,
}

impl WireSerializer {
    /// Creates a serializer for an API namespace.
    ///
    /// Surrounding slashes are stripped; `"api/v1"` and `"/api/v1/"`
    /// are equivalent.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: namespace.trim_matches('/').to_string(),
        }
    }

    /// Returns the namespace.
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

// ============================================================================
// WireSerializer - Relationships
// ============================================================================

impl WireSerializer {
    /// Builds the canonical item URL for a record.
    ///
    /// Format: `/{namespace}/{resource}/{id}/`.
    #[must_use]
    pub fn item_url(&self, resource: &str, id: RecordId) -> String {
        format!("/{}/{}/{}/", self.namespace, resource, id)
    }

    /// Extracts the record id from an item URL.
    ///
    /// The id is the segment before the trailing slash; everything else
    /// is discarded. Returns `None` for URLs that do not end in
    /// `/{id}/`.
    #[must_use]
    pub fn decode_item_url(url: &str) -> Option<RecordId> {
        url.split('/').rev().nth(1)?.parse().ok()
    }

    /// Encodes a belongs-to relation as an item URL value.
    ///
    /// `None` ids encode to nothing - the field is omitted, not nulled.
    #[must_use]
    pub fn encode_belongs_to(&self, resource: &str, id: Option<RecordId>) -> Option<Value> {
        id.map(|id| Value::String(self.item_url(resource, id)))
    }

    /// Decodes a belongs-to field value into a record id.
    ///
    /// String values are treated as item URLs; a bare number passes
    /// through as an already-decoded id.
    #[must_use]
    pub fn decode_belongs_to(value: &Value) -> Option<RecordId> {
        match value {
            Value::String(url) => Self::decode_item_url(url),
            other => other.as_u64().map(RecordId::new),
        }
    }

    /// Encodes a has-many relation as an ordered list of item URLs.
    #[must_use]
    pub fn encode_has_many(&self, resource: &str, ids: &[RecordId]) -> Value {
        Value::Array(
            ids.iter()
                .map(|id| Value::String(self.item_url(resource, *id)))
                .collect(),
        )
    }

    /// Decodes a has-many field value into record ids, preserving order.
    ///
    /// Elements that are not decodable item URLs are skipped.
    #[must_use]
    pub fn decode_has_many(value: &Value) -> Vec<RecordId> {
        let Value::Array(items) = value else {
            return Vec::new();
        };
        items.iter().filter_map(Self::decode_belongs_to).collect()
    }
}

// ============================================================================
// WireSerializer - Envelope Extraction
// ============================================================================

impl WireSerializer {
    /// Merges a single-record payload into a record.
    ///
    /// Fields merge directly; the record adopts the payload's `id` when
    /// it had none (the create-then-assign flow).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload is not a JSON object.
    pub fn extract_single(&self, payload: &Value, record: &mut Record) -> Result<()> {
        let Value::Object(object) = payload else {
            return Err(Error::protocol(format!(
                "expected record object, got {payload}"
            )));
        };

        record.merge_fields(object);

        if record.id().is_none()
            && let Some(id) = object.get("id").and_then(Value::as_u64)
        {
            record.set_id(RecordId::new(id));
        }

        Ok(())
    }

    /// Decodes a list envelope into a collection.
    ///
    /// Records keep the server's array order; `meta.total_count` and
    /// `meta.next` ride along as collection metadata. A missing `meta`
    /// block leaves both unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if `objects` is missing or not an
    /// array.
    pub fn extract_many(&self, payload: &Value) -> Result<Collection> {
        let objects = payload
            .get("objects")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::protocol("list envelope missing objects array"))?;

        let mut records = Vec::with_capacity(objects.len());
        for element in objects {
            let Value::Object(object) = element else {
                return Err(Error::protocol(format!(
                    "expected record object in list, got {element}"
                )));
            };
            records.push(Record::from_object(object));
        }

        let meta = payload.get("meta");
        let total_count = meta
            .and_then(|m| m.get("total_count"))
            .and_then(Value::as_u64);
        let next = meta
            .and_then(|m| m.get("next"))
            .and_then(Value::as_str)
            .map(str::to_string);

        trace!(
            records = records.len(),
            ?total_count,
            next = next.as_deref().unwrap_or(""),
            "decoded list envelope"
        );

        Ok(Collection::from_parts(records, total_count, next))
    }
}

// ============================================================================
// Tests
// ============================================================================
