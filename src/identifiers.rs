//! Type-safe identifiers for channel requests and records.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! # ID Kinds
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`RequestId`] | Request/response correlation key on the channel |
//! | [`RecordId`] | Primary key of a record on the remote API |
//!
//! Request IDs are allocated by the channel starting at 1 and incrementing
//! by 1; an ID is never reused, even after its request completes or fails.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// RequestId
// ============================================================================

/// Correlation key matching a channel response to its originating request.
///
/// Serialized as a bare integer on the wire (`"requestId": 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// The first ID a channel hands out.
    pub const FIRST: Self = Self(1);

    /// Creates a request ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// RecordId
// ============================================================================

/// Primary key of a record on the remote API.
///
/// Appears as the numeric segment of item URLs
/// (`/{namespace}/{resource}/{id}/`) and as the `id` field of payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a record ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId::new(7).to_string(), "7");
        assert_eq!(RequestId::FIRST.to_string(), "1");
    }

    #[test]
    fn test_request_id_ordering() {
        assert!(RequestId::new(1) < RequestId::new(2));
        assert_eq!(RequestId::new(3), RequestId::new(3));
    }

    #[test]
    fn test_request_id_serde_transparent() {
        let json = serde_json::to_string(&RequestId::new(42)).expect("serialize");
        assert_eq!(json, "42");

        let id: RequestId = serde_json::from_str("42").expect("parse");
        assert_eq!(id, RequestId::new(42));
    }

    #[test]
    fn test_record_id_from_str() {
        let id: RecordId = "15".parse().expect("parse");
        assert_eq!(id, RecordId::new(15));
        assert!("tags".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::new(42).to_string(), "42");
    }
}
