//! Continuation cursor handling.
//!
//! Paged list responses carry an opaque `next` URL. Only its integer
//! `offset` query parameter matters: the value is extracted and
//! re-issued as a fresh `offset` parameter on the follow-up request.
//! A cursor without an offset parameter is terminal - there is no next
//! page, and the lookup must not be retried.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

// ============================================================================
// Cursor Extraction
// ============================================================================

static OFFSET_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"offset=(\d+)").expect("static pattern"));

/// Extracts the integer offset from a `next` cursor URL.
///
/// Returns `None` when the cursor carries no offset parameter,
/// signaling a terminal page.
#[must_use]
pub fn offset_from_next(next: &str) -> Option<u64> {
    OFFSET_PARAM
        .captures(next)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Builds the follow-up query fragment from a `next` cursor.
///
/// Returns `{"offset": n}` for a live cursor, `None` when there is no
/// cursor or it is terminal. Merge the fragment into the original query
/// before re-issuing it.
#[must_use]
pub fn next_page_query(next: Option<&str>) -> Option<Value> {
    let offset = offset_from_next(next?)?;
    Some(json!({ "offset": offset }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_extracted() {
        assert_eq!(
            offset_from_next("/api/v1/items/?offset=40&limit=20"),
            Some(40)
        );
    }

    #[test]
    fn test_offset_extracted_mid_query() {
        assert_eq!(
            offset_from_next("/api/v1/items/?limit=20&offset=60"),
            Some(60)
        );
    }

    #[test]
    fn test_cursor_without_offset_is_terminal() {
        assert_eq!(offset_from_next("/api/v1/items/?limit=20"), None);
        assert_eq!(offset_from_next(""), None);
    }

    #[test]
    fn test_next_page_query_fragment() {
        let query = next_page_query(Some("/api/v1/items/?offset=40&limit=20")).expect("fragment");
        assert_eq!(query, json!({"offset": 40}));
    }

    #[test]
    fn test_next_page_query_terminal() {
        assert!(next_page_query(None).is_none());
        assert!(next_page_query(Some("/api/v1/items/?limit=20")).is_none());
    }
}
