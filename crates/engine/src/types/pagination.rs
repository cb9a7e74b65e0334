//! Pagination types for listing results.
//!
//! This module defines the opaque [`PageCursor`], the comparable
//! [`CursorValue`] it carries, the [`Page`] handed back to callers, and the
//! [`NavigationIntent`] vocabulary.

use std::cmp::Ordering;
use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CursorError;

use super::document::Document;
use super::query::{QueryFingerprint, SortDirective};

const CURSOR_VERSION: u8 = 1;

/// A value in the cursor for sorting.
///
/// Values of different kinds order as
/// `Null < Boolean < Number/Decimal < Timestamp < String`, so a sort over a
/// field with mixed types is still total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "lowercase")]
pub enum CursorValue {
    /// Null or missing value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// Integer value.
    Number(i64),
    /// Floating point value.
    Decimal(f64),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// String value.
    String(String),
}

impl CursorValue {
    /// Converts a JSON field value into a comparable value.
    ///
    /// Objects shaped like a store timestamp (`seconds` + `nanoseconds`, with
    /// or without a leading underscore) become [`CursorValue::Timestamp`].
    /// Other arrays and objects compare by their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CursorValue::Null,
            Value::Bool(b) => CursorValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CursorValue::Number(i),
                None => CursorValue::Decimal(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => CursorValue::String(s.clone()),
            Value::Object(map) => {
                let seconds = map.get("seconds").or_else(|| map.get("_seconds"));
                let nanos = map
                    .get("nanoseconds")
                    .or_else(|| map.get("_nanoseconds"))
                    .or_else(|| map.get("nanos"));
                match (seconds.and_then(Value::as_i64), nanos.and_then(Value::as_u64)) {
                    (Some(secs), Some(nanos)) if map.len() == 2 => {
                        match DateTime::from_timestamp(secs, nanos as u32) {
                            Some(ts) => CursorValue::Timestamp(ts),
                            None => CursorValue::String(value.to_string()),
                        }
                    }
                    _ => CursorValue::String(value.to_string()),
                }
            }
            Value::Array(_) => CursorValue::String(value.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CursorValue::Null => 0,
            CursorValue::Boolean(_) => 1,
            CursorValue::Number(_) | CursorValue::Decimal(_) => 2,
            CursorValue::Timestamp(_) => 3,
            CursorValue::String(_) => 4,
        }
    }

    /// Total ascending order over cursor values.
    pub fn compare(&self, other: &CursorValue) -> Ordering {
        match (self, other) {
            (CursorValue::Null, CursorValue::Null) => Ordering::Equal,
            (CursorValue::Boolean(a), CursorValue::Boolean(b)) => a.cmp(b),
            (CursorValue::Number(a), CursorValue::Number(b)) => a.cmp(b),
            (CursorValue::Number(a), CursorValue::Decimal(b)) => (*a as f64).total_cmp(b),
            (CursorValue::Decimal(a), CursorValue::Number(b)) => a.total_cmp(&(*b as f64)),
            (CursorValue::Decimal(a), CursorValue::Decimal(b)) => a.total_cmp(b),
            (CursorValue::Timestamp(a), CursorValue::Timestamp(b)) => a.cmp(b),
            (CursorValue::String(a), CursorValue::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<&str> for CursorValue {
    fn from(s: &str) -> Self {
        CursorValue::String(s.to_string())
    }
}

impl From<String> for CursorValue {
    fn from(s: String) -> Self {
        CursorValue::String(s)
    }
}

impl From<i64> for CursorValue {
    fn from(n: i64) -> Self {
        CursorValue::Number(n)
    }
}

impl From<f64> for CursorValue {
    fn from(n: f64) -> Self {
        CursorValue::Decimal(n)
    }
}

impl From<bool> for CursorValue {
    fn from(b: bool) -> Self {
        CursorValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for CursorValue {
    fn from(ts: DateTime<Utc>) -> Self {
        CursorValue::Timestamp(ts)
    }
}

/// An opaque cursor for keyset pagination.
///
/// The cursor pins a position in one query's result order:
/// - the sort key value of a document
/// - the document id for tie-breaking
/// - the fingerprint of the query that produced it
///
/// # Encoding
///
/// Cursors encode to URL-safe base64 JSON so they can travel through links
/// and query strings untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Cursor format version.
    version: u8,

    /// Fingerprint of the query the cursor belongs to.
    fingerprint: QueryFingerprint,

    /// The sort key value at the cursor position.
    sort_value: CursorValue,

    /// The document id at the cursor position.
    document_id: String,
}

impl PageCursor {
    /// Creates a new cursor at the given position.
    pub fn new(
        fingerprint: QueryFingerprint,
        sort_value: CursorValue,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            version: CURSOR_VERSION,
            fingerprint,
            sort_value,
            document_id: document_id.into(),
        }
    }

    /// Creates a cursor positioned on `document` under `sort`.
    pub fn from_document(
        document: &Document,
        sort: &SortDirective,
        fingerprint: QueryFingerprint,
    ) -> Self {
        Self::new(fingerprint, document.sort_value(&sort.field), document.id())
    }

    /// Returns the sort value.
    pub fn sort_value(&self) -> &CursorValue {
        &self.sort_value
    }

    /// Returns the document id.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Returns the query fingerprint.
    pub fn fingerprint(&self) -> QueryFingerprint {
        self.fingerprint
    }

    /// Fails unless the cursor was produced for `fingerprint`.
    pub fn ensure_query(&self, fingerprint: QueryFingerprint) -> Result<(), CursorError> {
        if self.fingerprint == fingerprint {
            Ok(())
        } else {
            Err(CursorError::QueryMismatch)
        }
    }

    /// Orders `document` relative to this cursor in `sort` order.
    ///
    /// `Greater` means the document comes after the cursor position.
    pub fn position_of(&self, document: &Document, sort: &SortDirective) -> Ordering {
        let ordering = document
            .sort_value(&sort.field)
            .compare(&self.sort_value)
            .then_with(|| document.id().cmp(&self.document_id));
        sort.direction.apply(ordering)
    }

    /// Encodes the cursor to an opaque string.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decodes a cursor from an opaque string.
    pub fn decode(s: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|_| CursorError::InvalidCursor {
                cursor: s.to_string(),
            })?;

        let cursor: Self =
            serde_json::from_slice(&bytes).map_err(|_| CursorError::InvalidCursor {
                cursor: s.to_string(),
            })?;
        if cursor.version != CURSOR_VERSION {
            return Err(CursorError::InvalidCursor {
                cursor: s.to_string(),
            });
        }
        Ok(cursor)
    }
}

/// A page of listing results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T = Document> {
    /// The rows in query sort order.
    pub rows: Vec<T>,

    /// Whether there are more rows after this page.
    pub has_next: bool,

    /// Cursor at the first row, if any.
    pub first_row_cursor: Option<PageCursor>,

    /// Cursor at the last row, if any.
    pub last_row_cursor: Option<PageCursor>,

    /// Zero-based page index.
    pub index: usize,

    /// Served by a degraded fallback query; may hold fewer rows than the
    /// page size even when more matches exist.
    pub degraded: bool,

    /// Client-side matching dropped rows from a full batch, so `has_next`
    /// only covers that batch and later matches may exist.
    #[serde(default)]
    pub client_filtered: bool,
}

impl<T> Page<T> {
    /// Creates an empty first page.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            has_next: false,
            first_row_cursor: None,
            last_row_cursor: None,
            index: 0,
            degraded: false,
            client_filtered: false,
        }
    }

    /// Returns true if this page has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows in this page.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Maps the rows to a different type.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            rows: self.rows.into_iter().map(f).collect(),
            has_next: self.has_next,
            first_row_cursor: self.first_row_cursor,
            last_row_cursor: self.last_row_cursor,
            index: self.index,
            degraded: self.degraded,
            client_filtered: self.client_filtered,
        }
    }
}

impl Page<Document> {
    /// Builds a page from rows already trimmed to the page size.
    pub fn from_rows(
        rows: Vec<Document>,
        has_next: bool,
        index: usize,
        sort: &SortDirective,
        fingerprint: QueryFingerprint,
    ) -> Self {
        let first_row_cursor = rows
            .first()
            .map(|doc| PageCursor::from_document(doc, sort, fingerprint));
        let last_row_cursor = rows
            .last()
            .map(|doc| PageCursor::from_document(doc, sort, fingerprint));
        Self {
            rows,
            has_next,
            first_row_cursor,
            last_row_cursor,
            index,
            degraded: false,
            client_filtered: false,
        }
    }

    /// Returns the row ids in order.
    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(Document::id).collect()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// What the caller wants to see next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationIntent {
    /// The first page, with no lower bound.
    First,
    /// The page after the current one.
    Next,
    /// The page before the current one.
    Previous,
    /// The current page again, in place.
    Refresh,
}

impl fmt::Display for NavigationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NavigationIntent::First => "first",
            NavigationIntent::Next => "next",
            NavigationIntent::Previous => "previous",
            NavigationIntent::Refresh => "refresh",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Query;
    use serde_json::json;

    fn fingerprint() -> QueryFingerprint {
        Query::new("books", SortDirective::asc("title"), 10).fingerprint()
    }

    #[test]
    fn test_cursor_encode_decode() {
        let cursor = PageCursor::new(fingerprint(), CursorValue::from("Algebra"), "book-1");

        let decoded = PageCursor::decode(&cursor.encode()).unwrap();

        assert_eq!(decoded, cursor);
        assert_eq!(decoded.document_id(), "book-1");
    }

    #[test]
    fn test_cursor_decode_invalid() {
        assert!(matches!(
            PageCursor::decode("not-valid-base64!!!"),
            Err(CursorError::InvalidCursor { .. })
        ));
        let not_json = URL_SAFE_NO_PAD.encode(b"{oops");
        assert!(PageCursor::decode(&not_json).is_err());
    }

    #[test]
    fn test_cursor_rejects_other_query() {
        let cursor = PageCursor::new(fingerprint(), CursorValue::Null, "x");
        let other = Query::new("books", SortDirective::desc("title"), 10).fingerprint();
        assert!(cursor.ensure_query(fingerprint()).is_ok());
        assert_eq!(cursor.ensure_query(other), Err(CursorError::QueryMismatch));
    }

    #[test]
    fn test_cursor_value_ordering_across_kinds() {
        let ordered = [
            CursorValue::Null,
            CursorValue::Boolean(false),
            CursorValue::Boolean(true),
            CursorValue::Number(1),
            CursorValue::Decimal(1.5),
            CursorValue::Number(2),
            CursorValue::Timestamp(DateTime::from_timestamp(0, 0).unwrap()),
            CursorValue::String("a".into()),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].compare(&pair[1]), Ordering::Less, "{pair:?}");
        }
    }

    #[test]
    fn test_store_timestamp_object() {
        let value = CursorValue::from_json(&json!({"seconds": 1_700_000_000, "nanoseconds": 5}));
        assert!(matches!(value, CursorValue::Timestamp(_)));

        let admin_shape = CursorValue::from_json(&json!({"_seconds": 10, "_nanoseconds": 0}));
        assert!(matches!(admin_shape, CursorValue::Timestamp(_)));

        let other = CursorValue::from_json(&json!({"seconds": 1, "label": "x"}));
        assert!(matches!(other, CursorValue::String(_)));
    }

    #[test]
    fn test_timestamp_cursor_round_trip_keeps_kind() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let cursor = PageCursor::new(fingerprint(), ts.into(), "c-1");
        let decoded = PageCursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded.sort_value(), &CursorValue::Timestamp(ts));
    }

    #[test]
    fn test_position_of_respects_direction() {
        let fp = fingerprint();
        let cursor = PageCursor::new(fp, CursorValue::Number(3), "c");
        let after = Document::from_json("d", json!({"n": 4}));
        let same = Document::from_json("c", json!({"n": 3}));

        assert_eq!(cursor.position_of(&after, &SortDirective::asc("n")), Ordering::Greater);
        assert_eq!(cursor.position_of(&after, &SortDirective::desc("n")), Ordering::Less);
        assert_eq!(cursor.position_of(&same, &SortDirective::asc("n")), Ordering::Equal);
    }

    #[test]
    fn test_page_from_rows_cursors() {
        let fp = fingerprint();
        let sort = SortDirective::asc("n");
        let rows = vec![
            Document::from_json("a", json!({"n": 1})),
            Document::from_json("b", json!({"n": 2})),
        ];
        let page = Page::from_rows(rows, true, 3, &sort, fp);

        assert_eq!(page.ids(), vec!["a", "b"]);
        assert_eq!(page.index, 3);
        assert_eq!(page.first_row_cursor.as_ref().unwrap().document_id(), "a");
        assert_eq!(page.last_row_cursor.as_ref().unwrap().document_id(), "b");
    }

    #[test]
    fn test_page_map() {
        let page = Page {
            rows: vec![1, 2, 3],
            ..Page::empty()
        };
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.rows, vec![2, 4, 6]);
    }

    #[test]
    fn test_navigation_intent_display() {
        assert_eq!(NavigationIntent::Previous.to_string(), "previous");
    }
}
