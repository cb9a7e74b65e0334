//! Document store contract.
//!
//! The engine needs exactly three things from a storage layer:
//!
//! 1. run a filtered, sorted, bounded query with an optional start cursor
//! 2. recognize the missing-index error class
//! 3. produce an opaque cursor from a returned row
//!
//! Everything else (schema, field names, which collection) is supplied per
//! listing by the caller.

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::types::{Document, Filter, PageCursor, QueryFingerprint, SortDirective};

/// Where a fetch starts relative to a cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct StartBound {
    /// The cursor position.
    pub cursor: PageCursor,
    /// Whether the row at the cursor itself is included.
    pub inclusive: bool,
}

impl StartBound {
    /// Starts at the cursor row (backward navigation, refresh).
    pub fn at(cursor: PageCursor) -> Self {
        Self {
            cursor,
            inclusive: true,
        }
    }

    /// Starts right after the cursor row (forward navigation).
    pub fn after(cursor: PageCursor) -> Self {
        Self {
            cursor,
            inclusive: false,
        }
    }
}

/// Inclusive string range on a precomputed lowercase field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRange {
    /// The field the range applies to.
    pub field: String,
    /// Lower bound (the token itself).
    pub lower: String,
    /// Upper bound (token plus sentinel).
    pub upper: String,
}

impl PrefixRange {
    /// Returns true if `value` lies within the range.
    pub fn contains(&self, value: &str) -> bool {
        value >= self.lower.as_str() && value <= self.upper.as_str()
    }
}

/// A query as sent to a document store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    /// Collection to read.
    pub collection: String,
    /// Primary sort; the document id breaks ties.
    pub sort: SortDirective,
    /// Field constraints.
    pub filters: Vec<Filter>,
    /// Optional prefix range for search.
    pub prefix: Option<PrefixRange>,
    /// Optional start position.
    pub start: Option<StartBound>,
    /// Maximum number of rows returned.
    pub limit: usize,
}

impl StoreQuery {
    /// Creates a sort-only query.
    pub fn new(collection: impl Into<String>, sort: SortDirective, limit: usize) -> Self {
        Self {
            collection: collection.into(),
            sort,
            filters: Vec::new(),
            prefix: None,
            start: None,
            limit,
        }
    }

    /// Returns true if the query combines constraints with the sort.
    pub fn is_compound(&self) -> bool {
        !self.filters.is_empty() || self.prefix.is_some()
    }

    /// Fields a composite index would need to cover, sort field last.
    pub fn index_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        let constrained = self
            .filters
            .iter()
            .map(|f| f.field.as_str())
            .chain(self.prefix.as_ref().map(|p| p.field.as_str()));
        for field in constrained {
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }
        if !fields.contains(&self.sort.field) {
            fields.push(self.sort.field.clone());
        }
        fields
    }

    /// The narrowest query that needs no composite index: same sort, start
    /// bound and limit, no filters, no prefix range.
    pub fn degraded(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            sort: self.sort.clone(),
            filters: Vec::new(),
            prefix: None,
            start: self.start.clone(),
            limit: self.limit,
        }
    }
}

/// What a store can do natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// String range queries usable for prefix search.
    pub prefix_range: bool,
    /// Largest `limit` the store accepts.
    pub max_limit: Option<usize>,
}

impl Default for StoreCapabilities {
    fn default() -> Self {
        Self {
            prefix_range: true,
            max_limit: None,
        }
    }
}

/// A remote document database as seen by the pagination engine.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use pageline_engine::core::{DocumentStore, StoreQuery};
/// use pageline_engine::error::{StoreError, StoreResult};
/// use pageline_engine::types::Document;
///
/// struct RemoteStore { /* client handle */ }
///
/// #[async_trait]
/// impl DocumentStore for RemoteStore {
///     fn backend_name(&self) -> &'static str {
///         "remote"
///     }
///
///     async fn run_query(&self, query: &StoreQuery) -> StoreResult<Vec<Document>> {
///         let response = self.client.run(query).await;
///         response.map_err(|e| StoreError::classify(&query.collection, e.code(), e.message()))
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns a short name used in logs.
    fn backend_name(&self) -> &'static str;

    /// Returns the native capabilities of this store.
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::default()
    }

    /// Runs a filtered, sorted, bounded query.
    ///
    /// Rows come back in `query.sort` order (ties by id), start strictly after
    /// (or at, when inclusive) the start cursor, and number at most
    /// `query.limit`.
    ///
    /// # Errors
    ///
    /// * `StoreError::IndexMissing` - the combination needs an index that does not exist
    /// * `StoreError::Transient` / `StoreError::Timeout` - the fetch failed
    /// * `StoreError::PermissionDenied` - the caller cannot read the collection
    async fn run_query(&self, query: &StoreQuery) -> StoreResult<Vec<Document>>;

    /// Returns true if `error` is the missing-index class.
    fn is_index_missing(&self, error: &StoreError) -> bool {
        error.is_index_missing()
    }

    /// Produces an opaque cursor positioned on `document`.
    fn cursor_for(
        &self,
        document: &Document,
        sort: &SortDirective,
        fingerprint: QueryFingerprint,
    ) -> PageCursor {
        PageCursor::from_document(document, sort, fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchTokenMatcher;

    #[test]
    fn test_degraded_keeps_sort_start_and_limit() {
        let (lower, upper) = SearchTokenMatcher::prefix_range("math");
        let mut query = StoreQuery::new("courses", SortDirective::desc("createdAt"), 11);
        query.filters.push(Filter::eq("status", "active"));
        query.prefix = Some(PrefixRange {
            field: "titleLower".into(),
            lower,
            upper,
        });

        assert!(query.is_compound());
        let degraded = query.degraded();
        assert!(!degraded.is_compound());
        assert_eq!(degraded.sort, query.sort);
        assert_eq!(degraded.limit, 11);
        assert_eq!(degraded.start, query.start);
    }

    #[test]
    fn test_index_fields() {
        let mut query = StoreQuery::new("courses", SortDirective::asc("createdAt"), 3);
        query.filters.push(Filter::eq("status", "active"));
        query.filters.push(Filter::eq("status", "active"));
        assert_eq!(query.index_fields(), vec!["status", "createdAt"]);
    }

    #[test]
    fn test_prefix_contains() {
        let (lower, upper) = SearchTokenMatcher::prefix_range("alg");
        let range = PrefixRange {
            field: "titleLower".into(),
            lower,
            upper,
        };
        assert!(range.contains("algebra"));
        assert!(range.contains("alg"));
        assert!(!range.contains("geometry"));
        assert!(!range.contains("al"));
    }
}
