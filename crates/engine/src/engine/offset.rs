//! Offset-based pagination over rows already held in memory.
//!
//! Simpler listings load their whole collection once and page through it
//! locally. [`OffsetPaginator`] applies the same filters and search matcher
//! as the cursor engine and returns the same [`Page`] shape, so both kinds of
//! listing render identically.

use crate::search::{SearchTokenMatcher, normalize};
use crate::types::{Document, Filter, Page, Query, SortDirective};

/// Pages through an in-memory row set by offset.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    collection: String,
    rows: Vec<Document>,
    sort: SortDirective,
    filters: Vec<Filter>,
    search_token: Option<String>,
    matcher: SearchTokenMatcher,
}

impl OffsetPaginator {
    /// Creates a paginator; rows are sorted by `sort`, ties by id.
    pub fn new(collection: impl Into<String>, rows: Vec<Document>, sort: SortDirective) -> Self {
        let mut paginator = Self {
            collection: collection.into(),
            rows,
            sort,
            filters: Vec::new(),
            search_token: None,
            matcher: SearchTokenMatcher::default(),
        };
        paginator.sort_rows();
        paginator
    }

    /// Sets the fields searched client-side.
    pub fn with_search_fields(mut self, search_field: Option<String>, fallback: Vec<String>) -> Self {
        self.matcher = SearchTokenMatcher::new(search_field, fallback, false);
        self
    }

    /// Replaces the filters.
    pub fn set_filters(&mut self, filters: Vec<Filter>) {
        self.filters = filters;
    }

    /// Replaces the search text.
    pub fn set_search(&mut self, raw: &str) {
        self.search_token = normalize(raw);
    }

    /// Replaces the sort and re-sorts the rows.
    pub fn set_sort(&mut self, sort: SortDirective) {
        self.sort = sort;
        self.sort_rows();
    }

    /// Replaces the row set.
    pub fn set_rows(&mut self, rows: Vec<Document>) {
        self.rows = rows;
        self.sort_rows();
    }

    /// Returns the rows matching the filters and search, in order.
    pub fn matching(&self) -> impl Iterator<Item = &Document> {
        self.rows.iter().filter(move |doc| {
            self.filters.iter().all(|f| f.matches(doc))
                && self
                    .search_token
                    .as_deref()
                    .is_none_or(|token| self.matcher.matches_document(token, doc))
        })
    }

    /// Number of matching rows.
    pub fn total_matching(&self) -> usize {
        self.matching().count()
    }

    /// Number of pages; an empty listing still has one (empty) page.
    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.total_matching().div_ceil(page_size).max(1)
    }

    /// Returns the query describing the current filters and search.
    pub fn query(&self, page_size: u32) -> Query {
        Query {
            collection: self.collection.clone(),
            sort: self.sort.clone(),
            filters: self.filters.clone(),
            search_token: self.search_token.clone(),
            page_size,
        }
    }

    /// Returns page `index` (zero-based). Out-of-range pages are empty.
    pub fn page(&self, index: usize, page_size: usize) -> Page {
        let fingerprint = self.query(page_size as u32).fingerprint();
        if page_size == 0 {
            return Page::from_rows(Vec::new(), false, index, &self.sort, fingerprint);
        }

        let offset = index.saturating_mul(page_size);
        let mut window = self.matching().skip(offset);
        let rows: Vec<Document> = window.by_ref().take(page_size).cloned().collect();
        let has_next = window.next().is_some();
        Page::from_rows(rows, has_next, index, &self.sort, fingerprint)
    }

    fn sort_rows(&mut self) {
        let sort = self.sort.clone();
        self.rows.sort_by(|a, b| sort.compare(a, b));
    }
}
