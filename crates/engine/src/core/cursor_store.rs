//! Cursor store for backward navigation.
//!
//! Records the first-row cursor of every page visited in the current query,
//! so stepping back to page `i` needs no re-derivation. Slot 0 is always
//! empty: the first page is fetched without a lower bound.

use crate::types::{PageCursor, QueryFingerprint};

/// Ordered first-row cursors indexed by page.
#[derive(Debug, Clone, Default)]
pub struct CursorStore {
    fingerprint: Option<QueryFingerprint>,
    starts: Vec<Option<PageCursor>>,
}

impl CursorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the store to a query, resetting it if the query changed.
    ///
    /// Returns true if the store was reset.
    pub fn bind(&mut self, fingerprint: QueryFingerprint) -> bool {
        if self.fingerprint == Some(fingerprint) {
            return false;
        }
        let had_entries = !self.starts.is_empty();
        self.reset();
        self.fingerprint = Some(fingerprint);
        had_entries
    }

    /// Returns the query the store is bound to.
    pub fn fingerprint(&self) -> Option<QueryFingerprint> {
        self.fingerprint
    }

    /// Records the first-row cursor of page `index`.
    ///
    /// Page 0 is always stored as `None`. Cursors from another query are
    /// ignored. Gaps before `index` are left empty.
    pub fn record_page_start(&mut self, index: usize, cursor: Option<PageCursor>) {
        let cursor = match cursor {
            Some(c) if index > 0 && self.accepts(&c) => Some(c),
            _ => None,
        };
        if self.starts.len() <= index {
            self.starts.resize(index + 1, None);
        }
        self.starts[index] = cursor;
    }

    /// Returns the first-row cursor of page `index`.
    pub fn cursor_for(&self, index: usize) -> Option<&PageCursor> {
        if index == 0 {
            return None;
        }
        self.starts.get(index).and_then(Option::as_ref)
    }

    /// Drops every entry at `index` and beyond.
    pub fn truncate_from(&mut self, index: usize) {
        self.starts.truncate(index);
    }

    /// Drops every entry.
    pub fn reset(&mut self) {
        self.starts.clear();
    }

    /// Number of pages recorded.
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Returns true if no page was recorded.
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    fn accepts(&self, cursor: &PageCursor) -> bool {
        match self.fingerprint {
            Some(fp) => cursor.ensure_query(fp).is_ok(),
            None => true,
        }
    }
}
