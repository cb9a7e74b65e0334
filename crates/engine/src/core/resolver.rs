//! Index fallback resolver.
//!
//! Compound (filter + prefix range + sort) queries are exactly the ones a
//! hosted document database refuses when the composite index is missing. The
//! resolver runs the full query first and, only for that error class, retries
//! once with a sort-only query. The caller re-applies the dropped constraints
//! client-side.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::types::{Document, Filter};

use super::store::{DocumentStore, StoreQuery};

/// The unfiltered, untrimmed result of asking the store.
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    /// Rows as returned by the store.
    pub rows: Vec<Document>,

    /// True when the rows came from the degraded query.
    pub degraded: bool,

    /// Filters the store did not apply.
    pub dropped_filters: Vec<Filter>,
}

impl RawPage {
    fn full(rows: Vec<Document>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }
}

/// Executes store queries with a single degraded retry on missing indexes.
#[derive(Debug)]
pub struct IndexFallbackResolver<S> {
    store: Arc<S>,
    fetch_timeout: Option<Duration>,
}

impl<S> Clone for IndexFallbackResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl<S: DocumentStore> IndexFallbackResolver<S> {
    /// Creates a resolver over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            fetch_timeout: None,
        }
    }

    /// Bounds every store call by `timeout`.
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Runs `query`, falling back to the degraded query on a missing index.
    ///
    /// Errors other than the missing-index class propagate unchanged. If the
    /// degraded query itself reports a missing index the error is surfaced as
    /// transient, so the missing-index class never leaves the resolver.
    pub async fn execute(&self, query: &StoreQuery) -> StoreResult<RawPage> {
        let error = match self.fetch(query).await {
            Ok(rows) => return Ok(RawPage::full(rows)),
            Err(error) if self.store.is_index_missing(&error) => error,
            Err(error) => return Err(error),
        };

        report_missing_index(self.store.backend_name(), query, &error);

        let degraded = query.degraded();
        match self.fetch(&degraded).await {
            Ok(rows) => {
                debug!(
                    collection = %query.collection,
                    rows = rows.len(),
                    "Degraded query served"
                );
                Ok(RawPage {
                    rows,
                    degraded: true,
                    dropped_filters: query.filters.clone(),
                })
            }
            Err(error) if self.store.is_index_missing(&error) => Err(StoreError::Transient {
                message: format!("sort-only query on {} also needs an index", query.collection),
            }),
            Err(error) => Err(error),
        }
    }

    async fn fetch(&self, query: &StoreQuery) -> StoreResult<Vec<Document>> {
        match self.fetch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.store.run_query(query))
                .await
                .map_err(|_| StoreError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })?,
            None => self.store.run_query(query).await,
        }
    }
}

fn report_missing_index(backend: &str, query: &StoreQuery, error: &StoreError) {
    let (fields, hint) = match error {
        StoreError::IndexMissing { fields, hint, .. } if !fields.is_empty() => {
            (fields.clone(), hint.clone())
        }
        StoreError::IndexMissing { hint, .. } => (query.index_fields(), hint.clone()),
        _ => (query.index_fields(), None),
    };
    warn!(
        backend,
        collection = %query.collection,
        fields = %fields.join(","),
        hint = hint.as_deref().unwrap_or("-"),
        "Missing composite index, retrying with sort-only query"
    );
}
