//! In-memory document store.
//!
//! Behaves like a hosted document database from the engine's point of view:
//! rows come back sorted and bounded, and with `require_indexes` enabled a
//! compound query fails with `IndexMissing` until a matching composite index
//! is registered. Failures and latency can be injected for tests.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{DocumentStore, StoreCapabilities, StoreQuery};
use crate::error::{StoreError, StoreResult};
use crate::types::Document;

/// Configuration for the in-memory store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    /// Reject compound queries without a registered composite index.
    #[serde(default)]
    pub require_indexes: bool,

    /// Advertise prefix range support.
    #[serde(default = "default_true")]
    pub prefix_range: bool,

    /// Largest limit accepted per query.
    #[serde(default)]
    pub max_limit: Option<usize>,

    /// Fixed delay applied to every query, in milliseconds.
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl MemoryStoreConfig {
    /// Config with composite index enforcement on.
    pub fn strict() -> Self {
        Self {
            require_indexes: true,
            prefix_range: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IndexKey {
    collection: String,
    constrained: BTreeSet<String>,
    sort_field: String,
}

/// Document store held entirely in memory.
pub struct MemoryStore {
    config: MemoryStoreConfig,
    collections: RwLock<HashMap<String, Vec<Document>>>,
    indexes: RwLock<HashSet<IndexKey>>,
    failures: Mutex<VecDeque<StoreError>>,
    queries: AtomicUsize,
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("config", &self.config)
            .field("collections", &self.collections.read().len())
            .field("indexes", &self.indexes.read().len())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a store that accepts every query.
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig {
            prefix_range: true,
            ..Default::default()
        })
    }

    /// Creates a store with custom configuration.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            collections: RwLock::new(HashMap::new()),
            indexes: RwLock::new(HashSet::new()),
            failures: Mutex::new(VecDeque::new()),
            queries: AtomicUsize::new(0),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MemoryStoreConfig {
        &self.config
    }

    /// Inserts or replaces a document.
    pub fn insert(&self, collection: &str, document: Document) {
        let mut collections = self.collections.write();
        let rows = collections.entry(collection.to_string()).or_default();
        match rows.iter_mut().find(|d| d.id() == document.id()) {
            Some(existing) => *existing = document,
            None => rows.push(document),
        }
    }

    /// Inserts a JSON object, taking its id from an `id` field or generating one.
    pub fn insert_json(&self, collection: &str, value: Value) -> Document {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut data = match value {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        data.remove("id");
        let document = Document::new(id, data);
        self.insert(collection, document.clone());
        document
    }

    /// Inserts many documents.
    pub fn insert_many(&self, collection: &str, documents: impl IntoIterator<Item = Document>) {
        for document in documents {
            self.insert(collection, document);
        }
    }

    /// Removes a document; returns true if it existed.
    pub fn remove(&self, collection: &str, id: &str) -> bool {
        let mut collections = self.collections.write();
        match collections.get_mut(collection) {
            Some(rows) => {
                let before = rows.len();
                rows.retain(|d| d.id() != id);
                rows.len() != before
            }
            None => false,
        }
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Removes every document and index.
    pub fn clear(&self) {
        self.collections.write().clear();
        self.indexes.write().clear();
    }

    /// Registers a composite index over `fields`; the last field is the sort.
    pub fn add_index(&self, collection: &str, fields: &[&str]) {
        let Some((sort_field, constrained)) = fields.split_last() else {
            return;
        };
        self.indexes.write().insert(IndexKey {
            collection: collection.to_string(),
            constrained: constrained.iter().map(|f| f.to_string()).collect(),
            sort_field: sort_field.to_string(),
        });
    }

    /// Makes the next query fail with `error` (queued, first in first out).
    pub fn fail_next(&self, error: StoreError) {
        self.failures.lock().push_back(error);
    }

    /// Number of queries received, including failed ones.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check_index(&self, query: &StoreQuery) -> StoreResult<()> {
        if !self.config.require_indexes || !query.is_compound() {
            return Ok(());
        }
        let constrained: BTreeSet<String> = query
            .filters
            .iter()
            .map(|f| f.field.clone())
            .chain(query.prefix.iter().map(|p| p.field.clone()))
            .filter(|f| *f != query.sort.field)
            .collect();
        if constrained.is_empty() {
            return Ok(());
        }

        let key = IndexKey {
            collection: query.collection.clone(),
            constrained,
            sort_field: query.sort.field.clone(),
        };
        if self.indexes.read().contains(&key) {
            return Ok(());
        }

        let fields = query.index_fields();
        Err(StoreError::IndexMissing {
            hint: Some(format!(
                "memory://indexes/{}?fields={}",
                query.collection,
                fields.join(",")
            )),
            collection: query.collection.clone(),
            fields,
        })
    }

    fn execute(&self, query: &StoreQuery) -> Vec<Document> {
        let collections = self.collections.read();
        let Some(rows) = collections.get(&query.collection) else {
            return Vec::new();
        };

        let mut matched: Vec<&Document> = rows
            .iter()
            .filter(|doc| query.filters.iter().all(|f| f.matches(doc)))
            .filter(|doc| match &query.prefix {
                Some(range) => doc.text(&range.field).is_some_and(|v| range.contains(v)),
                None => true,
            })
            .filter(|doc| match &query.start {
                Some(bound) => match bound.cursor.position_of(doc, &query.sort) {
                    std::cmp::Ordering::Greater => true,
                    std::cmp::Ordering::Equal => bound.inclusive,
                    std::cmp::Ordering::Less => false,
                },
                None => true,
            })
            .collect();

        matched.sort_by(|a, b| query.sort.compare(a, b));
        let limit = match self.config.max_limit {
            Some(max) => query.limit.min(max),
            None => query.limit,
        };
        matched.into_iter().take(limit).cloned().collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            prefix_range: self.config.prefix_range,
            max_limit: self.config.max_limit,
        }
    }

    async fn run_query(&self, query: &StoreQuery) -> StoreResult<Vec<Document>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(ms) = self.config.latency_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        let injected = self.failures.lock().pop_front();
        if let Some(error) = injected {
            return Err(error);
        }

        self.check_index(query)?;
        Ok(self.execute(query))
    }
}
