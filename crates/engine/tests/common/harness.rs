//! Store wrappers that give tests control over query timing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use pageline_engine::backends::memory::MemoryStore;
use pageline_engine::core::{DocumentStore, StoreCapabilities, StoreQuery};
use pageline_engine::error::StoreResult;
use pageline_engine::types::Document;

struct Gate {
    release: Option<oneshot::Sender<()>>,
    wait: Option<oneshot::Receiver<()>>,
}

impl Gate {
    fn new() -> Self {
        let (release, wait) = oneshot::channel();
        Self {
            release: Some(release),
            wait: Some(wait),
        }
    }
}

/// Holds every query until the test releases it by call number.
///
/// Calls are numbered from zero in the order they reach the store. The
/// underlying store is read after release, so data changed while a call is
/// held is visible to it.
pub struct GatedStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    gates: Mutex<HashMap<usize, Gate>>,
}

impl GatedStore {
    /// Wraps `inner`.
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Number of calls that reached the store.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Lets call `n` proceed.
    pub fn release(&self, n: usize) {
        let sender = self
            .gates
            .lock()
            .entry(n)
            .or_insert_with(Gate::new)
            .release
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }

    /// Waits until `n` calls have reached the store.
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("store calls did not arrive");
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    fn backend_name(&self) -> &'static str {
        "gated"
    }

    fn capabilities(&self) -> StoreCapabilities {
        self.inner.capabilities()
    }

    async fn run_query(&self, query: &StoreQuery) -> StoreResult<Vec<Document>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let wait = self
            .gates
            .lock()
            .entry(n)
            .or_insert_with(Gate::new)
            .wait
            .take();
        if let Some(wait) = wait {
            let _ = wait.await;
        }
        self.inner.run_query(query).await
    }
}

/// Panics on every query.
pub struct PanickingStore;

#[async_trait]
impl DocumentStore for PanickingStore {
    fn backend_name(&self) -> &'static str {
        "panicking"
    }

    async fn run_query(&self, _query: &StoreQuery) -> StoreResult<Vec<Document>> {
        panic!("store crashed");
    }
}

/// Yields to the runtime until spawned navigations have had a chance to run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
