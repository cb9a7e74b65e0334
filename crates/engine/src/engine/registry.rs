//! Per-session isolation for a shared backend service.
//!
//! When one process serves many listing sessions, each session key gets its
//! own engine and therefore its own generation counter, cursor store and page
//! index. Only the document store is shared.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::core::DocumentStore;
use crate::error::ConfigError;
use crate::types::ListingConfig;

use super::session::PaginationEngine;

/// Engines keyed by session.
pub struct SessionRegistry<S> {
    store: Arc<S>,
    sessions: RwLock<HashMap<String, PaginationEngine<S>>>,
}

impl<S: DocumentStore + 'static> SessionRegistry<S> {
    /// Creates an empty registry over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the session's engine, creating it from `config` if absent.
    ///
    /// An existing session keeps its original configuration.
    pub fn open(
        &self,
        key: impl Into<String>,
        config: ListingConfig,
    ) -> Result<PaginationEngine<S>, ConfigError> {
        let key = key.into();
        if let Some(engine) = self.sessions.read().get(&key) {
            return Ok(engine.clone());
        }

        let mut sessions = self.sessions.write();
        if let Some(engine) = sessions.get(&key) {
            return Ok(engine.clone());
        }
        let engine = PaginationEngine::new(Arc::clone(&self.store), config)?;
        debug!(session = %key, collection = %engine.config().collection, "Session opened");
        sessions.insert(key, engine.clone());
        Ok(engine)
    }

    /// Returns the session's engine.
    pub fn get(&self, key: &str) -> Option<PaginationEngine<S>> {
        self.sessions.read().get(key).cloned()
    }

    /// Drops the session. In-flight fetches finish but commit nowhere visible.
    pub fn close(&self, key: &str) -> bool {
        let removed = self.sessions.write().remove(key).is_some();
        if removed {
            debug!(session = %key, "Session closed");
        }
        removed
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no session is open.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
