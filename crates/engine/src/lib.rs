//! Pageline Pagination Engine
//!
//! This crate provides cursor-based (keyset) pagination over remote document
//! stores that only answer sorted, bounded queries. It keeps a listing
//! session's position across next/previous navigation, falls back to a
//! degraded query when the store lacks a composite index, and discards
//! results that arrive after a newer request has started.
//!
//! # Features
//!
//! - **Keyset cursors**: Pages are addressed by the first and last row, never by offset
//! - **Missing-index fallback**: Compound queries are retried sort-only and refiltered locally
//! - **Stale-result protection**: Every navigation carries a generation; only the latest commits
//! - **Search tokens**: Normalized prefix ranges pushed to the store, substring matching locally
//! - **Offset paging**: The same page shape over rows already held in memory
//!
//! Available features:
//! - `memory` (default) - In-memory document store with composite index emulation
//!
//! # Architecture
//!
//! - [`types`] - Documents, queries, cursors, pages and listing configuration
//! - [`error`] - Error types for all operations
//! - [`core`] - The store contract, fallback resolver, generation guard and cursor store
//! - [`search`] - Search token normalization and matching
//! - [`engine`] - The pagination engine, the offset paginator and the session registry
//! - [`backends`] - Store implementations
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pageline_engine::backends::memory::MemoryStore;
//! use pageline_engine::types::{Document, Filter, ListingConfig, NavigationIntent};
//! use pageline_engine::PaginationEngine;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! store.insert("courses", Document::from_json("c1", json!({
//!     "title": "Calculus",
//!     "titleLower": "calculus",
//!     "status": "active",
//!     "createdAt": 1,
//! })));
//!
//! let config = ListingConfig::new("courses", "createdAt")
//!     .with_page_size(10)
//!     .with_search_field("titleLower");
//! let engine = PaginationEngine::new(store, config)?;
//!
//! engine.navigate(NavigationIntent::First).await?;
//! engine.set_filters(vec![Filter::eq("status", "active")]).await?;
//! engine.set_search("calc").await?;
//!
//! let page = engine.current_page();
//! assert_eq!(page.ids(), vec!["c1"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Cursors
//!
//! Cursors are bound to the query they were produced by and can be handed to
//! clients as opaque strings:
//!
//! ```
//! use pageline_engine::types::{CursorValue, PageCursor, Query, SortDirective};
//!
//! let fingerprint = Query::new("courses", SortDirective::desc("createdAt"), 10).fingerprint();
//! let cursor = PageCursor::new(fingerprint, CursorValue::Number(42), "c1");
//!
//! let decoded = PageCursor::decode(&cursor.encode()).unwrap();
//! assert!(decoded.ensure_query(fingerprint).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod engine;
pub mod error;
pub mod search;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, CursorError, ListingError, ListingResult, StoreError, StoreResult};
pub use types::{Document, ListingConfig, NavigationIntent, Page, PageCursor, Query};

// Re-export the engine and the store contract
pub use core::{DocumentStore, StoreQuery};
pub use engine::{EngineStatus, NavigationOutcome, OffsetPaginator, PaginationEngine, SessionRegistry};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
