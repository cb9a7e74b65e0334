//! Core types for the pagination engine.
//!
//! - [`Document`] - A row returned by a document store
//! - [`Query`], [`Filter`], [`SortDirective`] - Query description
//! - [`PageCursor`], [`CursorValue`] - Opaque keyset positions
//! - [`Page`] - A bounded slice of rows plus navigation metadata
//! - [`ListingConfig`] - Per-listing configuration
//!
//! # Example
//!
//! ```
//! use pageline_engine::types::{Filter, Query, SortDirective};
//!
//! let query = Query::new("courses", SortDirective::parse("-createdAt"), 10)
//!     .with_filter(Filter::eq("status", "active"))
//!     .with_search_token(Some("math".to_string()));
//!
//! assert_eq!(query.filters.len(), 1);
//! ```

mod config;
mod document;
mod pagination;
mod query;

pub use config::{ListingConfig, MAX_PAGE_SIZE};
pub use document::Document;
pub use pagination::{CursorValue, NavigationIntent, Page, PageCursor};
pub use query::{Filter, FilterOp, Query, QueryFingerprint, SortDirection, SortDirective};
