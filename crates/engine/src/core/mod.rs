//! Core building blocks of the pagination engine.
//!
//! - [`DocumentStore`] - The storage contract the engine consumes
//! - [`IndexFallbackResolver`] - Missing-index detection and degraded retry
//! - [`RequestGuard`] - Generation counter that discards stale results
//! - [`CursorStore`] - First-row cursors of visited pages
//!
//! # Data flow
//!
//! ```text
//! navigate(intent)
//!     └── RequestGuard::begin
//!             └── IndexFallbackResolver::execute ── DocumentStore::run_query
//!                     └── RequestGuard::is_current
//!                             └── CursorStore::record_page_start
//! ```

pub mod cursor_store;
pub mod guard;
pub mod resolver;
pub mod store;

pub use cursor_store::CursorStore;
pub use guard::{Generation, RequestGuard};
pub use resolver::{IndexFallbackResolver, RawPage};
pub use store::{DocumentStore, PrefixRange, StartBound, StoreCapabilities, StoreQuery};
