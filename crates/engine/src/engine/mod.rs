//! Pagination engines.
//!
//! - [`PaginationEngine`] - Cursor-based engine over a remote document store
//! - [`OffsetPaginator`] - Offset-based paging over rows held in memory
//! - [`SessionRegistry`] - Per-session engines for a shared service

mod offset;
mod registry;
mod session;

pub use offset::OffsetPaginator;
pub use registry::SessionRegistry;
pub use session::{EngineStatus, NavigationOutcome, PaginationEngine, PendingPage};
