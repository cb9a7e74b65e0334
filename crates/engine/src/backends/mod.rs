//! Document store implementations.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | `memory` | In-process store with composite index emulation and fault injection |
//!
//! Remote stores implement [`DocumentStore`](crate::core::DocumentStore)
//! directly and map their status codes with
//! [`StoreError::classify`](crate::error::StoreError::classify).
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "memory")]
//! # {
//! use pageline_engine::backends::memory::{MemoryStore, MemoryStoreConfig};
//!
//! let store = MemoryStore::with_config(MemoryStoreConfig::strict());
//! store.add_index("courses", &["status", "createdAt"]);
//! # }
//! ```

#[cfg(feature = "memory")]
pub mod memory;
