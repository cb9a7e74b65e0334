//! Request guard for overlapping reloads.
//!
//! Every reload takes a fresh [`Generation`]. A continuation commits its
//! result only if its generation is still the latest one handed out;
//! otherwise the result is dropped without error. Cancellation is
//! cooperative: superseded fetches still run to completion.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A reload generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Returns the raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out generations and answers freshness checks.
#[derive(Debug, Default)]
pub struct RequestGuard {
    latest: AtomicU64,
}

impl RequestGuard {
    /// Creates a guard with no generation issued yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation, superseding all earlier ones.
    pub fn begin(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Returns true if `generation` is still the latest.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest.load(Ordering::Acquire) == generation.0
    }

    /// Returns the latest generation issued.
    pub fn current(&self) -> Generation {
        Generation(self.latest.load(Ordering::Acquire))
    }
}
