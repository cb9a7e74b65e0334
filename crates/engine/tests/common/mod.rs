//! Test infrastructure for the pagination engine.
//!
//! This module provides seeded stores and store wrappers that let tests
//! control when a query completes.

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

// Re-export commonly used items
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use harness::*;
