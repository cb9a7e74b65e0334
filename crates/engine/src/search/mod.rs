//! Free-text search handling.
//!
//! See [`SearchTokenMatcher`] for how a token is split between the server
//! prefix range and client-side substring matching.

mod matcher;

pub use matcher::{
    PREFIX_RANGE_SENTINEL, SearchTokenMatcher, matches_client_side, normalize,
};
