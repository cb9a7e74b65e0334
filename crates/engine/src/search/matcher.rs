//! Search token normalization and matching.
//!
//! Free-text input is normalized once into a token. The token either narrows
//! the server query through a prefix range on a precomputed lowercase field,
//! or is applied after the fetch as a substring match. Both paths share the
//! same normalization so the fallback path never changes what matches.

use crate::types::Document;

/// Upper sentinel appended to a prefix to close the range.
pub const PREFIX_RANGE_SENTINEL: char = '\u{f8ff}';

/// Normalizes raw search input into a token.
///
/// Lowercases, trims and collapses inner whitespace runs. Returns `None` for
/// empty or whitespace-only input.
///
/// ```
/// use pageline_engine::search::normalize;
///
/// assert_eq!(normalize("  Intro  TO math "), Some("intro to math".to_string()));
/// assert_eq!(normalize("   "), None);
/// ```
pub fn normalize(raw: &str) -> Option<String> {
    let token = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if token.is_empty() { None } else { Some(token) }
}

/// Returns true iff the normalized `candidate` contains `token`.
pub fn matches_client_side(token: &str, candidate: &str) -> bool {
    match normalize(candidate) {
        Some(normalized) => normalized.contains(token),
        None => token.is_empty(),
    }
}

/// Decides where a search token is applied for one listing.
#[derive(Debug, Clone, Default)]
pub struct SearchTokenMatcher {
    search_field: Option<String>,
    fallback_fields: Vec<String>,
    store_supports_prefix: bool,
}

impl SearchTokenMatcher {
    /// Creates a matcher.
    ///
    /// * `search_field` - precomputed lowercase field, if the collection has one
    /// * `fallback_fields` - fields matched client-side when the search field is absent
    /// * `store_supports_prefix` - whether the store can run prefix range queries
    pub fn new(
        search_field: Option<String>,
        fallback_fields: Vec<String>,
        store_supports_prefix: bool,
    ) -> Self {
        Self {
            search_field,
            fallback_fields,
            store_supports_prefix,
        }
    }

    /// Returns the precomputed search field.
    pub fn search_field(&self) -> Option<&str> {
        self.search_field.as_deref()
    }

    /// Returns true when the token can be expressed as a server prefix range.
    pub fn can_push_to_server(&self, token: &str) -> bool {
        self.store_supports_prefix
            && self.search_field.is_some()
            && !token.is_empty()
            && !token.contains(PREFIX_RANGE_SENTINEL)
    }

    /// Returns the inclusive `[lower, upper]` prefix range for `token`.
    pub fn prefix_range(token: &str) -> (String, String) {
        let mut upper = String::with_capacity(token.len() + PREFIX_RANGE_SENTINEL.len_utf8());
        upper.push_str(token);
        upper.push(PREFIX_RANGE_SENTINEL);
        (token.to_string(), upper)
    }

    /// Returns the text a document is searched by.
    pub fn candidate_text(&self, document: &Document) -> Option<String> {
        if let Some(text) = self.search_field.as_deref().and_then(|f| document.text(f)) {
            return Some(text.to_string());
        }
        let parts: Vec<&str> = self
            .fallback_fields
            .iter()
            .filter_map(|field| document.text(field))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Applies the token to a document client-side.
    pub fn matches_document(&self, token: &str, document: &Document) -> bool {
        self.candidate_text(document)
            .is_some_and(|text| matches_client_side(token, &text))
    }
}
