//! Listing configuration.
//!
//! Each listing view supplies one [`ListingConfig`]: the collection, the sort
//! key, the page size, its fixed equality filters and, optionally, the
//! precomputed lowercase field used for prefix search.
//!
//! # Example
//!
//! ```
//! use pageline_engine::types::{ListingConfig, SortDirection};
//!
//! let config: ListingConfig = serde_json::from_str(r#"{
//!     "collection": "courses",
//!     "sort_field": "createdAt",
//!     "sort_direction": "desc",
//!     "page_size": 10,
//!     "equality_filters": [["status", "active"]],
//!     "search_field": "titleLower",
//!     "fetch_timeout": "5s"
//! }"#).unwrap();
//!
//! assert_eq!(config.sort_direction, SortDirection::Desc);
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ConfigError;

use super::query::{Filter, SortDirection, SortDirective};

fn default_page_size() -> u32 {
    20
}

/// Largest page size a listing may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Configuration for one listing instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Logical collection name.
    pub collection: String,

    /// Field used as the primary sort key.
    pub sort_field: String,

    /// Sort direction.
    #[serde(default)]
    pub sort_direction: SortDirection,

    /// Rows per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Fixed equality filters as `(field, value)` pairs.
    #[serde(default)]
    pub equality_filters: Vec<(String, Value)>,

    /// Precomputed lowercase field used for prefix search.
    #[serde(default)]
    pub search_field: Option<String>,

    /// Fields whose text is matched client-side when no search field is set.
    #[serde(default)]
    pub search_fallback_fields: Vec<String>,

    /// Upper bound on a single store fetch.
    #[serde(
        default,
        serialize_with = "serialize_timeout",
        deserialize_with = "deserialize_timeout"
    )]
    pub fetch_timeout: Option<Duration>,
}

impl ListingConfig {
    /// Creates a configuration with default page size and no filters.
    pub fn new(collection: impl Into<String>, sort_field: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            sort_field: sort_field.into(),
            sort_direction: SortDirection::Asc,
            page_size: default_page_size(),
            equality_filters: Vec::new(),
            search_field: None,
            search_fallback_fields: Vec::new(),
            fetch_timeout: None,
        }
    }

    /// Sets the sort direction.
    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.sort_direction = direction;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Adds an equality filter.
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equality_filters.push((field.into(), value.into()));
        self
    }

    /// Sets the prefix search field.
    pub fn with_search_field(mut self, field: impl Into<String>) -> Self {
        self.search_field = Some(field.into());
        self
    }

    /// Adds a client-side search field.
    pub fn with_search_fallback_field(mut self, field: impl Into<String>) -> Self {
        self.search_fallback_fields.push(field.into());
        self
    }

    /// Sets the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Returns the sort directive.
    pub fn sort(&self) -> SortDirective {
        SortDirective {
            field: self.sort_field.clone(),
            direction: self.sort_direction,
        }
    }

    /// Returns the configured filters.
    pub fn filters(&self) -> Vec<Filter> {
        self.equality_filters
            .iter()
            .map(|(field, value)| Filter::eq(field.clone(), value.clone()))
            .collect()
    }

    /// Validates the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.collection.trim().is_empty() {
            errors.push("Collection cannot be empty".to_string());
        }

        if self.sort_field.trim().is_empty() {
            errors.push("Sort field cannot be empty".to_string());
        }

        if self.page_size == 0 {
            errors.push("Page size cannot be 0".to_string());
        }

        if self.page_size > MAX_PAGE_SIZE {
            errors.push(format!("Page size cannot exceed {MAX_PAGE_SIZE}"));
        }

        if self
            .equality_filters
            .iter()
            .any(|(field, _)| field.trim().is_empty())
        {
            errors.push("Filter field names cannot be empty".to_string());
        }

        if let Some(field) = &self.search_field {
            if field.trim().is_empty() {
                errors.push("Search field cannot be empty".to_string());
            }
        }

        if self.fetch_timeout == Some(Duration::ZERO) {
            errors.push("Fetch timeout cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates and converts failures into a [`ConfigError`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()
            .map_err(|errors| ConfigError::Invalid { errors })?;
        Ok(self)
    }
}

fn serialize_timeout<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(duration) => s.serialize_some(&humantime::format_duration(*duration).to_string()),
        None => s.serialize_none(),
    }
}

fn deserialize_timeout<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config: ListingConfig =
            serde_json::from_value(json!({"collection": "books", "sort_field": "title"})).unwrap();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.sort_direction, SortDirection::Asc);
        assert!(config.fetch_timeout.is_none());
    }

    #[test]
    fn test_timeout_round_trip() {
        let config =
            ListingConfig::new("books", "title").with_fetch_timeout(Duration::from_millis(1500));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["fetch_timeout"], json!("1s 500ms"));

        let parsed: ListingConfig = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.fetch_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let result: Result<ListingConfig, _> = serde_json::from_value(json!({
            "collection": "books",
            "sort_field": "title",
            "fetch_timeout": "soon"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_collects_errors() {
        let config = ListingConfig::new("", " ").with_page_size(0);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_validate_page_size_limit() {
        let config = ListingConfig::new("books", "title").with_page_size(MAX_PAGE_SIZE + 1);
        assert!(config.validate().is_err());
        assert!(matches!(
            config.validated(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_sort_and_filters() {
        let config = ListingConfig::new("courses", "createdAt")
            .with_direction(SortDirection::Desc)
            .with_page_size(5)
            .with_filter("status", "active");

        assert_eq!(config.sort(), SortDirective::desc("createdAt"));
        assert_eq!(config.filters(), vec![Filter::eq("status", "active")]);
    }
}
