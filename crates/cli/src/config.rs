//! Command line configuration for `pageline`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PAGELINE_DATA` | - | JSON document file |
//! | `PAGELINE_COLLECTION` | items | Collection to list |
//! | `PAGELINE_SORT_FIELD` | createdAt | Sort field |
//! | `PAGELINE_PAGE_SIZE` | 20 | Rows per page |
//! | `PAGELINE_SEARCH_FIELD` | - | Field holding lowercased search text |
//! | `PAGELINE_PAGES` | 3 | Pages to walk forward |
//! | `PAGELINE_REQUIRE_INDEXES` | false | Reject compound queries without an index |
//! | `PAGELINE_LOG_LEVEL` | warn | Log level |

use std::path::PathBuf;

use clap::Parser;
use pageline_engine::types::{ListingConfig, SortDirection};
use serde_json::Value;

/// Walks a paginated listing over a JSON document file.
#[derive(Debug, Clone, Parser)]
#[command(name = "pageline")]
#[command(about = "Page through a JSON document collection with keyset cursors")]
pub struct CliConfig {
    /// JSON file: an array of documents, or an object of collection name to array.
    #[arg(long, env = "PAGELINE_DATA")]
    pub data: PathBuf,

    /// Collection to list.
    #[arg(long, env = "PAGELINE_COLLECTION", default_value = "items")]
    pub collection: String,

    /// Field to sort by.
    #[arg(long, env = "PAGELINE_SORT_FIELD", default_value = "createdAt")]
    pub sort_field: String,

    /// Sort descending.
    #[arg(long)]
    pub desc: bool,

    /// Rows per page.
    #[arg(long, env = "PAGELINE_PAGE_SIZE", default_value = "20")]
    pub page_size: u32,

    /// Equality filter `field=value`; values that parse as JSON keep their type.
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, Value)>,

    /// Search text.
    #[arg(long)]
    pub search: Option<String>,

    /// Field holding the lowercased search text.
    #[arg(long, env = "PAGELINE_SEARCH_FIELD")]
    pub search_field: Option<String>,

    /// Fields searched client-side when no search field is set.
    #[arg(long = "search-fallback", value_delimiter = ',')]
    pub search_fallback: Vec<String>,

    /// Pages to walk forward before walking back to the first.
    #[arg(long, env = "PAGELINE_PAGES", default_value = "3")]
    pub pages: usize,

    /// Reject compound queries that have no registered composite index.
    #[arg(long, env = "PAGELINE_REQUIRE_INDEXES")]
    pub require_indexes: bool,

    /// Composite index to register, as comma-separated fields with the sort field last.
    #[arg(long = "index")]
    pub indexes: Vec<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "PAGELINE_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl CliConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = self
            .listing_config()
            .validate()
            .err()
            .unwrap_or_default();

        if self.pages == 0 {
            errors.push("Pages must be at least 1".to_string());
        }

        for index in &self.indexes {
            if index_fields(index).is_empty() {
                errors.push(format!("Index '{}' names no fields", index));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the listing configuration.
    pub fn listing_config(&self) -> ListingConfig {
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        let mut config = ListingConfig::new(&self.collection, &self.sort_field)
            .with_direction(direction)
            .with_page_size(self.page_size);
        for (field, value) in &self.filters {
            config = config.with_filter(field.clone(), value.clone());
        }
        if let Some(field) = &self.search_field {
            config = config.with_search_field(field.clone());
        }
        for field in &self.search_fallback {
            config = config.with_search_fallback_field(field.clone());
        }
        config
    }
}

/// Splits an index spec into its fields.
pub fn index_fields(spec: &str) -> Vec<&str> {
    spec.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

fn parse_filter(s: &str) -> Result<(String, Value), String> {
    let (field, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", s))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field.to_string(), value))
}
