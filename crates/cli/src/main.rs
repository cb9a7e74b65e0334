//! Pageline CLI
//!
//! Loads a JSON document file into the in-memory store, walks the listing
//! forward page by page and then back to the first page, printing each
//! committed page as one JSON line.

mod config;
mod data;

use std::sync::Arc;

use clap::Parser;
use pageline_engine::backends::memory::{MemoryStore, MemoryStoreConfig};
use pageline_engine::types::{NavigationIntent, Page};
use pageline_engine::{NavigationOutcome, PaginationEngine};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use config::{CliConfig, index_fields};

/// One printed page.
#[derive(Debug, Serialize)]
struct PageLine<'a> {
    intent: String,
    index: usize,
    rows: Vec<Value>,
    has_next: bool,
    degraded: bool,
    client_filtered: bool,
    next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
}

impl<'a> PageLine<'a> {
    fn new(intent: NavigationIntent, page: &Page, search: Option<&'a str>) -> Self {
        let rows = page
            .rows
            .iter()
            .map(|doc| {
                let mut row = doc.data().clone();
                row.insert("id".to_string(), Value::String(doc.id().to_string()));
                Value::Object(row)
            })
            .collect();
        Self {
            intent: intent.to_string(),
            index: page.index,
            rows,
            has_next: page.has_next,
            degraded: page.degraded,
            client_filtered: page.client_filtered,
            next_cursor: page
                .has_next
                .then(|| page.last_row_cursor.as_ref().map(|c| c.encode()))
                .flatten(),
            search,
        }
    }
}

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("pageline={level},pageline_engine={level}"))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn create_store(config: &CliConfig) -> anyhow::Result<MemoryStore> {
    let store = MemoryStore::with_config(MemoryStoreConfig {
        require_indexes: config.require_indexes,
        prefix_range: true,
        ..Default::default()
    });
    data::load_file(&store, &config.data, &config.collection)?;
    for index in &config.indexes {
        let fields = index_fields(index);
        info!(collection = %config.collection, fields = %fields.join(","), "Registering index");
        store.add_index(&config.collection, &fields);
    }
    Ok(store)
}

fn print_outcome(
    intent: NavigationIntent,
    outcome: &NavigationOutcome,
    search: Option<&str>,
) -> anyhow::Result<bool> {
    match outcome.page() {
        Some(page) => {
            println!("{}", serde_json::to_string(&PageLine::new(intent, page, search))?);
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn walk(engine: &PaginationEngine<MemoryStore>, config: &CliConfig) -> anyhow::Result<()> {
    let search = config.search.as_deref();
    let first = match search {
        Some(raw) => engine.set_search(raw).await?,
        None => engine.navigate(NavigationIntent::First).await?,
    };
    print_outcome(NavigationIntent::First, &first, search)?;

    let mut forward = 1;
    while forward < config.pages {
        let outcome = engine.navigate(NavigationIntent::Next).await?;
        if !print_outcome(NavigationIntent::Next, &outcome, search)? {
            break;
        }
        forward += 1;
    }

    while engine.current_index() > 0 {
        let outcome = engine.navigate(NavigationIntent::Previous).await?;
        if !print_outcome(NavigationIntent::Previous, &outcome, search)? {
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let store = Arc::new(create_store(&config)?);
    let engine = PaginationEngine::new(store, config.listing_config())?;
    info!(
        collection = %config.collection,
        sort_field = %config.sort_field,
        page_size = config.page_size,
        "Walking listing"
    );

    walk(&engine, &config).await
}
