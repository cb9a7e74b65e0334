//! Loads JSON document files into the in-memory store.

use std::path::Path;

use anyhow::{Context, bail};
use pageline_engine::backends::memory::MemoryStore;
use serde_json::Value;
use tracing::info;

/// Loads `path` into `store`.
///
/// A top-level array goes into `default_collection`; a top-level object maps
/// collection names to arrays. Returns the number of documents loaded.
pub fn load_file(store: &MemoryStore, path: &Path, default_collection: &str) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    let loaded = load_value(store, value, default_collection)?;
    info!(path = %path.display(), documents = loaded, "Loaded documents");
    Ok(loaded)
}

/// Loads an already parsed document set; see [`load_file`].
pub fn load_value(store: &MemoryStore, value: Value, default_collection: &str) -> anyhow::Result<usize> {
    match value {
        Value::Array(rows) => Ok(load_rows(store, default_collection, rows)),
        Value::Object(collections) => {
            let mut loaded = 0;
            for (collection, rows) in collections {
                match rows {
                    Value::Array(rows) => loaded += load_rows(store, &collection, rows),
                    _ => bail!("collection '{}' must be an array of documents", collection),
                }
            }
            Ok(loaded)
        }
        _ => bail!("expected an array of documents or an object of collections"),
    }
}

fn load_rows(store: &MemoryStore, collection: &str, rows: Vec<Value>) -> usize {
    let count = rows.len();
    for row in rows {
        store.insert_json(collection, row);
    }
    count
}
