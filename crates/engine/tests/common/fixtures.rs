//! Seed data shared by the integration tests.

use pageline_engine::backends::memory::{MemoryStore, MemoryStoreConfig};
use pageline_engine::types::{Document, ListingConfig};
use serde_json::json;

/// Collection used by every fixture.
pub const COURSES: &str = "courses";

/// Builds a course document.
pub fn course(id: &str, created_at: i64, title: &str, status: &str) -> Document {
    Document::from_json(
        id,
        json!({
            "title": title,
            "titleLower": title.to_lowercase(),
            "status": status,
            "createdAt": created_at,
        }),
    )
}

/// Five courses with `createdAt` 1 through 5.
pub fn five_courses() -> MemoryStore {
    let store = MemoryStore::new();
    for i in 1..=5 {
        store.insert(COURSES, course(&format!("c{i}"), i, &format!("Course {i}"), "active"));
    }
    store
}

/// Twelve courses in a store that enforces composite indexes.
///
/// Within the first eight by `createdAt`, only `c3` is both active and
/// contains "math". `c10` matches as well but lies beyond the first eight.
pub fn mixed_courses() -> MemoryStore {
    let store = MemoryStore::with_config(MemoryStoreConfig::strict());
    let rows = [
        ("c1", "Intro to Biology", "active"),
        ("c2", "Mathematics Basics", "draft"),
        ("c3", "Applied Mathematics", "active"),
        ("c4", "World History", "active"),
        ("c5", "Math for Poets", "archived"),
        ("c6", "Chemistry", "active"),
        ("c7", "Physics", "draft"),
        ("c8", "Art History", "active"),
        ("c9", "Music Theory", "active"),
        ("c10", "Discrete Math", "active"),
        ("c11", "Poetry", "active"),
        ("c12", "Statistics", "draft"),
    ];
    for (n, (id, title, status)) in rows.iter().enumerate() {
        store.insert(COURSES, course(id, n as i64 + 1, title, status));
    }
    store
}

/// Listing over `courses` sorted ascending by `createdAt`.
pub fn course_listing(page_size: u32) -> ListingConfig {
    ListingConfig::new(COURSES, "createdAt")
        .with_page_size(page_size)
        .with_search_field("titleLower")
}

/// Extracts the `createdAt` values of a page.
pub fn created_at(page: &pageline_engine::Page) -> Vec<i64> {
    page.rows
        .iter()
        .filter_map(|doc| doc.field("createdAt").and_then(|v| v.as_i64()))
        .collect()
}
