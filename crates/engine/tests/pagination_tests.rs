//! Cursor pagination integration tests.
//!
//! These tests walk listings forward and backward through the engine against
//! the in-memory store and check the pages, the recorded page starts and the
//! resets caused by query changes.

mod common;

use std::sync::Arc;

use pageline_engine::backends::memory::{MemoryStore, MemoryStoreConfig};
use pageline_engine::types::{Filter, NavigationIntent, PageCursor, SortDirective};
use pageline_engine::{ConfigError, EngineStatus, NavigationOutcome, PaginationEngine};

use common::*;

fn engine(store: MemoryStore, page_size: u32) -> PaginationEngine<MemoryStore> {
    PaginationEngine::new(Arc::new(store), course_listing(page_size)).unwrap()
}

// ============================================================================
// Forward and Backward Navigation
// ============================================================================

#[tokio::test]
async fn test_walks_five_rows_in_pages_of_two() {
    let engine = engine(five_courses(), 2);

    let first = engine.navigate(NavigationIntent::First).await.unwrap();
    let page = first.page().unwrap();
    assert_eq!(created_at(page), vec![1, 2]);
    assert!(page.has_next);
    assert_eq!(page.index, 0);

    let second = engine.navigate(NavigationIntent::Next).await.unwrap();
    let page = second.page().unwrap();
    assert_eq!(created_at(page), vec![3, 4]);
    assert!(page.has_next);
    assert_eq!(page.index, 1);

    let third = engine.navigate(NavigationIntent::Next).await.unwrap();
    let page = third.page().unwrap();
    assert_eq!(created_at(page), vec![5]);
    assert!(!page.has_next);
    assert_eq!(engine.current_index(), 2);
    assert_eq!(engine.status(), EngineStatus::Loaded);
}

#[tokio::test]
async fn test_next_on_last_page_is_noop() {
    let engine = engine(five_courses(), 5);
    engine.navigate(NavigationIntent::First).await.unwrap();
    let generation = engine.generation();

    let pending = engine.navigate(NavigationIntent::Next);
    assert!(pending.generation().is_none());
    assert!(matches!(pending.await.unwrap(), NavigationOutcome::NoOp));
    assert_eq!(engine.generation(), generation);
    assert_eq!(engine.status(), EngineStatus::Loaded);
}

#[tokio::test]
async fn test_previous_returns_to_recorded_pages() {
    let engine = engine(five_courses(), 2);
    engine.navigate(NavigationIntent::First).await.unwrap();
    engine.navigate(NavigationIntent::Next).await.unwrap();
    engine.navigate(NavigationIntent::Next).await.unwrap();

    let back = engine.navigate(NavigationIntent::Previous).await.unwrap();
    assert_eq!(created_at(back.page().unwrap()), vec![3, 4]);
    assert!(back.page().unwrap().has_next);
    assert_eq!(engine.current_index(), 1);

    let back = engine.navigate(NavigationIntent::Previous).await.unwrap();
    assert_eq!(created_at(back.page().unwrap()), vec![1, 2]);
    assert_eq!(engine.current_index(), 0);

    assert!(matches!(
        engine.navigate(NavigationIntent::Previous).await.unwrap(),
        NavigationOutcome::NoOp
    ));

    // forward again reuses the same positions
    let forward = engine.navigate(NavigationIntent::Next).await.unwrap();
    assert_eq!(created_at(forward.page().unwrap()), vec![3, 4]);
}

#[tokio::test]
async fn test_descending_sort() {
    let store = five_courses();
    let config = course_listing(2).with_direction(pageline_engine::types::SortDirection::Desc);
    let engine = PaginationEngine::new(Arc::new(store), config).unwrap();

    engine.navigate(NavigationIntent::First).await.unwrap();
    assert_eq!(created_at(&engine.current_page()), vec![5, 4]);
    engine.navigate(NavigationIntent::Next).await.unwrap();
    assert_eq!(created_at(&engine.current_page()), vec![3, 2]);
    engine.navigate(NavigationIntent::Next).await.unwrap();
    assert_eq!(created_at(&engine.current_page()), vec![1]);
}

#[tokio::test]
async fn test_empty_collection() {
    let engine = engine(MemoryStore::new(), 3);
    let outcome = engine.navigate(NavigationIntent::First).await.unwrap();
    let page = outcome.page().unwrap();
    assert!(page.is_empty());
    assert!(!page.has_next);
    assert!(page.first_row_cursor.is_none());
    assert_eq!(engine.status(), EngineStatus::Loaded);
}

// ============================================================================
// Cursor Store
// ============================================================================

#[tokio::test]
async fn test_cursor_store_records_first_row_of_each_page() {
    let engine = engine(five_courses(), 2);
    let mut firsts = Vec::new();

    let outcome = engine.navigate(NavigationIntent::First).await.unwrap();
    firsts.push(outcome.page().unwrap().first_row_cursor.clone());
    for _ in 0..2 {
        let outcome = engine.navigate(NavigationIntent::Next).await.unwrap();
        firsts.push(outcome.page().unwrap().first_row_cursor.clone());
    }

    assert_eq!(engine.recorded_pages(), 3);
    // page 0 always starts from the beginning of the listing
    assert!(engine.cursor_for(0).is_none());
    assert_eq!(engine.cursor_for(1), firsts[1]);
    assert_eq!(engine.cursor_for(2), firsts[2]);
    assert_eq!(engine.cursor_for(2).unwrap().document_id(), "c5");
}

#[tokio::test]
async fn test_page_cursors_survive_encoding() {
    let engine = engine(five_courses(), 2);
    engine.navigate(NavigationIntent::First).await.unwrap();

    let page = engine.current_page();
    let cursor = page.last_row_cursor.clone().unwrap();
    let decoded = PageCursor::decode(&cursor.encode()).unwrap();
    assert_eq!(decoded, cursor);
    assert!(decoded.ensure_query(engine.query().fingerprint()).is_ok());
}

#[tokio::test]
async fn test_refresh_reloads_current_position() {
    let store = Arc::new(five_courses());
    let engine = PaginationEngine::new(Arc::clone(&store), course_listing(2)).unwrap();
    engine.navigate(NavigationIntent::First).await.unwrap();
    engine.navigate(NavigationIntent::Next).await.unwrap();

    store.insert(COURSES, course("c3b", 3, "Course 3b", "active"));

    let refreshed = engine.navigate(NavigationIntent::Refresh).await.unwrap();
    let page = refreshed.page().unwrap();
    assert_eq!(page.ids(), vec!["c3", "c3b"]);
    assert!(page.has_next);
    assert_eq!(engine.current_index(), 1);
}

// ============================================================================
// Query Changes
// ============================================================================

#[tokio::test]
async fn test_filter_change_resets_position() {
    let store = five_courses();
    store.insert(COURSES, course("c6", 6, "Course 6", "draft"));
    let engine = engine(store, 2);

    engine.navigate(NavigationIntent::First).await.unwrap();
    engine.navigate(NavigationIntent::Next).await.unwrap();
    assert_eq!(engine.recorded_pages(), 2);

    let outcome = engine
        .set_filters(vec![Filter::eq("status", "draft")])
        .await
        .unwrap();
    let page = outcome.page().unwrap();
    assert_eq!(page.ids(), vec!["c6"]);
    assert_eq!(page.index, 0);
    assert_eq!(engine.current_index(), 0);
    assert_eq!(engine.recorded_pages(), 1);
    assert_eq!(engine.filters(), vec![Filter::eq("status", "draft")]);
}

#[tokio::test]
async fn test_sort_change_resets_position() {
    let engine = engine(five_courses(), 2);
    engine.navigate(NavigationIntent::First).await.unwrap();
    engine.navigate(NavigationIntent::Next).await.unwrap();

    let outcome = engine
        .set_sort(SortDirective::desc("createdAt"))
        .await
        .unwrap();
    assert_eq!(created_at(outcome.page().unwrap()), vec![5, 4]);
    assert_eq!(engine.current_index(), 0);
}

#[tokio::test]
async fn test_search_pushes_prefix_to_store() {
    let engine = engine(five_courses(), 10);
    let outcome = engine.set_search("  COURSE 4 ").await.unwrap();
    assert_eq!(outcome.page().unwrap().ids(), vec!["c4"]);
    assert_eq!(engine.search_token().as_deref(), Some("course 4"));

    let outcome = engine.set_search("").await.unwrap();
    assert_eq!(outcome.page().unwrap().len(), 5);
    assert!(engine.search_token().is_none());
}

#[tokio::test]
async fn test_search_without_prefix_support_matches_substrings() {
    let store = MemoryStore::with_config(MemoryStoreConfig {
        prefix_range: false,
        ..Default::default()
    });
    store.insert(COURSES, course("a", 1, "Linear Algebra", "active"));
    store.insert(COURSES, course("b", 2, "Algebraic Topology", "active"));
    store.insert(COURSES, course("c", 3, "Geometry", "active"));
    let engine = engine(store, 10);

    let outcome = engine.set_search("algebra").await.unwrap();
    assert_eq!(outcome.page().unwrap().ids(), vec!["a", "b"]);
    assert!(!outcome.page().unwrap().degraded);
    // the batch ended before the limit, so nothing lies beyond it
    assert!(!outcome.page().unwrap().client_filtered);
}

#[tokio::test]
async fn test_client_side_search_flags_short_page() {
    let store = MemoryStore::with_config(MemoryStoreConfig {
        prefix_range: false,
        ..Default::default()
    });
    for i in 1..=4 {
        store.insert(COURSES, course(&format!("c{i}"), i, "Other", "active"));
    }
    store.insert(COURSES, course("c5", 5, "Algebra", "active"));
    store.insert(COURSES, course("c6", 6, "Algebra II", "active"));
    let engine = engine(store, 2);

    // the first batch (c1..c3) holds no match, later rows do
    let outcome = engine.set_search("algebra").await.unwrap();
    let page = outcome.page().unwrap();
    assert!(page.is_empty());
    assert!(!page.has_next);
    assert!(!page.degraded);
    assert!(page.client_filtered);
}

#[tokio::test]
async fn test_pushed_search_is_not_client_filtered() {
    let engine = engine(five_courses(), 10);
    let outcome = engine.set_search("course 4").await.unwrap();
    assert_eq!(outcome.page().unwrap().ids(), vec!["c4"]);
    assert!(!outcome.page().unwrap().client_filtered);
}

// ============================================================================
// Store Limits
// ============================================================================

#[tokio::test]
async fn test_page_size_larger_than_store_limit_is_rejected() {
    let capped = || {
        let store = MemoryStore::with_config(MemoryStoreConfig {
            prefix_range: true,
            max_limit: Some(2),
            ..Default::default()
        });
        for i in 1..=5 {
            store.insert(COURSES, course(&format!("c{i}"), i, &format!("Course {i}"), "active"));
        }
        Arc::new(store)
    };

    let err = PaginationEngine::new(capped(), course_listing(2)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));

    // one row below the cap leaves room for the look-ahead row
    let engine = PaginationEngine::new(capped(), course_listing(1)).unwrap();
    let mut seen = Vec::new();
    let outcome = engine.navigate(NavigationIntent::First).await.unwrap();
    seen.extend(created_at(outcome.page().unwrap()));
    while engine.current_page().has_next {
        let outcome = engine.navigate(NavigationIntent::Next).await.unwrap();
        seen.extend(created_at(outcome.page().unwrap()));
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_configured_filters_apply_from_the_start() {
    let store = five_courses();
    store.insert(COURSES, course("c6", 6, "Course 6", "draft"));
    let config = course_listing(10).with_filter("status", "draft");
    let engine = PaginationEngine::new(Arc::new(store), config).unwrap();

    let outcome = engine.navigate(NavigationIntent::First).await.unwrap();
    assert_eq!(outcome.page().unwrap().ids(), vec!["c6"]);
}
