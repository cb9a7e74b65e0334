//! The pagination engine.
//!
//! A [`PaginationEngine`] owns one listing session: its filters and search
//! token, the generation counter, the cursor store and the page currently on
//! screen. Navigation never blocks the caller: [`PaginationEngine::navigate`]
//! snapshots the query under the session lock, spawns the fetch on the tokio
//! runtime and returns a [`PendingPage`] future.
//!
//! # State machine
//!
//! ```text
//! Idle | Loaded | Error ──navigate──▶ Loading
//! Loading ──success, current──▶ Loaded
//! Loading ──error, current──▶ Error      (page and cursor store untouched)
//! Loading ──result, stale──▶ (unchanged)
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::{
    CursorStore, DocumentStore, Generation, IndexFallbackResolver, PrefixRange, RawPage,
    RequestGuard, StartBound, StoreQuery,
};
use crate::error::{ConfigError, ListingError, ListingResult};
use crate::search::{SearchTokenMatcher, normalize};
use crate::types::{
    Document, Filter, ListingConfig, NavigationIntent, Page, PageCursor, Query, QueryFingerprint,
    SortDirective,
};

/// Engine status as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// The latest navigation is in flight.
    Loading,
    /// The latest navigation was applied.
    Loaded,
    /// The latest navigation failed; the previous page is still shown.
    Error,
}

/// How a navigation request ended.
#[derive(Debug, Clone)]
pub enum NavigationOutcome {
    /// The page was committed and is now the current page.
    Applied(Page),
    /// The request had nothing to do (e.g. `previous` on the first page).
    NoOp,
    /// A newer request started before this one finished; its result was
    /// discarded.
    Superseded,
}

impl NavigationOutcome {
    /// Returns the applied page, if any.
    pub fn page(&self) -> Option<&Page> {
        match self {
            NavigationOutcome::Applied(page) => Some(page),
            _ => None,
        }
    }

    /// Returns true if the result was committed.
    pub fn is_applied(&self) -> bool {
        matches!(self, NavigationOutcome::Applied(_))
    }
}

#[derive(Debug)]
struct SessionState {
    filters: Vec<Filter>,
    search_token: Option<String>,
    sort: SortDirective,
    status: EngineStatus,
    page: Page,
    page_fingerprint: Option<QueryFingerprint>,
    current_index: usize,
    cursor_store: CursorStore,
    last_error: Option<ListingError>,
}

/// Everything a spawned fetch needs, captured at navigation time.
#[derive(Debug)]
struct FetchPlan {
    generation: Generation,
    intent: NavigationIntent,
    target_index: usize,
    query: Query,
    fingerprint: QueryFingerprint,
    store_query: StoreQuery,
}

struct EngineInner<S> {
    config: ListingConfig,
    resolver: IndexFallbackResolver<S>,
    matcher: SearchTokenMatcher,
    guard: RequestGuard,
    state: Mutex<SessionState>,
}

/// Cursor-based pagination over one listing.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use pageline_engine::backends::memory::MemoryStore;
/// use pageline_engine::engine::PaginationEngine;
/// use pageline_engine::types::{ListingConfig, NavigationIntent};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryStore::new());
/// let config = ListingConfig::new("courses", "createdAt").with_page_size(10);
/// let engine = PaginationEngine::new(store, config)?;
///
/// let first = engine.navigate(NavigationIntent::First).await?;
/// if let Some(page) = first.page() {
///     println!("{} rows, more: {}", page.len(), page.has_next);
/// }
/// let _ = engine.navigate(NavigationIntent::Next).await?;
/// # Ok(())
/// # }
/// ```
pub struct PaginationEngine<S> {
    inner: Arc<EngineInner<S>>,
}

impl<S> Clone for PaginationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for PaginationEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationEngine")
            .field("collection", &self.inner.config.collection)
            .field("generation", &self.inner.guard.current())
            .finish()
    }
}

impl<S: DocumentStore + 'static> PaginationEngine<S> {
    /// Creates an engine for one listing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the configuration does not validate,
    /// or if the store cannot return `page_size + 1` rows in one query.
    pub fn new(store: Arc<S>, config: ListingConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let capabilities = store.capabilities();
        if let Some(max) = capabilities.max_limit {
            // has_next needs one row beyond the page
            if config.page_size as usize >= max {
                return Err(ConfigError::Invalid {
                    errors: vec![format!(
                        "Page size {} needs {} rows per query but the {} store returns at most {}",
                        config.page_size,
                        config.page_size as usize + 1,
                        store.backend_name(),
                        max
                    )],
                });
            }
        }
        let matcher = SearchTokenMatcher::new(
            config.search_field.clone(),
            config.search_fallback_fields.clone(),
            capabilities.prefix_range,
        );
        let resolver = IndexFallbackResolver::new(store).with_fetch_timeout(config.fetch_timeout);
        let state = SessionState {
            filters: config.filters(),
            search_token: None,
            sort: config.sort(),
            status: EngineStatus::Idle,
            page: Page::empty(),
            page_fingerprint: None,
            current_index: 0,
            cursor_store: CursorStore::new(),
            last_error: None,
        };

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                resolver,
                matcher,
                guard: RequestGuard::new(),
                state: Mutex::new(state),
            }),
        })
    }

    /// Starts a navigation and returns immediately.
    ///
    /// The returned future resolves once the fetch finishes; dropping it does
    /// not cancel the fetch. Must be called from within a tokio runtime.
    pub fn navigate(&self, intent: NavigationIntent) -> PendingPage {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return PendingPage::ready(
                None,
                Err(ListingError::TaskFailed {
                    message: "navigation requires a tokio runtime".to_string(),
                }),
            );
        };

        let plan = {
            let mut state = self.inner.state.lock();
            match self.inner.plan(&mut state, intent) {
                Some(plan) => plan,
                None => {
                    debug!(
                        collection = %self.inner.config.collection,
                        %intent,
                        index = state.current_index,
                        "Navigation is a no-op"
                    );
                    return PendingPage::ready(None, Ok(NavigationOutcome::NoOp));
                }
            }
        };

        let generation = plan.generation;
        let inner = Arc::clone(&self.inner);
        let handle = runtime.spawn(async move { inner.run(plan).await });
        PendingPage::running(generation, handle)
    }

    /// Replaces the filters and reloads from the first page.
    pub fn set_filters(&self, filters: Vec<Filter>) -> PendingPage {
        {
            let mut state = self.inner.state.lock();
            state.filters = filters;
            state.reset_position();
        }
        self.navigate(NavigationIntent::First)
    }

    /// Replaces the search text and reloads from the first page.
    pub fn set_search(&self, raw: &str) -> PendingPage {
        {
            let mut state = self.inner.state.lock();
            state.search_token = normalize(raw);
            state.reset_position();
        }
        self.navigate(NavigationIntent::First)
    }

    /// Replaces the sort and reloads from the first page.
    pub fn set_sort(&self, sort: SortDirective) -> PendingPage {
        {
            let mut state = self.inner.state.lock();
            state.sort = sort;
            state.reset_position();
        }
        self.navigate(NavigationIntent::First)
    }
}

impl<S> PaginationEngine<S> {
    /// Returns the last committed page.
    pub fn current_page(&self) -> Page {
        self.inner.state.lock().page.clone()
    }

    /// Returns the engine status.
    pub fn status(&self) -> EngineStatus {
        self.inner.state.lock().status
    }

    /// Returns the error of the latest navigation, if it failed.
    pub fn last_error(&self) -> Option<ListingError> {
        self.inner.state.lock().last_error.clone()
    }

    /// Returns the index of the last committed page.
    pub fn current_index(&self) -> usize {
        self.inner.state.lock().current_index
    }

    /// Returns the latest generation handed out.
    pub fn generation(&self) -> Generation {
        self.inner.guard.current()
    }

    /// Returns the recorded first-row cursor of page `index`.
    pub fn cursor_for(&self, index: usize) -> Option<PageCursor> {
        self.inner.state.lock().cursor_store.cursor_for(index).cloned()
    }

    /// Returns the number of pages recorded in the cursor store.
    pub fn recorded_pages(&self) -> usize {
        self.inner.state.lock().cursor_store.len()
    }

    /// Returns the active filters.
    pub fn filters(&self) -> Vec<Filter> {
        self.inner.state.lock().filters.clone()
    }

    /// Returns the active search token.
    pub fn search_token(&self) -> Option<String> {
        self.inner.state.lock().search_token.clone()
    }

    /// Returns the query the next navigation would run.
    pub fn query(&self) -> Query {
        let state = self.inner.state.lock();
        self.inner.query_for(&state)
    }

    /// Returns the listing configuration.
    pub fn config(&self) -> &ListingConfig {
        &self.inner.config
    }
}

impl SessionState {
    fn reset_position(&mut self) {
        self.cursor_store.reset();
        self.current_index = 0;
    }
}

impl<S> EngineInner<S> {
    fn query_for(&self, state: &SessionState) -> Query {
        Query {
            collection: self.config.collection.clone(),
            sort: state.sort.clone(),
            filters: state.filters.clone(),
            search_token: state.search_token.clone(),
            page_size: self.config.page_size,
        }
    }
}

impl<S: DocumentStore> EngineInner<S> {
    /// Resolves the intent against the session and begins a generation.
    ///
    /// Returns `None` for no-op intents. Runs under the session lock.
    fn plan(&self, state: &mut SessionState, intent: NavigationIntent) -> Option<FetchPlan> {
        let query = self.query_for(state);
        let fingerprint = query.fingerprint();
        if state.cursor_store.bind(fingerprint) {
            state.current_index = 0;
        }
        let page_is_current = state.page_fingerprint == Some(fingerprint);

        let (target_index, start) = match intent {
            NavigationIntent::First => (0, None),
            NavigationIntent::Next if !page_is_current => (0, None),
            NavigationIntent::Next => {
                if !state.page.has_next {
                    return None;
                }
                let cursor = state.page.last_row_cursor.clone()?;
                (state.current_index + 1, Some(StartBound::after(cursor)))
            }
            NavigationIntent::Previous => {
                if state.current_index == 0 {
                    return None;
                }
                let target = state.current_index - 1;
                match state.cursor_store.cursor_for(target) {
                    Some(cursor) => (target, Some(StartBound::at(cursor.clone()))),
                    None => (0, None),
                }
            }
            NavigationIntent::Refresh => match state.cursor_store.cursor_for(state.current_index) {
                Some(cursor) => (state.current_index, Some(StartBound::at(cursor.clone()))),
                None => (0, None),
            },
        };

        let store_query = self.store_query(&query, start);
        let generation = self.guard.begin();
        state.status = EngineStatus::Loading;

        debug!(
            collection = %query.collection,
            %intent,
            %generation,
            target_index,
            "Navigation started"
        );

        Some(FetchPlan {
            generation,
            intent,
            target_index,
            query,
            fingerprint,
            store_query,
        })
    }

    fn store_query(&self, query: &Query, start: Option<StartBound>) -> StoreQuery {
        let prefix = match (&query.search_token, self.matcher.search_field()) {
            (Some(token), Some(field)) if self.matcher.can_push_to_server(token) => {
                let (lower, upper) = SearchTokenMatcher::prefix_range(token);
                Some(PrefixRange {
                    field: field.to_string(),
                    lower,
                    upper,
                })
            }
            _ => None,
        };

        let limit = query.page_size as usize + 1;

        StoreQuery {
            collection: query.collection.clone(),
            sort: query.sort.clone(),
            filters: query.filters.clone(),
            prefix,
            start,
            limit,
        }
    }

    /// Filters, trims and wraps the raw rows into a page.
    fn assemble(&self, plan: &FetchPlan, raw: RawPage) -> Page {
        let query = &plan.query;
        let store = self.resolver.store();

        let fetched = raw.rows.len();
        let rows: Vec<Document> = raw
            .rows
            .into_iter()
            .filter(|doc| !raw.degraded || raw.dropped_filters.iter().all(|f| f.matches(doc)))
            .filter(|doc| match &query.search_token {
                Some(token) => self.matcher.matches_document(token, doc),
                None => true,
            })
            .collect();

        let page_size = query.page_size as usize;
        // a short batch already reached the end of the listing
        let client_filtered = rows.len() < fetched && fetched > page_size;
        let has_next = rows.len() > page_size;
        let mut rows = rows;
        rows.truncate(page_size);

        let first_row_cursor = rows
            .first()
            .map(|doc| store.cursor_for(doc, &query.sort, plan.fingerprint));
        let last_row_cursor = rows
            .last()
            .map(|doc| store.cursor_for(doc, &query.sort, plan.fingerprint));

        Page {
            rows,
            has_next,
            first_row_cursor,
            last_row_cursor,
            index: plan.target_index,
            degraded: raw.degraded,
            client_filtered,
        }
    }

    async fn run(&self, plan: FetchPlan) -> ListingResult<NavigationOutcome> {
        let mut loading = LoadingGuard {
            inner: self,
            generation: plan.generation,
            armed: true,
        };

        let result = self
            .resolver
            .execute(&plan.store_query)
            .await
            .map(|raw| self.assemble(&plan, raw));

        loading.armed = false;
        let mut state = self.state.lock();
        if !self.guard.is_current(plan.generation) {
            debug!(
                collection = %plan.query.collection,
                generation = %plan.generation,
                latest = %self.guard.current(),
                "Discarding stale result"
            );
            return Ok(NavigationOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                state
                    .cursor_store
                    .record_page_start(plan.target_index, page.first_row_cursor.clone());
                state.current_index = plan.target_index;
                state.page = page.clone();
                state.page_fingerprint = Some(plan.fingerprint);
                state.status = EngineStatus::Loaded;
                state.last_error = None;
                debug!(
                    collection = %plan.query.collection,
                    intent = %plan.intent,
                    generation = %plan.generation,
                    index = page.index,
                    rows = page.len(),
                    has_next = page.has_next,
                    degraded = page.degraded,
                    client_filtered = page.client_filtered,
                    "Page applied"
                );
                Ok(NavigationOutcome::Applied(page))
            }
            Err(error) => {
                let retryable = error.is_retryable();
                let error = ListingError::from(error);
                warn!(
                    backend = self.resolver.store().backend_name(),
                    collection = %plan.query.collection,
                    intent = %plan.intent,
                    generation = %plan.generation,
                    error = %error,
                    retryable,
                    "Navigation failed"
                );
                state.status = EngineStatus::Error;
                state.last_error = Some(error.clone());
                Err(error)
            }
        }
    }
}

/// Moves a still-current navigation out of `Loading` if its task ends
/// without committing (panic in the store, runtime shutdown).
struct LoadingGuard<'a, S> {
    inner: &'a EngineInner<S>,
    generation: Generation,
    armed: bool,
}

impl<S> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.inner.state.lock();
        if self.inner.guard.is_current(self.generation) && state.status == EngineStatus::Loading {
            state.status = EngineStatus::Error;
            state.last_error = Some(ListingError::TaskFailed {
                message: format!("generation {} did not complete", self.generation),
            });
        }
    }
}

enum PendingState {
    Ready(Option<ListingResult<NavigationOutcome>>),
    Running(JoinHandle<ListingResult<NavigationOutcome>>),
}

/// Completion of a navigation request.
///
/// Resolves to the [`NavigationOutcome`] or the error committed to the
/// engine. Dropping it leaves the fetch running.
pub struct PendingPage {
    generation: Option<Generation>,
    state: PendingState,
}

impl PendingPage {
    fn ready(generation: Option<Generation>, result: ListingResult<NavigationOutcome>) -> Self {
        Self {
            generation,
            state: PendingState::Ready(Some(result)),
        }
    }

    fn running(generation: Generation, handle: JoinHandle<ListingResult<NavigationOutcome>>) -> Self {
        Self {
            generation: Some(generation),
            state: PendingState::Running(handle),
        }
    }

    /// Returns the generation of this request; `None` for no-ops.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }
}

impl std::fmt::Debug for PendingPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingPage")
            .field("generation", &self.generation)
            .finish()
    }
}

impl Future for PendingPage {
    type Output = ListingResult<NavigationOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            PendingState::Ready(result) => Poll::Ready(result.take().unwrap_or_else(|| {
                Err(ListingError::TaskFailed {
                    message: "navigation result already taken".to_string(),
                })
            })),
            PendingState::Running(handle) => match Pin::new(handle).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(join_error)) => Poll::Ready(Err(ListingError::TaskFailed {
                    message: join_error.to_string(),
                })),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}
