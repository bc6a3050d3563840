//! The consuming side of the data layer: one list screen's state.
//!
//! A [`ListView`] owns the fetched collection, its [`CacheState`], the
//! [`ViewSpec`] and the selection set. Clones share the same state. State
//! lives behind a `std::sync::Mutex` that is only ever held for synchronous
//! reads and writes, never across a fetch or a create call.
//!
//! Fetches cannot be aborted once started. [`ListView::close`] marks the view
//! dead instead, and results arriving afterwards are dropped on the floor.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::api::{PageSource, RecordSink};
use crate::config::ImportLimits;
use crate::debounce::Debounced;
use crate::error::{ExportResult, FetchError, ImportResult};
use crate::export::{rows_for_export, write_export, ExportExtension};
use crate::fetch::{fetch_all, Completeness, FetchOptions};
use crate::import::{import_bytes, ImportReport};
use crate::logs::{log_error, log_info};
use crate::models::{ColumnSpec, EntityKind, Record};
use crate::query::{self, ColumnFilter, DateRange, QueryResult, SortSpec, ViewSpec};

/// Where a view's collection stands. Only fetch outcomes move it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CacheState {
    NotFetched,
    Fetching,
    /// Records present; `complete` is false after a partial or truncated walk.
    Loaded { complete: bool },
    Empty,
    Failed {
        message: String,
        /// Connectivity failure rather than a server answer.
        transport: bool,
    },
}

impl CacheState {
    fn from_outcome(result: &Result<(usize, Completeness), FetchError>) -> Self {
        match result {
            Ok((0, _)) => CacheState::Empty,
            Ok((_, completeness)) => CacheState::Loaded {
                complete: matches!(
                    completeness,
                    Completeness::Complete | Completeness::Unpaginated
                ),
            },
            Err(e) => CacheState::Failed {
                message: e.to_string(),
                transport: e.is_transport(),
            },
        }
    }

    /// Whether a refresh is worth issuing without an explicit user action.
    pub fn needs_fetch(&self) -> bool {
        matches!(self, CacheState::NotFetched | CacheState::Failed { .. })
    }
}

/// Shared alive/dead flag checked before applying asynchronous results.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct ViewState {
    cache: CacheState,
    records: Vec<Record>,
    spec: ViewSpec,
    selection: HashSet<String>,
    /// Bumped by every refresh; only the latest one may apply its result.
    generation: u64,
}

/// One entity list screen.
#[derive(Debug, Clone)]
pub struct ListView {
    kind: EntityKind,
    alive: Liveness,
    state: Arc<Mutex<ViewState>>,
}

impl ListView {
    pub fn new(kind: EntityKind) -> Self {
        Self::with_spec(kind, ViewSpec::default())
    }

    pub fn with_spec(kind: EntityKind, spec: ViewSpec) -> Self {
        Self {
            kind,
            alive: Liveness::new(),
            state: Arc::new(Mutex::new(ViewState {
                cache: CacheState::NotFetched,
                records: Vec::new(),
                spec,
                selection: HashSet::new(),
                generation: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_alive(&self) -> bool {
        self.alive.is_alive()
    }

    /// Tear the view down. Results of fetches still in flight are ignored and
    /// the cache state falls back to what it was before that fetch began.
    pub fn close(&self) {
        self.alive.kill();
    }

    pub fn cache_state(&self) -> CacheState {
        self.lock().cache.clone()
    }

    pub fn records(&self) -> Vec<Record> {
        self.lock().records.clone()
    }

    /// Re-fetch the whole listing. Returns the state the view ends in, or
    /// `None` when the result was discarded: the view was closed, or a newer
    /// refresh started while this one was in flight.
    pub async fn refresh<S>(&self, source: &S, options: FetchOptions) -> Option<CacheState>
    where
        S: PageSource + ?Sized,
    {
        if !self.is_alive() {
            return None;
        }
        let (generation, previous) = {
            let mut state = self.lock();
            state.generation += 1;
            let previous = std::mem::replace(&mut state.cache, CacheState::Fetching);
            (state.generation, previous)
        };

        let result = fetch_all(source, self.kind.list_path(), options).await;

        let mut state = self.lock();
        if state.generation != generation {
            log::debug!("{}: superseded by a newer refresh, discarding result", self.kind);
            return None;
        }
        if !self.is_alive() {
            log::debug!("{}: view closed, discarding fetch result", self.kind);
            state.cache = previous;
            return None;
        }

        let outcome = result
            .as_ref()
            .map(|a| (a.records.len(), a.completeness.clone()))
            .map_err(Clone::clone);
        let cache = CacheState::from_outcome(&outcome);

        match result {
            Ok(aggregation) => state.records = aggregation.records,
            Err(e) => log_error(format!("{}: {}", self.kind, e)),
        }
        state.cache = cache.clone();
        Some(cache)
    }

    /// The current visible page.
    pub fn rows(&self) -> QueryResult {
        let state = self.lock();
        query::apply(&state.records, self.kind, &state.spec)
    }

    pub fn spec(&self) -> ViewSpec {
        self.lock().spec.clone()
    }

    /// Apply any change to the view spec.
    pub fn update_spec<F: FnOnce(&mut ViewSpec)>(&self, change: F) {
        change(&mut self.lock().spec);
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.update_spec(|s| s.set_query(query));
    }

    pub fn set_filter(&self, column: impl Into<String>, filter: ColumnFilter) {
        self.update_spec(|s| s.set_filter(column, filter));
    }

    pub fn clear_filter(&self, column: &str) {
        self.update_spec(|s| s.clear_filter(column));
    }

    pub fn set_date_range(&self, field: impl Into<String>, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        let range = DateRange {
            field: field.into(),
            from,
            to,
        };
        self.update_spec(|s| s.set_date_range(Some(range)));
    }

    pub fn toggle_sort(&self, key: &str) {
        self.update_spec(|s| s.toggle_sort(key));
    }

    pub fn set_sort(&self, sort: Option<SortSpec>) {
        self.update_spec(|s| s.set_sort(sort));
    }

    pub fn set_page(&self, page: usize) {
        self.update_spec(|s| s.set_page(page));
    }

    /// Flip selection of the record with natural key `key`.
    pub fn toggle_selected(&self, key: impl Into<String>) -> bool {
        let key = key.into();
        let mut state = self.lock();
        if state.selection.remove(&key) {
            false
        } else {
            state.selection.insert(key);
            true
        }
    }

    pub fn select(&self, keys: impl IntoIterator<Item = String>) {
        self.lock().selection.extend(keys);
    }

    pub fn clear_selection(&self) {
        self.lock().selection.clear();
    }

    pub fn selection(&self) -> HashSet<String> {
        self.lock().selection.clone()
    }

    /// All rows the current search/filter/sort produce (unpaged), narrowed
    /// to the selection when one exists.
    pub fn export_rows(&self) -> Vec<Record> {
        let state = self.lock();
        let rows = query::filter_and_sort(&state.records, self.kind, &state.spec);
        rows_for_export(&rows, self.kind, &state.selection)
    }

    /// Export [`export_rows`](Self::export_rows) into `dir`.
    pub async fn export_to(
        &self,
        dir: &Path,
        columns: Option<&[ColumnSpec]>,
        extension: ExportExtension,
    ) -> ExportResult<PathBuf> {
        let rows = self.export_rows();
        let defaults;
        let columns = match columns {
            Some(c) => c,
            None => {
                defaults = self.kind.schema().default_columns();
                &defaults
            }
        };
        write_export(dir, &rows, self.kind, columns, extension).await
    }

    /// Import a file, then refresh the listing if anything was created.
    pub async fn import_file<A>(
        &self,
        api: &A,
        file_name: &str,
        bytes: &[u8],
        limits: ImportLimits,
        options: FetchOptions,
    ) -> ImportResult<ImportReport>
    where
        A: RecordSink + PageSource + ?Sized,
    {
        let report = import_bytes(api, self.kind, file_name, bytes, limits).await?;
        if report.needs_refresh() {
            log_info(format!("{}: refreshing after import", self.kind));
            self.refresh(api, options).await;
        }
        Ok(report)
    }
}

/// Search input wired to a view through a debounce.
pub struct SearchBox {
    debounced: Debounced<String>,
}

impl SearchBox {
    pub fn new(view: &ListView, wait: Duration) -> Self {
        let view = view.clone();
        Self {
            debounced: Debounced::new(
                move |query: String| {
                    if view.is_alive() {
                        view.set_query(query);
                    }
                },
                wait,
            ),
        }
    }

    /// One keystroke's worth of input.
    pub fn input(&self, text: impl Into<String>) {
        self.debounced.call(text.into());
    }

    pub fn is_pending(&self) -> bool {
        self.debounced.is_pending()
    }
}
