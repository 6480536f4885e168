//! The table controller
//!
//! [`KingTable`] owns the pagination state, the held rows, the columns and
//! the fetch epochs of one table. It is cheap to clone; clones share state.
//!
//! Only [`fetch_rows`](KingTable::fetch_rows) and the methods built on it
//! suspend. Everything else runs to completion under the state lock, and
//! hooks and events are dispatched after the lock is released.

mod columns;
mod fetch;
mod navigate;
mod search;
mod sync;

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

pub use fetch::RenderOutcome;
pub use search::SearchTrigger;
use tokio::sync::broadcast;

use crate::Row;
use crate::column::Column;
use crate::column::DefaultRegistry;
use crate::config::TableOptions;
use crate::error::Error;
use crate::event::EventBus;
use crate::event::NoHooks;
use crate::event::TableEvent;
use crate::event::TableHooks;
use crate::filter::FilterEngine;
use crate::filter::MatchPattern;
use crate::filter::SearchFilterEngine;
use crate::location::UrlParams;
use crate::pagination::PaginationState;
use crate::schema::JsonSchemaInferencer;
use crate::schema::SchemaInferencer;
use crate::storage::PersistentStore;
use crate::transport::FetchTransport;
use crate::transport::HttpTransport;

/// Process-unique table identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kt{}", self.0)
    }
}

/// The query parameter keys a table reads and writes.
///
/// With multi-instance support on, every key carries the table's
/// [`InstanceId`] as a suffix so several tables can share one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKeys {
    pub page: String,
    pub size: String,
    pub search: String,
    pub sort: String,
}

impl QueryKeys {
    fn new(options: &TableOptions, id: InstanceId) -> Self {
        let key = |base: &str| {
            if options.multi_instance && options.use_query_string {
                format!("{}_{}", base, id)
            } else {
                base.to_string()
            }
        };
        Self {
            page: key(&options.page_query_string),
            size: key(&options.results_per_page_query_string),
            search: key(&options.search_query_string),
            sort: key(&options.sort_query_string),
        }
    }
}

/// Strictly increasing millisecond timestamps tagging fetch attempts.
#[derive(Debug, Default)]
struct EpochClock {
    last: u64,
    anchor: Option<u64>,
}

impl EpochClock {
    /// Records and returns a new epoch. The first one becomes the anchor.
    fn next(&mut self) -> u64 {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let epoch = now.max(self.last.saturating_add(1));
        self.last = epoch;
        self.anchor.get_or_insert(epoch);
        epoch
    }

    fn anchor(&self) -> u64 {
        self.anchor.unwrap_or(0)
    }

    /// Returns `true` unless a newer fetch was started after `epoch`.
    fn is_current(&self, epoch: u64) -> bool {
        epoch >= self.last
    }
}

struct TableState {
    fixed: bool,
    data: Option<Vec<Row>>,
    pagination: PaginationState,
    columns: Option<Vec<Column>>,
    columns_initialized: bool,
    epochs: EpochClock,
    filters: Box<dyn FilterEngine>,
    last_fetch_filter: Option<MatchPattern>,
    pending_render: bool,
    guessed_search_properties: Option<Vec<String>>,
    disposed: bool,
}

impl TableState {
    fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
    }
}

struct Inner {
    id: InstanceId,
    options: TableOptions,
    keys: QueryKeys,
    state: Mutex<TableState>,
    transport: Arc<dyn FetchTransport>,
    store: Option<Arc<dyn PersistentStore>>,
    location: Option<Arc<dyn UrlParams>>,
    inferencer: Box<dyn SchemaInferencer>,
    registry: DefaultRegistry,
    hooks: Arc<dyn TableHooks>,
    events: EventBus,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, TableState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_all(&self, events: Vec<TableEvent>) {
        for event in events {
            self.events.emit(event);
        }
    }
}

/// Client-side table state: rows, pagination, columns and search.
///
/// # Example
///
/// ```
/// use kingtable_lib::KingTable;
/// use kingtable_lib::config::TableOptions;
/// use serde_json::json;
///
/// let rows = serde_json::from_value(json!([{"id": 1, "name": "Ada"}])).unwrap();
/// let table = KingTable::builder(TableOptions::default())
///     .data(rows)
///     .build()
///     .unwrap();
///
/// assert!(table.is_fixed());
/// assert_eq!(table.pagination().total_rows_count, 1);
/// ```
#[derive(Clone)]
pub struct KingTable {
    inner: Arc<Inner>,
}

impl fmt::Debug for KingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KingTable")
            .field("id", &self.inner.id)
            .field("keys", &self.inner.keys)
            .finish_non_exhaustive()
    }
}

impl KingTable {
    /// Starts building a table with the given options.
    pub fn builder(options: TableOptions) -> KingTableBuilder {
        KingTableBuilder::new(options)
    }

    /// The table's identifier.
    pub fn instance_id(&self) -> InstanceId {
        self.inner.id
    }

    /// The effective options.
    ///
    /// URL and store synchronization show as off when the table was built
    /// without the corresponding adapter.
    pub fn options(&self) -> &TableOptions {
        &self.inner.options
    }

    /// The query keys this table uses.
    pub fn query_keys(&self) -> &QueryKeys {
        &self.inner.keys
    }

    /// Returns a copy of the pagination state.
    pub fn pagination(&self) -> PaginationState {
        self.inner.state().pagination.clone()
    }

    /// Whether the whole collection is held client side.
    pub fn is_fixed(&self) -> bool {
        self.inner.state().fixed
    }

    /// Returns a copy of the held rows.
    pub fn data(&self) -> Option<Vec<Row>> {
        self.inner.state().data.clone()
    }

    /// The match pattern compiled for the search echoed by the last
    /// paginated response.
    pub fn last_fetch_pattern(&self) -> Option<MatchPattern> {
        self.inner.state().last_fetch_filter.clone()
    }

    /// Returns the slice of `rows` on the current page.
    pub fn subset(&self, rows: &[Row]) -> Vec<Row> {
        self.inner.state().pagination.subset(rows).to_vec()
    }

    /// Registers an event listener.
    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.inner.events.subscribe()
    }

    /// Releases the columns and announces disposal.
    ///
    /// Columns are not rebuilt afterwards.
    pub fn dispose(&self) {
        {
            let mut state = self.inner.state();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.columns = None;
        }
        log::debug!("table {} disposed", self.inner.id);
        self.inner.events.emit(TableEvent::Dispose);
    }

    /// Whether [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.inner.state().disposed
    }
}

/// Builder for [`KingTable`].
///
/// Only the options are required. Without a [`location`](Self::location) the
/// table does not sync with a URL; without a [`store`](Self::store) it does
/// not remember the page size. When a fetch endpoint is configured and no
/// transport is given, [`HttpTransport`] is used.
pub struct KingTableBuilder {
    options: TableOptions,
    data: Option<Vec<Row>>,
    transport: Option<Arc<dyn FetchTransport>>,
    store: Option<Arc<dyn PersistentStore>>,
    location: Option<Arc<dyn UrlParams>>,
    inferencer: Box<dyn SchemaInferencer>,
    registry: DefaultRegistry,
    hooks: Arc<dyn TableHooks>,
    filters: Box<dyn FilterEngine>,
}

impl KingTableBuilder {
    /// Creates a builder with the default collaborators.
    pub fn new(options: TableOptions) -> Self {
        Self {
            options,
            data: None,
            transport: None,
            store: None,
            location: None,
            inferencer: Box::new(JsonSchemaInferencer::new()),
            registry: DefaultRegistry::standard(),
            hooks: Arc::new(NoHooks),
            filters: Box::new(SearchFilterEngine::new()),
        }
    }

    /// Supplies the whole collection up front; the table becomes fixed.
    pub fn data(mut self, rows: Vec<Row>) -> Self {
        self.data = Some(rows);
        self
    }

    /// Sets the fetch transport.
    pub fn transport(mut self, transport: impl FetchTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the persistent store used for the page size.
    pub fn store(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the URL the table keeps its state in.
    pub fn location(mut self, location: Arc<dyn UrlParams>) -> Self {
        self.location = Some(location);
        self
    }

    /// Replaces the schema inferencer.
    pub fn inferencer(mut self, inferencer: impl SchemaInferencer + 'static) -> Self {
        self.inferencer = Box::new(inferencer);
        self
    }

    /// Replaces the column default registry.
    pub fn registry(mut self, registry: DefaultRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the lifecycle hooks.
    pub fn hooks(mut self, hooks: impl TableHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Replaces the filter engine.
    pub fn filter_engine(mut self, filters: impl FilterEngine + 'static) -> Self {
        self.filters = Box::new(filters);
        self
    }

    /// Validates the options, restores state from the URL and store, and
    /// builds the table.
    pub fn build(self) -> Result<KingTable, Error> {
        let mut options = self.options;
        options.validate()?;

        if self.location.is_none() {
            options.use_query_string = false;
        }
        if self.store.is_none() {
            options.use_local_storage = false;
        }
        let location = self.location.filter(|_| options.use_query_string);
        let store = self.store.filter(|_| options.use_local_storage);

        let id = InstanceId::new();
        let keys = QueryKeys::new(&options, id);
        let fixed = options.fixed || self.data.is_some();

        let mut filters = self.filters;
        filters.set_search_disabled(!fixed);

        let settings = sync::load_settings(&options, &keys, location.as_deref(), store.as_deref());
        let total = self.data.as_ref().map_or(0, Vec::len);
        let mut pagination = PaginationState::new(settings.page, settings.results_per_page, total);
        pagination.order_by = settings.order_by;
        pagination.sort_order = settings.sort_order;

        let state = TableState {
            fixed,
            data: self.data,
            pagination,
            columns: None,
            columns_initialized: false,
            epochs: EpochClock::default(),
            filters,
            last_fetch_filter: None,
            pending_render: false,
            guessed_search_properties: None,
            disposed: false,
        };

        let inner = Inner {
            id,
            options,
            keys,
            state: Mutex::new(state),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(HttpTransport::new())),
            store,
            location,
            inferencer: self.inferencer,
            registry: self.registry,
            hooks: self.hooks,
            events: EventBus::new(),
        };

        {
            let mut state = inner.state();
            if !settings.search.is_empty() {
                inner.set_search_locked(&mut state, &settings.search);
            }
            // A restored page must exist in a collection we already hold.
            if state.data.is_some() && !state.pagination.contains_page(state.pagination.page) {
                log::warn!(
                    "page {} is out of range for {} rows; showing page 1",
                    state.pagination.page,
                    state.pagination.total_rows_count
                );
                state.pagination.set_page(1);
                inner.write_param(&inner.keys.page, "1");
            }
        }

        log::debug!("table {} built (fixed: {})", id, fixed);
        inner.hooks.initialize();
        Ok(KingTable {
            inner: Arc::new(inner),
        })
    }
}
