//! Table notifications and overridable hooks

use tokio::sync::broadcast;

use crate::config::SortOrder;
use crate::error::TransportError;
use crate::pagination::PaginationState;

/// A lifecycle notification published by a table.
///
/// Delivery is fire-and-forget: a table never waits for listeners and does
/// not care whether there are any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A request was posted.
    FetchStart,
    /// A request completed (successfully or not).
    FetchEnd,
    /// A request failed; carries a short reason such as `"network"` or `"http"`.
    Error(String),
    /// A render found no rows to build columns from and was parked.
    MissingData,
    /// A parked render got its data.
    RenderReady,
    /// The table was disposed.
    Dispose,
    /// The search was changed by a navigation.
    SearchQueryStringChange,
    /// The search was cleared.
    SearchCleared,
    /// The current page changed; carries the new page.
    PageChange(usize),
    /// The page size changed; carries the new size.
    ResultsPerPageChange(usize),
    /// The sort changed.
    SortChange { column: String, order: SortOrder },
    /// The total rows count changed; carries the new total.
    ResultsCountChange(usize),
}

impl TableEvent {
    /// The conventional event name, as used by listeners keyed on strings.
    pub fn name(&self) -> &'static str {
        match self {
            TableEvent::FetchStart => "fetch-start",
            TableEvent::FetchEnd => "fetch-end",
            TableEvent::Error(_) => "error",
            TableEvent::MissingData => "missing-data",
            TableEvent::RenderReady => "render-ready",
            TableEvent::Dispose => "dispose",
            TableEvent::SearchQueryStringChange => "search-qs-change",
            TableEvent::SearchCleared => "search-empty",
            TableEvent::PageChange(_) => "page-change",
            TableEvent::ResultsPerPageChange(_) => "page-size-change",
            TableEvent::SortChange { .. } => "sort-change",
            TableEvent::ResultsCountChange(_) => "results-count-change",
        }
    }
}

/// Broadcast channel carrying a table's events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TableEvent>,
}

impl EventBus {
    /// Events a slow listener may lag behind before it starts losing them.
    pub const CAPACITY: usize = 64;

    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    /// Registers a listener.
    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event.
    pub fn emit(&self, event: TableEvent) {
        log::trace!("event {}", event.name());
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Points where an embedding application can step into a table's lifecycle.
///
/// Every method has an empty default. Hooks run synchronously, after the
/// table has released its state, so they may call back into the table.
pub trait TableHooks: Send + Sync {
    /// Called once when the table is built.
    fn initialize(&self) {}

    /// Called before a request is posted.
    fn on_fetch_start(&self) {}

    /// Called when a request completes, successfully or not.
    fn on_fetch_end(&self) {}

    /// Called when a current (not stale) request fails in transport.
    fn on_fetch_error(&self, error: &TransportError) {
        log::error!("fetch failed: {}", error);
    }

    /// Called before columns are prepared for a render.
    fn before_render(&self) {}

    /// Called after a render has its rows and columns.
    fn after_render(&self) {}

    /// Called whenever a response sets the total rows count.
    fn on_results_count_change(&self, _pagination: &PaginationState) {}
}

/// Hooks that do nothing beyond the defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl TableHooks for NoHooks {}
