//! Keeping pagination state, URL and store in agreement

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::Inner;
use super::KingTable;
use super::QueryKeys;
use super::TableState;
use crate::config::SortOrder;
use crate::config::TableOptions;
use crate::event::TableEvent;
use crate::location::UrlParams;
use crate::pagination::PaginationState;
use crate::storage::PersistentStore;

/// State restored when a table is built.
pub(super) struct InitialSettings {
    pub page: usize,
    pub results_per_page: usize,
    pub search: String,
    pub order_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

/// Parses a page number or page size; zero and garbage are malformed.
fn parse_positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// Parses a `"<column>:<asc|desc>"` sort value.
fn parse_sort(raw: &str) -> Option<(String, SortOrder)> {
    let (column, order) = raw.rsplit_once(':')?;
    let column = column.trim();
    if column.is_empty() {
        return None;
    }
    Some((column.to_string(), SortOrder::parse(order)?))
}

pub(super) fn format_sort(column: &str, order: SortOrder) -> String {
    format!("{}:{}", column, order)
}

/// Reads the initial state from the options, the URL and the store.
///
/// URL values win over the options. A stored page size wins over both and is
/// copied into the URL. A missing URL page is filled in with the starting page.
pub(super) fn load_settings(
    options: &TableOptions,
    keys: &QueryKeys,
    location: Option<&dyn UrlParams>,
    store: Option<&dyn PersistentStore>,
) -> InitialSettings {
    let mut settings = InitialSettings {
        page: options.page,
        results_per_page: options.results_per_page,
        search: options.search.clone(),
        order_by: options.order_by.clone(),
        sort_order: options.sort_order,
    };

    if let Some(location) = location {
        if let Some(search) = location.get(&keys.search).filter(|s| !s.is_empty()) {
            log::debug!("search restored from url: {:?}", search);
            settings.search = search;
        }

        match location.get(&keys.page) {
            Some(raw) => match parse_positive(&raw) {
                Some(page) => settings.page = page,
                None => {
                    log::warn!("ignoring malformed page {:?} in url", raw);
                    location.set(&keys.page, &settings.page.to_string());
                }
            },
            None => location.set(&keys.page, &settings.page.to_string()),
        }

        if let Some(raw) = location.get(&keys.size) {
            match parse_positive(&raw).filter(|s| options.is_allowed_page_size(*s)) {
                Some(size) => settings.results_per_page = size,
                None => log::warn!("ignoring page size {:?} in url", raw),
            }
        }

        if let Some(raw) = location.get(&keys.sort) {
            match parse_sort(&raw) {
                Some((column, order)) => {
                    settings.order_by = Some(column);
                    settings.sort_order = Some(order);
                }
                None => log::warn!("ignoring malformed sort {:?} in url", raw),
            }
        }
    }

    let stored = store.and_then(|s| s.get(&options.results_per_page_storage_key));
    if let Some(raw) = stored {
        match parse_positive(&raw).filter(|s| options.is_allowed_page_size(*s)) {
            Some(size) => {
                settings.results_per_page = size;
                if let Some(location) = location {
                    location.set(&keys.size, &size.to_string());
                }
            }
            None => log::warn!("ignoring stored page size {:?}", raw),
        }
    }

    if !PaginationState::is_addressable(settings.page, settings.results_per_page) {
        log::warn!("ignoring page {} in url; it is out of range", settings.page);
        settings.page = if PaginationState::is_addressable(options.page, settings.results_per_page) {
            options.page
        } else {
            1
        };
        if let Some(location) = location {
            location.set(&keys.page, &settings.page.to_string());
        }
    }

    settings
}

impl Inner {
    /// Writes a query parameter when URL sync is on.
    pub(super) fn write_param(&self, key: &str, value: &str) {
        if let Some(location) = &self.location {
            location.set(key, value);
        }
    }

    pub(super) fn write_page(&self, page: usize) {
        self.write_param(&self.keys.page, &page.to_string());
    }

    /// Writes the page size to the URL and the store.
    pub(super) fn persist_size(&self, size: usize) {
        let value = size.to_string();
        self.write_param(&self.keys.size, &value);
        if let Some(store) = &self.store {
            if let Err(e) = store.set(&self.options.results_per_page_storage_key, &value) {
                log::warn!("failed to store page size: {}", e);
            }
        }
    }

    fn reconcile_page(&self, state: &mut TableState, events: &mut Vec<TableEvent>) {
        let Some(location) = &self.location else {
            return;
        };
        let current = state.pagination.page;
        match location.get(&self.keys.page).as_deref().map(parse_positive) {
            Some(Some(page)) if state.pagination.contains_page(page) => {
                if page != current {
                    log::debug!("page {} adopted from url", page);
                    state.pagination.set_page(page);
                    events.push(TableEvent::PageChange(page));
                }
            }
            other => {
                if other.is_some() {
                    log::warn!("url page out of range or malformed; restoring {}", current);
                }
                self.write_page(current);
            }
        }
    }

    fn reconcile_size(&self, state: &mut TableState, events: &mut Vec<TableEvent>) {
        let Some(location) = &self.location else {
            return;
        };
        let current = state.pagination.results_per_page;
        let raw = location.get(&self.keys.size);
        match raw
            .as_deref()
            .and_then(parse_positive)
            .filter(|s| self.options.is_allowed_page_size(*s))
        {
            Some(size) if size != current => {
                log::debug!("page size {} adopted from url", size);
                state.pagination.set_results_per_page(size);
                self.persist_size(size);
                self.write_page(state.pagination.page);
                events.push(TableEvent::ResultsPerPageChange(size));
                events.push(TableEvent::PageChange(state.pagination.page));
            }
            Some(_) => {}
            None => {
                if raw.is_some() {
                    log::warn!("url page size not allowed or malformed; restoring {}", current);
                }
                self.write_param(&self.keys.size, &current.to_string());
            }
        }
    }

    fn reconcile_search(&self, state: &mut TableState, events: &mut Vec<TableEvent>) {
        let Some(location) = &self.location else {
            return;
        };
        let search = location.get(&self.keys.search).unwrap_or_default();
        if search == state.pagination.search {
            return;
        }
        if search.is_empty() {
            log::debug!("search cleared from url");
            self.clear_search_locked(state);
            events.push(TableEvent::SearchCleared);
        } else {
            log::debug!("search {:?} adopted from url", search);
            self.set_search_locked(state, &search);
        }
        events.push(TableEvent::SearchQueryStringChange);
    }
}

impl KingTable {
    /// Brings the state in line with the URL after a navigation.
    ///
    /// For page and page size, a valid URL value that differs from the state
    /// is adopted; a missing, malformed or out-of-range one is overwritten
    /// with the state's value. A differing search is always adopted.
    /// Does nothing when URL sync is off.
    pub fn reconcile_location(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.inner.state();
            self.inner.reconcile_page(&mut state, &mut events);
            self.inner.reconcile_size(&mut state, &mut events);
            self.inner.reconcile_search(&mut state, &mut events);
        }
        self.inner.emit_all(events);
    }

    /// Reconciles with the URL on every navigation notification until the
    /// source closes.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use kingtable_lib::KingTable;
    /// # use kingtable_lib::config::TableOptions;
    /// # use kingtable_lib::location::LocationQuery;
    /// # async fn run() -> Result<(), kingtable_lib::error::Error> {
    /// let location = Arc::new(LocationQuery::parse("https://example.com/?page=1")?);
    /// let table = KingTable::builder(TableOptions::default().with_url("https://example.com/rows"))
    ///     .location(location.clone())
    ///     .build()?;
    ///
    /// tokio::spawn({
    ///     let table = table.clone();
    ///     let changes = location.subscribe();
    ///     async move { table.follow_navigation(changes).await }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub async fn follow_navigation(&self, mut changes: broadcast::Receiver<()>) {
        loop {
            match changes.recv().await {
                Ok(()) => self.reconcile_location(),
                Err(RecvError::Lagged(missed)) => {
                    log::debug!("{} navigation notifications coalesced", missed);
                    self.reconcile_location();
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
