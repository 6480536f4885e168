//! Fetching rows, the staleness guard, and rendering

use serde_json::Map;
use serde_json::Value;

use super::Inner;
use super::KingTable;
use super::TableState;
use crate::Loaded;
use crate::Row;
use crate::config::SortOrder;
use crate::error::ConfigError;
use crate::error::Error;
use crate::event::TableEvent;
use crate::response::FetchOutcome;
use crate::sort::sort_rows;
use crate::transport::FetchPayload;
use crate::transport::FetchRequest;

/// Result of [`KingTable::render`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Rows are available and columns are built.
    Ready(Loaded<Vec<Row>>),
    /// The fetch brought no rows and there are no columns yet; the render
    /// resumes (with a `RenderReady` event) when a later fetch brings rows.
    Pending,
    /// A newer fetch was started while this one was in flight.
    Stale,
}

impl Inner {
    /// Applies an accepted payload and returns the rows it carried.
    fn accept(
        &self,
        state: &mut TableState,
        payload: FetchPayload,
        events: &mut Vec<TableEvent>,
    ) -> (Vec<Row>, bool) {
        let (rows, total) = match payload {
            FetchPayload::Collection(rows) => {
                if !state.fixed {
                    log::debug!("server returned the whole collection; table is now fixed");
                }
                state.fixed = true;
                state.filters.set_search_disabled(false);
                let total = rows.len();
                (rows, total)
            }
            FetchPayload::Envelope {
                subset,
                total,
                search,
            } => {
                // The local search stays authoritative; the server's only
                // warms the pattern cache.
                if let Some(search) = search.filter(|s| !s.is_empty()) {
                    state.last_fetch_filter =
                        state.filters.match_pattern(&search, self.options.search_mode);
                }
                (subset, total)
            }
        };
        state.data = Some(rows.clone());

        let previous_total = state.pagination.total_rows_count;
        if state.pagination.update_totals(total) {
            self.write_page(state.pagination.page);
            events.push(TableEvent::PageChange(state.pagination.page));
        }
        if previous_total != total {
            events.push(TableEvent::ResultsCountChange(total));
        }

        self.initialize_columns(state);

        let resumed = state.pending_render && state.has_data();
        if resumed {
            state.pending_render = false;
        }
        (rows, resumed)
    }
}

impl KingTable {
    /// Loads rows for the current state.
    ///
    /// A fixed table that holds its collection answers synchronously.
    /// Otherwise the current page, size, sort and search, the configured
    /// `postData` and then `extra` are posted to the endpoint.
    ///
    /// When another fetch was started after this one, the response (or
    /// failure) is discarded and [`FetchOutcome::Stale`] is returned.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingUrl`] if there is no endpoint and nothing to answer with.
    /// - [`Error::Transport`] if the request fails; the `on_fetch_error` hook and an
    ///   `Error` event fire as well.
    /// - [`Error::Protocol`] if the response breaks the catalog contract. State is
    ///   left untouched.
    pub async fn fetch_rows(&self, extra: Option<Map<String, Value>>) -> Result<FetchOutcome<Vec<Row>>, Error> {
        let inner = &self.inner;
        let (epoch, url, body) = {
            let mut state = inner.state();
            if state.fixed {
                if let Some(data) = &state.data {
                    if !data.is_empty() || inner.options.url.is_none() {
                        return Ok(FetchOutcome::Loaded(Loaded::synchronous(data.clone())));
                    }
                }
            }
            let url = inner.options.url.clone().ok_or(ConfigError::MissingUrl)?;
            let epoch = state.epochs.next();
            let pagination = &state.pagination;
            let request = FetchRequest {
                fixed: state.fixed,
                page: pagination.page,
                size: pagination.results_per_page,
                order_by: pagination.order_by.clone(),
                sort_order: pagination.sort_order,
                search: pagination.search.clone(),
                timestamp: state.epochs.anchor(),
            };
            let body = request.into_body(&inner.options.post_data, extra.as_ref());
            (epoch, url, body)
        };

        log::debug!("fetch {} started for {}", epoch, url);
        inner.hooks.on_fetch_start();
        inner.events.emit(TableEvent::FetchStart);

        let result = inner.transport.post_json(&url, &body).await;

        inner.hooks.on_fetch_end();
        inner.events.emit(TableEvent::FetchEnd);

        let mut events = Vec::new();
        let (rows, resumed, pagination) = {
            let mut state = inner.state();
            if !state.epochs.is_current(epoch) {
                log::debug!("fetch {} superseded; response discarded", epoch);
                return Ok(FetchOutcome::Stale);
            }
            let value = match result {
                Ok(value) => value,
                Err(e) => {
                    drop(state);
                    log::warn!("fetch {} failed: {}", epoch, e);
                    inner.hooks.on_fetch_error(&e);
                    inner.events.emit(TableEvent::Error(e.reason().to_string()));
                    return Err(e.into());
                }
            };
            let payload = match FetchPayload::from_json(value) {
                Ok(payload) => payload,
                Err(e) => {
                    log::warn!("fetch {} rejected: {}", epoch, e);
                    return Err(e.into());
                }
            };
            log::debug!("fetch {} accepted with {} rows", epoch, payload.len());
            let (rows, resumed) = inner.accept(&mut state, payload, &mut events);
            (rows, resumed, state.pagination.clone())
        };

        inner.hooks.on_results_count_change(&pagination);
        inner.emit_all(events);
        if resumed {
            inner.hooks.before_render();
            inner.hooks.after_render();
            inner.events.emit(TableEvent::RenderReady);
        }
        Ok(FetchOutcome::Loaded(Loaded::fetched(rows)))
    }

    /// Loads rows and prepares the columns for display.
    ///
    /// Runs the `before_render` hook, builds and sorts the columns, then runs
    /// `after_render`. If no rows came back and there are no columns yet, a
    /// `MissingData` event fires and the render is parked.
    pub async fn render(&self) -> Result<RenderOutcome, Error> {
        let loaded = match self.fetch_rows(None).await? {
            FetchOutcome::Loaded(loaded) => loaded,
            FetchOutcome::Stale => return Ok(RenderOutcome::Stale),
        };
        let inner = &self.inner;
        {
            let mut state = inner.state();
            if loaded.data().is_empty() && !state.columns_initialized {
                state.pending_render = true;
                drop(state);
                log::debug!("render parked until rows arrive");
                inner.events.emit(TableEvent::MissingData);
                return Ok(RenderOutcome::Pending);
            }
        }
        inner.hooks.before_render();
        {
            let mut state = inner.state();
            inner.initialize_columns(&mut state);
        }
        inner.hooks.after_render();
        Ok(RenderOutcome::Ready(loaded))
    }

    /// Loads rows and returns the ones to show on the current page.
    ///
    /// The search rule is applied. In a fixed table the totals follow the
    /// filtered count and rows are sorted client side. Every returned row
    /// carries a 1-based `rowCount`. When the held rows exceed one page and
    /// pagination is on, only the current page is returned.
    pub async fn rows_to_display(
        &self,
        extra: Option<Map<String, Value>>,
    ) -> Result<FetchOutcome<Vec<Row>>, Error> {
        let loaded = match self.fetch_rows(extra).await? {
            FetchOutcome::Loaded(loaded) => loaded,
            FetchOutcome::Stale => return Ok(FetchOutcome::Stale),
        };
        let origin = loaded.origin;
        let rows = loaded.into_inner();
        let inner = &self.inner;

        let mut events = Vec::new();
        let (visible, count_changed) = {
            let mut state = inner.state();
            inner.ensure_search_filter(&mut state);

            let mut visible: Vec<Row> = state.filters.skim(&rows).into_iter().cloned().collect();

            let mut count_changed = None;
            if state.fixed {
                let previous_total = state.pagination.total_rows_count;
                if state.pagination.update_totals(visible.len()) {
                    inner.write_page(state.pagination.page);
                    events.push(TableEvent::PageChange(state.pagination.page));
                }
                if previous_total != visible.len() {
                    events.push(TableEvent::ResultsCountChange(visible.len()));
                }
                count_changed = Some(state.pagination.clone());
                if let Some(order_by) = &state.pagination.order_by {
                    let order = state.pagination.sort_order.unwrap_or(SortOrder::Asc);
                    sort_rows(&mut visible, order_by, order);
                }
            }

            for (index, row) in visible.iter_mut().enumerate() {
                row.insert("rowCount".to_string(), Value::from(index + 1));
            }

            let held = state.data.as_ref().map_or(0, Vec::len);
            if held > state.pagination.results_per_page && inner.options.pagination_enabled {
                visible = state.pagination.subset(&visible).to_vec();
            }
            (visible, count_changed)
        };

        if let Some(pagination) = count_changed {
            inner.hooks.on_results_count_change(&pagination);
        }
        inner.emit_all(events);
        let mut loaded = Loaded::fetched(visible);
        loaded.origin = origin;
        Ok(FetchOutcome::Loaded(loaded))
    }
}
