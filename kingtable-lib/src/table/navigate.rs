//! Page, page size and sort changes

use super::KingTable;
use super::sync::format_sort;
use crate::config::SortOrder;
use crate::error::ConfigError;
use crate::event::TableEvent;

impl KingTable {
    /// Moves to `page` if it is a valid target.
    ///
    /// A target must be within `1..=total_page_count` and differ from the
    /// current page. Returns `true` if the page changed.
    pub fn go_to_page(&self, page: usize) -> bool {
        {
            let mut state = self.inner.state();
            if !state.pagination.is_valid_target(page) {
                return false;
            }
            state.pagination.set_page(page);
            self.inner.write_page(page);
        }
        self.inner.events.emit(TableEvent::PageChange(page));
        true
    }

    /// Moves to the first page.
    pub fn go_to_first(&self) -> bool {
        self.go_to_page(1)
    }

    /// Moves to the last page.
    pub fn go_to_last(&self) -> bool {
        let last = self.inner.state().pagination.total_page_count;
        self.go_to_page(last)
    }

    /// Moves to the next page.
    pub fn go_to_next(&self) -> bool {
        let next = self.inner.state().pagination.page.saturating_add(1);
        self.go_to_page(next)
    }

    /// Moves to the previous page.
    pub fn go_to_prev(&self) -> bool {
        let prev = self.inner.state().pagination.page.saturating_sub(1);
        self.go_to_page(prev)
    }

    /// Changes the page size.
    ///
    /// The size must be one of `resultsPerPageSelect`. The page is reset to 1
    /// if it no longer exists. The size is written to the URL and the store.
    pub fn set_results_per_page(&self, size: usize) -> Result<(), ConfigError> {
        if size == 0 || !self.inner.options.is_allowed_page_size(size) {
            return Err(ConfigError::PageSizeNotAllowed(size));
        }
        let page = {
            let mut state = self.inner.state();
            if state.pagination.results_per_page == size {
                return Ok(());
            }
            state.pagination.set_results_per_page(size);
            self.inner.persist_size(size);
            self.inner.write_page(state.pagination.page);
            state.pagination.page
        };
        log::debug!("page size set to {}", size);
        self.inner.emit_all(vec![
            TableEvent::ResultsPerPageChange(size),
            TableEvent::PageChange(page),
        ]);
        Ok(())
    }

    /// Sorts by `column`, toggling to descending when it is already the
    /// ascending sort column.
    ///
    /// Once columns are built, `column` must be one of them. Returns the new
    /// sort order.
    pub fn sort_by(&self, column: &str) -> Result<SortOrder, ConfigError> {
        let order = {
            let mut state = self.inner.state();
            if let Some(columns) = &state.columns {
                if !columns.iter().any(|c| c.name == column) {
                    return Err(ConfigError::UnknownColumn(column.to_string()));
                }
            }
            let pagination = &mut state.pagination;
            let order = match (&pagination.order_by, pagination.sort_order) {
                (Some(current), Some(SortOrder::Asc)) if current == column => SortOrder::Desc,
                _ => SortOrder::Asc,
            };
            pagination.order_by = Some(column.to_string());
            pagination.sort_order = Some(order);
            self.inner
                .write_param(&self.inner.keys.sort, &format_sort(column, order));
            order
        };
        self.inner.events.emit(TableEvent::SortChange {
            column: column.to_string(),
            order,
        });
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::KingTable;
    use crate::Row;
    use crate::config::SortOrder;
    use crate::config::TableOptions;
    use crate::error::ConfigError;
    use crate::event::TableEvent;

    fn table(count: usize) -> KingTable {
        let rows: Vec<Row> = (0..count)
            .map(|i| serde_json::from_value(json!({"n": i})).unwrap())
            .collect();
        KingTable::builder(TableOptions::default().with_results_per_page(10))
            .data(rows)
            .build()
            .unwrap()
    }

    #[test]
    fn test_navigation_bounds() {
        let table = table(35);
        assert_eq!(table.pagination().total_page_count, 4);

        assert!(!table.go_to_prev());
        assert!(!table.go_to_first());
        assert!(table.go_to_next());
        assert_eq!(table.pagination().page, 2);
        assert!(table.go_to_last());
        assert_eq!(table.pagination().page, 4);
        assert!(!table.go_to_next());
        assert!(!table.go_to_page(5));
        assert!(table.go_to_page(3));

        let pagination = table.pagination();
        assert_eq!(pagination.first_object_number, 21);
        assert_eq!(pagination.last_object_number, 30);
    }

    #[tokio::test]
    async fn test_set_results_per_page() {
        let table = table(35);
        table.go_to_last();
        let mut rx = table.subscribe();

        assert_eq!(
            table.set_results_per_page(7),
            Err(ConfigError::PageSizeNotAllowed(7))
        );
        table.set_results_per_page(50).unwrap();

        let pagination = table.pagination();
        assert_eq!(pagination.results_per_page, 50);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.total_page_count, 1);
        assert_eq!(rx.recv().await.unwrap(), TableEvent::ResultsPerPageChange(50));
        assert_eq!(rx.recv().await.unwrap(), TableEvent::PageChange(1));
    }

    #[test]
    fn test_sort_toggles() {
        let table = table(3);
        assert_eq!(table.sort_by("n").unwrap(), SortOrder::Asc);
        assert_eq!(table.sort_by("n").unwrap(), SortOrder::Desc);
        assert_eq!(table.sort_by("n").unwrap(), SortOrder::Asc);

        table.initialize_columns();
        assert_eq!(
            table.sort_by("missing"),
            Err(ConfigError::UnknownColumn("missing".to_string()))
        );
    }
}
