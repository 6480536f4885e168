//! Pagination state and subset math

use crate::config::SortOrder;

/// Returns the number of pages needed to show `total` rows, `per_page` at a time.
///
/// Never returns less than 1, so an empty table still has a first page.
///
/// # Example
///
/// ```
/// use kingtable_lib::pagination::page_count;
///
/// assert_eq!(page_count(0, 30), 1);
/// assert_eq!(page_count(90, 30), 3);
/// assert_eq!(page_count(95, 30), 4);
/// ```
pub fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 || total <= per_page {
        return 1;
    }
    if total % per_page == 0 {
        total / per_page
    } else {
        total.div_ceil(per_page)
    }
}

/// Paging, sort and search state of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState {
    /// Current page (1-based).
    pub page: usize,
    /// Rows per page.
    pub results_per_page: usize,
    /// Total rows reported by the source (or the filtered count in fixed mode).
    pub total_rows_count: usize,
    /// Derived page count, at least 1.
    pub total_page_count: usize,
    /// Sort column.
    pub order_by: Option<String>,
    /// Sort direction.
    pub sort_order: Option<SortOrder>,
    /// Current search string.
    pub search: String,
    /// 1-based number of the first row on the current page.
    pub first_object_number: usize,
    /// 1-based number of the last row slot on the current page.
    pub last_object_number: usize,
}

impl PaginationState {
    /// Creates pagination state for the given page, page size and total.
    pub fn new(page: usize, results_per_page: usize, total_rows_count: usize) -> Self {
        let mut state = Self {
            page: page.max(1),
            results_per_page,
            total_rows_count,
            total_page_count: page_count(total_rows_count, results_per_page),
            order_by: None,
            sort_order: None,
            search: String::new(),
            first_object_number: 0,
            last_object_number: 0,
        };
        state.refresh_bounds();
        state
    }

    /// Applies a new total rows count.
    ///
    /// Nothing but the display bounds changes when the total is the same. When
    /// the current page no longer exists it is reset to 1; the return value
    /// tells the caller to publish that page change.
    pub fn update_totals(&mut self, total_rows_count: usize) -> bool {
        let mut page_reset = false;
        if self.total_rows_count != total_rows_count {
            self.total_rows_count = total_rows_count;
            self.total_page_count = page_count(total_rows_count, self.results_per_page);
            if self.page > self.total_page_count {
                self.page = 1;
                page_reset = true;
            }
        }
        self.refresh_bounds();
        page_reset
    }

    /// Changes the page size, recomputing the page count.
    ///
    /// Returns `true` if the current page had to be reset to 1.
    pub fn set_results_per_page(&mut self, results_per_page: usize) -> bool {
        self.results_per_page = results_per_page;
        self.total_page_count = page_count(self.total_rows_count, results_per_page);
        let page_reset = self.page > self.total_page_count;
        if page_reset {
            self.page = 1;
        }
        self.refresh_bounds();
        page_reset
    }

    /// Moves to `page` without validation and refreshes the bounds.
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
        self.refresh_bounds();
    }

    /// Recomputes `first_object_number` and `last_object_number`.
    ///
    /// Bounds saturate at `usize::MAX` for pages too far out to address.
    pub fn refresh_bounds(&mut self) {
        let per_page = self.results_per_page;
        self.first_object_number = self
            .page
            .saturating_sub(1)
            .saturating_mul(per_page)
            .saturating_add(1);
        self.last_object_number = self.page.saturating_mul(per_page);
    }

    /// Returns `true` if the rows of `page` can be numbered at `results_per_page`.
    pub fn is_addressable(page: usize, results_per_page: usize) -> bool {
        page.checked_mul(results_per_page).is_some()
    }

    /// Returns `true` if `page` is a valid navigation target.
    ///
    /// A target must exist and differ from the current page.
    pub fn is_valid_target(&self, page: usize) -> bool {
        page >= 1 && page <= self.total_page_count && page != self.page
    }

    /// Returns `true` if `page` is within `1..=total_page_count`.
    pub fn contains_page(&self, page: usize) -> bool {
        page >= 1 && page <= self.total_page_count
    }

    /// Returns the slice of `rows` that belongs on the current page.
    ///
    /// Applied to server pages as well: a server may send coarser pages than
    /// the table shows, and the client slices them further.
    pub fn subset<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let from = self.page.saturating_sub(1).saturating_mul(self.results_per_page);
        let from = from.min(rows.len());
        let to = from.saturating_add(self.results_per_page).min(rows.len());
        log::trace!("subset rows {}..{} of {}", from, to, rows.len());
        &rows[from..to]
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_page_count_edges() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(50, 10), 5);
        assert_eq!(page_count(5, 0), 1);
    }

    #[test]
    fn test_ninety_five_rows_thirty_per_page() {
        let mut state = PaginationState::new(1, 30, 95);
        assert_eq!(state.total_page_count, 4);

        state.set_page(4);
        let rows: Vec<usize> = (0..95).collect();
        let subset = state.subset(&rows);
        assert_eq!(subset.len(), 5);
        assert_eq!(subset.first(), Some(&90));
        assert_eq!(subset.last(), Some(&94));
        assert_eq!(state.first_object_number, 91);
        assert_eq!(state.last_object_number, 120);
    }

    #[test]
    fn test_update_totals_resets_page_past_end() {
        let mut state = PaginationState::new(5, 10, 100);
        assert!(state.update_totals(30));
        assert_eq!(state.page, 1);
        assert_eq!(state.total_page_count, 3);
        assert_eq!(state.first_object_number, 1);
        assert_eq!(state.last_object_number, 10);
    }

    #[test]
    fn test_update_totals_keeps_valid_page() {
        let mut state = PaginationState::new(2, 10, 100);
        assert!(!state.update_totals(50));
        assert_eq!(state.page, 2);
        assert_eq!(state.total_page_count, 5);
    }

    #[test]
    fn test_set_results_per_page_clamps() {
        let mut state = PaginationState::new(4, 10, 40);
        assert!(state.set_results_per_page(50));
        assert_eq!(state.page, 1);
        assert_eq!(state.total_page_count, 1);
    }

    #[test]
    fn test_valid_target() {
        let state = PaginationState::new(2, 10, 40);
        assert!(state.is_valid_target(1));
        assert!(state.is_valid_target(4));
        assert!(!state.is_valid_target(2));
        assert!(!state.is_valid_target(0));
        assert!(!state.is_valid_target(5));
    }

    #[test]
    fn test_bounds_saturate_for_huge_pages() {
        let mut state = PaginationState::new(usize::MAX, 30, 0);
        assert_eq!(state.last_object_number, usize::MAX);
        assert_eq!(state.first_object_number, usize::MAX);
        assert!(!PaginationState::is_addressable(usize::MAX, 30));
        assert!(PaginationState::is_addressable(4, 30));

        assert!(state.update_totals(90));
        assert_eq!(state.page, 1);
        assert_eq!(state.last_object_number, 30);
    }

    #[test]
    fn test_subset_past_end_is_empty() {
        let state = PaginationState::new(3, 10, 100);
        let rows: Vec<u8> = vec![0; 12];
        assert!(state.subset(&rows).is_empty());
    }

    proptest! {
        #[test]
        fn prop_page_count_at_least_one(total in 0usize..100_000, per_page in 1usize..1_000) {
            prop_assert!(page_count(total, per_page) >= 1);
        }

        #[test]
        fn prop_page_count_is_ceiling_above_one_page(total in 0usize..100_000, per_page in 1usize..1_000) {
            prop_assume!(total > per_page);
            prop_assert_eq!(page_count(total, per_page), total.div_ceil(per_page));
        }

        #[test]
        fn prop_update_totals_is_idempotent(
            page in 1usize..50,
            per_page in 1usize..100,
            start in 0usize..10_000,
            total in 0usize..10_000,
        ) {
            let mut state = PaginationState::new(page, per_page, start);
            state.update_totals(total);
            let once = state.clone();
            prop_assert!(!state.update_totals(total));
            prop_assert_eq!(state, once);
        }
    }
}
