//! Search filter lifecycle

use super::Inner;
use super::KingTable;
use super::TableState;
use crate::filter::FilterRule;
use crate::filter::SEARCH_RULE;

/// What [`KingTable::search`] did with a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTrigger {
    /// The value became the current search.
    Applied,
    /// The value was empty; the search was cleared.
    Cleared,
    /// The value is too short or blank; nothing changed.
    Ignored,
}

impl Inner {
    /// Fields the search rule should match against.
    ///
    /// Explicit configuration wins. Otherwise the fields are guessed once from
    /// the first held row, minus columns that disallow search. Empty when
    /// there is nothing to guess from yet.
    fn search_properties(&self, state: &mut TableState) -> Vec<String> {
        if let Some(explicit) = &self.options.search_properties {
            return explicit.clone();
        }
        if state.guessed_search_properties.is_none() {
            let first = state.data.as_ref().and_then(|d| d.first());
            state.guessed_search_properties =
                first.map(|row| self.inferencer.searchable_properties(row));
        }
        let guessed = state.guessed_search_properties.clone().unwrap_or_default();
        match &state.columns {
            Some(columns) => guessed
                .into_iter()
                .filter(|name| {
                    !columns
                        .iter()
                        .any(|c| &c.name == name && !c.allow_search)
                })
                .collect(),
            None => guessed,
        }
    }

    pub(super) fn set_search_locked(&self, state: &mut TableState, value: &str) {
        state.pagination.search = value.to_string();
        let properties = self.search_properties(state);
        if properties.is_empty() {
            log::debug!("search {:?} stored; no searchable fields yet", value);
            return;
        }
        state.filters.set(FilterRule::search(
            value,
            properties,
            self.options.search_mode,
        ));
    }

    pub(super) fn clear_search_locked(&self, state: &mut TableState) {
        state.filters.remove(SEARCH_RULE);
        self.write_param(&self.keys.search, "");
        state.pagination.search.clear();
    }

    /// Registers the search rule if a search is set but the rule is missing.
    pub(super) fn ensure_search_filter(&self, state: &mut TableState) {
        if !state.pagination.search.is_empty() && state.filters.rule(SEARCH_RULE).is_none() {
            let search = state.pagination.search.clone();
            self.set_search_locked(state, &search);
        }
    }
}

impl KingTable {
    /// Stores `value` as the current search and registers the search rule.
    ///
    /// The rule is only registered once searchable fields are known; until
    /// then the value is kept and the rule is created on the next display.
    pub fn set_search_filter(&self, value: &str) {
        let mut state = self.inner.state();
        self.inner.set_search_locked(&mut state, value);
    }

    /// Removes the search rule, resets the search and clears it from the URL.
    pub fn clear_search(&self) {
        let mut state = self.inner.state();
        self.inner.clear_search_locked(&mut state);
    }

    /// Returns `true` if `value` should trigger a search.
    ///
    /// Blank values and values shorter than `minSearchChars` do not.
    pub fn validate_for_search(&self, value: &str) -> bool {
        if !value.is_empty() && value.trim().is_empty() {
            return false;
        }
        value.chars().count() >= self.inner.options.min_search_chars
    }

    /// Handles a value typed in a search box.
    ///
    /// An empty value clears the search. A value rejected by
    /// [`validate_for_search`](Self::validate_for_search) is ignored.
    /// Otherwise the value becomes the search and is written to the URL.
    pub fn search(&self, value: &str) -> SearchTrigger {
        if value.is_empty() {
            self.clear_search();
            return SearchTrigger::Cleared;
        }
        if !self.validate_for_search(value) {
            return SearchTrigger::Ignored;
        }
        let mut state = self.inner.state();
        self.inner.set_search_locked(&mut state, value);
        self.inner.write_param(&self.inner.keys.search, value);
        SearchTrigger::Applied
    }

    /// The current search value.
    pub fn search_value(&self) -> String {
        self.inner.state().pagination.search.clone()
    }

    /// The search rule currently registered, if any.
    pub fn search_rule(&self) -> Option<FilterRule> {
        self.inner.state().filters.rule(SEARCH_RULE).cloned()
    }
}
