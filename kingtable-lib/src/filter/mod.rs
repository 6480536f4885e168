//! Filter rules and the engine that applies them

mod search;

use std::fmt;

use regex::Regex;
pub use search::SearchFilterEngine;

use crate::Row;
use crate::config::SearchMode;

/// Key of the rule the table manages for its search box.
pub const SEARCH_RULE: &str = "search";

/// Kind of a filter rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Free-text match over a set of properties.
    Search,
}

/// A named filter rule.
///
/// The table creates and removes rules by key; the engine owns matching.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRule {
    pub key: String,
    pub kind: RuleKind,
    /// Raw search value as typed.
    pub value: String,
    /// Properties the value is matched against.
    pub search_properties: Vec<String>,
    pub search_mode: SearchMode,
}

impl FilterRule {
    /// Creates the table's search rule.
    pub fn search(
        value: impl Into<String>,
        search_properties: Vec<String>,
        search_mode: SearchMode,
    ) -> Self {
        Self {
            key: SEARCH_RULE.to_string(),
            kind: RuleKind::Search,
            value: value.into(),
            search_properties,
            search_mode,
        }
    }
}

/// A compiled search pattern.
#[derive(Clone)]
pub struct MatchPattern {
    source: String,
    regex: Regex,
}

impl MatchPattern {
    pub(crate) fn new(source: impl Into<String>, regex: Regex) -> Self {
        Self {
            source: source.into(),
            regex,
        }
    }

    /// The search value the pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns `true` if `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The compiled expression.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Debug for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchPattern")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

impl PartialEq for MatchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.regex.as_str() == other.regex.as_str()
    }
}

/// Holds named filter rules and reduces a collection to matching rows.
///
/// Invoked synchronously by the table. Implementations must not hold on to
/// the rows they are given.
pub trait FilterEngine: Send {
    /// Registers a rule, replacing any rule with the same key.
    fn set(&mut self, rule: FilterRule);

    /// Returns the rule registered under `key`.
    fn rule(&self, key: &str) -> Option<&FilterRule>;

    /// Removes and returns the rule registered under `key`.
    fn remove(&mut self, key: &str) -> Option<FilterRule>;

    /// Turns text search off or on. While off, [`skim`](Self::skim) ignores search rules.
    fn set_search_disabled(&mut self, disabled: bool);

    /// Whether text search is currently off.
    fn is_search_disabled(&self) -> bool;

    /// Returns the rows matching every active rule, in their original order.
    fn skim<'a>(&mut self, rows: &'a [Row]) -> Vec<&'a Row>;

    /// Compiles (or returns a cached) match pattern for `value`.
    ///
    /// `None` when the value holds nothing to match.
    fn match_pattern(&mut self, value: &str, mode: SearchMode) -> Option<MatchPattern>;
}
