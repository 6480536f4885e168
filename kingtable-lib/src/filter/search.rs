//! Regex-backed text search

use std::collections::HashMap;

use regex::RegexBuilder;
use serde_json::Value;

use super::FilterEngine;
use super::FilterRule;
use super::MatchPattern;
use super::RuleKind;
use crate::Row;
use crate::config::SearchMode;

/// Default [`FilterEngine`]: case-insensitive text search over row properties.
///
/// Strings, numbers and booleans are matched by their text form; nested
/// values and nulls never match. Compiled patterns are cached per value and
/// mode.
#[derive(Debug, Default)]
pub struct SearchFilterEngine {
    rules: Vec<FilterRule>,
    search_disabled: bool,
    patterns: HashMap<(String, SearchMode), MatchPattern>,
}

impl SearchFilterEngine {
    /// Creates an engine with no rules and search enabled.
    pub fn new() -> Self {
        Self::default()
    }

    fn compile(value: &str, mode: SearchMode) -> Option<MatchPattern> {
        let parts = split(value, mode);
        if parts.is_empty() {
            return None;
        }
        let expr = parts
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        match RegexBuilder::new(&expr).case_insensitive(true).build() {
            Ok(regex) => Some(MatchPattern::new(value, regex)),
            Err(e) => {
                log::warn!("search pattern for {:?} rejected: {}", value, e);
                None
            }
        }
    }

    fn rule_matches(pattern: &MatchPattern, properties: &[String], row: &Row) -> bool {
        properties
            .iter()
            .filter_map(|p| row.get(p))
            .any(|v| match v {
                Value::String(s) => pattern.is_match(s),
                Value::Number(n) => pattern.is_match(&n.to_string()),
                Value::Bool(b) => pattern.is_match(if *b { "true" } else { "false" }),
                _ => false,
            })
    }
}

/// Splits a search value into the alternatives of its pattern.
fn split(value: &str, mode: SearchMode) -> Vec<String> {
    let value = value.trim();
    if value.is_empty() {
        return Vec::new();
    }
    match mode {
        SearchMode::FullString => vec![value.to_string()],
        SearchMode::SplitWords => value.split_whitespace().map(str::to_string).collect(),
        SearchMode::SplitSentences => {
            let mut parts = Vec::new();
            // Odd chunks sit between quotes.
            for (i, chunk) in value.split('"').enumerate() {
                if i % 2 == 1 {
                    let phrase = chunk.trim();
                    if !phrase.is_empty() {
                        parts.push(phrase.to_string());
                    }
                } else {
                    parts.extend(chunk.split_whitespace().map(str::to_string));
                }
            }
            parts
        }
    }
}

impl FilterEngine for SearchFilterEngine {
    fn set(&mut self, rule: FilterRule) {
        match self.rules.iter_mut().find(|r| r.key == rule.key) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    fn rule(&self, key: &str) -> Option<&FilterRule> {
        self.rules.iter().find(|r| r.key == key)
    }

    fn remove(&mut self, key: &str) -> Option<FilterRule> {
        let index = self.rules.iter().position(|r| r.key == key)?;
        Some(self.rules.remove(index))
    }

    fn set_search_disabled(&mut self, disabled: bool) {
        self.search_disabled = disabled;
    }

    fn is_search_disabled(&self) -> bool {
        self.search_disabled
    }

    fn skim<'a>(&mut self, rows: &'a [Row]) -> Vec<&'a Row> {
        if self.search_disabled {
            return rows.iter().collect();
        }
        let active: Vec<(MatchPattern, Vec<String>)> = self
            .rules
            .clone()
            .into_iter()
            .filter(|r| r.kind == RuleKind::Search)
            .filter_map(|r| {
                self.match_pattern(&r.value, r.search_mode)
                    .map(|p| (p, r.search_properties))
            })
            .collect();
        if active.is_empty() {
            return rows.iter().collect();
        }
        rows.iter()
            .filter(|row| {
                active
                    .iter()
                    .all(|(pattern, props)| Self::rule_matches(pattern, props, row))
            })
            .collect()
    }

    fn match_pattern(&mut self, value: &str, mode: SearchMode) -> Option<MatchPattern> {
        let key = (value.to_string(), mode);
        if let Some(pattern) = self.patterns.get(&key) {
            return Some(pattern.clone());
        }
        let pattern = Self::compile(value, mode)?;
        self.patterns.insert(key, pattern.clone());
        Some(pattern)
    }
}
