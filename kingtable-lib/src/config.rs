//! Table configuration

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde_json::Map;
use serde_json::Value;

use crate::column::ColumnAttributes;
use crate::error::ConfigError;
use crate::pagination::PaginationState;

/// How a search string is turned into a match pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchMode {
    /// The whole string must appear in a field.
    #[default]
    FullString,
    /// Any whitespace-separated word may appear in a field.
    SplitWords,
    /// Like `SplitWords`, but double-quoted phrases are kept together.
    SplitSentences,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl SortOrder {
    /// Returns the wire form (`"asc"` / `"desc"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Parses the wire form, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    /// Returns the opposite direction.
    pub fn reversed(&self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single explicit column override, as written by the user.
///
/// A bare string is shorthand: inside a name-keyed map it is the column's
/// display name, inside an ordered list it is the column's field name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColumnSpec {
    /// Shorthand string form.
    Short(String),
    /// Full attribute object.
    Attributes(ColumnAttributes),
}

/// Explicit column overrides, either keyed by field name or as an ordered list.
///
/// Declaration order is preserved in both forms; it decides the position of
/// columns that do not carry an explicit one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColumnOverrides {
    /// `[{ "name": "id", ... }, "title", ...]`
    Ordered(Vec<ColumnSpec>),
    /// `{ "id": { ... }, "title": "Title", ... }`
    Named(NamedColumns),
}

/// Name-keyed column overrides in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedColumns(pub Vec<(String, ColumnSpec)>);

impl<'de> Deserialize<'de> for NamedColumns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamedColumnsVisitor;

        impl<'de> Visitor<'de> for NamedColumnsVisitor {
            type Value = NamedColumns;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column names to column options")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, spec)) = map.next_entry::<String, ColumnSpec>()? {
                    entries.push((name, spec));
                }
                Ok(NamedColumns(entries))
            }
        }

        deserializer.deserialize_map(NamedColumnsVisitor)
    }
}

impl ColumnOverrides {
    /// Creates name-keyed overrides from `(name, attributes)` pairs.
    pub fn named<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnAttributes)>,
        S: Into<String>,
    {
        ColumnOverrides::Named(NamedColumns(
            entries
                .into_iter()
                .map(|(name, attrs)| (name.into(), ColumnSpec::Attributes(attrs)))
                .collect(),
        ))
    }

    /// Normalizes every entry to `(field name, attributes)` in declaration order.
    ///
    /// Shorthand strings become `{ displayName }` (map form) or `{ name }`
    /// (list form). List entries without a name cannot be matched and are skipped.
    pub fn normalized(&self) -> Vec<(String, ColumnAttributes)> {
        match self {
            ColumnOverrides::Named(NamedColumns(entries)) => entries
                .iter()
                .map(|(name, spec)| {
                    let attrs = match spec {
                        ColumnSpec::Short(display) => ColumnAttributes {
                            display_name: Some(display.clone()),
                            ..Default::default()
                        },
                        ColumnSpec::Attributes(attrs) => attrs.clone(),
                    };
                    (name.clone(), attrs)
                })
                .collect(),
            ColumnOverrides::Ordered(specs) => specs
                .iter()
                .filter_map(|spec| match spec {
                    ColumnSpec::Short(name) => Some((name.clone(), ColumnAttributes::default())),
                    ColumnSpec::Attributes(attrs) => match &attrs.name {
                        Some(name) => Some((name.clone(), attrs.clone())),
                        None => {
                            log::warn!("column override without a name is ignored");
                            None
                        }
                    },
                })
                .collect(),
        }
    }
}

/// Options recognized by a table.
///
/// Fixed once the table is built. Deserializing rejects unknown keys; extra
/// request payload belongs in [`post_data`](Self::post_data).
///
/// # Example
///
/// ```
/// use kingtable_lib::config::TableOptions;
///
/// let options = TableOptions::default()
///     .with_url("/api/people")
///     .with_results_per_page(50)
///     .with_min_search_chars(2);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TableOptions {
    /// Whether renderers should show the row number column.
    pub row_count: bool,
    /// Whether searching is offered at all.
    pub allow_search: bool,
    /// Minimum number of characters for a value to trigger a search.
    pub min_search_chars: usize,
    /// Debounce delay after the last keystroke.
    ///
    /// The table never waits on its own. Callers that feed a search box into
    /// [`KingTable::search`](crate::KingTable::search) wait this long after
    /// the last keystroke before calling it.
    #[serde(with = "duration_ms")]
    pub search_delay: Duration,
    /// Read and write page, size, search and sort in the URL query string.
    pub use_query_string: bool,
    /// Remember the page size in the persistent store.
    pub use_local_storage: bool,
    /// Query key for the search string.
    pub search_query_string: String,
    /// Query key for the page number.
    pub page_query_string: String,
    /// Query key for the page size.
    pub results_per_page_query_string: String,
    /// Query key for the sort (`"<column>:<asc|desc>"`).
    pub sort_query_string: String,
    /// Store key for the page size.
    pub results_per_page_storage_key: String,
    /// Initial page (1-based).
    pub page: usize,
    /// Initial page size.
    pub results_per_page: usize,
    /// Page sizes a user may pick from.
    pub results_per_page_select: Vec<usize>,
    /// Whether rows are split into pages.
    pub pagination_enabled: bool,
    /// Number of sample records used for schema inference.
    pub analyze_limit: usize,
    /// Search pattern mode.
    pub search_mode: SearchMode,
    /// Whether the full collection is held client side.
    pub fixed: bool,
    /// Initial search string.
    pub search: String,
    /// Initial sort column.
    pub order_by: Option<String>,
    /// Initial sort direction.
    pub sort_order: Option<SortOrder>,
    /// Explicit searchable fields; inferred from sample data when unset.
    pub search_properties: Option<Vec<String>>,
    /// Attributes applied to every column before any other default.
    pub column_default: ColumnAttributes,
    /// Explicit column overrides.
    pub columns: Option<ColumnOverrides>,
    /// Fetch endpoint.
    pub url: Option<String>,
    /// Extra payload merged into every fetch request.
    pub post_data: Map<String, Value>,
    /// Explicit identifier field.
    pub id_property: Option<String>,
    /// Suffix query keys with the table instance id so several tables can share a URL.
    pub multi_instance: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            row_count: true,
            allow_search: true,
            min_search_chars: 3,
            search_delay: Duration::from_millis(50),
            use_query_string: true,
            use_local_storage: true,
            search_query_string: "search".to_string(),
            page_query_string: "page".to_string(),
            results_per_page_query_string: "size".to_string(),
            sort_query_string: "sort".to_string(),
            results_per_page_storage_key: "kt-results-per-page".to_string(),
            page: 1,
            results_per_page: 30,
            results_per_page_select: vec![10, 30, 50, 100],
            pagination_enabled: true,
            analyze_limit: 1,
            search_mode: SearchMode::FullString,
            fixed: false,
            search: String::new(),
            order_by: None,
            sort_order: None,
            search_properties: None,
            column_default: ColumnAttributes::column_default(),
            columns: None,
            url: None,
            post_data: Map::new(),
            id_property: None,
            multi_instance: true,
        }
    }
}

impl TableOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::invalid("options", e.to_string()))
    }

    /// Sets the fetch endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the initial page.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Sets the initial page size.
    pub fn with_results_per_page(mut self, size: usize) -> Self {
        self.results_per_page = size;
        self
    }

    /// Sets the allowed page sizes.
    pub fn with_results_per_page_select(mut self, sizes: impl Into<Vec<usize>>) -> Self {
        self.results_per_page_select = sizes.into();
        self
    }

    /// Sets the minimum search length.
    pub fn with_min_search_chars(mut self, n: usize) -> Self {
        self.min_search_chars = n;
        self
    }

    /// Sets the search mode.
    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Sets the initial search string.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Enables or disables URL synchronization.
    pub fn use_query_string(mut self, enabled: bool) -> Self {
        self.use_query_string = enabled;
        self
    }

    /// Enables or disables persistent page size.
    pub fn use_local_storage(mut self, enabled: bool) -> Self {
        self.use_local_storage = enabled;
        self
    }

    /// Enables or disables per-instance query keys.
    pub fn multi_instance(mut self, enabled: bool) -> Self {
        self.multi_instance = enabled;
        self
    }

    /// Enables or disables pagination.
    pub fn pagination_enabled(mut self, enabled: bool) -> Self {
        self.pagination_enabled = enabled;
        self
    }

    /// Sets the number of records sampled for schema inference.
    pub fn with_analyze_limit(mut self, limit: usize) -> Self {
        self.analyze_limit = limit;
        self
    }

    /// Sets explicit column overrides.
    pub fn with_columns(mut self, columns: ColumnOverrides) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Sets the explicit searchable fields.
    pub fn with_search_properties<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_properties = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a key to the extra fetch payload.
    pub fn with_post_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.post_data.insert(key.into(), value.into());
        self
    }

    /// Sets the explicit identifier field.
    pub fn with_id_property(mut self, name: impl Into<String>) -> Self {
        self.id_property = Some(name.into());
        self
    }

    /// Sets the initial sort.
    pub fn with_sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some(column.into());
        self.sort_order = Some(order);
        self
    }

    /// Checks that numeric options are within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page == 0 {
            return Err(ConfigError::invalid("page", "must be at least 1"));
        }
        if self.results_per_page == 0 {
            return Err(ConfigError::invalid("resultsPerPage", "must be greater than 0"));
        }
        if !PaginationState::is_addressable(self.page, self.results_per_page) {
            return Err(ConfigError::invalid("page", "too large for the page size"));
        }
        if self.analyze_limit == 0 {
            return Err(ConfigError::invalid("analyzeLimit", "must be at least 1"));
        }
        if self.results_per_page_select.is_empty() {
            return Err(ConfigError::invalid("resultsPerPageSelect", "must not be empty"));
        }
        if self.results_per_page_select.contains(&0) {
            return Err(ConfigError::invalid(
                "resultsPerPageSelect",
                "page sizes must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Returns `true` if `size` is one of the selectable page sizes.
    pub fn is_allowed_page_size(&self, size: usize) -> bool {
        self.results_per_page_select.contains(&size)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
