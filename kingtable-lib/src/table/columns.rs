//! Column initialization and lookups

use std::sync::LazyLock;

use regex::Regex;
use regex::RegexBuilder;

use super::Inner;
use super::KingTable;
use super::TableState;
use crate::column::Column;
use crate::column::assemble;
use crate::column::sort_columns;
use crate::error::ConfigError;

static ID_PROPERTY: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    RegexBuilder::new(r"^_?id$|^_?guid$")
        .case_insensitive(true)
        .build()
});

impl Inner {
    /// Builds and sorts the columns from the held rows.
    ///
    /// Runs once per table, and only when there is at least one row.
    /// Returns `true` if the columns were built by this call.
    pub(super) fn initialize_columns(&self, state: &mut TableState) -> bool {
        if state.columns_initialized || !state.has_data() {
            return false;
        }
        let Some(data) = state.data.as_ref() else {
            return false;
        };
        let schema = self.inferencer.infer(data, self.options.analyze_limit);
        let mut columns = assemble(
            &schema,
            &self.options.column_default,
            &self.registry,
            self.options.columns.as_ref(),
        );
        sort_columns(&mut columns);
        log::debug!("table {} initialized {} columns", self.id, columns.len());

        state.columns_initialized = true;
        if !state.disposed {
            state.columns = Some(columns);
        }
        true
    }
}

impl KingTable {
    /// Builds the columns if there are rows and they were not built yet.
    ///
    /// Returns `true` if this call built them.
    pub fn initialize_columns(&self) -> bool {
        let mut state = self.inner.state();
        self.inner.initialize_columns(&mut state)
    }

    /// Returns a copy of the columns, sorted by position.
    ///
    /// Empty before the first rows arrive and after disposal.
    pub fn columns(&self) -> Vec<Column> {
        self.inner.state().columns.clone().unwrap_or_default()
    }

    /// Whether the columns have been built.
    pub fn columns_initialized(&self) -> bool {
        self.inner.state().columns_initialized
    }

    /// Returns the name of the field that identifies rows.
    ///
    /// The configured id property wins. Without columns it is `"id"`;
    /// otherwise the first column named `id`, `_id`, `guid` or `_guid` in
    /// any case.
    pub fn id_property(&self) -> Result<String, ConfigError> {
        if let Some(explicit) = &self.inner.options.id_property {
            return Ok(explicit.clone());
        }
        let state = self.inner.state();
        let columns = match &state.columns {
            Some(columns) if !columns.is_empty() => columns,
            _ => return Ok("id".to_string()),
        };
        let pattern = ID_PROPERTY
            .as_ref()
            .map_err(|e| ConfigError::invalid("idProperty", e.to_string()))?;
        columns
            .iter()
            .map(|c| &c.name)
            .find(|name| pattern.is_match(name))
            .cloned()
            .ok_or(ConfigError::AmbiguousIdProperty)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::KingTable;
    use crate::Row;
    use crate::column::ColumnAttributes;
    use crate::config::ColumnOverrides;
    use crate::config::TableOptions;
    use crate::error::ConfigError;

    fn rows(value: serde_json::Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_columns_built_once_from_data() {
        let table = KingTable::builder(TableOptions::default())
            .data(rows(json!([{"name": "Ada", "id": 1}])))
            .build()
            .unwrap();
        assert!(table.columns().is_empty());

        assert!(table.initialize_columns());
        assert!(!table.initialize_columns());

        let columns = table.columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].position, Some(0));
        assert!(columns.iter().find(|c| c.name == "id").unwrap().hidden);
    }

    #[test]
    fn test_no_columns_without_rows() {
        let table = KingTable::builder(TableOptions::default())
            .data(Vec::new())
            .build()
            .unwrap();
        assert!(!table.initialize_columns());
        assert!(!table.columns_initialized());
    }

    #[test]
    fn test_overrides_pin_columns() {
        let options = TableOptions::default().with_columns(ColumnOverrides::named([
            ("name", ColumnAttributes::default().display_name("Full name")),
            ("age", ColumnAttributes::default()),
        ]));
        let table = KingTable::builder(options)
            .data(rows(json!([{"age": 3, "name": "x", "city": "y"}])))
            .build()
            .unwrap();
        table.initialize_columns();

        let names: Vec<String> = table.columns().into_iter().map(|c| c.display_name).collect();
        assert_eq!(names, vec!["Full name", "age", "city"]);
    }

    #[test]
    fn test_id_property_guess() {
        let table = KingTable::builder(TableOptions::default())
            .data(rows(json!([{"name": "x", "_GUID": "abc"}])))
            .build()
            .unwrap();
        assert_eq!(table.id_property().unwrap(), "id");
        table.initialize_columns();
        assert_eq!(table.id_property().unwrap(), "_GUID");
    }

    #[test]
    fn test_id_property_ambiguous() {
        let table = KingTable::builder(TableOptions::default())
            .data(rows(json!([{"name": "x", "code": 1}])))
            .build()
            .unwrap();
        table.initialize_columns();
        assert_eq!(table.id_property(), Err(ConfigError::AmbiguousIdProperty));

        let explicit = KingTable::builder(TableOptions::default().with_id_property("code"))
            .data(rows(json!([{"code": 1}])))
            .build()
            .unwrap();
        assert_eq!(explicit.id_property().unwrap(), "code");
    }
}
