//! Column defaults by value type and by field name

use std::collections::HashMap;

use super::ColumnAttributes;

/// Column defaults looked up by value type and by field name.
///
/// Each table receives its own registry, so tables configured differently can
/// coexist. Type keys are matched in lowercase; name keys exactly.
///
/// # Example
///
/// ```
/// use kingtable_lib::column::{ColumnAttributes, DefaultRegistry};
///
/// let registry = DefaultRegistry::standard()
///     .with_type_default("currency", ColumnAttributes::default().format("0.00"))
///     .with_name_default("createdBy", ColumnAttributes::default().hidden(true));
///
/// assert!(registry.type_default("Currency").is_some());
/// assert!(registry.name_default("id").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultRegistry {
    by_type: HashMap<String, ColumnAttributes>,
    by_name: HashMap<String, ColumnAttributes>,
}

impl DefaultRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the stock registry: number and date formats, hidden `id` and `guid`.
    pub fn standard() -> Self {
        Self::new()
            .with_type_default("number", ColumnAttributes::default().format("{value}"))
            .with_type_default(
                "date",
                ColumnAttributes::default().format("dd/MM/yyyy hh:mm"),
            )
            .with_name_default("id", ColumnAttributes::of_kind("id").hidden(true))
            .with_name_default("guid", ColumnAttributes::of_kind("guid").hidden(true))
    }

    /// Adds or replaces the defaults for a value type.
    pub fn with_type_default(mut self, kind: impl AsRef<str>, attrs: ColumnAttributes) -> Self {
        self.by_type.insert(kind.as_ref().to_lowercase(), attrs);
        self
    }

    /// Adds or replaces the defaults for a field name.
    pub fn with_name_default(mut self, name: impl Into<String>, attrs: ColumnAttributes) -> Self {
        let name = name.into();
        let attrs = ColumnAttributes {
            name: Some(name.clone()),
            ..attrs
        };
        self.by_name.insert(name, attrs);
        self
    }

    /// Returns the defaults registered for a value type.
    pub fn type_default(&self, kind: &str) -> Option<&ColumnAttributes> {
        self.by_type.get(&kind.to_lowercase())
    }

    /// Returns the defaults registered for a field name.
    pub fn name_default(&self, name: &str) -> Option<&ColumnAttributes> {
        self.by_name.get(name)
    }
}
