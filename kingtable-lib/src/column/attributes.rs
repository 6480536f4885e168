//! Partial column attributes used for layering defaults

use serde::Deserialize;
use serde::Serialize;

/// A partial set of column attributes.
///
/// Every field is optional; layering one set over another replaces only the
/// fields that are present. Column defaults, type and name registries,
/// inferred schema and user overrides are all expressed this way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnAttributes {
    /// Field name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Value type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Header text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Explicit position; columns without one fall back to display name order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groupable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,
    /// Whether the column takes part in search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_search: Option<bool>,
    /// Cell template; `##Name##` is replaced with `{{field}}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<bool>,
    /// Display format hint for renderers (e.g. a date pattern).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ColumnAttributes {
    /// The attributes every column starts from unless configured otherwise.
    pub fn column_default() -> Self {
        Self {
            name: None,
            kind: Some("Text".to_string()),
            display_name: None,
            position: None,
            sortable: Some(true),
            groupable: Some(true),
            resizable: Some(true),
            allow_search: Some(true),
            template: Some("##Name##".to_string()),
            hidden: Some(false),
            secret: Some(false),
            format: None,
        }
    }

    /// Attributes that only set the value type.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    /// Sets the display name.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the explicit position.
    pub fn position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the hidden flag.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Sets whether the column takes part in search.
    pub fn allow_search(mut self, allow: bool) -> Self {
        self.allow_search = Some(allow);
        self
    }

    /// Sets the display format hint.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Layers `other` on top of `self`: present fields in `other` win.
    pub fn layer(&mut self, other: &ColumnAttributes) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if let Some(value) = value {
                *slot = Some(value.clone());
            }
        }

        take(&mut self.name, &other.name);
        take(&mut self.kind, &other.kind);
        take(&mut self.display_name, &other.display_name);
        take(&mut self.position, &other.position);
        take(&mut self.sortable, &other.sortable);
        take(&mut self.groupable, &other.groupable);
        take(&mut self.resizable, &other.resizable);
        take(&mut self.allow_search, &other.allow_search);
        take(&mut self.template, &other.template);
        take(&mut self.hidden, &other.hidden);
        take(&mut self.secret, &other.secret);
        take(&mut self.format, &other.format);
    }
}
