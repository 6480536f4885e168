//! Column assembly from schema, defaults and overrides

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::Column;
use super::ColumnAttributes;
use super::ColumnId;
use super::DefaultRegistry;
use crate::config::ColumnOverrides;
use crate::schema::ObjectSchema;
use crate::sort::compare_text;

static NAME_PLACEHOLDER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"##\s*Name\s*##"));

/// Type looked up in the registry when inference found nothing.
const FALLBACK_KIND: &str = "string";

/// Builds one column per inferred field.
///
/// Attributes are layered with later sets winning: `column_default`, the
/// registry's type default (by lowercased inferred type), the registry's name
/// default (by exact field name), the inferred attributes, and finally the
/// user override for that field. When overrides are given, overridden
/// columns without an explicit position take their declaration index.
///
/// Columns come back in schema order; call [`sort_columns`] to order them.
pub fn assemble(
    schema: &ObjectSchema,
    column_default: &ColumnAttributes,
    registry: &DefaultRegistry,
    overrides: Option<&ColumnOverrides>,
) -> Vec<Column> {
    let overrides: HashMap<String, (usize, ColumnAttributes)> = overrides
        .map(|o| {
            o.normalized()
                .into_iter()
                .enumerate()
                .map(|(index, (name, attrs))| (name, (index, attrs)))
                .collect()
        })
        .unwrap_or_default();

    schema
        .iter()
        .map(|(field, inferred)| {
            let mut attrs = column_default.clone();

            let kind = inferred.kind.as_deref().unwrap_or(FALLBACK_KIND);
            if let Some(by_type) = registry.type_default(kind) {
                attrs.layer(by_type);
            }
            if let Some(by_name) = registry.name_default(field) {
                attrs.layer(by_name);
            }
            attrs.layer(&inferred.to_attributes());

            if let Some((index, user)) = overrides.get(field) {
                attrs.layer(user);
                if user.position.is_none() {
                    attrs.position = Some(*index);
                }
            }

            build(field, attrs)
        })
        .collect()
}

fn build(field: &str, attrs: ColumnAttributes) -> Column {
    let template = attrs
        .template
        .map(|t| substitute_name(&t, field))
        .unwrap_or_else(|| format!("{{{{{field}}}}}"));

    Column {
        cid: ColumnId::new(),
        name: field.to_string(),
        kind: attrs.kind.unwrap_or_else(|| FALLBACK_KIND.to_string()),
        display_name: attrs.display_name.unwrap_or_else(|| field.to_string()),
        position: attrs.position,
        sortable: attrs.sortable.unwrap_or(true),
        groupable: attrs.groupable.unwrap_or(true),
        resizable: attrs.resizable.unwrap_or(true),
        allow_search: attrs.allow_search.unwrap_or(true),
        template,
        hidden: attrs.hidden.unwrap_or(false),
        secret: attrs.secret.unwrap_or(false),
        format: attrs.format,
    }
}

/// Replaces the first `##Name##` placeholder with `{{field}}`.
fn substitute_name(template: &str, field: &str) -> String {
    match &*NAME_PLACEHOLDER {
        Ok(re) => re
            .replacen(template, 1, regex::NoExpand(&format!("{{{{{field}}}}}")))
            .into_owned(),
        Err(_) => template.to_string(),
    }
}

/// Orders columns and renumbers their positions from 0.
///
/// Columns with a position come first, by position. The rest follow by
/// display name with [`compare_text`], which folds case but does not apply
/// locale collation rules.
pub fn sort_columns(columns: &mut [Column]) {
    columns.sort_by(|a, b| match (a.position, b.position) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_text(&a.display_name, &b.display_name),
    });
    for (index, column) in columns.iter_mut().enumerate() {
        column.position = Some(index);
    }
}
