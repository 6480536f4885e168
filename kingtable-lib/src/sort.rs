//! Client-side ordering of rows and display names

use std::cmp::Ordering;

use serde_json::Value;

use crate::Row;
use crate::config::SortOrder;

/// Compares two strings case-insensitively first, falling back to the exact
/// text so the order is total.
///
/// This approximates locale-aware collation with Unicode lowercase folding.
/// Letters compare by code point once folded, so accented letters sort after
/// the unaccented Latin alphabet (`"zebra" < "éclair"`).
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Compares two field values.
///
/// Numbers compare numerically, strings with [`compare_text`], booleans with
/// `false < true`. Missing and null values sort after everything else; values
/// of different kinds are grouped by kind.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => compare_text(x, y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => kind_rank(a).cmp(&kind_rank(b)),
        },
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

/// Sorts rows in place by one field. The sort is stable.
pub fn sort_rows(rows: &mut [Row], field: &str, order: SortOrder) {
    rows.sort_by(|a, b| {
        let ordering = compare_values(a.get(field), b.get(field));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}
