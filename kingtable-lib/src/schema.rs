//! Field type inference from sample records

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::Row;
use crate::column::ColumnAttributes;

/// Inferred description of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Value type (`"string"`, `"number"`, `"boolean"`, `"date"`, `"array"`, `"object"`).
    ///
    /// `None` when every sampled value was null.
    pub kind: Option<String>,
    /// Whether a null value was seen in the sample.
    pub nullable: bool,
}

impl FieldSchema {
    /// Converts the inferred facts into column attributes.
    pub fn to_attributes(&self) -> ColumnAttributes {
        ColumnAttributes {
            kind: self.kind.clone(),
            ..Default::default()
        }
    }
}

/// Inferred fields of a record, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldSchema)>,
}

impl ObjectSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, or replaces it if already present.
    pub fn insert(&mut self, name: impl Into<String>, field: FieldSchema) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = field,
            None => self.fields.push((name, field)),
        }
    }

    /// Returns the schema of a field.
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Iterates over `(name, schema)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field was found.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Derives a field → type mapping from sample records.
///
/// Called synchronously by the table, at most once per table for columns and
/// once for the searchable field guess. Implementations must not keep the rows.
pub trait SchemaInferencer: Send + Sync {
    /// Infers the schema from up to `limit` leading rows.
    fn infer(&self, rows: &[Row], limit: usize) -> ObjectSchema;

    /// Guesses which fields of `row` are worth searching.
    fn searchable_properties(&self, row: &Row) -> Vec<String>;
}

/// Default inferencer that reads JSON value kinds.
///
/// Strings that parse as RFC 3339 timestamps or ISO dates are typed `"date"`.
/// Text and numbers are searchable; dates, booleans and nested values are not.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaInferencer;

impl JsonSchemaInferencer {
    /// Creates the inferencer.
    pub fn new() -> Self {
        Self
    }

    fn kind_of(value: &Value) -> Option<&'static str> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some("boolean"),
            Value::Number(_) => Some("number"),
            Value::String(s) if looks_like_date(s) => Some("date"),
            Value::String(_) => Some("string"),
            Value::Array(_) => Some("array"),
            Value::Object(_) => Some("object"),
        }
    }
}

impl SchemaInferencer for JsonSchemaInferencer {
    fn infer(&self, rows: &[Row], limit: usize) -> ObjectSchema {
        let mut schema = ObjectSchema::new();
        for row in rows.iter().take(limit.max(1)) {
            for (name, value) in row {
                let kind = Self::kind_of(value);
                let entry = schema.get(name).cloned().unwrap_or(FieldSchema {
                    kind: None,
                    nullable: false,
                });
                schema.insert(
                    name.clone(),
                    FieldSchema {
                        kind: entry.kind.or_else(|| kind.map(str::to_string)),
                        nullable: entry.nullable || value.is_null(),
                    },
                );
            }
        }
        schema
    }

    fn searchable_properties(&self, row: &Row) -> Vec<String> {
        row.iter()
            .filter(|(_, value)| matches!(Self::kind_of(value), Some("string") | Some("number")))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

fn looks_like_date(s: &str) -> bool {
    let s = s.trim();
    // Cheap pre-check before trying the parsers.
    if s.len() < 10 || !s.as_bytes()[0].is_ascii_digit() {
        return false;
    }
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_infer_value_kinds() {
        let sample = rows(json!([{
            "id": 1,
            "name": "Ada",
            "active": true,
            "born": "1815-12-10",
            "updated": "2024-01-02T03:04:05Z",
            "tags": ["x"],
            "address": {"city": "London"}
        }]));
        let schema = JsonSchemaInferencer.infer(&sample, 1);

        let kind = |name: &str| schema.get(name).and_then(|f| f.kind.clone());
        assert_eq!(kind("id").as_deref(), Some("number"));
        assert_eq!(kind("name").as_deref(), Some("string"));
        assert_eq!(kind("active").as_deref(), Some("boolean"));
        assert_eq!(kind("born").as_deref(), Some("date"));
        assert_eq!(kind("updated").as_deref(), Some("date"));
        assert_eq!(kind("tags").as_deref(), Some("array"));
        assert_eq!(kind("address").as_deref(), Some("object"));
    }

    #[test]
    fn test_null_kind_resolved_by_later_sample() {
        let sample = rows(json!([{"note": null}, {"note": "hello", "extra": 2}]));

        let one = JsonSchemaInferencer.infer(&sample, 1);
        assert_eq!(one.get("note").unwrap().kind, None);
        assert!(one.get("extra").is_none());

        let two = JsonSchemaInferencer.infer(&sample, 2);
        let note = two.get("note").unwrap();
        assert_eq!(note.kind.as_deref(), Some("string"));
        assert!(note.nullable);
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn test_searchable_properties() {
        let sample = rows(json!([{"id": 7, "name": "Ada", "born": "1815-12-10", "active": true}]));
        let mut fields = JsonSchemaInferencer.searchable_properties(&sample[0]);
        fields.sort();
        assert_eq!(fields, vec!["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_phone_number_is_not_a_date() {
        assert!(!looks_like_date("555-1234"));
        assert!(!looks_like_date("2024-13-45"));
        assert!(looks_like_date("2024-02-29"));
    }
}
