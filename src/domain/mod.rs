//! Core data types shared across the crate
//!
//! Reference data arrives as JSON arrays of row objects whose shape is
//! defined entirely by the backend; there is no compile-time schema. A row
//! is therefore an opaque field-name → value map, and lookups use the loose
//! equality the backend's mixed string/number columns require.

use serde_json::{Map, Value};

use crate::error::{RefdataError, Result};

/// One reference record: an opaque mapping of column name to value
pub type Row = Map<String, Value>;

/// Notification fired when a loader's selection changes
#[derive(Debug, Clone)]
pub struct SelectionEvent {
    /// Name of the loader that fired the event
    pub loader: String,

    /// The newly selected row, None when the selection was cleared
    pub item: Option<Row>,
}

/// Validate that a response payload is a collection of row objects.
///
/// Every loader applies this single policy; a non-array payload or an array
/// with non-object elements is a `Shape` error and is never retried.
pub fn rows_from(payload: Value) -> Result<Vec<Row>> {
    match payload {
        Value::Array(values) => values
            .into_iter()
            .map(|v| match v {
                Value::Object(row) => Ok(row),
                other => Err(RefdataError::Shape(format!(
                    "expected row object, got {}",
                    type_name(&other)
                ))),
            })
            .collect(),
        other => Err(RefdataError::Shape(format!(
            "expected array of rows, got {}",
            type_name(&other)
        ))),
    }
}

/// Render a scalar value for comparison or grouping keys.
///
/// Strings pass through, numbers and booleans render in their canonical
/// form. Null and composite values have no scalar rendering.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Loose equality between two field values: numeric 5 matches string "5".
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return !a.is_null();
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => return x == y,
        _ => {}
    }
    // Cross-type: compare scalar renderings, so 5 == "5"
    match (numeric_string(a), numeric_string(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (scalar_string(a), scalar_string(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Field accessor that treats a missing field and an explicit null alike
pub fn field<'a>(row: &'a Row, key: &str) -> Option<&'a Value> {
    row.get(key).filter(|v| !v.is_null())
}

// Canonical numeric rendering so "5", "5.0" and 5 compare equal
fn numeric_string(value: &Value) -> Option<String> {
    let n: f64 = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Some(if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_rows_from_accepts_array_of_objects() {
        let rows = rows_from(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], json!(1));
    }

    #[test]
    fn test_rows_from_rejects_non_array() {
        let err = rows_from(json!({"id": 1})).unwrap_err();
        assert!(matches!(err, RefdataError::Shape(_)));
        assert!(err.to_string().contains("object"));
    }

    #[test]
    fn test_rows_from_rejects_scalar_elements() {
        let err = rows_from(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, RefdataError::Shape(_)));
    }

    #[test]
    fn test_loose_eq_numeric_vs_string() {
        assert!(loose_eq(&json!(5), &json!("5")));
        assert!(loose_eq(&json!("5"), &json!(5)));
        assert!(loose_eq(&json!(5.0), &json!("5")));
        assert!(!loose_eq(&json!(5), &json!("6")));
    }

    #[test]
    fn test_loose_eq_strings() {
        assert!(loose_eq(&json!("abc"), &json!("abc")));
        assert!(!loose_eq(&json!("abc"), &json!("ABC")));
    }

    #[test]
    fn test_loose_eq_null_never_matches() {
        assert!(!loose_eq(&Value::Null, &Value::Null));
        assert!(!loose_eq(&Value::Null, &json!("")));
    }

    #[test]
    fn test_field_skips_null() {
        let r = row(json!({"id": 1, "nombre": null}));
        assert!(field(&r, "id").is_some());
        assert!(field(&r, "nombre").is_none());
        assert!(field(&r, "missing").is_none());
    }

    #[test]
    fn test_scalar_string() {
        assert_eq!(scalar_string(&json!(42)), Some("42".to_string()));
        assert_eq!(scalar_string(&json!("x")), Some("x".to_string()));
        assert_eq!(scalar_string(&Value::Null), None);
    }
}
