//! Identifier extraction from arbitrarily shaped results

use super::types::QueryResult;
use serde_json::Value;

/// Field the generated queries alias `elementId(..)` to.
pub const DEFAULT_ID_FIELD: &str = "_id";

/// Collect every value stored under `field`, anywhere in `result`.
///
/// Depth-first, outer before inner: an object's own identifier is listed
/// before identifiers nested in its values. Duplicates are kept in
/// discovery order. A list stored under `field` contributes its scalar
/// elements in order. An absent result yields an empty list.
pub fn extract_ids(result: Option<&QueryResult>, field: &str) -> Vec<String> {
    let mut ids = Vec::new();
    match result {
        Some(QueryResult::Rows(rows)) => {
            for row in rows {
                collect(row, field, &mut ids);
            }
        }
        Some(QueryResult::Single(value)) => collect(value, field, &mut ids),
        None => {}
    }
    ids
}

fn collect(value: &Value, field: &str, ids: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            match map.get(field) {
                Some(Value::Array(items)) => ids.extend(items.iter().filter_map(id_text)),
                Some(value) => ids.extend(id_text(value)),
                None => {}
            }
            for (key, child) in map {
                if key != field {
                    collect(child, field, ids);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, field, ids);
            }
        }
        _ => {}
    }
}

/// Scalar identifiers only; null and structured values are skipped.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
