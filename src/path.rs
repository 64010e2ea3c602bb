// 🧭 Path Resolver - safe dotted-path lookups into Notion pages
// Pages are schema-loose (optional formulas, empty relations), so every lookup
// tolerates absence and never fails.

use serde_json::Value;

/// Text written into a cell when a path resolves to nothing (or to JSON null).
///
/// Downstream sheets already filter on this literal, so it stays as-is.
pub const MISSING_CELL: &str = "None";

/// Resolve a dotted path (`properties.ID.unique_id.number`) against a JSON value.
///
/// A segment that parses as a non-negative integer indexes into arrays; against
/// an object it is used as a plain key. Returns `None` as soon as a segment
/// does not apply (missing key, index out of range, scalar in the way).
///
/// ```
/// use expense_sync::resolve;
/// use serde_json::json;
///
/// let data = json!({"a": {"b": [{"c": 1}]}});
/// assert_eq!(resolve(&data, "a.b.0.c"), Some(&json!(1)));
/// assert_eq!(resolve(&json!({"a": 1}), "a.b.0"), None);
/// ```
pub fn resolve<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;

    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }

    Some(current)
}

/// Render a resolved value as sheet cell text.
///
/// Strings are written unquoted, numbers in their JSON form, `None`/null as
/// [`MISSING_CELL`], checkboxes as `True`/`False`. Arrays and objects fall back
/// to compact JSON.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_CELL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
