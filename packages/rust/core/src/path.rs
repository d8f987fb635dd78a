//! Dotted-path lookup into upstream JSON records.
//!
//! A path such as `assigned_to.name` or `custom_fields.0.value` walks mappings
//! by key and sequences by zero-based index. Any step that cannot be taken
//! yields the caller's default; nothing here panics on malformed input.

use serde_json::Value;

/// Resolve `path` against `root`. `None` stands for the default.
///
/// - `root` must be a mapping.
/// - A missing key, a non-numeric or out-of-range index, or a scalar with
///   segments left over ends the walk immediately.
/// - A `null` met along the way, or at the end, also resolves to `None`.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if !root.is_object() {
        return None;
    }

    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };

        if current.is_null() {
            return None;
        }
    }

    Some(current)
}

/// Resolve `path`, falling back to `default`.
pub fn resolve_or<'a>(root: &'a Value, path: &str, default: &'a Value) -> &'a Value {
    resolve(root, path).unwrap_or(default)
}

/// Render a resolved value as display text. `null` renders empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Resolve `path` and render it, empty when unreachable.
pub fn display_at(root: &Value, path: &str) -> String {
    resolve(root, path).map(display_value).unwrap_or_default()
}
