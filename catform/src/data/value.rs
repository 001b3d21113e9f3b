use serde_json::Value;

/// Normalize a raw value into the list of instances a repeating field renders.
///
/// - `Null` becomes a single null instance (the empty placeholder)
/// - a scalar or object becomes a one-element list containing it
/// - an empty list becomes a single null instance
/// - any other list is used as-is
///
/// The result is never empty, so a repeating field always renders at least
/// one instance.
pub fn normalize_repeating_value(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => vec![Value::Null],
        Value::Array(items) if items.is_empty() => vec![Value::Null],
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Render a scalar value as display text.
///
/// Null shows as an empty string. Strings show their content without
/// quoting; other values fall back to their JSON form.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
