use serde_json::Value;

/// Maximum number of times a string payload is re-parsed before giving up.
/// The backend has been observed to double-encode the plan body (a JSON
/// string containing another JSON string), so two unwraps recover it.
pub const MAX_UNWRAP_DEPTH: usize = 2;

/// Parse a possibly string-wrapped JSON value until an object comes out,
/// giving up after `max_unwraps` parse attempts.
///
/// Returns `None` when the value is neither an object nor a string that
/// eventually parses into one; callers substitute an explicit fallback
/// instead of propagating an error.
pub fn unwrap_nested(mut value: Value, max_unwraps: usize) -> Option<Value> {
    for _ in 0..=max_unwraps {
        match value {
            Value::Object(_) => return Some(value),
            Value::String(inner) => {
                value = serde_json::from_str(&inner).ok()?;
            }
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_object_passes_through() {
        let value = json!({"itinerary": []});
        assert_eq!(unwrap_nested(value.clone(), MAX_UNWRAP_DEPTH), Some(value));
    }

    #[test]
    fn single_encoded_string_is_unwrapped() {
        let inner = json!({"travel_tips": "pack light"});
        let wrapped = Value::String(inner.to_string());
        assert_eq!(unwrap_nested(wrapped, MAX_UNWRAP_DEPTH), Some(inner));
    }

    #[test]
    fn double_encoded_string_is_unwrapped() {
        let inner = json!({"estimated_costs": "$1200"});
        let once = Value::String(inner.to_string());
        let twice = Value::String(once.to_string());
        assert_eq!(unwrap_nested(twice, MAX_UNWRAP_DEPTH), Some(inner));
    }

    #[test]
    fn triple_encoded_string_exceeds_the_depth_limit() {
        let inner = json!({"a": 1});
        let mut wrapped = Value::String(inner.to_string());
        for _ in 0..2 {
            wrapped = Value::String(wrapped.to_string());
        }
        assert_eq!(unwrap_nested(wrapped, MAX_UNWRAP_DEPTH), None);
    }

    #[test]
    fn non_object_values_give_up() {
        assert_eq!(unwrap_nested(json!([1, 2, 3]), MAX_UNWRAP_DEPTH), None);
        assert_eq!(unwrap_nested(json!(42), MAX_UNWRAP_DEPTH), None);
        assert_eq!(
            unwrap_nested(Value::String("not json at all".to_string()), MAX_UNWRAP_DEPTH),
            None
        );
    }
}
