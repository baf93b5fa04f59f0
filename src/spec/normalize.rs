use super::error::SpecError;
use serde_yaml::value::{Mapping, TaggedValue};
use serde_yaml::Value;

/// Return a copy of `value` in which every mapping key is a string.
///
/// YAML allows keys such as `200:` or `true:` that JSON cannot represent.
/// Response codes are the usual culprit in OpenAPI documents. Keys are
/// converted at every depth, including mappings nested inside sequences.
/// Scalars pass through untouched.
pub fn normalize_keys(value: &Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (k, v) in map {
                out.insert(Value::String(key_text(k)), normalize_keys(v));
            }
            Value::Mapping(out)
        }
        Value::Sequence(items) => Value::Sequence(items.iter().map(normalize_keys).collect()),
        Value::Tagged(tagged) => Value::Tagged(Box::new(TaggedValue {
            tag: tagged.tag.clone(),
            value: normalize_keys(&tagged.value),
        })),
        scalar => scalar.clone(),
    }
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Tagged(tagged) => key_text(&tagged.value),
        complex @ (Value::Sequence(_) | Value::Mapping(_)) => {
            let normalized = normalize_keys(complex);
            serde_json::to_string(&normalized)
                .or_else(|_| serde_yaml::to_string(&normalized).map(|s| s.trim_end().to_string()))
                .unwrap_or_default()
        }
    }
}

/// Convert a key-normalized YAML tree into JSON.
///
/// # Errors
///
/// Fails when the tree still carries keys JSON cannot express, which
/// [`normalize_keys`] rules out.
pub fn to_json(value: &Value) -> Result<serde_json::Value, SpecError> {
    serde_json::to_value(value)
        .map_err(|e| SpecError::Validation(format!("document is not JSON compatible: {e}")))
}
