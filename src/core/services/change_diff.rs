use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Largest magnitude below which every integral `f64` is exact (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Serialize `value` with object keys sorted at every depth.
///
/// Two values that are structurally equal produce byte-identical output,
/// whatever order their object keys were inserted in.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Number(n) => match n.as_f64() {
            // 1.0 and 1 are the same number.
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => {
                out.push_str(&(f as i64).to_string())
            }
            _ => out.push_str(&n.to_string()),
        },
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Top-level keys whose values differ between two snapshots.
///
/// - A key present on only one side counts as changed
/// - Values are compared by their canonical serialization, so nested
///   objects with the same content in a different key order are equal
/// - Absent snapshots behave as empty ones
///
/// Results are sorted alphabetically.
pub fn changed_fields(
    previous: Option<&Map<String, Value>>,
    next: Option<&Map<String, Value>>,
) -> Vec<String> {
    let empty = Map::new();
    let previous = previous.unwrap_or(&empty);
    let next = next.unwrap_or(&empty);

    let all_keys: BTreeSet<&String> = previous.keys().chain(next.keys()).collect();

    all_keys
        .into_iter()
        .filter(|key| {
            let before = previous.get(*key).map(canonical_json);
            let after = next.get(*key).map(canonical_json);
            before != after
        })
        .cloned()
        .collect()
}
