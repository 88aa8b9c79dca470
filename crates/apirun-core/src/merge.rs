//! Deep-merge semantics shared by request resolution and definition/step
//! extension (`get_parsed_request`, definition/step extension,
//! §8 Deep-merge property).

use serde_json::Value;

use crate::error::Result;
use crate::validator::parse_validator;

/// Recursive dictionary merge: if both sides hold a mapping at a key,
/// recurse; `null` values in the overlay are skipped (base preserved); any
/// other overlay value replaces the base.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut out = base_map.clone();
            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    continue;
                }
                match out.get(key) {
                    Some(base_value) if base_value.is_object() && overlay_value.is_object() => {
                        out.insert(key.clone(), deep_merge(base_value, overlay_value));
                    }
                    _ => {
                        out.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
            Value::Object(out)
        }
        _ => overlay.clone(),
    }
}

fn validator_key(check: &Value, comparator: &str) -> String {
    match check {
        Value::Object(_) | Value::Array(_) => serde_json::to_string(check).unwrap_or_default(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
    + "\u{0}"
    + comparator
}

/// Merge a definition's validators with a referencing step's validators,
/// keyed by `(check, comparator)`; the step's entries win on collision.
pub fn merge_validators(def_validators: &[Value], ref_validators: &[Value]) -> Result<Vec<Value>> {
    if def_validators.is_empty() {
        return Ok(ref_validators.to_vec());
    }
    if ref_validators.is_empty() {
        return Ok(def_validators.to_vec());
    }

    let mut merged: indexmap::IndexMap<String, Value> = indexmap::IndexMap::new();
    for raw in def_validators.iter().chain(ref_validators.iter()) {
        let canonical = parse_validator(raw)?;
        let key = validator_key(&canonical.check, &canonical.comparator);
        merged.insert(
            key,
            serde_json::json!({
                "check": canonical.check,
                "comparator": canonical.comparator,
                "expect": canonical.expect,
            }),
        );
    }
    Ok(merged.into_values().collect())
}

/// Merge a definition's extractors with a referencing step's extractors,
/// each a single-key `{var: expr}` mapping; the step's entries win on name
/// collision, and insertion order is preserved (definition entries first).
pub fn merge_extractors(def_extractors: &[Value], ref_extractors: &[Value]) -> Vec<Value> {
    if def_extractors.is_empty() {
        return ref_extractors.to_vec();
    }
    if ref_extractors.is_empty() {
        return def_extractors.to_vec();
    }

    let mut merged: indexmap::IndexMap<String, Value> = indexmap::IndexMap::new();
    for extractor in def_extractors.iter().chain(ref_extractors.iter()) {
        let Some(obj) = extractor.as_object() else {
            tracing::warn!(?extractor, "incorrect extractor, expected a single-key mapping");
            continue;
        };
        if obj.len() != 1 {
            tracing::warn!(?extractor, "incorrect extractor, expected a single-key mapping");
            continue;
        }
        let (var_name, expr) = obj.iter().next().expect("len == 1");
        merged.insert(var_name.clone(), expr.clone());
    }

    merged
        .into_iter()
        .map(|(name, expr)| serde_json::json!({ name: expr }))
        .collect()
}
