//! Data mapping between data-source payloads and component fields.
//!
//! Paths use dot segments with optional `[n]` indices: `users[0].address.city`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DataError;

/// One field mapping rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMapping {
    /// Field name at the leaf.
    pub field: String,
    /// Where to read in the source data.
    pub source_path: String,
    /// Where to write in the result.
    pub target_path: String,
    /// Value used when the source path does not resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

/// Target type for [`transform_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Convert to a string.
    String,
    /// Convert to a number.
    Number,
    /// Convert to a boolean.
    Boolean,
    /// Unknown kinds pass data through.
    #[serde(other)]
    Passthrough,
}

/// A transformation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformRule {
    /// Target type; `None` passes data through.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransformKind>,
}

/// How far past the end of an array a write may land; the gap is filled with
/// `null`.
pub const MAX_ARRAY_GAP: usize = 1024;

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['.', '[', ']']).filter(|s| !s.is_empty())
}

/// Every addressable path in a value.
///
/// Arrays contribute their own path plus the paths of their first element.
#[must_use]
pub fn extract_paths(data: &Value, prefix: &str) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(data, prefix, &mut paths);
    paths
}

fn collect_paths(data: &Value, prefix: &str, paths: &mut Vec<String>) {
    match data {
        Value::Null => {}
        Value::Array(items) => {
            if !prefix.is_empty() {
                paths.push(prefix.to_string());
            }
            if let Some(first) = items.first() {
                let first_path = format!("{prefix}[0]");
                paths.push(first_path.clone());
                collect_paths(first, &first_path, paths);
            }
        }
        Value::Object(fields) => {
            if !prefix.is_empty() && !fields.is_empty() {
                paths.push(prefix.to_string());
            }
            for (key, value) in fields {
                let current = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match value {
                    Value::Object(_) | Value::Array(_) => collect_paths(value, &current, paths),
                    _ => paths.push(current),
                }
            }
        }
        _ => {
            if !prefix.is_empty() {
                paths.push(prefix.to_string());
            }
        }
    }
}

/// Resolve a path. Returns `None` when any segment is missing.
#[must_use]
pub fn get_value_by_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(data, |current, key| match current {
        Value::Object(fields) => fields.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write a value at a path, creating intermediate objects or arrays (when the
/// next segment is an index).
///
/// # Errors
///
/// Returns [`DataError::Mapping`] for an empty path, when a non-index
/// segment addresses an existing array, or when an index lands more than
/// [`MAX_ARRAY_GAP`] past the end of its array. Scalars in the way are
/// replaced.
pub fn set_value_by_path(data: &mut Value, path: &str, value: Value) -> Result<(), DataError> {
    let keys: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = keys.split_last() else {
        return Err(DataError::Mapping("path cannot be empty".to_string()));
    };

    let mut current = data;
    for (i, key) in parents.iter().enumerate() {
        let next_is_index = keys
            .get(i + 1)
            .is_some_and(|k| k.parse::<usize>().is_ok());
        let fresh = || {
            if next_is_index {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            }
        };
        let slot = child_slot(current, key, path)?;
        if !(slot.is_object() || slot.is_array()) {
            *slot = fresh();
        }
        current = slot;
    }
    *child_slot(current, last, path)? = value;
    Ok(())
}

fn child_slot<'a>(
    current: &'a mut Value,
    key: &str,
    path: &str,
) -> Result<&'a mut Value, DataError> {
    match current {
        Value::Object(fields) => Ok(fields.entry(key.to_string()).or_insert(Value::Null)),
        Value::Array(items) => {
            let index: usize = key.parse().map_err(|_| {
                DataError::Mapping(format!("segment '{key}' of '{path}' is not an array index"))
            })?;
            if index >= items.len() {
                if index - items.len() > MAX_ARRAY_GAP {
                    return Err(DataError::Mapping(format!(
                        "index {index} in '{path}' is more than {MAX_ARRAY_GAP} past the end \
                         of an array of length {}",
                        items.len()
                    )));
                }
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        _ => Err(DataError::Mapping(format!(
            "segment '{key}' of '{path}' is not inside a container"
        ))),
    }
}

/// Derive mapping rules by matching a target structure against source data.
///
/// Nested objects recurse; for arrays the first elements are matched. Target
/// keys missing from the source get a `null` default.
#[must_use]
pub fn generate_mapping(source: &Value, target: &Value) -> Vec<DataMapping> {
    let mut mappings = Vec::new();
    collect_mappings(source, target, "", &mut mappings);
    mappings
}

fn collect_mappings(source: &Value, target: &Value, prefix: &str, out: &mut Vec<DataMapping>) {
    match (source, target) {
        (Value::Object(source_fields), Value::Object(target_fields)) => {
            for (key, target_value) in target_fields {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match source_fields.get(key) {
                    Some(source_value) if source_value.is_object() && target_value.is_object() => {
                        collect_mappings(source_value, target_value, &path, out);
                    }
                    found => out.push(DataMapping {
                        field: key.clone(),
                        source_path: path.clone(),
                        target_path: path,
                        default_value: found.is_none().then_some(Value::Null),
                    }),
                }
            }
        }
        (Value::Array(source_items), Value::Array(target_items)) => {
            if let (Some(first_source), Some(first_target)) =
                (source_items.first(), target_items.first())
            {
                collect_mappings(first_source, first_target, prefix, out);
            }
        }
        _ => {}
    }
}

/// Build a new object by reading each rule's source path and writing its
/// target path. Unresolved paths use the rule's default, then `null`.
///
/// # Errors
///
/// Returns [`DataError::Mapping`] if a target path cannot be written.
pub fn apply_mapping(data: &Value, mappings: &[DataMapping]) -> Result<Value, DataError> {
    let mut result = Value::Object(Map::new());
    for mapping in mappings {
        let value = get_value_by_path(data, &mapping.source_path)
            .or(mapping.default_value.as_ref())
            .cloned()
            .unwrap_or(Value::Null);
        set_value_by_path(&mut result, &mapping.target_path, value)?;
    }
    Ok(result)
}

/// Coerce a value according to a rule. Values that cannot be coerced to a
/// number are returned unchanged.
#[must_use]
pub fn transform_data(data: &Value, rule: &TransformRule) -> Value {
    match rule.kind {
        Some(TransformKind::String) => match data {
            Value::String(_) => data.clone(),
            other => Value::String(other.to_string()),
        },
        Some(TransformKind::Number) => {
            let number = data
                .as_f64()
                .or_else(|| data.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
                .and_then(serde_json::Number::from_f64);
            number.map_or_else(|| data.clone(), Value::Number)
        }
        Some(TransformKind::Boolean) => Value::Bool(data.as_bool().unwrap_or(false)),
        Some(TransformKind::Passthrough) | None => data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_paths() {
        let data = json!({
            "users": [{ "name": "Ann", "tags": ["a"] }],
            "meta": { "total": 1 },
            "empty": null
        });
        let paths = extract_paths(&data, "");
        for expected in [
            "users",
            "users[0]",
            "users[0].name",
            "users[0].tags",
            "users[0].tags[0]",
            "meta",
            "meta.total",
            "empty",
        ] {
            assert!(paths.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn test_get_value_by_path() {
        let data = json!({ "users": [{ "address": { "city": "Oslo" } }] });
        assert_eq!(
            get_value_by_path(&data, "users[0].address.city"),
            Some(&json!("Oslo"))
        );
        assert_eq!(get_value_by_path(&data, "users.0.address.city"), Some(&json!("Oslo")));
        assert_eq!(get_value_by_path(&data, "users[3]"), None);
        assert_eq!(get_value_by_path(&data, "users[0].zip"), None);
    }

    #[test]
    fn test_set_value_by_path_creates_containers() {
        let mut data = json!({});
        set_value_by_path(&mut data, "a.b", json!(1)).expect("set");
        set_value_by_path(&mut data, "list[1].name", json!("x")).expect("set");
        assert_eq!(data, json!({ "a": { "b": 1 }, "list": [null, { "name": "x" }] }));
        assert!(set_value_by_path(&mut data, "", json!(1)).is_err());
    }

    #[test]
    fn test_set_value_by_path_bounds_array_growth() {
        let mut data = json!({ "list": [1] });
        let result = set_value_by_path(&mut data, "list[18446744073709551615]", json!(2));
        assert!(matches!(result, Err(DataError::Mapping(_))));
        assert!(set_value_by_path(&mut data, "fresh[4000000000].x", json!(2)).is_err());
        assert_eq!(data, json!({ "list": [1], "fresh": [] }));

        set_value_by_path(&mut data, "list[3]", json!(4)).expect("small gap");
        assert_eq!(data["list"], json!([1, null, null, 4]));
    }

    #[test]
    fn test_apply_mapping_rejects_huge_target_index() {
        let mapping = DataMapping {
            field: "a".to_string(),
            source_path: "a".to_string(),
            target_path: "list[18446744073709551615]".to_string(),
            default_value: None,
        };
        let result = apply_mapping(&json!({ "a": 1 }), &[mapping]);
        assert!(matches!(result, Err(DataError::Mapping(_))));
    }

    #[test]
    fn test_generate_and_apply_mapping() {
        let source = json!({ "name": "Ann", "address": { "city": "Oslo" } });
        let target = json!({ "name": "", "address": { "city": "", "zip": "" } });

        let mappings = generate_mapping(&source, &target);
        assert_eq!(mappings.len(), 3);
        let zip = mappings
            .iter()
            .find(|m| m.field == "zip")
            .expect("zip mapping");
        assert_eq!(zip.source_path, "address.zip");
        assert_eq!(zip.default_value, Some(Value::Null));

        let mapped = apply_mapping(&source, &mappings).expect("apply");
        assert_eq!(
            mapped,
            json!({ "name": "Ann", "address": { "city": "Oslo", "zip": null } })
        );
    }

    #[test]
    fn test_mapping_json_shape() {
        let mapping: DataMapping = serde_json::from_value(json!({
            "field": "title",
            "sourcePath": "post.title",
            "targetPath": "heading",
            "defaultValue": "Untitled"
        }))
        .expect("mapping");
        let result = apply_mapping(&json!({}), &[mapping]).expect("apply");
        assert_eq!(result, json!({ "heading": "Untitled" }));
    }

    #[test]
    fn test_transform_data() {
        let number = TransformRule {
            kind: Some(TransformKind::Number),
        };
        assert_eq!(transform_data(&json!("4.5"), &number), json!(4.5));
        assert_eq!(transform_data(&json!("abc"), &number), json!("abc"));

        let string = TransformRule {
            kind: Some(TransformKind::String),
        };
        assert_eq!(transform_data(&json!(12), &string), json!("12"));
        assert_eq!(transform_data(&json!("as-is"), &string), json!("as-is"));

        let boolean: TransformRule =
            serde_json::from_value(json!({ "type": "boolean" })).expect("rule");
        assert_eq!(transform_data(&json!("yes"), &boolean), json!(false));
        assert_eq!(transform_data(&json!(true), &boolean), json!(true));

        let unknown: TransformRule =
            serde_json::from_value(json!({ "type": "date" })).expect("rule");
        assert_eq!(transform_data(&json!(1), &unknown), json!(1));
    }
}
