//! Shaping stored documents into API JSON.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Serializes a document and rewrites extended-JSON object ids
/// (`{"$oid": "..."}`) into plain hex strings.
pub fn to_api_value<T: Serialize>(value: &T) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(value)?;
    normalize_object_ids(&mut value);
    Ok(value)
}

pub fn normalize_object_ids(value: &mut Value) {
    let replacement = match value {
        Value::Object(map) if map.len() == 1 => match map.get("$oid") {
            Some(Value::String(hex)) => Some(Value::String(hex.clone())),
            _ => None,
        },
        _ => None,
    };
    if let Some(replacement) = replacement {
        *value = replacement;
        return;
    }
    match value {
        Value::Object(map) => map.values_mut().for_each(normalize_object_ids),
        Value::Array(items) => items.iter_mut().for_each(normalize_object_ids),
        _ => {}
    }
}

/// Resolves id references found at `path` using `lookup`.
///
/// Arrays met along the path are traversed element by element, so
/// `["attendees", "user"]` resolves every attendee. Ids missing from the
/// lookup become `null`.
pub fn populate(value: &mut Value, path: &[&str], lookup: &HashMap<String, Value>) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(|item| populate(item, path, lookup)),
        Value::Object(map) => {
            let Some((head, rest)) = path.split_first() else {
                return;
            };
            let Some(child) = map.get_mut(*head) else {
                return;
            };
            if !rest.is_empty() {
                populate(child, rest, lookup);
                return;
            }
            let resolved = match child {
                Value::String(id) => Some(lookup.get(id.as_str()).cloned().unwrap_or(Value::Null)),
                _ => None,
            };
            if let Some(resolved) = resolved {
                *child = resolved;
            }
        }
        _ => {}
    }
}

/// Drops `key` from an object, or from every object of an array.
pub fn strip(value: &mut Value, key: &str) {
    match value {
        Value::Object(map) => {
            map.remove(key);
        }
        Value::Array(items) => items.iter_mut().for_each(|item| strip(item, key)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use serde_json::json;

    #[derive(Serialize)]
    struct Doc {
        #[serde(rename = "_id")]
        id: ObjectId,
        owner: ObjectId,
        tags: Vec<String>,
    }

    #[test]
    fn test_object_ids_become_strings() {
        let id = ObjectId::new();
        let owner = ObjectId::new();
        let value = to_api_value(&Doc { id, owner, tags: vec!["a".into()] }).unwrap();
        assert_eq!(value["_id"], json!(id.to_hex()));
        assert_eq!(value["owner"], json!(owner.to_hex()));
        assert_eq!(value["tags"], json!(["a"]));
    }

    #[test]
    fn test_populate_nested_arrays() {
        let mut value = json!({
            "organizer": "u1",
            "attendees": [{"user": "u1", "status": "registered"}, {"user": "u9"}]
        });
        let lookup = HashMap::from([("u1".to_string(), json!({"_id": "u1", "firstName": "Amina"}))]);
        populate(&mut value, &["organizer"], &lookup);
        populate(&mut value, &["attendees", "user"], &lookup);
        assert_eq!(value["organizer"]["firstName"], "Amina");
        assert_eq!(value["attendees"][0]["user"]["_id"], "u1");
        assert!(value["attendees"][1]["user"].is_null());
    }

    #[test]
    fn test_strip_from_list() {
        let mut value = json!([{"a": 1, "applications": []}, {"a": 2}]);
        strip(&mut value, "applications");
        assert_eq!(value, json!([{"a": 1}, {"a": 2}]));
    }
}
