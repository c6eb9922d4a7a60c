//! Removal of zero-valued fields from a marshalled object

use serde_json::Value as JsonValue;

/// Remove the top-level `status` and every zero-valued field.
///
/// Children are pruned before their parent is checked, so a map or list
/// that only held zero values disappears as well. Pruning is idempotent.
pub fn prune(value: &mut JsonValue) {
    if let JsonValue::Object(map) = value {
        map.remove("status");
    }
    prune_children(value);
}

fn prune_children(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            for child in map.values_mut() {
                prune_children(child);
            }
            map.retain(|_, child| !is_zero(child));
        }
        // list positions are not preserved
        JsonValue::Array(items) => {
            for item in items.iter_mut() {
                prune_children(item);
            }
            items.retain(|item| !is_zero(item));
        }
        _ => {}
    }
}

/// Zero value of the underlying kind
pub fn is_zero(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_removes_status_and_zero_values() {
        let mut value = json!({
            "metadata": {"name": "web", "creationTimestamp": null, "labels": {}},
            "spec": {
                "replicas": 0,
                "paused": false,
                "hostname": "",
                "template": {"spec": {"containers": [{"name": "web", "resources": {}}]}}
            },
            "status": {"replicas": 2}
        });
        prune(&mut value);

        assert_eq!(
            value,
            json!({
                "metadata": {"name": "web"},
                "spec": {"template": {"spec": {"containers": [{"name": "web"}]}}}
            })
        );
    }

    #[test]
    fn test_status_only_removed_at_top_level() {
        let mut value = json!({"spec": {"status": "kept"}, "status": "dropped"});
        prune(&mut value);
        assert_eq!(value, json!({"spec": {"status": "kept"}}));
    }

    #[test]
    fn test_emptied_parents_are_removed() {
        let mut value = json!({
            "spec": {"strategy": {"rollingUpdate": {"maxSurge": 0}}, "name": "x"}
        });
        prune(&mut value);
        assert_eq!(value, json!({"spec": {"name": "x"}}));
    }

    #[test]
    fn test_sequence_elements_dropped() {
        let mut value = json!({"args": ["", "--verbose", null, {"a": ""}, [0]]});
        prune(&mut value);
        assert_eq!(value, json!({"args": ["--verbose"]}));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let original = json!({
            "a": {"b": {"c": {"d": false}}, "e": [{"f": []}, 1]},
            "g": "keep",
            "status": {}
        });

        let mut once = original.clone();
        prune(&mut once);
        let mut twice = once.clone();
        prune(&mut twice);

        assert_eq!(once, twice);
        assert_eq!(once, json!({"a": {"e": [1]}, "g": "keep"}));
    }
}
