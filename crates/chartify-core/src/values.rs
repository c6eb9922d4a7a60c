//! Values document, safe keys and template expressions

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::document::Node;
use crate::error::Result;

/// Helper invocation that renders the release-scoped chart name
pub const FULLNAME: &str = r#"{{ template "fullname" . }}"#;

/// Labels injected into the metadata of every object
pub const CHART_LABELS: [(&str, &str); 3] = [
    ("chart", "{{.Chart.Name}}-{{.Chart.Version}}"),
    ("release", "{{.Release.Name}}"),
    ("heritage", "{{.Release.Service}}"),
];

/// Derive the values key of an object name: ASCII letters only.
///
/// Falls back to the name itself when it contains no letters at all.
pub fn safe_key(name: &str) -> String {
    let key: String = name.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if key.is_empty() {
        name.to_string()
    } else {
        key
    }
}

/// First of `base`, `base2`, `base3`, ... that is not taken
pub fn unique_key(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}{}", base, n))
        .find(|key| !taken(key))
        .unwrap_or_else(|| base.to_string())
}

/// `.Values.a.b.c`, the bare reference used inside template actions
pub fn values_path<S: AsRef<str>>(path: &[S]) -> String {
    let joined: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
    format!(".Values.{}", joined.join("."))
}

/// `{{.Values.a.b.c}}`
pub fn values_expression<S: AsRef<str>>(path: &[S]) -> String {
    format!("{{{{{}}}}}", values_path(path))
}

/// Name of another object of the same chart
pub fn fullname_ref(name: &str) -> String {
    format!("{}-{}", FULLNAME, name)
}

/// Label value prefixed with the release name
pub fn release_scoped(value: &str) -> String {
    format!("{{{{.Release.Name}}}}-{}", value)
}

// =============================================================================
// PER-OBJECT SCOPE
// =============================================================================

/// Values recorded while templating one object
///
/// The prefix is the path of the scope inside the values document, for
/// example `["web"]` or `["persistence", "data"]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueScope {
    prefix: Vec<String>,
    values: Map<String, JsonValue>,
    /// Keys handed out by [`ValueScope::claim_key`], with the name they stand for
    claimed: BTreeMap<Vec<String>, String>,
    /// Dotted paths whose recorded value was replaced
    conflicts: Vec<String>,
}

impl ValueScope {
    pub fn new<I, S>(prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: prefix.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// Bare `.Values` path of `field` relative to this scope
    pub fn path(&self, field: &[&str]) -> String {
        let path: Vec<&str> = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(field.iter().copied())
            .collect();
        values_path(&path)
    }

    /// Expression referencing `field` relative to this scope
    pub fn expression(&self, field: &[&str]) -> String {
        format!("{{{{{}}}}}", self.path(field))
    }

    /// Record `value` under `field` and return the expression that reads it back.
    ///
    /// Replacing a different value already recorded on the path is kept as
    /// a conflict, see [`ValueScope::conflicts`].
    pub fn record(&mut self, field: &[&str], value: JsonValue) -> String {
        if set_nested(&mut self.values, field, value) {
            let path: Vec<&str> = self
                .prefix
                .iter()
                .map(String::as_str)
                .chain(field.iter().copied())
                .collect();
            let path = path.join(".");
            tracing::debug!(path = %path, "recorded value replaced");
            self.conflicts.push(path);
        }
        self.expression(field)
    }

    /// Values key for the entry `name` below `parent`.
    ///
    /// The safe key of `name` unless another name already claimed it or a
    /// value sits there, in which case a numeric suffix is appended. The same
    /// name always gets the same key.
    pub fn claim_key(&mut self, parent: &[&str], name: &str) -> String {
        let slot = |key: &str| -> Vec<String> {
            parent
                .iter()
                .copied()
                .chain(std::iter::once(key))
                .map(str::to_string)
                .collect()
        };

        let owned = self.claimed.iter().find(|(path, owner)| {
            owner.as_str() == name
                && path.len() == parent.len() + 1
                && path.iter().zip(parent).all(|(a, b)| a == b)
        });
        if let Some((path, _)) = owned {
            return path[parent.len()].clone();
        }

        let base = safe_key(name);
        let key = unique_key(&base, |key| {
            let path = slot(key);
            let field: Vec<&str> = path.iter().map(String::as_str).collect();
            self.claimed.contains_key(&path) || self.get(&field).is_some()
        });
        self.claimed.insert(slot(&key), name.to_string());
        key
    }

    /// Paths where [`ValueScope::record`] replaced an earlier value
    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    pub fn get(&self, field: &[&str]) -> Option<&JsonValue> {
        let (first, rest) = field.split_first()?;
        rest.iter()
            .try_fold(self.values.get(*first)?, |value, key| value.get(*key))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_map(self) -> Map<String, JsonValue> {
        self.values
    }
}

impl From<ValueScope> for JsonValue {
    fn from(scope: ValueScope) -> Self {
        JsonValue::Object(scope.into_map())
    }
}

/// Insert `value` at `path`. Returns true when a different value was replaced.
fn set_nested(map: &mut Map<String, JsonValue>, path: &[&str], value: JsonValue) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };

    if rest.is_empty() {
        let previous = map.insert((*first).to_string(), value);
        return previous.is_some_and(|old| map.get(*first) != Some(&old));
    }

    let entry = map
        .entry((*first).to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    let replaced = !entry.is_object();
    if replaced {
        *entry = JsonValue::Object(Map::new());
    }
    match entry {
        JsonValue::Object(child) => set_nested(child, rest, value) || replaced,
        _ => replaced,
    }
}

// =============================================================================
// CHART VALUES DOCUMENT
// =============================================================================

/// The chart-wide values document
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

impl Values {
    pub fn new() -> Self {
        Self(JsonValue::Object(Map::new()))
    }

    /// Deep merge `overlay` into the entry at `key`.
    ///
    /// Returns the dotted paths where an existing value was replaced by a
    /// different one.
    pub fn merge_at(&mut self, key: &str, overlay: Map<String, JsonValue>) -> Vec<String> {
        let mut conflicts = Vec::new();
        if let JsonValue::Object(root) = &mut self.0 {
            let overlay = JsonValue::Object(overlay);
            match root.get_mut(key) {
                Some(base) => deep_merge(base, overlay, key, &mut conflicts),
                None => {
                    root.insert(key.to_string(), overlay);
                }
            }
        }
        conflicts
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        path.split('.')
            .try_fold(&self.0, |value, key| value.as_object()?.get(key))
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }

    /// Render as `values.yaml` content with sorted keys
    pub fn to_yaml(&self) -> Result<String> {
        if self.is_empty() {
            return Ok("{}\n".to_string());
        }
        Node::from(self.0.clone()).to_yaml()
    }
}

fn deep_merge(base: &mut JsonValue, overlay: JsonValue, path: &str, conflicts: &mut Vec<String>) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let child_path = format!("{}.{}", path, key);
                match base_map.get_mut(&key) {
                    Some(base_value) => {
                        deep_merge(base_value, overlay_value, &child_path, conflicts)
                    }
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base, overlay) => {
            if *base != overlay {
                tracing::debug!(path, "values entry replaced by a different value");
                conflicts.push(path.to_string());
            }
            *base = overlay;
        }
    }
}
