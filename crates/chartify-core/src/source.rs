//! Local manifest source
//!
//! Turns a directory of YAML or JSON files into single-document manifest
//! texts, the input [`Generator::create`](crate::Generator::create) expects.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use walkdir::WalkDir;

use crate::error::{ChartifyError, Result};

const LIST_KIND: &str = "List";

/// Read every manifest file directly inside `dir`, in file name order
pub fn read_manifest_dir(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(ChartifyError::Source {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut manifests = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ChartifyError::Source {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let text = std::fs::read_to_string(entry.path())?;
        let documents = split_documents(&text).map_err(|e| ChartifyError::Source {
            path: entry.path().to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(file = %entry.path().display(), objects = documents.len(), "read manifests");
        manifests.extend(documents);
    }
    Ok(manifests)
}

/// Split a multi-document YAML stream into one text per object.
///
/// Empty documents are dropped and `kind: List` documents are flattened
/// into their items.
pub fn split_documents(text: &str) -> Result<Vec<String>> {
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = JsonValue::deserialize(document)?;
        flatten(value, &mut objects);
    }
    objects
        .iter()
        .map(|object| serde_yaml::to_string(object).map_err(ChartifyError::from))
        .collect()
}

fn flatten(value: JsonValue, out: &mut Vec<JsonValue>) {
    match value {
        JsonValue::Null => {}
        JsonValue::Object(mut map)
            if map.get("kind").and_then(JsonValue::as_str) == Some(LIST_KIND) =>
        {
            if let Some(JsonValue::Array(items)) = map.remove("items") {
                for item in items {
                    flatten(item, out);
                }
            }
        }
        other => out.push(other),
    }
}
