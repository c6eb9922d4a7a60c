//! Parsed manifests
//!
//! A manifest is kept as an untyped JSON tree so that any `apiVersion` of a
//! supported kind can be templated, including legacy groups such as
//! `extensions/v1beta1`.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{ChartifyError, Result};
use crate::kind::ResourceKind;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Header {
    api_version: Option<String>,
    kind: Option<String>,
    #[serde(default)]
    metadata: HeaderMeta,
}

#[derive(Debug, Default, Deserialize)]
struct HeaderMeta {
    name: Option<String>,
}

/// A single Kubernetes object read from YAML or JSON text
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// The raw `kind` field
    pub kind_name: String,
    /// Resolved kind, `None` when no template function handles it
    pub kind: Option<ResourceKind>,
    pub api_version: String,
    pub name: String,
    /// The full object
    pub object: JsonValue,
}

impl Manifest {
    /// Parse one manifest document
    pub fn parse(text: &str) -> Result<Self> {
        let object: JsonValue = serde_yaml::from_str(text)?;
        Self::from_value(object)
    }

    /// Build a manifest from an already decoded object
    pub fn from_value(object: JsonValue) -> Result<Self> {
        if !object.is_object() {
            return Err(ChartifyError::InvalidManifest(
                "top level of a manifest must be a mapping".to_string(),
            ));
        }

        let header = Header::deserialize(&object)?;
        let api_version = header
            .api_version
            .filter(|v| !v.is_empty())
            .ok_or(ChartifyError::MissingField("apiVersion"))?;
        let kind_name = header
            .kind
            .filter(|k| !k.is_empty())
            .ok_or(ChartifyError::MissingField("kind"))?;
        let name = header
            .metadata
            .name
            .filter(|n| !n.is_empty())
            .ok_or(ChartifyError::MissingField("metadata.name"))?;

        Ok(Self {
            kind: ResourceKind::from_kind(&kind_name),
            kind_name,
            api_version,
            name,
            object,
        })
    }

    /// `Kind/name`, used in logs and warnings
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.kind_name, self.name)
    }
}

/// Object at `path`, if every step is a mapping
pub(crate) fn map_at<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a Map<String, JsonValue>> {
    path.iter()
        .try_fold(value, |value, key| value.as_object()?.get(*key))?
        .as_object()
}

pub(crate) fn map_at_mut<'a>(
    value: &'a mut JsonValue,
    path: &[&str],
) -> Option<&'a mut Map<String, JsonValue>> {
    path.iter()
        .try_fold(value, |value, key| value.as_object_mut()?.get_mut(*key))?
        .as_object_mut()
}

/// Non-empty string field of a mapping
pub(crate) fn str_field<'a>(map: &'a Map<String, JsonValue>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
}
