//! Storage kinds: volumes, claims and classes

use serde_json::{Map, Value as JsonValue};

use super::{Extras, KindTemplate};
use crate::context::ChartContext;
use crate::error::Result;
use crate::extract::externalize_str;
use crate::kind::ResourceKind;
use crate::manifest::map_at_mut;
use crate::values::ValueScope;
use crate::volume::PERSISTENCE;

/// Externalize the first access mode; further modes stay literal
fn first_access_mode(spec: &mut Map<String, JsonValue>, scope: &mut ValueScope) {
    if let Some(JsonValue::Array(modes)) = spec.get_mut("accessModes")
        && let Some(first) = modes.first_mut()
        && let Some(mode) = first.as_str().filter(|m| !m.is_empty()).map(str::to_string)
    {
        *first = JsonValue::String(scope.record(&["accessMode"], JsonValue::String(mode)));
    }
}

// =============================================================================
// PERSISTENT VOLUME CLAIM
// =============================================================================

pub struct ClaimTemplate;

pub static PERSISTENT_VOLUME_CLAIM: ClaimTemplate = ClaimTemplate;

impl KindTemplate for ClaimTemplate {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PersistentVolumeClaim
    }

    fn scope(&self, key: &str) -> ValueScope {
        ValueScope::new([PERSISTENCE, key])
    }

    fn customize(
        &self,
        object: &mut JsonValue,
        scope: &mut ValueScope,
        _ctx: &ChartContext,
        _extras: &mut Extras,
    ) -> Result<()> {
        scope.record(&["enabled"], JsonValue::Bool(true));
        let Some(spec) = map_at_mut(object, &["spec"]) else {
            return Ok(());
        };

        externalize_str(spec, "volumeName", scope, &["volumeName"]);
        first_access_mode(spec, scope);
        if let Some(JsonValue::Object(requests)) = spec
            .get_mut("resources")
            .and_then(|resources| resources.get_mut("requests"))
        {
            externalize_str(requests, "storage", scope, &["size"]);
        }
        Ok(())
    }

    fn wrap(&self, text: String, scope: &ValueScope) -> String {
        format!(
            "{{{{- if {} -}}}}\n{}{{{{- end -}}}}\n",
            scope.path(&["enabled"]),
            text
        )
    }
}

// =============================================================================
// PERSISTENT VOLUME
// =============================================================================

pub struct VolumeTemplate;

pub static PERSISTENT_VOLUME: VolumeTemplate = VolumeTemplate;

impl KindTemplate for VolumeTemplate {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PersistentVolume
    }

    fn customize(
        &self,
        object: &mut JsonValue,
        scope: &mut ValueScope,
        _ctx: &ChartContext,
        _extras: &mut Extras,
    ) -> Result<()> {
        if let Some(spec) = map_at_mut(object, &["spec"]) {
            externalize_str(spec, "persistentVolumeReclaimPolicy", scope, &["reclaimPolicy"]);
            first_access_mode(spec, scope);
        }
        Ok(())
    }
}

// =============================================================================
// STORAGE CLASS
// =============================================================================

pub struct StorageClassTemplate;

pub static STORAGE_CLASS: StorageClassTemplate = StorageClassTemplate;

impl KindTemplate for StorageClassTemplate {
    fn kind(&self) -> ResourceKind {
        ResourceKind::StorageClass
    }

    fn customize(
        &self,
        object: &mut JsonValue,
        scope: &mut ValueScope,
        _ctx: &ChartContext,
        _extras: &mut Extras,
    ) -> Result<()> {
        let Some(root) = object.as_object_mut() else {
            return Ok(());
        };
        externalize_str(root, "provisioner", scope, &["provisioner"]);

        if let Some(JsonValue::Object(parameters)) = root.get_mut("parameters") {
            let keys: Vec<String> = parameters.keys().cloned().collect();
            for key in keys {
                let field = scope.claim_key(&["parameters"], &key);
                externalize_str(parameters, &key, scope, &["parameters", field.as_str()]);
            }
        }
        Ok(())
    }
}
