//! Volume templates
//!
//! Volumes are taken out of the pod spec before pruning and emitted as a raw
//! block, so that persistent sources can be switched off through
//! `persistence.<volume>.enabled` and fall back to an `emptyDir`.

use serde_json::{Map, Value as JsonValue};

use crate::context::ChartContext;
use crate::document::{Node, quote};
use crate::error::{GenerationWarning, Result};
use crate::extract::{externalize_str, rewrite_name};
use crate::kind::ResourceKind;
use crate::manifest::str_field;
use crate::prune::prune;
use crate::values::{ValueScope, fullname_ref, safe_key, unique_key};

/// Reserved top-level values key for persistence entries
pub const PERSISTENCE: &str = "persistence";

/// How a volume source is templated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    /// Claim reference, rewritten when the claim is part of the chart
    Claim,
    /// Persistent storage: fields externalized, optionally behind the enabled guard
    Persistent {
        fields: &'static [&'static str],
        guarded: bool,
    },
    /// Reference to a ConfigMap or Secret of the chart
    Reference {
        kind: ResourceKind,
        name_field: &'static str,
    },
    /// Emitted as written
    Literal,
}

const fn guarded(fields: &'static [&'static str]) -> Treatment {
    Treatment::Persistent {
        fields,
        guarded: true,
    }
}

/// Source fields in the order they are checked
pub static VOLUME_SOURCES: [(&str, Treatment); 22] = [
    ("persistentVolumeClaim", Treatment::Claim),
    (
        "configMap",
        Treatment::Reference {
            kind: ResourceKind::ConfigMap,
            name_field: "name",
        },
    ),
    (
        "secret",
        Treatment::Reference {
            kind: ResourceKind::Secret,
            name_field: "secretName",
        },
    ),
    ("glusterfs", guarded(&["path", "endpoints"])),
    (
        "hostPath",
        Treatment::Persistent {
            fields: &["path"],
            guarded: false,
        },
    ),
    ("gcePersistentDisk", guarded(&["pdName", "fsType"])),
    ("awsElasticBlockStore", guarded(&["fsType", "volumeID"])),
    ("gitRepo", guarded(&["repository", "revision", "directory"])),
    ("nfs", guarded(&["server", "path"])),
    (
        "iscsi",
        guarded(&["targetPortal", "iqn", "iscsiInterface", "fsType"]),
    ),
    ("rbd", guarded(&["fsType", "image", "pool", "user", "keyring"])),
    ("quobyte", guarded(&["registry", "volume", "group", "user"])),
    ("flexVolume", guarded(&["driver", "fsType"])),
    ("cinder", guarded(&["fsType", "volumeID"])),
    ("cephfs", guarded(&["path", "secretFile", "user"])),
    ("flocker", guarded(&["datasetName"])),
    ("downwardAPI", Treatment::Literal),
    ("fc", guarded(&["fsType"])),
    ("azureFile", guarded(&["secretName", "shareName"])),
    ("azureDisk", guarded(&["diskName", "diskURI"])),
    ("vsphereVolume", guarded(&["fsType", "volumePath"])),
    ("emptyDir", Treatment::Literal),
];

/// Source field and treatment of a volume, first match in check order
pub fn classify(volume: &Map<String, JsonValue>) -> Option<(&'static str, Treatment)> {
    VOLUME_SOURCES
        .iter()
        .find(|(field, _)| volume.get(*field).is_some_and(|source| !source.is_null()))
        .copied()
}

/// Output of [`build`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VolumeTemplate {
    /// Lines of the `volumes:` block, relative to the `volumes` key
    pub lines: Vec<String>,
    /// Persistence entries keyed by volume safe key
    pub persistence: Map<String, JsonValue>,
    pub warnings: Vec<GenerationWarning>,
}

/// Template the volumes of a pod spec owned by `object` (`Kind/name`)
pub fn build(volumes: &[JsonValue], ctx: &ChartContext, object: &str) -> Result<VolumeTemplate> {
    let mut out = VolumeTemplate::default();

    for volume in volumes {
        let Some(volume) = volume.as_object() else {
            continue;
        };
        let mut volume = volume.clone();
        let name = str_field(&volume, "name").unwrap_or_default().to_string();
        volume.remove("name");

        let mut guard = None;
        match classify(&volume) {
            Some((field, Treatment::Claim)) => {
                let key = unique_key(&safe_key(&name), |k| out.persistence.contains_key(k));
                let mut scope = persistence_scope(&key);
                if let Some(source) = volume.get_mut(field).and_then(JsonValue::as_object_mut) {
                    claim(source, &mut scope, ctx);
                }
                guard = Some(scope.path(&["enabled"]));
                out.persistence.insert(key, scope.into());
            }
            Some((field, Treatment::Persistent { fields, guarded })) => {
                let key = unique_key(&safe_key(&name), |k| out.persistence.contains_key(k));
                let mut scope = persistence_scope(&key);
                if let Some(source) = volume.get_mut(field).and_then(JsonValue::as_object_mut) {
                    for &key in fields {
                        externalize_str(source, key, &mut scope, &[key]);
                    }
                }
                if guarded {
                    guard = Some(scope.path(&["enabled"]));
                }
                out.persistence.insert(key, scope.into());
            }
            Some((field, Treatment::Reference { kind, name_field })) => {
                if let Some(source) = volume.get_mut(field).and_then(JsonValue::as_object_mut) {
                    rewrite_name(source, name_field, kind, ctx);
                }
            }
            Some((_, Treatment::Literal)) => {}
            None => {
                let source = volume.keys().next().cloned().unwrap_or_default();
                out.warnings
                    .push(GenerationWarning::untemplated_volume(object, &name, &source));
            }
        }

        for source in volume.values_mut() {
            prune(source);
        }
        out.lines.push(format!("- name: {}", quote(&name)?));
        let body: Vec<String> = if volume.is_empty() {
            Vec::new()
        } else {
            Node::from(JsonValue::Object(volume))
                .lines()?
                .into_iter()
                .map(|line| format!("  {}", line))
                .collect()
        };

        match guard {
            Some(path) => {
                out.lines.push(format!("{{{{- if {} }}}}", path));
                out.lines.extend(body);
                out.lines.push("{{- else }}".to_string());
                out.lines.push("  emptyDir: {}".to_string());
                out.lines.push("{{- end }}".to_string());
            }
            None => out.lines.extend(body),
        }
    }

    Ok(out)
}

/// Scope of `persistence.<key>`, enabled by default
fn persistence_scope(key: &str) -> ValueScope {
    let mut scope = ValueScope::new([PERSISTENCE, key]);
    scope.record(&["enabled"], JsonValue::Bool(true));
    scope
}

fn claim(source: &mut Map<String, JsonValue>, scope: &mut ValueScope, ctx: &ChartContext) {
    let Some(claim) = str_field(source, "claimName").map(str::to_string) else {
        return;
    };
    if ctx.is_inside_object(ResourceKind::PersistentVolumeClaim, &claim) {
        source.insert("claimName".to_string(), JsonValue::String(fullname_ref(&claim)));
    } else {
        externalize_str(source, "claimName", scope, &["claimName"]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn volumes(value: JsonValue) -> Vec<JsonValue> {
        value.as_array().cloned().unwrap()
    }

    #[test]
    fn test_check_order_and_coverage() {
        assert_eq!(VOLUME_SOURCES[0].0, "persistentVolumeClaim");
        let persistent = VOLUME_SOURCES
            .iter()
            .filter(|(_, t)| matches!(t, Treatment::Persistent { .. } | Treatment::Claim))
            .count();
        assert_eq!(persistent, 18);

        let both = json!({"nfs": {"server": "a"}, "hostPath": {"path": "/x"}});
        assert_eq!(classify(both.as_object().unwrap()).map(|(f, _)| f), Some("hostPath"));
    }

    #[test]
    fn test_colliding_volume_names_get_distinct_entries() {
        let template = build(
            &volumes(json!([
                {"name": "data-1", "nfs": {"server": "10.0.0.2", "path": "/a"}},
                {"name": "data-2", "hostPath": {"path": "/b"}}
            ])),
            &ChartContext::new(),
            "Pod/web",
        )
        .unwrap();

        assert!(template
            .lines
            .contains(&"    path: '{{.Values.persistence.data2.path}}'".to_string()));
        assert_eq!(
            JsonValue::Object(template.persistence),
            json!({
                "data": {"enabled": true, "server": "10.0.0.2", "path": "/a"},
                "data2": {"enabled": true, "path": "/b"}
            })
        );
    }

    #[test]
    fn test_guarded_nfs_volume() {
        let template = build(
            &volumes(json!([{"name": "shared-data", "nfs": {"server": "10.0.0.2", "path": "/exports", "readOnly": true}}])),
            &ChartContext::new(),
            "Pod/web",
        )
        .unwrap();

        assert_eq!(
            template.lines,
            vec![
                "- name: shared-data",
                "{{- if .Values.persistence.shareddata.enabled }}",
                "  nfs:",
                "    path: '{{.Values.persistence.shareddata.path}}'",
                "    readOnly: true",
                "    server: '{{.Values.persistence.shareddata.server}}'",
                "{{- else }}",
                "  emptyDir: {}",
                "{{- end }}",
            ]
        );
        assert_eq!(
            JsonValue::Object(template.persistence),
            json!({"shareddata": {"enabled": true, "server": "10.0.0.2", "path": "/exports"}})
        );
    }

    #[test]
    fn test_empty_dir_kept_after_pruning() {
        let template = build(
            &volumes(json!([{"name": "scratch", "emptyDir": {}}])),
            &ChartContext::new(),
            "Pod/web",
        )
        .unwrap();

        assert_eq!(template.lines, vec!["- name: scratch", "  emptyDir: {}"]);
        assert!(template.persistence.is_empty());
    }

    #[test]
    fn test_host_path_is_not_guarded() {
        let template = build(
            &volumes(json!([{"name": "logs", "hostPath": {"path": "/var/log"}}])),
            &ChartContext::new(),
            "Pod/web",
        )
        .unwrap();

        assert_eq!(
            template.lines,
            vec![
                "- name: logs",
                "  hostPath:",
                "    path: '{{.Values.persistence.logs.path}}'",
            ]
        );
        assert_eq!(template.persistence["logs"]["enabled"], true);
    }

    #[test]
    fn test_claim_in_batch_is_rewritten() {
        let ctx = ChartContext::new().with_object(ResourceKind::PersistentVolumeClaim, "data-pvc");
        let template = build(
            &volumes(json!([
                {"name": "data", "persistentVolumeClaim": {"claimName": "data-pvc"}},
                {"name": "cache", "persistentVolumeClaim": {"claimName": "external"}}
            ])),
            &ctx,
            "Deployment/web",
        )
        .unwrap();

        assert!(template.lines.contains(
            &"    claimName: '{{ template \"fullname\" . }}-data-pvc'".to_string()
        ));
        assert!(template.lines.contains(
            &"    claimName: '{{.Values.persistence.cache.claimName}}'".to_string()
        ));
        assert_eq!(
            JsonValue::Object(template.persistence),
            json!({
                "data": {"enabled": true},
                "cache": {"enabled": true, "claimName": "external"}
            })
        );
    }

    #[test]
    fn test_config_and_secret_volumes_not_persisted() {
        let ctx = ChartContext::new().with_object(ResourceKind::ConfigMap, "nginx-conf");
        let template = build(
            &volumes(json!([
                {"name": "conf", "configMap": {"name": "nginx-conf"}},
                {"name": "tls", "secret": {"secretName": "tls"}},
                {"name": "info", "downwardAPI": {"items": [{"path": "labels", "fieldRef": {"fieldPath": "metadata.labels"}}]}}
            ])),
            &ctx,
            "Pod/web",
        )
        .unwrap();

        assert!(template.persistence.is_empty());
        assert!(template.warnings.is_empty());
        assert!(template.lines.contains(
            &"    name: '{{ template \"fullname\" . }}-nginx-conf'".to_string()
        ));
        assert!(template.lines.contains(&"    secretName: tls".to_string()));
    }

    #[test]
    fn test_unknown_source_warns() {
        let template = build(
            &volumes(json!([{"name": "token", "projected": {"sources": [{"serviceAccountToken": {"path": "token"}}]}}])),
            &ChartContext::new(),
            "Pod/web",
        )
        .unwrap();

        assert_eq!(template.warnings.len(), 1);
        assert!(template.warnings[0].message.contains("projected"));
        assert_eq!(
            template.lines,
            vec![
                "- name: token",
                "  projected:",
                "    sources:",
                "    - serviceAccountToken:",
                "        path: token",
            ]
        );
    }

    #[test]
    fn test_every_persistent_source_gets_enabled_entry() {
        for (field, treatment) in VOLUME_SOURCES.iter() {
            if !matches!(treatment, Treatment::Persistent { .. } | Treatment::Claim) {
                continue;
            }
            let mut volume = json!({"name": "vol"});
            volume[*field] = json!({"fsType": "ext4"});
            let template = build(
                &[volume],
                &ChartContext::new(),
                "Pod/p",
            )
            .unwrap();
            assert_eq!(
                template.persistence.get("vol").and_then(|v| v.get("enabled")),
                Some(&json!(true)),
                "{}",
                field
            );
        }
    }
}
