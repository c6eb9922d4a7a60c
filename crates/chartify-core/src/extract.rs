//! Externalization of literal fields into the values document
//!
//! Each externalized field is recorded in a [`ValueScope`] and replaced in
//! the object by the expression that reads it back.

use serde_json::{Map, Value as JsonValue};

use crate::context::ChartContext;
use crate::kind::ResourceKind;
use crate::manifest::{map_at, map_at_mut, str_field};
use crate::template::KindTemplate;
use crate::values::{CHART_LABELS, FULLNAME, ValueScope, fullname_ref, release_scoped};

/// Labels of the pod template of a workload
pub const POD_TEMPLATE_LABELS: &[&str] = &["spec", "template", "metadata", "labels"];
const OBJECT_LABELS: &[&str] = &["metadata", "labels"];

/// Image tag used when the reference carries none
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Externalize `map[key]` if it holds a non-empty string.
///
/// Returns the expression written into the map.
pub fn externalize_str(
    map: &mut Map<String, JsonValue>,
    key: &str,
    scope: &mut ValueScope,
    field: &[&str],
) -> Option<String> {
    let value = str_field(map, key)?.to_string();
    let expression = scope.record(field, JsonValue::String(value));
    map.insert(key.to_string(), JsonValue::String(expression.clone()));
    Some(expression)
}

/// Template value of an object's own `metadata.name`
pub fn object_name(suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) if !suffix.is_empty() => format!("{}-{}", FULLNAME, suffix),
        _ => FULLNAME.to_string(),
    }
}

// =============================================================================
// METADATA
// =============================================================================

/// Template the metadata of an object named `name`
pub fn metadata(object: &mut JsonValue, name: &str, scope: &mut ValueScope) {
    let Some(root) = object.as_object_mut() else {
        return;
    };
    let meta = root
        .entry("metadata")
        .or_insert_with(|| JsonValue::Object(Map::new()));
    let Some(meta) = meta.as_object_mut() else {
        return;
    };

    meta.insert("name".to_string(), JsonValue::String(object_name(Some(name))));
    for field in ["clusterName", "generateName", "namespace"] {
        externalize_str(meta, field, scope, &[field]);
    }

    let labels = meta
        .entry("labels")
        .or_insert_with(|| JsonValue::Object(Map::new()));
    if let JsonValue::Object(labels) = labels {
        for (key, value) in CHART_LABELS {
            labels.insert(key.to_string(), JsonValue::String(value.to_string()));
        }
    }
}

// =============================================================================
// POD SPEC
// =============================================================================

/// Template the containers and scheduling fields of a pod spec.
///
/// Scheduling fields are recorded first so container keys step around them.
pub fn pod_spec(spec: &mut Map<String, JsonValue>, scope: &mut ValueScope, ctx: &ChartContext) {
    for field in [
        "hostname",
        "subdomain",
        "nodeName",
        "serviceAccountName",
        "restartPolicy",
    ] {
        externalize_str(spec, field, scope, &[field]);
    }

    if let Some(JsonValue::Array(secrets)) = spec.get_mut("imagePullSecrets") {
        for secret in secrets.iter_mut().filter_map(JsonValue::as_object_mut) {
            let Some(name) = str_field(secret, "name").map(str::to_string) else {
                continue;
            };
            let reference = if ctx.is_inside_object(ResourceKind::Secret, &name) {
                fullname_ref(&name)
            } else {
                let key = scope.claim_key(&["imagePullSecrets"], &name);
                scope.record(&["imagePullSecrets", key.as_str()], JsonValue::String(name))
            };
            secret.insert("name".to_string(), JsonValue::String(reference));
        }
    }

    for field in ["initContainers", "containers"] {
        if let Some(JsonValue::Array(containers)) = spec.get_mut(field) {
            for container in containers.iter_mut().filter_map(JsonValue::as_object_mut) {
                self::container(container, scope, ctx);
            }
        }
    }
}

/// Template one container. Values nest under the container's safe key,
/// suffixed when another container or field already uses it.
pub fn container(
    container: &mut Map<String, JsonValue>,
    scope: &mut ValueScope,
    ctx: &ChartContext,
) {
    let Some(name) = str_field(container, "name") else {
        return;
    };
    let key = scope.claim_key(&[], name);

    if let Some(image) = str_field(container, "image").map(str::to_string) {
        let (repository, tag) = split_image(&image);
        let image_expr = scope.record(
            &[key.as_str(), "image"],
            JsonValue::String(repository.to_string()),
        );
        let tag_expr = scope.record(
            &[key.as_str(), "imageTag"],
            JsonValue::String(tag.to_string()),
        );
        container.insert(
            "image".to_string(),
            JsonValue::String(format!("{}:{}", image_expr, tag_expr)),
        );
    }
    externalize_str(
        container,
        "imagePullPolicy",
        scope,
        &[key.as_str(), "imagePullPolicy"],
    );

    if let Some(JsonValue::Array(env)) = container.get_mut("env") {
        for var in env.iter_mut().filter_map(JsonValue::as_object_mut) {
            let Some(var_name) = str_field(var, "name") else {
                continue;
            };
            let var_key = scope.claim_key(&[key.as_str()], var_name);
            let field = [key.as_str(), var_key.as_str()];
            if externalize_str(var, "value", scope, &field).is_none() {
                rewrite_key_refs(var, ctx);
            }
        }
    }

    if let Some(JsonValue::Array(sources)) = container.get_mut("envFrom") {
        for source in sources.iter_mut().filter_map(JsonValue::as_object_mut) {
            rewrite_ref(source, "configMapRef", ResourceKind::ConfigMap, ctx);
            rewrite_ref(source, "secretRef", ResourceKind::Secret, ctx);
        }
    }
}

fn rewrite_key_refs(var: &mut Map<String, JsonValue>, ctx: &ChartContext) {
    if let Some(JsonValue::Object(from)) = var.get_mut("valueFrom") {
        rewrite_ref(from, "configMapKeyRef", ResourceKind::ConfigMap, ctx);
        rewrite_ref(from, "secretKeyRef", ResourceKind::Secret, ctx);
    }
}

/// Point `holder[field].name` at the chart's copy of an in-batch object
fn rewrite_ref(
    holder: &mut Map<String, JsonValue>,
    field: &str,
    kind: ResourceKind,
    ctx: &ChartContext,
) {
    if let Some(JsonValue::Object(reference)) = holder.get_mut(field) {
        rewrite_name(reference, "name", kind, ctx);
    }
}

/// Rewrite `map[key]` to the fullname form when it names an in-batch object
pub fn rewrite_name(
    map: &mut Map<String, JsonValue>,
    key: &str,
    kind: ResourceKind,
    ctx: &ChartContext,
) -> bool {
    let Some(name) = str_field(map, key) else {
        return false;
    };
    if !ctx.is_inside_object(kind, name) {
        return false;
    }
    let reference = fullname_ref(name);
    map.insert(key.to_string(), JsonValue::String(reference));
    true
}

/// Split an image reference into repository and tag.
///
/// The tag is whatever follows the last `:` when that colon comes after the
/// last `/`, so registry ports are not mistaken for tags.
pub fn split_image(image: &str) -> (&str, &str) {
    let slash = image.rfind('/');
    match image.rfind(':') {
        Some(colon) if slash.is_none_or(|slash| colon > slash) => {
            (&image[..colon], &image[colon + 1..])
        }
        _ => (image, DEFAULT_IMAGE_TAG),
    }
}

// =============================================================================
// LABEL SELECTORS
// =============================================================================

/// Selector labels present in the pod template labels and the object labels.
///
/// An object without a selector yields nothing.
pub fn selector_pairs(object: &JsonValue, template: &dyn KindTemplate) -> Vec<(String, String)> {
    let Some(path) = template.match_labels() else {
        return Vec::new();
    };
    let (Some(selector), Some(pod_labels), Some(labels)) = (
        map_at(object, path),
        map_at(object, POD_TEMPLATE_LABELS),
        map_at(object, OBJECT_LABELS),
    ) else {
        return Vec::new();
    };

    selector
        .iter()
        .filter(|(key, _)| pod_labels.contains_key(*key) && labels.contains_key(*key))
        .filter_map(|(key, value)| Some((key.clone(), value.as_str()?.to_string())))
        .collect()
}

/// Prefix the given selector pairs with the release name in the selector,
/// the pod template labels and the object labels
pub fn rewrite_selector(
    object: &mut JsonValue,
    template: &dyn KindTemplate,
    pairs: &[(String, String)],
) {
    let Some(selector_path) = template.match_labels() else {
        return;
    };
    for path in [selector_path, POD_TEMPLATE_LABELS, OBJECT_LABELS] {
        if let Some(map) = map_at_mut(object, path) {
            for (key, value) in pairs {
                map.insert(key.clone(), JsonValue::String(release_scoped(value)));
            }
        }
    }
}
