//! Stripping of server-assigned fields and controller decorations

use serde_json::{Map, Value as JsonValue};

use crate::manifest::map_at_mut;
use crate::template::KindTemplate;

/// Metadata fields assigned by the API server
const SERVER_METADATA: [&str; 8] = [
    "generateName",
    "selfLink",
    "uid",
    "resourceVersion",
    "generation",
    "creationTimestamp",
    "deletionTimestamp",
    "managedFields",
];

/// Label and annotation keys added by controllers
pub const DECORATORS: [&str; 8] = [
    "controller-uid",
    "deployment.kubernetes.io/desired-replicas",
    "deployment.kubernetes.io/max-replicas",
    "deployment.kubernetes.io/revision",
    "pod-template-hash",
    "pv.kubernetes.io/bind-completed",
    "pv.kubernetes.io/bound-by-controller",
    "kubectl.kubernetes.io/last-applied-configuration",
];

const DEFAULT_SERVICE_ACCOUNT: &str = "default";

pub fn is_decorator(key: &str) -> bool {
    DECORATORS.contains(&key)
}

/// Sanitize an object of the given kind in place
pub fn sanitize(object: &mut JsonValue, template: &dyn KindTemplate) {
    if let Some(meta) = map_at_mut(object, &["metadata"]) {
        sanitize_metadata(meta);
    }

    for path in template.decorated() {
        if let Some(map) = map_at_mut(object, path) {
            remove_decorators(map);
        }
    }

    if let Some(path) = template.pod_spec()
        && let Some(spec) = map_at_mut(object, path)
    {
        sanitize_pod_spec(spec);
    }
}

/// Clear server-assigned metadata and decorations on labels and annotations
pub fn sanitize_metadata(meta: &mut Map<String, JsonValue>) {
    for field in SERVER_METADATA {
        meta.remove(field);
    }
    for field in ["annotations", "labels"] {
        if let Some(JsonValue::Object(map)) = meta.get_mut(field) {
            remove_decorators(map);
        }
    }
}

pub fn remove_decorators(map: &mut Map<String, JsonValue>) {
    map.retain(|key, _| !is_decorator(key));
}

pub fn sanitize_pod_spec(spec: &mut Map<String, JsonValue>) {
    spec.remove("dnsPolicy");
    spec.remove("nodeName");
    spec.remove("terminationGracePeriodSeconds");
    for field in ["serviceAccountName", "serviceAccount"] {
        if spec.get(field).and_then(JsonValue::as_str) == Some(DEFAULT_SERVICE_ACCOUNT) {
            spec.remove(field);
        }
    }

    for field in ["initContainers", "containers"] {
        if let Some(JsonValue::Array(containers)) = spec.get_mut(field) {
            for container in containers.iter_mut().filter_map(JsonValue::as_object_mut) {
                container.remove("terminationMessagePath");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ResourceKind;
    use crate::template::template_for;
    use serde_json::json;

    #[test]
    fn test_metadata_cleanup() {
        let mut meta = json!({
            "name": "web",
            "namespace": "prod",
            "generateName": "web-",
            "selfLink": "/api/v1/namespaces/prod/pods/web",
            "uid": "1234",
            "resourceVersion": "99",
            "generation": 3,
            "creationTimestamp": "2017-01-01T00:00:00Z",
            "annotations": {"deployment.kubernetes.io/revision": "2", "team": "a"},
            "labels": {"pod-template-hash": "abc", "app": "web"}
        });
        sanitize_metadata(meta.as_object_mut().unwrap());

        assert_eq!(
            meta,
            json!({
                "name": "web",
                "namespace": "prod",
                "annotations": {"team": "a"},
                "labels": {"app": "web"}
            })
        );
    }

    #[test]
    fn test_pod_spec_cleanup() {
        let mut spec = json!({
            "dnsPolicy": "ClusterFirst",
            "nodeName": "node-1",
            "serviceAccountName": "default",
            "serviceAccount": "default",
            "terminationGracePeriodSeconds": 30,
            "restartPolicy": "Always",
            "initContainers": [{"name": "init", "terminationMessagePath": "/dev/termination-log"}],
            "containers": [{"name": "web", "terminationMessagePath": "/dev/termination-log"}]
        });
        sanitize_pod_spec(spec.as_object_mut().unwrap());

        assert_eq!(
            spec,
            json!({
                "restartPolicy": "Always",
                "initContainers": [{"name": "init"}],
                "containers": [{"name": "web"}]
            })
        );
    }

    #[test]
    fn test_custom_service_account_kept() {
        let mut spec = json!({"serviceAccountName": "builder", "containers": []});
        sanitize_pod_spec(spec.as_object_mut().unwrap());
        assert_eq!(spec["serviceAccountName"], "builder");
    }

    #[test]
    fn test_replicaset_nested_decorators() {
        let mut rs = json!({
            "metadata": {"name": "web-abc", "labels": {"app": "web", "pod-template-hash": "abc"}},
            "spec": {
                "selector": {"matchLabels": {"app": "web", "pod-template-hash": "abc"}},
                "template": {
                    "metadata": {"labels": {"app": "web", "pod-template-hash": "abc"}},
                    "spec": {"containers": [{"name": "web"}], "dnsPolicy": "ClusterFirst"}
                }
            }
        });
        sanitize(&mut rs, template_for(ResourceKind::ReplicaSet));

        assert_eq!(rs["spec"]["selector"]["matchLabels"], json!({"app": "web"}));
        assert_eq!(rs["spec"]["template"]["metadata"]["labels"], json!({"app": "web"}));
        assert_eq!(rs["metadata"]["labels"], json!({"app": "web"}));
        assert!(rs["spec"]["template"]["spec"].get("dnsPolicy").is_none());
    }

    #[test]
    fn test_job_without_selector() {
        let mut job = json!({
            "metadata": {"name": "migrate", "labels": {"controller-uid": "x", "job-name": "migrate"}},
            "spec": {"template": {"metadata": {"labels": {"controller-uid": "x"}}, "spec": {"containers": []}}}
        });
        sanitize(&mut job, template_for(ResourceKind::Job));

        assert_eq!(job["metadata"]["labels"], json!({"job-name": "migrate"}));
        assert_eq!(job["spec"]["template"]["metadata"]["labels"], json!({}));
    }
}
