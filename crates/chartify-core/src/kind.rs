//! Supported resource kinds and their dispatch table

use k8s_openapi::Resource;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    ConfigMap, PersistentVolume, PersistentVolumeClaim, Pod, ReplicationController, Secret,
    Service,
};
use k8s_openapi::api::storage::v1::StorageClass;
use phf::phf_map;

/// A Kubernetes kind the engine knows how to template
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Pod,
    ReplicationController,
    Deployment,
    DaemonSet,
    ReplicaSet,
    StatefulSet,
    Job,
    Service,
    ConfigMap,
    Secret,
    PersistentVolume,
    PersistentVolumeClaim,
    StorageClass,
    HorizontalPodAutoscaler,
}

static KINDS: phf::Map<&'static str, ResourceKind> = phf_map! {
    "Pod" => ResourceKind::Pod,
    "ReplicationController" => ResourceKind::ReplicationController,
    "Deployment" => ResourceKind::Deployment,
    "DaemonSet" => ResourceKind::DaemonSet,
    "ReplicaSet" => ResourceKind::ReplicaSet,
    "StatefulSet" => ResourceKind::StatefulSet,
    "Job" => ResourceKind::Job,
    "Service" => ResourceKind::Service,
    "ConfigMap" => ResourceKind::ConfigMap,
    "Secret" => ResourceKind::Secret,
    "PersistentVolume" => ResourceKind::PersistentVolume,
    "PersistentVolumeClaim" => ResourceKind::PersistentVolumeClaim,
    "StorageClass" => ResourceKind::StorageClass,
    "HorizontalPodAutoscaler" => ResourceKind::HorizontalPodAutoscaler,
};

impl ResourceKind {
    pub const ALL: [ResourceKind; 14] = [
        Self::Pod,
        Self::ReplicationController,
        Self::Deployment,
        Self::DaemonSet,
        Self::ReplicaSet,
        Self::StatefulSet,
        Self::Job,
        Self::Service,
        Self::ConfigMap,
        Self::Secret,
        Self::PersistentVolume,
        Self::PersistentVolumeClaim,
        Self::StorageClass,
        Self::HorizontalPodAutoscaler,
    ];

    /// Resolve the `kind` field of a manifest
    pub fn from_kind(kind: &str) -> Option<Self> {
        KINDS.get(kind).copied()
    }

    /// Canonical `kind` string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pod => Pod::KIND,
            Self::ReplicationController => ReplicationController::KIND,
            Self::Deployment => Deployment::KIND,
            Self::DaemonSet => DaemonSet::KIND,
            Self::ReplicaSet => ReplicaSet::KIND,
            Self::StatefulSet => StatefulSet::KIND,
            Self::Job => Job::KIND,
            Self::Service => Service::KIND,
            Self::ConfigMap => ConfigMap::KIND,
            Self::Secret => Secret::KIND,
            Self::PersistentVolume => PersistentVolume::KIND,
            Self::PersistentVolumeClaim => PersistentVolumeClaim::KIND,
            Self::StorageClass => StorageClass::KIND,
            Self::HorizontalPodAutoscaler => HorizontalPodAutoscaler::KIND,
        }
    }

    /// Suffix placed between the object name and `.yaml` in the template file name
    pub fn file_suffix(&self) -> Option<&'static str> {
        match self {
            Self::Pod => Some("pod"),
            Self::ReplicationController => Some("rc"),
            Self::Deployment => Some("deployment"),
            Self::DaemonSet => Some("daemonset"),
            Self::ReplicaSet => Some("rs"),
            Self::StatefulSet => Some("statefulset"),
            Self::Job => Some("job"),
            Self::Service => Some("svc"),
            Self::ConfigMap => None,
            Self::Secret => Some("secret"),
            Self::PersistentVolume => Some("pv"),
            Self::PersistentVolumeClaim => Some("pvc"),
            Self::StorageClass => Some("storage"),
            Self::HorizontalPodAutoscaler => Some("hpa"),
        }
    }

    /// Template file name for an object of this kind
    pub fn template_file_name(&self, name: &str) -> String {
        match self.file_suffix() {
            Some(suffix) => format!("{}.{}.yaml", name, suffix),
            None => format!("{}.yaml", name),
        }
    }

    /// Kinds other objects may reference by name from inside a pod spec
    pub fn is_inside_object(&self) -> bool {
        matches!(
            self,
            Self::Secret | Self::ConfigMap | Self::PersistentVolume | Self::PersistentVolumeClaim
        )
    }

    /// Kinds that can be the scale target of an autoscaler
    pub fn is_scalable(&self) -> bool {
        matches!(
            self,
            Self::Deployment | Self::ReplicaSet | Self::StatefulSet | Self::ReplicationController
        )
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_matches_canonical_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_kind(kind.as_str()), Some(kind));
        }
        assert_eq!(KINDS.len(), ResourceKind::ALL.len());
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(ResourceKind::from_kind("Ingress"), None);
        assert_eq!(ResourceKind::from_kind("configmap"), None);
    }

    #[test]
    fn test_template_file_names() {
        assert_eq!(ResourceKind::Pod.template_file_name("web"), "web.pod.yaml");
        assert_eq!(ResourceKind::Service.template_file_name("web"), "web.svc.yaml");
        assert_eq!(ResourceKind::ConfigMap.template_file_name("conf"), "conf.yaml");
        assert_eq!(
            ResourceKind::StorageClass.template_file_name("fast"),
            "fast.storage.yaml"
        );
    }

    #[test]
    fn test_inside_objects() {
        let inside: Vec<_> = ResourceKind::ALL
            .into_iter()
            .filter(ResourceKind::is_inside_object)
            .collect();
        assert_eq!(
            inside,
            vec![
                ResourceKind::ConfigMap,
                ResourceKind::Secret,
                ResourceKind::PersistentVolume,
                ResourceKind::PersistentVolumeClaim,
            ]
        );
    }
}
