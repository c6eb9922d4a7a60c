//! Fetching selected objects from a live cluster

use std::fmt::Debug;

use chartify_core::ResourceKind;
use futures::future::try_join_all;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    ConfigMap, PersistentVolume, PersistentVolumeClaim, Pod, ReplicationController, Secret,
    Service,
};
use k8s_openapi::api::storage::v1::StorageClass;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, Resource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::objects::{ObjectRef, ObjectSelection};

/// Reads objects from the cluster of the current (or a named) kubeconfig context
#[derive(Debug, Clone, Default)]
pub struct ClusterSource {
    context: Option<String>,
}

impl ClusterSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a named kubeconfig context instead of the current one
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    async fn client(&self) -> Result<Client> {
        let Some(context) = &self.context else {
            return Ok(Client::try_default().await?);
        };

        let kubeconfig = Kubeconfig::read()?;
        let options = KubeConfigOptions {
            context: Some(context.clone()),
            cluster: None,
            user: None,
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options).await?;
        Ok(Client::try_from(config)?)
    }

    /// Fetch every selected object as a manifest text, in selection order
    pub async fn fetch(&self, selection: &ObjectSelection) -> Result<Vec<String>> {
        if selection.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.client().await?;
        try_join_all(
            selection
                .iter()
                .map(|(kind, reference)| fetch_object(client.clone(), *kind, reference)),
        )
        .await
    }
}

async fn fetch_object(client: Client, kind: ResourceKind, reference: &ObjectRef) -> Result<String> {
    tracing::debug!(kind = kind.as_str(), object = %reference, "fetching");
    match kind {
        ResourceKind::Pod => namespaced::<Pod>(client, reference).await,
        ResourceKind::ReplicationController => {
            namespaced::<ReplicationController>(client, reference).await
        }
        ResourceKind::Deployment => namespaced::<Deployment>(client, reference).await,
        ResourceKind::DaemonSet => namespaced::<DaemonSet>(client, reference).await,
        ResourceKind::ReplicaSet => namespaced::<ReplicaSet>(client, reference).await,
        ResourceKind::StatefulSet => namespaced::<StatefulSet>(client, reference).await,
        ResourceKind::Job => namespaced::<Job>(client, reference).await,
        ResourceKind::Service => namespaced::<Service>(client, reference).await,
        ResourceKind::ConfigMap => namespaced::<ConfigMap>(client, reference).await,
        ResourceKind::Secret => namespaced::<Secret>(client, reference).await,
        ResourceKind::PersistentVolumeClaim => {
            namespaced::<PersistentVolumeClaim>(client, reference).await
        }
        ResourceKind::HorizontalPodAutoscaler => {
            namespaced::<HorizontalPodAutoscaler>(client, reference).await
        }
        ResourceKind::PersistentVolume => cluster::<PersistentVolume>(client, reference).await,
        ResourceKind::StorageClass => cluster::<StorageClass>(client, reference).await,
    }
}

async fn namespaced<K>(client: Client, reference: &ObjectRef) -> Result<String>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client, &reference.namespace);
    to_manifest(&api.get(&reference.name).await?)
}

async fn cluster<K>(client: Client, reference: &ObjectRef) -> Result<String>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    K::DynamicType: Default,
{
    let api: Api<K> = Api::all(client);
    to_manifest(&api.get(&reference.name).await?)
}

/// Serialize a fetched object to YAML, without its status and field managers
pub fn to_manifest<K: Serialize>(object: &K) -> Result<String> {
    let mut value = serde_json::to_value(object)?;
    if let Some(map) = value.as_object_mut() {
        map.remove("status");
        if let Some(metadata) = map.get_mut("metadata").and_then(JsonValue::as_object_mut) {
            metadata.remove("managedFields");
        }
    }
    Ok(serde_yaml::to_string(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartify_core::Manifest;
    use k8s_openapi::api::core::v1::{PersistentVolumeSpec, PodSpec, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ManagedFieldsEntry, ObjectMeta};

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("shop".to_string()),
            managed_fields: Some(vec![ManagedFieldsEntry {
                manager: Some("kubectl".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_manifest_drops_status_and_managed_fields() {
        let pod = Pod {
            metadata: meta("web"),
            spec: Some(PodSpec::default()),
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                ..Default::default()
            }),
        };

        let text = to_manifest(&pod).unwrap();
        assert!(!text.contains("status"));
        assert!(!text.contains("managedFields"));
        assert!(!text.contains("kubectl"));

        let manifest = Manifest::parse(&text).unwrap();
        assert_eq!(manifest.kind, Some(ResourceKind::Pod));
        assert_eq!(manifest.name, "web");
        assert_eq!(manifest.object["apiVersion"], "v1");
        assert_eq!(manifest.object["metadata"]["namespace"], "shop");
    }

    #[test]
    fn test_cluster_scoped_manifest() {
        let pv = PersistentVolume {
            metadata: meta("data"),
            spec: Some(PersistentVolumeSpec {
                persistent_volume_reclaim_policy: Some("Retain".to_string()),
                ..Default::default()
            }),
            status: None,
        };

        let manifest = Manifest::parse(&to_manifest(&pv).unwrap()).unwrap();
        assert_eq!(manifest.kind, Some(ResourceKind::PersistentVolume));
        assert_eq!(
            manifest.object["spec"]["persistentVolumeReclaimPolicy"],
            "Retain"
        );
    }

    #[tokio::test]
    async fn test_empty_selection_needs_no_cluster() {
        let manifests = ClusterSource::new().fetch(&ObjectSelection::new()).await.unwrap();
        assert!(manifests.is_empty());
    }

    #[test]
    fn test_source_context() {
        let source = ClusterSource::new().with_context(Some("staging".to_string()));
        assert_eq!(source.context.as_deref(), Some("staging"));
    }
}
