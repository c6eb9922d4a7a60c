//! Cross-object lookup shared by every template function of a run
//!
//! Built once from the whole batch before any object is templated, then
//! passed down read-only.

use std::collections::{BTreeMap, BTreeSet};

use crate::extract::selector_pairs;
use crate::kind::ResourceKind;
use crate::manifest::Manifest;
use crate::sanitize::sanitize;
use crate::template::template_for;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartContext {
    /// Names of Secrets, ConfigMaps, PersistentVolumes and PersistentVolumeClaims
    inside_objects: BTreeMap<ResourceKind, BTreeSet<String>>,
    services: BTreeSet<String>,
    scale_targets: BTreeSet<(ResourceKind, String)>,
    /// Label pairs whose value a workload selector prefixes with the release name
    release_labels: BTreeSet<(String, String)>,
}

impl ChartContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every object of the batch
    pub fn from_manifests<'a, I>(manifests: I) -> Self
    where
        I: IntoIterator<Item = &'a Manifest>,
    {
        let mut context = Self::new();
        for manifest in manifests {
            let Some(kind) = manifest.kind else {
                continue;
            };
            context.add_object(kind, &manifest.name);

            let template = template_for(kind);
            if template.match_labels().is_some() {
                let mut object = manifest.object.clone();
                sanitize(&mut object, template);
                context
                    .release_labels
                    .extend(selector_pairs(&object, template));
            }
        }
        context
    }

    /// Register an object by kind and name
    pub fn add_object(&mut self, kind: ResourceKind, name: &str) {
        if kind.is_inside_object() {
            self.inside_objects
                .entry(kind)
                .or_default()
                .insert(name.to_string());
        } else if kind == ResourceKind::Service {
            self.services.insert(name.to_string());
        } else if kind.is_scalable() {
            self.scale_targets.insert((kind, name.to_string()));
        }
    }

    pub fn with_object(mut self, kind: ResourceKind, name: &str) -> Self {
        self.add_object(kind, name);
        self
    }

    pub fn with_release_label(mut self, key: &str, value: &str) -> Self {
        self.release_labels
            .insert((key.to_string(), value.to_string()));
        self
    }

    /// Whether a referenced Secret, ConfigMap, PV or PVC belongs to the chart
    pub fn is_inside_object(&self, kind: ResourceKind, name: &str) -> bool {
        self.inside_objects
            .get(&kind)
            .is_some_and(|names| names.contains(name))
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains(name)
    }

    pub fn is_scale_target(&self, kind: &str, name: &str) -> bool {
        ResourceKind::from_kind(kind)
            .is_some_and(|kind| self.scale_targets.contains(&(kind, name.to_string())))
    }

    /// Whether some workload of the batch rewrote `key: value` in its selector
    pub fn is_release_label(&self, key: &str, value: &str) -> bool {
        self.release_labels
            .contains(&(key.to_string(), value.to_string()))
    }
}
