//! Kind-specific template functions
//!
//! Every supported kind runs through the same pipeline in [`render_object`].
//! A [`KindTemplate`] only describes where its pod spec, selector and numeric
//! fields live, and adds its own scalar extraction in
//! [`KindTemplate::customize`].

mod autoscaling;
mod config;
mod service;
mod storage;
mod workload;

use serde_json::{Map, Value as JsonValue};

use crate::context::ChartContext;
use crate::document::Node;
use crate::error::{GenerationWarning, Result};
use crate::extract::{self, rewrite_selector, selector_pairs};
use crate::kind::ResourceKind;
use crate::manifest::{Manifest, map_at_mut};
use crate::prune::prune;
use crate::sanitize::sanitize;
use crate::values::{ValueScope, safe_key};
use crate::volume;

/// Path of a map inside an object, from the root
pub type FieldPath = &'static [&'static str];

/// Per-kind hooks of the template pipeline
pub trait KindTemplate: Sync {
    fn kind(&self) -> ResourceKind;

    /// Location of the pod spec, for kinds that run pods
    fn pod_spec(&self) -> Option<FieldPath> {
        None
    }

    /// Location of the label selector kept in sync with the pod labels
    fn match_labels(&self) -> Option<FieldPath> {
        None
    }

    /// Nested label maps scrubbed of controller decorations
    fn decorated(&self) -> &'static [FieldPath] {
        &[]
    }

    /// Integer fields emitted as bare expressions, with their values key
    fn numeric_fields(&self) -> &'static [(FieldPath, &'static str)] {
        &[]
    }

    /// Scope the object's values are recorded in
    fn scope(&self, key: &str) -> ValueScope {
        ValueScope::new([key])
    }

    /// Kind-specific extraction, run after metadata and pod spec
    fn customize(
        &self,
        _object: &mut JsonValue,
        _scope: &mut ValueScope,
        _ctx: &ChartContext,
        _extras: &mut Extras,
    ) -> Result<()> {
        Ok(())
    }

    /// Final wrapping of the rendered template text
    fn wrap(&self, text: String, _scope: &ValueScope) -> String {
        text
    }
}

/// Template hooks for a kind
pub fn template_for(kind: ResourceKind) -> &'static dyn KindTemplate {
    match kind {
        ResourceKind::Pod => &workload::POD,
        ResourceKind::ReplicationController => &workload::REPLICATION_CONTROLLER,
        ResourceKind::Deployment => &workload::DEPLOYMENT,
        ResourceKind::DaemonSet => &workload::DAEMON_SET,
        ResourceKind::ReplicaSet => &workload::REPLICA_SET,
        ResourceKind::StatefulSet => &workload::STATEFUL_SET,
        ResourceKind::Job => &workload::JOB,
        ResourceKind::Service => &service::SERVICE,
        ResourceKind::ConfigMap => &config::CONFIG_MAP,
        ResourceKind::Secret => &config::SECRET,
        ResourceKind::PersistentVolume => &storage::PERSISTENT_VOLUME,
        ResourceKind::PersistentVolumeClaim => &storage::PERSISTENT_VOLUME_CLAIM,
        ResourceKind::StorageClass => &storage::STORAGE_CLASS,
        ResourceKind::HorizontalPodAutoscaler => &autoscaling::HORIZONTAL_POD_AUTOSCALER,
    }
}

/// Output collected beside the object tree
#[derive(Debug, Default)]
pub struct Extras {
    /// Raw blocks spliced into the tree after pruning: parent path, key, lines
    blocks: Vec<(FieldPath, String, Vec<String>)>,
    persistence: Map<String, JsonValue>,
    warnings: Vec<GenerationWarning>,
}

impl Extras {
    pub fn block(&mut self, parent: FieldPath, key: &str, lines: Vec<String>) {
        self.blocks.push((parent, key.to_string(), lines));
    }
}

/// One templated object
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedObject {
    pub kind: ResourceKind,
    pub name: String,
    /// Safe key of the object name, its entry in the values document
    pub key: String,
    pub file_name: String,
    pub template: String,
    /// Values merged under `key`
    pub values: Map<String, JsonValue>,
    /// Entries merged under `persistence`
    pub persistence: Map<String, JsonValue>,
    pub warnings: Vec<GenerationWarning>,
}

/// Run the template pipeline for one manifest of a supported kind
pub fn render_object(
    kind: ResourceKind,
    manifest: &Manifest,
    ctx: &ChartContext,
) -> Result<RenderedObject> {
    let template = template_for(kind);
    let key = safe_key(&manifest.name);
    let mut scope = template.scope(&key);
    let mut extras = Extras::default();
    let mut object = manifest.object.clone();

    sanitize(&mut object, template);
    let pairs = selector_pairs(&object, template);
    extract::metadata(&mut object, &manifest.name, &mut scope);

    if let Some(path) = template.pod_spec()
        && let Some(spec) = map_at_mut(&mut object, path)
    {
        extract::pod_spec(spec, &mut scope, ctx);
        if let Some(JsonValue::Array(volumes)) = spec.remove("volumes") {
            let built = volume::build(&volumes, ctx, &manifest.display_name())?;
            extras.persistence.extend(built.persistence);
            extras.warnings.extend(built.warnings);
            if !built.lines.is_empty() {
                extras.block(path, "volumes", built.lines);
            }
        }
    }

    template.customize(&mut object, &mut scope, ctx, &mut extras)?;
    rewrite_selector(&mut object, template, &pairs);
    prune(&mut object);

    let mut node = Node::from(object);
    for &(path, field) in template.numeric_fields() {
        if let Some(slot) = node.pointer_mut(path)
            && let Node::Number(number) = &*slot
        {
            let expression = scope.record(&[field], JsonValue::Number(number.clone()));
            *slot = Node::Expr(expression);
        }
    }
    for (parent, block_key, lines) in extras.blocks {
        splice(&mut node, parent, block_key, lines);
    }

    let template_text = template.wrap(node.to_yaml()?, &scope);
    tracing::debug!(object = %manifest.display_name(), "rendered template");

    let mut warnings = extras.warnings;
    warnings.extend(
        scope
            .conflicts()
            .iter()
            .map(|path| GenerationWarning::value_conflict(path)),
    );

    let (values, persistence) = if scope.prefix().first().map(String::as_str)
        == Some(volume::PERSISTENCE)
    {
        let mut persistence = extras.persistence;
        persistence.insert(key.clone(), scope.into());
        (Map::new(), persistence)
    } else {
        (scope.into_map(), extras.persistence)
    };

    Ok(RenderedObject {
        kind,
        name: manifest.name.clone(),
        file_name: kind.template_file_name(&manifest.name),
        key,
        template: template_text,
        values,
        persistence,
        warnings,
    })
}

/// Insert a raw block at `parent.key`, creating missing parents
fn splice(node: &mut Node, parent: FieldPath, key: String, lines: Vec<String>) {
    let mut current = node;
    for step in parent {
        let Some(map) = current.as_map_mut() else {
            return;
        };
        current = map
            .entry(step.to_string())
            .or_insert_with(|| Node::Map(Default::default()));
    }
    if let Some(map) = current.as_map_mut() {
        map.insert(key, Node::Block(lines));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn render(text: &str, ctx: &ChartContext) -> RenderedObject {
        let manifest = Manifest::parse(text).unwrap();
        let kind = manifest.kind.unwrap();
        render_object(kind, &manifest, ctx).unwrap()
    }

    pub fn values(rendered: &RenderedObject) -> JsonValue {
        JsonValue::Object(rendered.values.clone())
    }
}
