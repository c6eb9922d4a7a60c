//! Pods and the controllers that own a pod template

use serde_json::Value as JsonValue;

use super::{FieldPath, KindTemplate};
use crate::context::ChartContext;
use crate::error::Result;
use crate::extract::{POD_TEMPLATE_LABELS, externalize_str};
use crate::kind::ResourceKind;
use crate::manifest::{map_at_mut, str_field};
use crate::values::{ValueScope, fullname_ref};

const POD_SPEC: FieldPath = &["spec"];
const TEMPLATE_POD_SPEC: FieldPath = &["spec", "template", "spec"];
const MATCH_LABELS: FieldPath = &["spec", "selector", "matchLabels"];
const NESTED_LABELS: &[FieldPath] = &[POD_TEMPLATE_LABELS, MATCH_LABELS];

const REPLICAS: (FieldPath, &str) = (&["spec", "replicas"], "replicas");
const MIN_READY_SECONDS: (FieldPath, &str) = (&["spec", "minReadySeconds"], "minReadySeconds");
const REVISION_HISTORY_LIMIT: (FieldPath, &str) =
    (&["spec", "revisionHistoryLimit"], "revisionHistoryLimit");

/// Kind-specific scalar extraction of a workload
type Extra = fn(&mut JsonValue, &mut ValueScope, &ChartContext);

pub struct Workload {
    kind: ResourceKind,
    pod_spec: FieldPath,
    match_labels: Option<FieldPath>,
    decorated: &'static [FieldPath],
    numeric: &'static [(FieldPath, &'static str)],
    extra: Option<Extra>,
}

impl KindTemplate for Workload {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn pod_spec(&self) -> Option<FieldPath> {
        Some(self.pod_spec)
    }

    fn match_labels(&self) -> Option<FieldPath> {
        self.match_labels
    }

    fn decorated(&self) -> &'static [FieldPath] {
        self.decorated
    }

    fn numeric_fields(&self) -> &'static [(FieldPath, &'static str)] {
        self.numeric
    }

    fn customize(
        &self,
        object: &mut JsonValue,
        scope: &mut ValueScope,
        ctx: &ChartContext,
        _extras: &mut super::Extras,
    ) -> Result<()> {
        if let Some(extra) = self.extra {
            extra(object, scope, ctx);
        }
        Ok(())
    }
}

pub static POD: Workload = Workload {
    kind: ResourceKind::Pod,
    pod_spec: POD_SPEC,
    match_labels: None,
    decorated: &[],
    numeric: &[],
    extra: None,
};

pub static REPLICATION_CONTROLLER: Workload = Workload {
    kind: ResourceKind::ReplicationController,
    pod_spec: TEMPLATE_POD_SPEC,
    match_labels: None,
    decorated: &[],
    numeric: &[REPLICAS, MIN_READY_SECONDS],
    extra: None,
};

pub static DEPLOYMENT: Workload = Workload {
    kind: ResourceKind::Deployment,
    pod_spec: TEMPLATE_POD_SPEC,
    match_labels: Some(MATCH_LABELS),
    decorated: NESTED_LABELS,
    numeric: &[REPLICAS, MIN_READY_SECONDS, REVISION_HISTORY_LIMIT],
    extra: Some(strategy_type),
};

pub static DAEMON_SET: Workload = Workload {
    kind: ResourceKind::DaemonSet,
    pod_spec: TEMPLATE_POD_SPEC,
    match_labels: Some(MATCH_LABELS),
    decorated: &[],
    numeric: &[MIN_READY_SECONDS, REVISION_HISTORY_LIMIT],
    extra: None,
};

pub static REPLICA_SET: Workload = Workload {
    kind: ResourceKind::ReplicaSet,
    pod_spec: TEMPLATE_POD_SPEC,
    match_labels: Some(MATCH_LABELS),
    decorated: NESTED_LABELS,
    numeric: &[REPLICAS, MIN_READY_SECONDS],
    extra: None,
};

pub static STATEFUL_SET: Workload = Workload {
    kind: ResourceKind::StatefulSet,
    pod_spec: TEMPLATE_POD_SPEC,
    match_labels: Some(MATCH_LABELS),
    decorated: &[],
    numeric: &[REPLICAS, MIN_READY_SECONDS, REVISION_HISTORY_LIMIT],
    extra: Some(service_name),
};

pub static JOB: Workload = Workload {
    kind: ResourceKind::Job,
    pod_spec: TEMPLATE_POD_SPEC,
    match_labels: Some(MATCH_LABELS),
    decorated: NESTED_LABELS,
    numeric: &[],
    extra: None,
};

fn strategy_type(object: &mut JsonValue, scope: &mut ValueScope, _ctx: &ChartContext) {
    if let Some(strategy) = map_at_mut(object, &["spec", "strategy"]) {
        externalize_str(strategy, "type", scope, &["strategyType"]);
    }
}

/// The governing Service is part of the chart or an external name
fn service_name(object: &mut JsonValue, scope: &mut ValueScope, ctx: &ChartContext) {
    let Some(spec) = map_at_mut(object, &["spec"]) else {
        return;
    };
    let Some(name) = str_field(spec, "serviceName").map(str::to_string) else {
        return;
    };
    if ctx.has_service(&name) {
        spec.insert("serviceName".to_string(), JsonValue::String(fullname_ref(&name)));
    } else {
        externalize_str(spec, "serviceName", scope, &["serviceName"]);
    }
}
