use std::net::IpAddr;

use serde_json::Value as JsonValue;

use super::{Extras, KindTemplate};
use crate::context::ChartContext;
use crate::error::Result;
use crate::extract::externalize_str;
use crate::kind::ResourceKind;
use crate::manifest::map_at_mut;
use crate::values::{ValueScope, release_scoped};

pub struct ServiceTemplate;

pub static SERVICE: ServiceTemplate = ServiceTemplate;

fn is_ip(value: &JsonValue) -> bool {
    value
        .as_str()
        .is_some_and(|ip| ip.parse::<IpAddr>().is_ok())
}

impl KindTemplate for ServiceTemplate {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Service
    }

    fn customize(
        &self,
        object: &mut JsonValue,
        scope: &mut ValueScope,
        ctx: &ChartContext,
        _extras: &mut Extras,
    ) -> Result<()> {
        let Some(spec) = map_at_mut(object, &["spec"]) else {
            return Ok(());
        };

        // allocated addresses are not portable, `None` is
        if spec.get("clusterIP").is_some_and(is_ip) {
            spec.remove("clusterIP");
        }
        if let Some(JsonValue::Array(ips)) = spec.get("clusterIPs")
            && ips.iter().all(is_ip)
        {
            spec.remove("clusterIPs");
        }

        for field in ["clusterIP", "externalName", "loadBalancerIP", "sessionAffinity"] {
            externalize_str(spec, field, scope, &[field]);
        }
        externalize_str(spec, "type", scope, &["serviceType"]);

        if let Some(JsonValue::Object(selector)) = spec.get_mut("selector") {
            for (key, value) in selector.iter_mut() {
                let Some(literal) = value.as_str() else {
                    continue;
                };
                if ctx.is_release_label(key, literal) {
                    *value = JsonValue::String(release_scoped(literal));
                }
            }
        }

        Ok(())
    }
}
