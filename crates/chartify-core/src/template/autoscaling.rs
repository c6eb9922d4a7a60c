use serde_json::Value as JsonValue;

use super::{Extras, FieldPath, KindTemplate};
use crate::context::ChartContext;
use crate::error::Result;
use crate::kind::ResourceKind;
use crate::manifest::{map_at_mut, str_field};
use crate::values::{ValueScope, fullname_ref};

pub struct AutoscalerTemplate;

pub static HORIZONTAL_POD_AUTOSCALER: AutoscalerTemplate = AutoscalerTemplate;

impl KindTemplate for AutoscalerTemplate {
    fn kind(&self) -> ResourceKind {
        ResourceKind::HorizontalPodAutoscaler
    }

    fn numeric_fields(&self) -> &'static [(FieldPath, &'static str)] {
        &[
            (&["spec", "minReplicas"], "minReplicas"),
            (&["spec", "maxReplicas"], "maxReplicas"),
            (
                &["spec", "targetCPUUtilizationPercentage"],
                "targetCPUUtilizationPercentage",
            ),
        ]
    }

    fn customize(
        &self,
        object: &mut JsonValue,
        _scope: &mut ValueScope,
        ctx: &ChartContext,
        _extras: &mut Extras,
    ) -> Result<()> {
        let Some(target) = map_at_mut(object, &["spec", "scaleTargetRef"]) else {
            return Ok(());
        };
        let (Some(kind), Some(name)) = (str_field(target, "kind"), str_field(target, "name"))
        else {
            return Ok(());
        };
        if ctx.is_scale_target(kind, name) {
            let reference = fullname_ref(name);
            target.insert("name".to_string(), JsonValue::String(reference));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{render, values};
    use super::*;
    use serde_json::json;

    const HPA: &str = r#"
apiVersion: autoscaling/v1
kind: HorizontalPodAutoscaler
metadata:
  name: web
spec:
  scaleTargetRef:
    apiVersion: apps/v1
    kind: Deployment
    name: web
  minReplicas: 2
  maxReplicas: 10
  targetCPUUtilizationPercentage: 80
"#;

    #[test]
    fn test_replica_bounds_are_expressions() {
        let rendered = render(HPA, &ChartContext::new());

        assert_eq!(rendered.file_name, "web.hpa.yaml");
        assert!(rendered.template.contains("  maxReplicas: {{.Values.web.maxReplicas}}\n"));
        assert!(rendered.template.contains("  minReplicas: {{.Values.web.minReplicas}}\n"));
        assert!(rendered.template.contains(
            "  targetCPUUtilizationPercentage: {{.Values.web.targetCPUUtilizationPercentage}}\n"
        ));
        assert!(rendered.template.contains("    name: web\n"));
        assert_eq!(
            values(&rendered),
            json!({"minReplicas": 2, "maxReplicas": 10, "targetCPUUtilizationPercentage": 80})
        );
    }

    #[test]
    fn test_scale_target_in_batch() {
        let ctx = ChartContext::new().with_object(ResourceKind::Deployment, "web");
        let rendered = render(HPA, &ctx);
        assert!(rendered
            .template
            .contains("    name: '{{ template \"fullname\" . }}-web'\n"));
    }
}
