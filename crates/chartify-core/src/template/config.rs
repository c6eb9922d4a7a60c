//! ConfigMaps and Secrets

use serde_json::Value as JsonValue;

use super::{Extras, FieldPath, KindTemplate};
use crate::context::ChartContext;
use crate::document::quote;
use crate::error::Result;
use crate::extract::externalize_str;
use crate::kind::ResourceKind;
use crate::values::ValueScope;

const ROOT: FieldPath = &[];

/// Default for secret data nobody overrides
const RANDOM_DATA: &str = "{{ randAlphaNum 10 | b64enc | quote }}";

pub struct ConfigMapTemplate;

pub static CONFIG_MAP: ConfigMapTemplate = ConfigMapTemplate;

impl KindTemplate for ConfigMapTemplate {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ConfigMap
    }
}

pub struct SecretTemplate;

pub static SECRET: SecretTemplate = SecretTemplate;

impl KindTemplate for SecretTemplate {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Secret
    }

    fn customize(
        &self,
        object: &mut JsonValue,
        scope: &mut ValueScope,
        _ctx: &ChartContext,
        extras: &mut Extras,
    ) -> Result<()> {
        let Some(root) = object.as_object_mut() else {
            return Ok(());
        };
        externalize_str(root, "type", scope, &["type"]);

        let Some(JsonValue::Object(data)) = root.remove("data") else {
            return Ok(());
        };
        let mut entries: Vec<_> = data.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut lines = Vec::new();
        for (key, value) in entries {
            let field = data_field(&key);
            scope.record(&[field], value);
            let reference = data_reference(&scope.path(&[]), field);
            let key = quote(&key)?;
            lines.push(format!("  {{{{ if {} }}}}", reference));
            lines.push(format!("  {}: {{{{{}}}}}", key, reference));
            lines.push("  {{ else }}".to_string());
            lines.push(format!("  {}: {}", key, RANDOM_DATA));
            lines.push("  {{ end }}".to_string());
        }
        if !lines.is_empty() {
            extras.block(ROOT, "data", lines);
        }
        Ok(())
    }
}

/// Values key of a data entry: one leading dot stripped
fn data_field(key: &str) -> &str {
    key.strip_prefix('.').unwrap_or(key)
}

/// Template reference to a data value.
///
/// Keys that are not plain identifiers, such as `tls.crt`, are read with
/// `index` so the dot is not taken as a path separator.
fn data_reference(scope_path: &str, field: &str) -> String {
    let scope_path = scope_path.trim_end_matches('.');
    let plain = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        format!("{}.{}", scope_path, field)
    } else {
        format!("index {} {:?}", scope_path, field)
    }
}
