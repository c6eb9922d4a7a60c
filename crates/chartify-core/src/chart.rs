//! Chart metadata and the static helper templates

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name of the chart metadata
pub const CHART_FILE: &str = "Chart.yaml";
/// File name of the values document
pub const VALUES_FILE: &str = "values.yaml";
/// Directory holding the templates
pub const TEMPLATES_DIR: &str = "templates";
/// File name of the helper templates
pub const HELPERS_FILE: &str = "_helpers.tpl";

pub const DEFAULT_DESCRIPTION: &str = "Helm chart generated by https://github.com/kubepack/chartify";

/// `name` and `fullname` helpers referenced by every generated template
pub const HELPERS: &str = r#"{{/* vim: set filetype=mustache: */}}
{{/*
Expand the name of the chart.
*/}}
{{- define "name" -}}
{{- default .Chart.Name .Values.nameOverride | trunc 24 -}}
{{- end -}}

{{/*
Create a default fully qualified app name.
We truncate at 24 chars because some Kubernetes name fields are limited to this (by the DNS naming spec).
*/}}
{{- define "fullname" -}}
{{- $name := default .Chart.Name .Values.nameOverride -}}
{{- printf "%s-%s" .Release.Name $name | trunc 24 -}}
{{- end -}}
"#;

/// Helm `Chart.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFile {
    pub api_version: String,
    pub name: String,
    pub description: String,
    pub version: Version,
}

impl ChartFile {
    /// Metadata of a freshly generated chart
    pub fn new(name: &str) -> Self {
        Self {
            api_version: "v1".to_string(),
            name: name.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            version: Version::new(0, 1, 0),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_file_yaml() {
        let chart = ChartFile::new("mychart");
        assert_eq!(
            chart.to_yaml().unwrap(),
            "apiVersion: v1\nname: mychart\ndescription: Helm chart generated by https://github.com/kubepack/chartify\nversion: 0.1.0\n"
        );
        let parsed: ChartFile = serde_yaml::from_str(&chart.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, chart);
    }

    #[test]
    fn test_helpers_define_fullname() {
        assert!(HELPERS.contains(r#"{{- define "fullname" -}}"#));
        assert!(HELPERS.contains(r#"{{- define "name" -}}"#));
        assert!(HELPERS.contains("trunc 24"));
    }
}
