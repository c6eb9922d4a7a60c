//! Chart generator
//!
//! Parses and renders the whole batch in memory, then writes the chart
//! directory in one pass.

use std::fs;
use std::path::{Path, PathBuf};

use crate::chart::{CHART_FILE, ChartFile, HELPERS, HELPERS_FILE, TEMPLATES_DIR, VALUES_FILE};
use crate::context::ChartContext;
use crate::error::{ChartifyError, GenerationWarning, Result, WarningSeverity};
use crate::manifest::Manifest;
use crate::template::render_object;
use crate::values::Values;
use crate::volume::PERSISTENCE;

/// Options for the generator
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Render everything but write nothing
    pub dry_run: bool,
}

/// Result of a generation run
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// `<location>/<chart name>`
    pub chart_dir: PathBuf,
    /// Template files, in input order
    pub templates: Vec<PathBuf>,
    /// Objects skipped because their kind is not supported, as `Kind/name`
    pub skipped: Vec<String>,
    pub warnings: Vec<GenerationWarning>,
    pub values_file: PathBuf,
    /// False when an existing Chart.yaml was kept
    pub chart_file_written: bool,
}

/// A rendered chart, not yet on disk
struct RenderedChart {
    templates: Vec<(String, String)>,
    values: Values,
    skipped: Vec<String>,
    warnings: Vec<GenerationWarning>,
}

pub struct Generator {
    options: GenerateOptions,
}

impl Generator {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    /// Generate chart `chart_name` under `location` from manifest texts
    pub fn create<S: AsRef<str>>(
        &self,
        chart_name: &str,
        location: &Path,
        manifests: &[S],
    ) -> Result<GenerationResult> {
        let chart_dir = location.join(chart_name);
        if chart_dir.exists() && !chart_dir.is_dir() {
            return Err(ChartifyError::NotADirectory(chart_dir));
        }

        let manifests = manifests
            .iter()
            .map(|text| Manifest::parse(text.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let rendered = render_chart(&manifests)?;

        let templates_dir = chart_dir.join(TEMPLATES_DIR);
        let chart_file = chart_dir.join(CHART_FILE);
        let values_file = chart_dir.join(VALUES_FILE);
        let chart_file_written = !chart_file.exists();
        let templates = rendered
            .templates
            .iter()
            .map(|(file_name, _)| templates_dir.join(file_name))
            .collect();

        if self.options.dry_run {
            tracing::debug!(chart = %chart_dir.display(), "dry run, nothing written");
        } else {
            fs::create_dir_all(&templates_dir)?;
            if chart_file_written {
                fs::write(&chart_file, ChartFile::new(chart_name).to_yaml()?)?;
            }
            fs::write(templates_dir.join(HELPERS_FILE), HELPERS)?;
            for (file_name, text) in &rendered.templates {
                fs::write(templates_dir.join(file_name), text)?;
            }
            fs::write(&values_file, rendered.values.to_yaml()?)?;
        }

        Ok(GenerationResult {
            chart_dir,
            templates,
            skipped: rendered.skipped,
            warnings: rendered.warnings,
            values_file,
            chart_file_written,
        })
    }
}

fn render_chart(manifests: &[Manifest]) -> Result<RenderedChart> {
    let ctx = ChartContext::from_manifests(manifests);
    let mut chart = RenderedChart {
        templates: Vec::new(),
        values: Values::new(),
        skipped: Vec::new(),
        warnings: Vec::new(),
    };

    for manifest in manifests {
        let Some(kind) = manifest.kind else {
            chart.skipped.push(manifest.display_name());
            chart
                .warnings
                .push(GenerationWarning::unsupported_kind(&manifest.kind_name, &manifest.name));
            continue;
        };

        let rendered = render_object(kind, manifest, &ctx)?;
        tracing::debug!(object = %manifest.display_name(), file = %rendered.file_name, "templated");

        chart.warnings.extend(rendered.warnings);
        for (key, values) in [
            (rendered.key.as_str(), rendered.values),
            (PERSISTENCE, rendered.persistence),
        ] {
            if values.is_empty() {
                continue;
            }
            for path in chart.values.merge_at(key, values) {
                chart.warnings.push(GenerationWarning::value_conflict(&path));
            }
        }
        chart.templates.push((rendered.file_name, rendered.template));
    }

    chart.warnings.iter().for_each(log_warning);
    Ok(chart)
}

fn log_warning(warning: &GenerationWarning) {
    match warning.severity {
        WarningSeverity::Info => tracing::info!(object = %warning.object, "{}", warning.message),
        WarningSeverity::Warning => tracing::warn!(object = %warning.object, "{}", warning.message),
    }
}

/// Generate a chart with default options
pub fn create<S: AsRef<str>>(
    chart_name: &str,
    location: &Path,
    manifests: &[S],
) -> Result<GenerationResult> {
    Generator::new(GenerateOptions::default()).create(chart_name, location, manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SERVICE: &str = "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\nspec:\n  type: NodePort\n  ports:\n  - port: 80\n";
    const DEPLOYMENT: &str = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\nspec:\n  replicas: 2\n  template:\n    spec:\n      containers:\n      - name: nginx\n        image: nginx:1.14\n";

    #[test]
    fn test_same_name_values_merge() {
        let dir = TempDir::new().unwrap();
        let result = create("mychart", dir.path(), &[SERVICE, DEPLOYMENT]).unwrap();

        assert!(result.warnings.is_empty());
        let values: serde_json::Value =
            serde_yaml::from_str(&fs::read_to_string(&result.values_file).unwrap()).unwrap();
        assert_eq!(values["web"]["serviceType"], "NodePort");
        assert_eq!(values["web"]["replicas"], 2);
        assert_eq!(values["web"]["nginx"]["image"], "nginx");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let result = Generator::new(GenerateOptions { dry_run: true })
            .create("mychart", dir.path(), &[SERVICE])
            .unwrap();

        assert_eq!(result.templates, vec![dir.path().join("mychart/templates/web.svc.yaml")]);
        assert!(result.chart_file_written);
        assert!(!result.chart_dir.exists());
    }

    #[test]
    fn test_malformed_manifest_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        let err = create("mychart", dir.path(), &[SERVICE, "kind: [unclosed"]).unwrap_err();

        assert!(matches!(err, ChartifyError::Yaml(_)));
        assert!(!dir.path().join("mychart").exists());
    }

    #[test]
    fn test_missing_api_version() {
        let dir = TempDir::new().unwrap();
        let err = create("mychart", dir.path(), &["kind: Pod\nmetadata:\n  name: a\n"]).unwrap_err();
        assert!(matches!(err, ChartifyError::MissingField("apiVersion")));
    }
}
