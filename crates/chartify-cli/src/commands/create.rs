//! Create command - generate a chart from manifests or cluster objects

use std::fs;
use std::path::{Path, PathBuf};

use chartify_core::{GenerateOptions, GenerationResult, Generator, ResourceKind, read_manifest_dir};
use chartify_kube::{ClusterSource, ObjectRef, ObjectSelection};
use clap::Args;
use console::style;

use crate::error::{CliError, Result};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Chart name
    pub name: String,

    /// Directory of manifest files to template instead of cluster objects
    #[arg(long, env = "CHARTIFY_KUBE_DIR")]
    pub kube_dir: Option<PathBuf>,

    /// Directory the chart is created in
    #[arg(long, env = "CHARTIFY_CHART_DIR", default_value = "charts")]
    pub chart_dir: PathBuf,

    /// Kubeconfig context used to fetch cluster objects
    #[arg(long)]
    pub context: Option<String>,

    /// Render the chart without writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Pods, as NAME[@NAMESPACE],...
    #[arg(long, value_delimiter = ',')]
    pub pods: Vec<String>,

    /// Replication controllers
    #[arg(long, value_delimiter = ',')]
    pub rcs: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub services: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub configmaps: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub secrets: Vec<String>,

    /// Persistent volumes (cluster scoped, namespace ignored)
    #[arg(long, value_delimiter = ',')]
    pub pvs: Vec<String>,

    /// Persistent volume claims
    #[arg(long, value_delimiter = ',')]
    pub pvcs: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub statefulsets: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub jobs: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub replicasets: Vec<String>,

    /// Daemon sets
    #[arg(long, value_delimiter = ',')]
    pub daemons: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub deployments: Vec<String>,

    /// Storage classes (cluster scoped, namespace ignored)
    #[arg(long, value_delimiter = ',')]
    pub storageclasses: Vec<String>,

    /// Horizontal pod autoscalers
    #[arg(long, value_delimiter = ',')]
    pub hpas: Vec<String>,
}

impl CreateArgs {
    /// Cluster objects named on the command line
    fn selection(&self) -> Result<ObjectSelection> {
        let flags: [(ResourceKind, &[String]); 14] = [
            (ResourceKind::Pod, &self.pods),
            (ResourceKind::ReplicationController, &self.rcs),
            (ResourceKind::Service, &self.services),
            (ResourceKind::ConfigMap, &self.configmaps),
            (ResourceKind::Secret, &self.secrets),
            (ResourceKind::PersistentVolume, &self.pvs),
            (ResourceKind::PersistentVolumeClaim, &self.pvcs),
            (ResourceKind::StatefulSet, &self.statefulsets),
            (ResourceKind::Job, &self.jobs),
            (ResourceKind::ReplicaSet, &self.replicasets),
            (ResourceKind::DaemonSet, &self.daemons),
            (ResourceKind::Deployment, &self.deployments),
            (ResourceKind::StorageClass, &self.storageclasses),
            (ResourceKind::HorizontalPodAutoscaler, &self.hpas),
        ];

        let mut selection = ObjectSelection::new();
        for (kind, references) in flags {
            for reference in references.iter().filter(|r| !r.trim().is_empty()) {
                selection.add(kind, ObjectRef::parse(reference)?);
            }
        }
        Ok(selection)
    }
}

pub fn run(args: &CreateArgs) -> Result<()> {
    let selection = args.selection()?;
    if args.kube_dir.is_none() && selection.is_empty() {
        return Err(CliError::usage_with_help(
            "No object given.",
            "pass --kube-dir or name objects with --pods, --services, --deployments, ...",
        ));
    }

    prepare_chart_dir(&args.chart_dir, args.dry_run)?;

    let manifests = match &args.kube_dir {
        Some(dir) => read_manifest_dir(dir)?,
        None => fetch_cluster_objects(&selection, args.context.clone())?,
    };
    tracing::info!(objects = manifests.len(), chart = %args.name, "generating chart");

    let result = Generator::new(GenerateOptions {
        dry_run: args.dry_run,
    })
    .create(&args.name, &args.chart_dir, &manifests)?;

    print_summary(&result, args.dry_run);
    Ok(())
}

fn prepare_chart_dir(chart_dir: &Path, dry_run: bool) -> Result<()> {
    if chart_dir.exists() {
        if !chart_dir.is_dir() {
            return Err(CliError::chart(format!(
                "{} is not a directory",
                chart_dir.display()
            )));
        }
    } else if !dry_run {
        fs::create_dir_all(chart_dir)?;
    }
    Ok(())
}

fn fetch_cluster_objects(selection: &ObjectSelection, context: Option<String>) -> Result<Vec<String>> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::internal(format!("failed to start runtime: {}", e)))?;
    let source = ClusterSource::new().with_context(context);
    Ok(runtime.block_on(source.fetch(selection))?)
}

fn print_summary(result: &GenerationResult, dry_run: bool) {
    let verb = if dry_run { "Would create" } else { "Created" };
    println!(
        "{} {} chart at {}",
        style("→").blue(),
        verb,
        style(result.chart_dir.display()).cyan()
    );

    if result.chart_file_written {
        println!("  {} Chart.yaml", style("✓").green());
    } else {
        println!("  {} Chart.yaml (kept existing)", style("•").dim());
    }
    println!("  {} values.yaml", style("✓").green());
    for template in &result.templates {
        let name = template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  {} templates/{}", style("✓").green(), name);
    }

    for object in &result.skipped {
        println!("  {} skipped {}", style("⚠").yellow(), object);
    }

    if !result.warnings.is_empty() {
        println!();
        println!("{} {} warning(s):", style("⚠").yellow(), result.warnings.len());
        for warning in &result.warnings {
            println!("  {}", warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CreateArgs,
    }

    fn parse(argv: &[&str]) -> CreateArgs {
        TestCli::parse_from(std::iter::once("chartify").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_selection_from_flags() {
        let args = parse(&["shop", "--services", "web@shop,db", "--pvs", "data"]);
        let selection = args.selection().unwrap();

        let objects: Vec<_> = selection
            .iter()
            .map(|(kind, r)| format!("{}/{}", kind.as_str(), r))
            .collect();
        assert_eq!(
            objects,
            vec![
                "Service/web@shop",
                "Service/db@default",
                "PersistentVolume/data@default"
            ]
        );
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["shop"]);
        assert_eq!(args.chart_dir, PathBuf::from("charts"));
        assert!(args.kube_dir.is_none());
        assert!(args.selection().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_reference() {
        let args = parse(&["shop", "--pods", "web@"]);
        assert_eq!(args.selection().unwrap_err().exit_code(), 64);
    }
}
