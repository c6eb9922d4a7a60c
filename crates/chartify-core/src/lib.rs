//! Chartify Core - Kubernetes manifests to Helm chart generator
//!
//! This crate turns a batch of Kubernetes objects into a Helm chart. Every
//! object becomes a template in which the environment-specific fields
//! (names, images, replica counts, storage parameters, secrets) read from
//! the chart's `values.yaml`, which captures the original literals.
//!
//! | Field | Template |
//! |-------|----------|
//! | `metadata.name: web` | `{{ template "fullname" . }}-web` |
//! | `image: nginx:1.14` | `{{.Values.web.nginx.image}}:{{.Values.web.nginx.imageTag}}` |
//! | `replicas: 3` | `{{.Values.web.replicas}}` |
//! | `nfs.server: 10.0.0.2` | `{{.Values.persistence.data.server}}` behind `persistence.data.enabled` |
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use chartify_core::{GenerateOptions, Generator, read_manifest_dir};
//!
//! let manifests = read_manifest_dir(Path::new("./manifests")).unwrap();
//! let result = Generator::new(GenerateOptions::default())
//!     .create("mychart", Path::new("./charts"), &manifests)
//!     .unwrap();
//!
//! for template in &result.templates {
//!     println!("wrote {}", template.display());
//! }
//! for warning in &result.warnings {
//!     println!("{}", warning);
//! }
//! ```

pub mod chart;
pub mod context;
pub mod document;
pub mod error;
pub mod extract;
pub mod generator;
pub mod kind;
pub mod manifest;
pub mod prune;
pub mod sanitize;
pub mod source;
pub mod template;
pub mod values;
pub mod volume;

// Re-exports
pub use chart::ChartFile;
pub use context::ChartContext;
pub use error::{
    ChartifyError, GenerationWarning, Result, WarningCategory, WarningSeverity,
};
pub use generator::{GenerateOptions, GenerationResult, Generator, create};
pub use kind::ResourceKind;
pub use manifest::Manifest;
pub use source::{read_manifest_dir, split_documents};
pub use template::{RenderedObject, render_object};
pub use values::{Values, safe_key};
