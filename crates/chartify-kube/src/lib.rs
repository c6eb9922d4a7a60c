//! Chartify Kube - live cluster source for chartify
//!
//! Fetches named objects from a Kubernetes cluster and hands them back as
//! manifest texts, ready for [`chartify_core::Generator::create`].
//!
//! ```no_run
//! # async fn run() -> chartify_kube::Result<()> {
//! use chartify_core::ResourceKind;
//! use chartify_kube::{ClusterSource, ObjectSelection};
//!
//! let mut selection = ObjectSelection::new();
//! selection.add_list(ResourceKind::Deployment, "web@shop,worker@shop")?;
//!
//! let manifests = ClusterSource::new().fetch(&selection).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod objects;
pub mod source;

pub use error::{KubeError, Result};
pub use objects::{DEFAULT_NAMESPACE, ObjectRef, ObjectSelection};
pub use source::{ClusterSource, to_manifest};
