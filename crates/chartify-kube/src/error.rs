//! Error types for chartify-kube

use thiserror::Error;

/// Result type for cluster operations
pub type Result<T> = std::result::Result<T, KubeError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Kubeconfig could not be loaded or the context does not exist
    #[error("kubeconfig error: {0}")]
    Kubeconfig(String),

    /// An object reference that is not `name[@namespace]`
    #[error("invalid object reference '{0}', expected NAME[@NAMESPACE]")]
    InvalidReference(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<kube::config::KubeconfigError> for KubeError {
    fn from(e: kube::config::KubeconfigError) -> Self {
        KubeError::Kubeconfig(e.to_string())
    }
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}
