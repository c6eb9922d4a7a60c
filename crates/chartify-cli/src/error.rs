//! CLI error type and its exit codes

use chartify_core::ChartifyError;
use chartify_kube::KubeError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Invalid or missing arguments
    #[error("{message}")]
    #[diagnostic(code(chartify::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manifest could not be templated or the chart cannot be written
    #[error("Chart error: {message}")]
    #[diagnostic(code(chartify::cli::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Fetching objects from the cluster failed
    #[error("Cluster error: {message}")]
    #[diagnostic(
        code(chartify::cli::cluster),
        help("check the kubeconfig context and that the objects exist")
    )]
    Cluster { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(chartify::cli::io))]
    Io { message: String },

    /// Runtime failure outside chart generation
    #[error("Internal error: {message}")]
    #[diagnostic(code(chartify::cli::internal))]
    Internal { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Chart { .. } => exit_codes::CHART_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Cluster { .. } | CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }

    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn chart(message: impl Into<String>) -> Self {
        Self::Chart {
            message: message.into(),
            help: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<ChartifyError> for CliError {
    fn from(err: ChartifyError) -> Self {
        let message = err.to_string();
        match err {
            ChartifyError::Io(e) => e.into(),
            ChartifyError::NotADirectory(_) => CliError::Chart {
                message,
                help: Some("remove the file or choose another --chart-dir".to_string()),
            },
            _ => CliError::chart(message),
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        let message = err.to_string();
        match err {
            KubeError::InvalidReference(_) => CliError::usage(message),
            _ => CliError::Cluster { message },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
