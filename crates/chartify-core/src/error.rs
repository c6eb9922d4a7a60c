//! Error and warning types for chart generation
//!
//! Errors abort the whole run. Warnings are collected into the
//! [`GenerationResult`](crate::GenerationResult) and the run continues.

use std::path::PathBuf;
use thiserror::Error;

/// Chart generation error
#[derive(Debug, Error)]
pub enum ChartifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("{0} already exists and is not a directory")]
    NotADirectory(PathBuf),

    #[error("Failed to read manifest directory {path}: {message}")]
    Source { path: PathBuf, message: String },
}

/// Result type for chartify operations
pub type Result<T> = std::result::Result<T, ChartifyError>;

// =============================================================================
// WARNING SYSTEM
// =============================================================================

/// Warning severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarningSeverity {
    /// Informational, the chart is complete
    Info,
    /// The chart was produced but needs a manual look
    Warning,
}

impl WarningSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

/// What a warning is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCategory {
    /// Object kind has no template function
    UnsupportedKind,
    /// Volume source emitted without templating
    VolumeSource,
    /// Values document entry replaced by a different value
    ValueConflict,
}

impl WarningCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnsupportedKind => "unsupported-kind",
            Self::VolumeSource => "volume-source",
            Self::ValueConflict => "value-conflict",
        }
    }
}

/// A non-fatal finding produced while generating a chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationWarning {
    pub severity: WarningSeverity,
    pub category: WarningCategory,
    /// Object the warning is about, as `Kind/name`
    pub object: String,
    pub message: String,
}

impl GenerationWarning {
    pub fn info(category: WarningCategory, object: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: WarningSeverity::Info,
            category,
            object: object.into(),
            message: message.into(),
        }
    }

    pub fn warning(
        category: WarningCategory,
        object: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: WarningSeverity::Warning,
            category,
            object: object.into(),
            message: message.into(),
        }
    }

    /// Kind not handled by any template function
    pub fn unsupported_kind(kind: &str, name: &str) -> Self {
        Self::info(
            WarningCategory::UnsupportedKind,
            format!("{}/{}", kind, name),
            format!("{} is not supported. Please add manually.", kind),
        )
    }

    /// Volume source with no templating rule
    pub fn untemplated_volume(object: &str, volume: &str, source: &str) -> Self {
        Self::info(
            WarningCategory::VolumeSource,
            object,
            format!(
                "volume '{}' uses source '{}' which is kept as a literal",
                volume, source
            ),
        )
    }

    /// Values entry overwritten with a different value
    pub fn value_conflict(path: &str) -> Self {
        Self::warning(
            WarningCategory::ValueConflict,
            path,
            format!("values entry '{}' was replaced by a different value", path),
        )
    }
}

impl std::fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} - {}",
            self.severity.label(),
            self.object,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_kind_message() {
        let warning = GenerationWarning::unsupported_kind("Ingress", "web");
        assert_eq!(warning.severity, WarningSeverity::Info);
        assert_eq!(warning.object, "Ingress/web");
        assert_eq!(warning.message, "Ingress is not supported. Please add manually.");
    }

    #[test]
    fn test_warning_display() {
        let warning = GenerationWarning::value_conflict("web.port");
        assert_eq!(
            warning.to_string(),
            "[warning] web.port - values entry 'web.port' was replaced by a different value"
        );
    }
}
