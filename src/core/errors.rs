use std::path::PathBuf;

/// All domain errors for CLAIR's audit trail.
///
/// Each variant provides enough context to diagnose the issue
/// without needing a debugger.
#[derive(Debug, thiserror::Error)]
pub enum ClairError {
    #[error(
        "File not found: {path}\n\n  \
         Check that the path is correct and the file exists."
    )]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("Invalid input: {detail}")]
    InvalidInput { detail: String },

    #[error("Audit log error: {detail}")]
    AuditError { detail: String },

    #[error(
        "Export failed: {reason}\n\n  \
         The audit log itself is unchanged."
    )]
    ExportError { reason: String },

    #[error(
        "Import failed: {reason}\n\n  \
         No entries were written.\n\n  \
         Expected input:\n    \
         → A JSON export produced by 'clair export --format json'\n    \
         → Or a JSON array of audit entries"
    )]
    ImportError { reason: String },

    #[error(
        "This project uses format version {project_version}, but this build \
         only supports up to version {supported_version}.\n\n  \
         Update clair before reading this audit directory."
    )]
    FormatVersionTooNew {
        project_version: u32,
        supported_version: u32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClairError>;
