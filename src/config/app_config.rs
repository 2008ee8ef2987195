use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::adapters::audit::json_audit_store::DEFAULT_LOG_FILE;
use crate::core::errors::{ClairError, Result};
use crate::core::services::export_service::DEFAULT_MAX_RECORDS;

/// Current format version supported by this build.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// Default configuration written by `clair init`.
pub const DEFAULT_CONFIG: &str = r#"[clair]
version = "0.1.0"
format_version = 1

[audit]
enabled = true
log_file = "audit.log"
# Informational only: entries are never deleted by clair.
retention_days = 365

[export]
max_records = 10000
"#;

/// Top-level configuration read from `.clair/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub clair: ClairSection,
    pub audit: Option<AuditSection>,
    #[serde(default)]
    pub export: ExportSection,
}

impl AppConfig {
    /// Load the configuration from `{clair_dir}/config.toml`.
    ///
    /// After parsing, validates the audit log filename so a tampered
    /// config cannot point the log outside the clair directory.
    pub fn load(clair_dir: &Path) -> Result<Self> {
        let config_path = clair_dir.join("config.toml");
        if !config_path.exists() {
            return Err(ClairError::InvalidConfig {
                detail: "config.toml not found. Run 'clair init' first.".into(),
            });
        }
        let content = std::fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ClairError::InvalidConfig {
            detail: format!("Failed to parse config.toml: {e}"),
        })?;

        if config.clair.format_version > CURRENT_FORMAT_VERSION {
            return Err(ClairError::FormatVersionTooNew {
                project_version: config.clair.format_version,
                supported_version: CURRENT_FORMAT_VERSION,
            });
        }

        if let Some(audit) = &config.audit {
            validate_simple_filename(&audit.log_file, "audit log file")?;
        }

        if config.export.max_records == 0 {
            return Err(ClairError::InvalidConfig {
                detail: "[export] max_records must be at least 1".into(),
            });
        }

        Ok(config)
    }

    /// Auditing is on unless the `[audit]` section turns it off.
    pub fn audit_enabled(&self) -> bool {
        self.audit.as_ref().map(|a| a.enabled).unwrap_or(true)
    }
}

/// The `[clair]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ClairSection {
    pub version: String,
    /// Format version for backward compatibility. Defaults to 1 if missing.
    #[serde(default = "default_format_version")]
    pub format_version: u32,
}

fn default_format_version() -> u32 {
    1
}

/// The `[audit]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSection {
    pub enabled: bool,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// How long operators intend to keep entries. Not enforced here.
    pub retention_days: Option<u32>,
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

/// The `[export]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSection {
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

fn default_max_records() -> usize {
    DEFAULT_MAX_RECORDS
}

/// Reject anything but a plain file name (no separators, no `..`).
pub fn validate_simple_filename(name: &str, what: &str) -> Result<()> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("filename pattern is valid")
    });

    if !pattern.is_match(name) || name.contains("..") {
        return Err(ClairError::InvalidConfig {
            detail: format!(
                "Invalid {what} '{name}'. Use a plain file name such as 'audit.log'."
            ),
        });
    }
    Ok(())
}
