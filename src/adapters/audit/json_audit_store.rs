use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::config::app_config::AuditSection;
use crate::core::errors::{ClairError, Result};
use crate::core::models::audit_entry::AuditEntry;
use crate::core::models::query::AuditFilter;
use crate::core::traits::audit::AuditStore;

/// Default file name of the audit trail inside the clair directory.
pub const DEFAULT_LOG_FILE: &str = "audit.log";

/// Audit store that appends entries as JSON lines to a file.
///
/// Each line in the log file is a self-contained JSON object representing
/// one `AuditEntry`. Appends never rewrite earlier lines.
pub struct JsonAuditStore {
    log_path: PathBuf,
}

impl JsonAuditStore {
    /// Create a store that writes to `{clair_dir}/{log_file}`.
    pub fn new(clair_dir: &Path, log_file: &str) -> Self {
        Self {
            log_path: clair_dir.join(log_file),
        }
    }

    /// Create a store from the `[audit]` section, falling back to defaults
    /// if the section is missing.
    pub fn from_config(clair_dir: &Path, audit_section: Option<&AuditSection>) -> Self {
        let log_file = audit_section
            .map(|a| a.log_file.as_str())
            .unwrap_or(DEFAULT_LOG_FILE);
        Self::new(clair_dir, log_file)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

impl AuditStore for JsonAuditStore {
    fn append(&self, entry: &AuditEntry) -> Result<()> {
        let line = serde_json::to_string(entry).map_err(|e| ClairError::AuditError {
            detail: format!("Failed to serialize audit entry: {e}"),
        })?;

        if let Some(parent) = self.log_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| ClairError::AuditError {
                detail: format!("Cannot open audit log at {}: {e}", self.log_path.display()),
            })?;

        writeln!(file, "{line}").map_err(|e| ClairError::AuditError {
            detail: format!("Failed to write audit entry: {e}"),
        })?;

        Ok(())
    }

    fn find(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.log_path).map_err(|e| ClairError::AuditError {
            detail: format!("Cannot read audit log: {e}"),
        })?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ClairError::AuditError {
                detail: format!("Error reading audit log line {}: {e}", line_num + 1),
            })?;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let entry: AuditEntry =
                serde_json::from_str(trimmed).map_err(|e| ClairError::AuditError {
                    detail: format!("Malformed audit entry at line {}: {e}", line_num + 1),
                })?;

            if filter.matches(&entry) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }
}
