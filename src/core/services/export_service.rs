use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{ClairError, Result};
use crate::core::models::audit_entry::AuditEntry;
use crate::core::models::query::{AuditFilter, Page};
use crate::core::services::audit_reader::AuditReader;
use crate::core::services::audit_writer::entry_id;
use crate::core::services::change_diff::canonical_json;
use crate::core::traits::audit::AuditStore;

/// Upper bound on the number of entries in one export.
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

/// Columns written before the discovered metadata columns.
const CSV_COLUMNS: [&str; 20] = [
    "id",
    "timestamp",
    "action",
    "entity",
    "entityId",
    "userId",
    "userName",
    "userRole",
    "userEmployeeNumber",
    "isReplacement",
    "sessionId",
    "ipAddress",
    "userAgent",
    "module",
    "severity",
    "success",
    "errorMessage",
    "duration",
    "description",
    "changedFields",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => f.write_str("csv"),
            ExportFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ClairError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ClairError::InvalidInput {
                detail: format!("Unknown export format '{other}'. Expected 'csv' or 'json'"),
            }),
        }
    }
}

/// JSON export document. Also the preferred import format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub filters: AuditFilter,
    pub total: usize,
    pub count: usize,
    pub truncated: bool,
    pub entries: Vec<AuditEntry>,
}

/// Rendered export plus the numbers needed to report on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutput {
    pub content: String,
    pub count: usize,
    pub total: usize,
}

impl ExportOutput {
    pub fn truncated(&self) -> bool {
        self.count < self.total
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Entries whose id was already in the log.
    pub skipped: usize,
}

/// Renders query results as CSV or JSON and loads JSON exports back.
pub struct ExportService;

impl ExportService {
    /// Export up to `max_records` newest entries matching `filter`.
    pub fn export<S: AuditStore>(
        &self,
        reader: &AuditReader<'_, S>,
        filter: &AuditFilter,
        format: ExportFormat,
        max_records: usize,
    ) -> Result<ExportOutput> {
        let page = reader
            .try_query(
                filter,
                Page {
                    limit: max_records,
                    skip: 0,
                },
            )
            .map_err(|e| ClairError::ExportError {
                reason: e.to_string(),
            })?;

        let count = page.entries.len();
        let content = match format {
            ExportFormat::Csv => to_csv(&page.entries),
            ExportFormat::Json => {
                let envelope = ExportEnvelope {
                    exported_at: Utc::now(),
                    filters: filter.clone(),
                    total: page.total,
                    count,
                    truncated: count < page.total,
                    entries: page.entries,
                };
                serde_json::to_string_pretty(&envelope).map_err(|e| ClairError::ExportError {
                    reason: format!("Failed to serialize export: {e}"),
                })?
            }
        };

        Ok(ExportOutput {
            content,
            count,
            total: page.total,
        })
    }

    /// Append the entries of a JSON export (or a bare JSON array of
    /// entries) to `store`, skipping entries that are already present.
    ///
    /// Ids are recomputed from content. An entry whose supplied id does not
    /// match its content rejects the whole import, and nothing is written
    /// until every entry has been checked.
    pub fn import<S: AuditStore>(&self, store: &S, content: &str) -> Result<ImportReport> {
        let mut entries = parse_import(content)?;
        for entry in &mut entries {
            let computed = entry_id(entry)?;
            if !entry.id.is_empty() && entry.id != computed {
                return Err(ClairError::ImportError {
                    reason: format!(
                        "Entry '{}' ({}) does not match its content; expected id {computed}",
                        entry.id, entry.description
                    ),
                });
            }
            entry.id = computed;
        }
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let mut known: HashSet<String> = store
            .find(&AuditFilter::default())?
            .into_iter()
            .map(|e| e.id)
            .collect();

        let mut report = ImportReport::default();
        for entry in entries {
            if !known.insert(entry.id.clone()) {
                tracing::debug!(id = %entry.id, "skipping entry already in log");
                report.skipped += 1;
                continue;
            }
            store.append(&entry)?;
            report.imported += 1;
        }

        Ok(report)
    }
}

fn parse_import(content: &str) -> Result<Vec<AuditEntry>> {
    let value: Value = serde_json::from_str(content).map_err(|e| ClairError::ImportError {
        reason: format!("Not valid JSON: {e}"),
    })?;

    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(|e| ClairError::ImportError {
            reason: format!("Invalid audit entry: {e}"),
        }),
        Value::Object(_) => {
            let envelope: ExportEnvelope =
                serde_json::from_value(value).map_err(|e| ClairError::ImportError {
                    reason: format!("Invalid export document: {e}"),
                })?;
            Ok(envelope.entries)
        }
        _ => Err(ClairError::ImportError {
            reason: "Expected a JSON object or array".to_string(),
        }),
    }
}

/// Render entries as CSV with one extra `metadata.<key>` column for every
/// metadata key found across the entries.
pub fn to_csv(entries: &[AuditEntry]) -> String {
    let metadata_keys: BTreeSet<&String> =
        entries.iter().flat_map(|e| e.metadata.keys()).collect();

    let mut out = String::new();
    let header: Vec<String> = CSV_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(metadata_keys.iter().map(|k| format!("metadata.{k}")))
        .collect();
    push_row(&mut out, &header);

    for entry in entries {
        let mut row = vec![
            entry.id.clone(),
            entry.timestamp.to_rfc3339(),
            entry.action.to_string(),
            entry.entity.clone(),
            entry.entity_id.clone().unwrap_or_default(),
            entry.user_id.clone().unwrap_or_default(),
            entry.user_name.clone(),
            entry.user_role.clone(),
            entry.user_employee_number.clone().unwrap_or_default(),
            entry.is_replacement.to_string(),
            entry.session_id.clone().unwrap_or_default(),
            entry.ip_address.clone().unwrap_or_default(),
            entry.user_agent.clone().unwrap_or_default(),
            entry.module.to_string(),
            entry.severity.to_string(),
            entry.success.to_string(),
            entry.error_message.clone().unwrap_or_default(),
            entry.duration.map(|d| d.to_string()).unwrap_or_default(),
            entry.description.clone(),
            entry.changed_fields.join(";"),
        ];
        row.extend(metadata_keys.iter().map(|k| match entry.metadata.get(*k) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => canonical_json(other),
        }));
        push_row(&mut out, &row);
    }

    out
}

fn push_row(out: &mut String, fields: &[String]) {
    let escaped: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
    out.push_str(&escaped.join(","));
    out.push_str("\r\n");
}

/// Quote a field when it contains a delimiter, a quote or a line break;
/// inner quotes are doubled.
pub fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
