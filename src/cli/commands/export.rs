use std::path::Path;

use serde_json::{Map, json};

use crate::cli::commands::audit_helpers::{build_filter, log_self, open_store};
use crate::cli::{FilterArgs, context, output};
use crate::core::errors::Result;
use crate::core::models::audit_entry::AuditAction;
use crate::core::services::audit_reader::AuditReader;
use crate::core::services::export_service::{ExportFormat, ExportService};

/// Execute the `clair export` command.
///
/// Writes at most `[export] max_records` entries to stdout or to
/// `output`. The export itself is recorded in the audit trail.
pub fn execute(filters: &FilterArgs, format: &str, output_path: Option<&str>) -> Result<()> {
    let config = context::load_config()?;
    let filter = build_filter(filters)?;
    let format: ExportFormat = format.parse()?;
    let store = open_store(&config);
    let reader = AuditReader::new(&store);

    let exported =
        ExportService.export(&reader, &filter, format, config.export.max_records)?;

    match output_path {
        Some(path) => {
            std::fs::write(Path::new(path), &exported.content)?;
            output::success(&format!(
                "Exported {} entries as {format} to {path}",
                exported.count
            ));
            if exported.truncated() {
                output::warning(&format!(
                    "{} entries matched; only the newest {} were exported (max_records)",
                    exported.total, exported.count
                ));
            }
        }
        None => print!("{}", exported.content),
    }

    let mut metadata = Map::new();
    metadata.insert("format".to_string(), json!(format.to_string()));
    metadata.insert("count".to_string(), json!(exported.count));
    metadata.insert("total".to_string(), json!(exported.total));
    metadata.insert("filters".to_string(), json!(filter));
    log_self(
        &config,
        AuditAction::Export,
        format!("exported {} audit entries as {format}", exported.count),
        metadata,
    );

    Ok(())
}
