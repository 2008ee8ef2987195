use serde_json::{Map, json};

use crate::cli::commands::audit_helpers::{log_self, open_store, read_input};
use crate::cli::{context, output};
use crate::core::errors::Result;
use crate::core::models::audit_entry::AuditAction;
use crate::core::services::export_service::ExportService;

/// Execute the `clair import` command.
pub fn execute(file: &str) -> Result<()> {
    let config = context::load_config()?;
    let content = read_input(file)?;
    let store = open_store(&config);

    let report = ExportService.import(&store, &content)?;

    output::header("clair import");
    output::success(&format!("Imported {} entries from {file}", report.imported));
    if report.skipped > 0 {
        output::warning(&format!(
            "Skipped {} entries already present in the log",
            report.skipped
        ));
    }

    let mut metadata = Map::new();
    metadata.insert("source".to_string(), json!(file));
    metadata.insert("imported".to_string(), json!(report.imported));
    metadata.insert("skipped".to_string(), json!(report.skipped));
    log_self(
        &config,
        AuditAction::Import,
        format!("imported {} audit entries", report.imported),
        metadata,
    );

    Ok(())
}
