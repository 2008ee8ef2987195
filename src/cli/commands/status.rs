use colored::Colorize;

use crate::cli::commands::audit_helpers::open_store;
use crate::cli::{context, output};
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::models::query::{AuditFilter, Page};
use crate::core::services::audit_reader::AuditReader;

/// Execute the `clair status` command.
///
/// Displays the configuration and a short overview of the audit log.
pub fn execute() -> Result<()> {
    let config = context::load_config()?;

    output::header(&format!("clair v{}", env!("CARGO_PKG_VERSION")));
    output::field("Directory", &context::clair_dir().display().to_string());
    output::field("Config version", &config.clair.version);
    output::field("Format", &config.clair.format_version.to_string());

    print_audit_settings(&config);
    print_log_overview(&config);

    Ok(())
}

fn print_audit_settings(config: &AppConfig) {
    println!("\n{}", "  Audit".bold());

    if config.audit_enabled() {
        output::success("Auditing enabled");
    } else {
        output::warning("Auditing disabled: record, auth and bulk store nothing");
    }

    let retention = config
        .audit
        .as_ref()
        .and_then(|a| a.retention_days)
        .map(|d| format!("{d} days (not enforced by clair)"))
        .unwrap_or_else(|| "not set".to_string());
    output::field("Retention", &retention);
    output::field("Export cap", &config.export.max_records.to_string());
}

fn print_log_overview(config: &AppConfig) {
    println!("\n{}", "  Log".bold());

    let store = open_store(config);
    output::field("File", &store.log_path().display().to_string());

    if !store.log_path().exists() {
        output::warning("No audit log yet");
        return;
    }

    let reader = AuditReader::new(&store);
    let latest = reader.query(&AuditFilter::default(), Page { limit: 1, skip: 0 });

    output::field("Entries", &latest.total.to_string());
    if let Some(entry) = latest.entries.first() {
        output::field(
            "Latest",
            &format!(
                "{} {} by {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.action,
                entry.user_name
            ),
        );
    }
}
