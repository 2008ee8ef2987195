use colored::Colorize;

use crate::cli::commands::audit_helpers::{build_filter, open_store};
use crate::cli::{FilterArgs, context, output};
use crate::core::errors::{ClairError, Result};
use crate::core::models::audit_entry::AuditEntry;
use crate::core::models::query::{AuditFilter, Page, QueryPage};
use crate::core::services::audit_reader::AuditReader;

/// Execute the `clair log` command.
///
/// Displays one page of the audit trail, newest first, with optional
/// filters.
pub fn execute(filters: &FilterArgs, limit: usize, skip: usize, json: bool) -> Result<()> {
    let config = context::load_config()?;
    let filter = build_filter(filters)?;
    let store = open_store(&config);

    let page = AuditReader::new(&store).query(&filter, Page { limit, skip });

    if json {
        let out = serde_json::to_string_pretty(&page).map_err(|e| ClairError::AuditError {
            detail: format!("Failed to serialize query result: {e}"),
        })?;
        println!("{out}");
        return Ok(());
    }

    if page.entries.is_empty() {
        output::header("clair log");
        output::warning("No audit entries found");
        if filter != AuditFilter::default() || skip > 0 {
            println!("  Try removing filters to see all entries.");
        }
        return Ok(());
    }

    output::header(&format!(
        "clair log ({} of {} entries)",
        page.entries.len(),
        page.total
    ));
    println!();

    for entry in &page.entries {
        print_entry(entry);
    }

    print_footer(&page);

    Ok(())
}

/// Print a single audit entry as a formatted row.
fn print_entry(entry: &AuditEntry) {
    let date = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    let target = match &entry.entity_id {
        Some(id) => format!("{}:{id}", entry.entity),
        None => entry.entity.clone(),
    };
    let who = if entry.is_replacement {
        format!("{} ({}, replacement)", entry.user_name, entry.user_role)
    } else {
        format!("{} ({})", entry.user_name, entry.user_role)
    };

    println!(
        "  {} {} {} {:<18} {:<22} {} {}",
        date.to_string().dimmed(),
        "│".dimmed(),
        output::severity(entry.severity),
        entry.action.as_str().cyan(),
        target,
        who,
        output::outcome(entry.success),
    );
    println!("      {}", entry.description.dimmed());

    if !entry.changed_fields.is_empty() {
        println!("      changed: {}", entry.changed_fields.join(", "));
    }
    if let Some(err) = &entry.error_message {
        println!("      error: {}", err.red());
    }
}

fn print_footer(page: &QueryPage) {
    if page.has_more() {
        println!(
            "\n  More entries available: use --skip {} to see the next page.",
            page.next_skip()
        );
    }
}
