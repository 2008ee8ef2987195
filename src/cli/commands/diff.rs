use colored::Colorize;
use serde_json::{Map, Value};

use crate::cli::commands::audit_helpers::{parse_object, read_input};
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::services::change_diff::{canonical_json, changed_fields};

/// Execute the `clair diff` command.
///
/// Compares two JSON object snapshots and lists the top-level fields an
/// update between them would record as changed.
pub fn execute(before: &str, after: &str) -> Result<()> {
    let previous = parse_object(&read_input(before)?, before)?;
    let next = parse_object(&read_input(after)?, after)?;

    let changed = changed_fields(Some(&previous), Some(&next));

    output::header("clair diff");

    if changed.is_empty() {
        output::success("No differences found");
        return Ok(());
    }

    for key in &changed {
        print_change(key, &previous, &next);
    }

    println!("\n  {} field(s) changed", changed.len());

    Ok(())
}

fn print_change(key: &str, previous: &Map<String, Value>, next: &Map<String, Value>) {
    match (previous.get(key), next.get(key)) {
        (Some(_), None) => println!("  {} {key}", "-".red()),
        (None, Some(new)) => println!("  {} {key} = {}", "+".green(), canonical_json(new)),
        (Some(old), Some(new)) => println!(
            "  {} {key}: {} → {}",
            "~".yellow(),
            canonical_json(old).dimmed(),
            canonical_json(new)
        ),
        (None, None) => {}
    }
}
