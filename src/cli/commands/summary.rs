use std::collections::BTreeMap;

use colored::Colorize;

use crate::cli::commands::audit_helpers::{Bound, open_store, parse_date};
use crate::cli::{context, output};
use crate::core::errors::{ClairError, Result};
use crate::core::models::query::{ActivitySummary, DateRange};
use crate::core::services::audit_reader::AuditReader;

/// Execute the `clair summary` command.
///
/// The reader returns raw value lists; grouping into counts happens here.
pub fn execute(since: Option<&str>, until: Option<&str>, json: bool) -> Result<()> {
    let config = context::load_config()?;
    let store = open_store(&config);

    let range = DateRange {
        start: since.map(|s| parse_date(s, Bound::Start)).transpose()?,
        end: until.map(|s| parse_date(s, Bound::End)).transpose()?,
    };
    let range = (range != DateRange::default()).then_some(range);

    let summary = AuditReader::new(&store).summarize(range.as_ref());

    if json {
        let out = serde_json::to_string_pretty(&summary).map_err(|e| ClairError::AuditError {
            detail: format!("Failed to serialize summary: {e}"),
        })?;
        println!("{out}");
        return Ok(());
    }

    output::header("clair summary");

    if summary.total == 0 {
        output::warning("No audit entries in this period");
        return Ok(());
    }

    output::field("Entries", &summary.total.to_string());
    output::field("Succeeded", &summary.successful.to_string().green().to_string());
    output::field("Failed", &format_failed(&summary));

    print_counts("By module", count(summary.modules.iter().map(|m| m.as_str())));
    print_counts("By severity", count(summary.severities.iter().map(|s| s.as_str())));
    print_counts("By user", count(summary.user_names.iter().map(String::as_str)));

    Ok(())
}

fn format_failed(summary: &ActivitySummary) -> String {
    if summary.failed == 0 {
        "0".to_string()
    } else {
        summary.failed.to_string().red().to_string()
    }
}

/// Occurrences of each value, most frequent first, ties by name.
fn count<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

fn print_counts(title: &str, counts: Vec<(&str, usize)>) {
    println!("\n{}", format!("  {title}").bold());
    for (name, n) in counts {
        println!("    {name:<24} {n}");
    }
}
