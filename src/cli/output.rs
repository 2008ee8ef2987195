use colored::{ColoredString, Colorize};

use crate::core::models::audit_entry::Severity;

/// Print a success message.
pub fn success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// Print an error message to stderr.
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a header line.
pub fn header(msg: &str) {
    println!("\n{}", msg.bold());
}

/// Print an indented `label: value` line.
pub fn field(label: &str, value: &str) {
    println!("  {:<14} {}", format!("{label}:").dimmed(), value);
}

/// Severity tag colored by importance.
pub fn severity(severity: Severity) -> ColoredString {
    let tag = format!("{:<8}", severity.as_str());
    match severity {
        Severity::Low => tag.dimmed(),
        Severity::Medium => tag.yellow(),
        Severity::High => tag.red(),
        Severity::Critical => tag.red().bold(),
    }
}

/// `ok` in green or `FAILED` in red.
pub fn outcome(success: bool) -> ColoredString {
    if success { "ok".green() } else { "FAILED".red().bold() }
}
