use crate::adapters::audit::json_audit_store::DEFAULT_LOG_FILE;
use crate::cli::{context, output};
use crate::config::app_config::DEFAULT_CONFIG;
use crate::core::errors::{ClairError, Result};

/// Execute the `clair init` command.
///
/// Creates the clair directory with a default `config.toml` and an empty
/// audit log.
pub fn execute(verbose: bool) -> Result<()> {
    let clair_dir = context::clair_dir();

    if clair_dir.exists() {
        return Err(ClairError::InvalidConfig {
            detail: format!("clair is already initialized ({} exists)", clair_dir.display()),
        });
    }

    output::header("clair — Initializing audit directory");

    std::fs::create_dir_all(clair_dir)?;
    output::success(&format!("Created {}/", clair_dir.display()));

    std::fs::write(clair_dir.join("config.toml"), DEFAULT_CONFIG)?;
    output::success("Generated config.toml with defaults");

    std::fs::write(clair_dir.join(DEFAULT_LOG_FILE), "")?;
    output::success(&format!("Created empty {DEFAULT_LOG_FILE}"));

    if verbose {
        println!("\n  Next steps:");
        println!("    → Record an action:  clair record --action view --entity patient \\");
        println!("                           --description \"opened file\" --module patients");
        println!("    → Browse entries:    clair log");
        println!("    → Activity totals:   clair summary");
    }

    Ok(())
}
