use crate::cli::commands::audit_helpers::{open_writer, request_info};
use crate::cli::{ActorArgs, RequestArgs, context, output};
use crate::core::errors::{ClairError, Result};
use crate::core::models::actor::ActorContext;
use crate::core::models::audit_entry::AuditAction;
use crate::core::models::request::RequestHeaders;

/// Execute the `clair auth` command.
///
/// Only `login`, `logout` and `login_attempt` are accepted.
pub fn execute(
    action: &str,
    actor: &ActorArgs,
    failed: bool,
    error: Option<&str>,
    request: &RequestArgs,
) -> Result<()> {
    let config = context::load_config()?;

    let action: AuditAction = action.parse()?;
    if !matches!(
        action,
        AuditAction::Login | AuditAction::Logout | AuditAction::LoginAttempt
    ) {
        return Err(ClairError::InvalidInput {
            detail: format!("'{action}' is not an auth action. Use login, logout or login_attempt"),
        });
    }

    let actor = ActorContext::from(actor);
    let request = request_info(request)?;
    let writer = open_writer(&config);

    let entry = writer.log_auth(
        action,
        &actor,
        !failed,
        error.map(str::to_string),
        request.as_ref().map(|r| r as &dyn RequestHeaders),
    );

    match entry {
        Some(entry) => output::success(&format!(
            "Recorded {} ({} severity)",
            entry.description, entry.severity
        )),
        None if !writer.is_enabled() => {
            output::warning("Auditing is disabled in config.toml; nothing recorded")
        }
        None => output::warning("Audit entry could not be stored (see log output)"),
    }

    Ok(())
}
