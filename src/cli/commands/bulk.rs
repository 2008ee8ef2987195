use crate::cli::commands::audit_helpers::{open_writer, request_info};
use crate::cli::{ActorArgs, RequestArgs, context, output};
use crate::core::errors::{ClairError, Result};
use crate::core::models::actor::ActorContext;
use crate::core::models::request::RequestHeaders;
use crate::core::services::audit_writer::BulkOperation;

/// Execute the `clair bulk` command.
#[allow(clippy::too_many_arguments)]
pub fn execute(
    operation: &str,
    actor: &ActorArgs,
    entity: &str,
    ids: &[String],
    description: &str,
    module: &str,
    request: &RequestArgs,
) -> Result<()> {
    let config = context::load_config()?;

    let operation = match operation.trim().to_lowercase().as_str() {
        "update" => BulkOperation::Update,
        "delete" => BulkOperation::Delete,
        other => {
            return Err(ClairError::InvalidInput {
                detail: format!("Unknown bulk operation '{other}'. Use update or delete"),
            });
        }
    };

    let ids: Vec<String> = ids
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(ClairError::InvalidInput {
            detail: "--ids needs at least one id".into(),
        });
    }

    let actor = ActorContext::from(actor);
    let request = request_info(request)?;
    let writer = open_writer(&config);

    let entry = writer.log_bulk(
        operation,
        &actor,
        entity,
        &ids,
        description,
        module.parse()?,
        request.as_ref().map(|r| r as &dyn RequestHeaders),
    );

    match entry {
        Some(entry) => output::success(&format!(
            "Recorded {} on {} {}(s)",
            entry.action,
            ids.len(),
            entry.entity
        )),
        None if !writer.is_enabled() => {
            output::warning("Auditing is disabled in config.toml; nothing recorded")
        }
        None => output::warning("Audit entry could not be stored (see log output)"),
    }

    Ok(())
}
