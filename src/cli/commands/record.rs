use crate::cli::commands::audit_helpers::{
    open_writer, parse_metadata, parse_snapshot, request_info,
};
use crate::cli::{ActorArgs, RequestArgs, context, output};
use crate::core::errors::{ClairError, Result};
use crate::core::models::actor::ActorContext;
use crate::core::models::audit_entry::{AuditParams, Severity};
use crate::core::models::request::RequestHeaders;

/// Options for `clair record`, gathered from the command line.
#[derive(Debug, Clone)]
pub struct RecordArgs<'a> {
    pub actor: &'a ActorArgs,
    pub action: &'a str,
    pub entity: &'a str,
    pub entity_id: Option<&'a str>,
    pub description: &'a str,
    pub module: &'a str,
    pub severity: Option<&'a str>,
    pub previous: Option<&'a str>,
    pub new: Option<&'a str>,
    pub failed: bool,
    pub error: Option<&'a str>,
    pub duration: Option<u64>,
    pub meta: &'a [String],
    pub request: &'a RequestArgs,
}

/// Execute the `clair record` command.
///
/// Input errors are reported; a storage failure is not, since recording is
/// best-effort.
pub fn execute(args: RecordArgs<'_>) -> Result<()> {
    let config = context::load_config()?;

    if args.error.is_some() && !args.failed {
        return Err(ClairError::InvalidInput {
            detail: "--error only applies together with --failed".into(),
        });
    }

    let mut params = AuditParams::new(
        args.action.parse()?,
        args.entity,
        args.description,
        args.module.parse()?,
    );
    params.entity_id = args.entity_id.map(str::to_string);
    params.severity = args.severity.map(str::parse::<Severity>).transpose()?;
    params.previous_data = args
        .previous
        .map(|raw| parse_snapshot(raw, "--previous"))
        .transpose()?;
    params.new_data = args.new.map(|raw| parse_snapshot(raw, "--new")).transpose()?;
    params.success = Some(!args.failed);
    params.error_message = args.error.map(str::to_string);
    params.duration = args.duration;
    if !args.meta.is_empty() {
        params.metadata = Some(parse_metadata(args.meta)?);
    }

    let actor = ActorContext::from(args.actor);
    let request = request_info(args.request)?;
    let writer = open_writer(&config);

    if !writer.is_enabled() {
        output::warning("Auditing is disabled in config.toml; nothing recorded");
        return Ok(());
    }

    match writer.write(&actor, params, request.as_ref().map(|r| r as &dyn RequestHeaders)) {
        Some(entry) => {
            output::success(&format!(
                "Recorded {} on {} ({})",
                entry.action,
                entry.entity,
                entry.id.get(..12).unwrap_or(&entry.id)
            ));
            if !entry.changed_fields.is_empty() {
                println!("  Changed fields: {}", entry.changed_fields.join(", "));
            }
        }
        None => output::warning("Audit entry could not be stored (see log output)"),
    }

    Ok(())
}
