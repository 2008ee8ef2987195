use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::adapters::audit::json_audit_store::JsonAuditStore;
use crate::cli::context;
use crate::cli::{ActorArgs, FilterArgs, RequestArgs};
use crate::config::app_config::AppConfig;
use crate::core::errors::{ClairError, Result};
use crate::core::models::actor::ActorContext;
use crate::core::models::audit_entry::{AuditAction, AuditModule, AuditParams, Severity};
use crate::core::models::query::AuditFilter;
use crate::core::models::request::RequestInfo;
use crate::core::services::audit_writer::AuditWriter;

/// Which end of a day a date-only bound resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Store for the configured audit log.
pub fn open_store(config: &AppConfig) -> JsonAuditStore {
    JsonAuditStore::from_config(context::clair_dir(), config.audit.as_ref())
}

/// Writer honoring the `[audit] enabled` switch.
pub fn open_writer(config: &AppConfig) -> AuditWriter<JsonAuditStore> {
    let store = open_store(config);
    if config.audit_enabled() {
        AuditWriter::new(store)
    } else {
        AuditWriter::disabled(store)
    }
}

/// Record an operation the tool performed on its own behalf, such as an
/// export. Best-effort like every write.
pub fn log_self(
    config: &AppConfig,
    action: AuditAction,
    description: String,
    metadata: Map<String, Value>,
) {
    let mut params = AuditParams::new(action, "audit_log", description, AuditModule::Export);
    params.metadata = Some(metadata);
    open_writer(config).write(&ActorContext::system(), params, None);
}

impl From<&ActorArgs> for ActorContext {
    fn from(args: &ActorArgs) -> Self {
        ActorContext {
            user_id: args.user_id.clone(),
            user_role: args.role.clone(),
            user_name: args.name.clone(),
            user_employee_number: args.employee_number.clone(),
            is_replacement: args.replacement,
            session_id: args.session.clone(),
        }
    }
}

/// Build the request handle, or `None` when no header was given.
pub fn request_info(args: &RequestArgs) -> Result<Option<RequestInfo>> {
    if args.headers.is_empty() {
        return Ok(None);
    }
    RequestInfo::from_pairs(&args.headers).map(Some)
}

/// Parse a date flag. `YYYY-MM-DD` resolves to the start or the end of
/// that day (UTC); anything else must be RFC 3339.
pub fn parse_date(s: &str, bound: Bound) -> Result<DateTime<Utc>> {
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let time = match bound {
            Bound::Start => day.and_hms_opt(0, 0, 0),
            Bound::End => day.and_hms_milli_opt(23, 59, 59, 999),
        };
        if let Some(t) = time {
            return Ok(Utc.from_utc_datetime(&t));
        }
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ClairError::InvalidInput {
            detail: format!(
                "Invalid date '{s}'. Expected YYYY-MM-DD (e.g. 2026-01-15) or RFC 3339"
            ),
        })
}

/// Turn command-line filter flags into an `AuditFilter`.
pub fn build_filter(args: &FilterArgs) -> Result<AuditFilter> {
    let success = match (args.failed, args.succeeded) {
        (true, _) => Some(false),
        (_, true) => Some(true),
        _ => None,
    };

    Ok(AuditFilter {
        start_date: args
            .since
            .as_deref()
            .map(|s| parse_date(s, Bound::Start))
            .transpose()?,
        end_date: args
            .until
            .as_deref()
            .map(|s| parse_date(s, Bound::End))
            .transpose()?,
        user_id: args.user_id.clone(),
        user_role: args.role.clone(),
        action: args
            .action
            .as_deref()
            .map(str::parse::<AuditAction>)
            .transpose()?,
        entity: args.entity.clone(),
        module: args
            .module
            .as_deref()
            .map(str::parse::<AuditModule>)
            .transpose()?,
        severity: args
            .severity
            .as_deref()
            .map(str::parse::<Severity>)
            .transpose()?,
        success,
    })
}

/// Parse a JSON object given inline or as `@path`.
pub fn parse_snapshot(raw: &str, what: &str) -> Result<Map<String, Value>> {
    let content = match raw.strip_prefix('@') {
        Some(path) => read_input(path)?,
        None => raw.to_string(),
    };
    parse_object(&content, what)
}

/// Read a file given on the command line, mapping a missing path to
/// `FileNotFound`.
pub fn read_input(path: &str) -> Result<String> {
    let p = std::path::Path::new(path);
    if !p.exists() {
        return Err(ClairError::FileNotFound {
            path: p.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(p)?)
}

pub fn parse_object(content: &str, what: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ClairError::InvalidInput {
            detail: format!("{what} must be a JSON object"),
        }),
        Err(e) => Err(ClairError::InvalidInput {
            detail: format!("{what} is not valid JSON: {e}"),
        }),
    }
}

/// Parse repeated `key=value` flags. Values that parse as JSON keep their
/// type; anything else is stored as a string.
pub fn parse_metadata(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| ClairError::InvalidInput {
            detail: format!("Invalid metadata '{pair}'. Expected key=value"),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ClairError::InvalidInput {
                detail: format!("Invalid metadata '{pair}': empty key"),
            });
        }
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.into()));
        map.insert(key.to_string(), value);
    }
    Ok(map)
}
