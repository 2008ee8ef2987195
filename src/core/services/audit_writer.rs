use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use crate::core::errors::{ClairError, Result};
use crate::core::models::actor::ActorContext;
use crate::core::models::audit_entry::{
    AuditAction, AuditEntry, AuditModule, AuditParams, Severity,
};
use crate::core::models::request::RequestHeaders;
use crate::core::services::change_diff::{canonical_json, changed_fields};
use crate::core::traits::audit::AuditStore;

/// Recorded when a request carries none of the client address headers.
pub const UNKNOWN_IP: &str = "unknown";

/// Client address headers, in order of preference.
const IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Kinds of bulk operation that can be audited as one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation {
    Update,
    Delete,
}

impl BulkOperation {
    pub fn action(self) -> AuditAction {
        match self {
            BulkOperation::Update => AuditAction::BulkUpdate,
            BulkOperation::Delete => AuditAction::BulkDelete,
        }
    }
}

/// Builds audit entries and appends them to a store.
///
/// Writing is best-effort: a storage failure is logged and dropped so that
/// auditing can never fail the operation being audited.
pub struct AuditWriter<S: AuditStore> {
    store: S,
    enabled: bool,
}

impl<S: AuditStore> AuditWriter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            enabled: true,
        }
    }

    /// A writer that records nothing (auditing turned off in config).
    pub fn disabled(store: S) -> Self {
        Self {
            store,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record one action. Never returns an error.
    ///
    /// Returns the stored entry, or `None` if auditing is disabled or the
    /// store rejected the write.
    pub fn write(
        &self,
        actor: &ActorContext,
        params: AuditParams,
        request: Option<&dyn RequestHeaders>,
    ) -> Option<AuditEntry> {
        if !self.enabled {
            tracing::debug!(action = %params.action, "auditing disabled, entry not recorded");
            return None;
        }

        let action = params.action;
        let entity = params.entity.clone();

        match self.try_write(actor, params, request) {
            Ok(entry) => {
                tracing::debug!(id = %entry.id, action = %entry.action, "audit entry recorded");
                Some(entry)
            }
            Err(e) => {
                tracing::error!(%action, %entity, "failed to write audit entry: {e}");
                None
            }
        }
    }

    fn try_write(
        &self,
        actor: &ActorContext,
        params: AuditParams,
        request: Option<&dyn RequestHeaders>,
    ) -> Result<AuditEntry> {
        let entry = build_entry(actor, params, request, Utc::now())?;
        self.store.append(&entry)?;
        Ok(entry)
    }

    /// Record a login, logout or login attempt.
    ///
    /// Failed attempts are stored with medium severity.
    pub fn log_auth(
        &self,
        action: AuditAction,
        actor: &ActorContext,
        success: bool,
        error_message: Option<String>,
        request: Option<&dyn RequestHeaders>,
    ) -> Option<AuditEntry> {
        let mut description = format!("{action} by {}", actor.user_name);
        if !success {
            description.push_str(" (failed)");
        }

        let mut params = AuditParams::new(action, "auth", description, AuditModule::Auth);
        params.severity = Some(if success {
            Severity::Low
        } else {
            Severity::Medium
        });
        params.success = Some(success);
        params.error_message = error_message;

        self.write(actor, params, request)
    }

    /// Record one operation applied to many entities at once.
    #[allow(clippy::too_many_arguments)]
    pub fn log_bulk(
        &self,
        operation: BulkOperation,
        actor: &ActorContext,
        entity: &str,
        entity_ids: &[String],
        description: &str,
        module: AuditModule,
        request: Option<&dyn RequestHeaders>,
    ) -> Option<AuditEntry> {
        let mut metadata = Map::new();
        metadata.insert("affectedIds".to_string(), json!(entity_ids));
        metadata.insert("count".to_string(), json!(entity_ids.len()));

        let mut params = AuditParams::new(operation.action(), entity, description, module);
        params.severity = Some(Severity::Medium);
        params.metadata = Some(metadata);

        self.write(actor, params, request)
    }
}

/// Assemble a complete entry from the actor, the action parameters and
/// the optional request.
pub fn build_entry(
    actor: &ActorContext,
    params: AuditParams,
    request: Option<&dyn RequestHeaders>,
    timestamp: DateTime<Utc>,
) -> Result<AuditEntry> {
    let changed = match (&params.previous_data, &params.new_data) {
        (Some(previous), Some(next)) => changed_fields(Some(previous), Some(next)),
        _ => Vec::new(),
    };

    let mut entry = AuditEntry {
        id: String::new(),
        action: params.action,
        entity: params.entity,
        entity_id: params.entity_id,
        user_id: actor.user_id.clone(),
        user_role: actor.user_role.clone(),
        user_name: actor.user_name.clone(),
        user_employee_number: actor.user_employee_number.clone(),
        is_replacement: actor.is_replacement,
        session_id: actor.session_id.clone(),
        ip_address: request.map(client_ip),
        user_agent: request.and_then(|r| r.header("user-agent").map(str::to_string)),
        description: params.description,
        module: params.module,
        severity: params.severity.unwrap_or_default(),
        previous_data: params.previous_data,
        new_data: params.new_data,
        changed_fields: changed,
        timestamp,
        success: params.success.unwrap_or(true),
        error_message: params.error_message,
        duration: params.duration,
        metadata: params.metadata.unwrap_or_default(),
    };
    entry.id = entry_id(&entry)?;

    Ok(entry)
}

/// Resolve the client address from proxy headers.
///
/// Prefers the first hop of `x-forwarded-for`, then `x-real-ip`, then
/// `cf-connecting-ip`.
pub fn client_ip(request: &dyn RequestHeaders) -> String {
    IP_HEADERS
        .iter()
        .filter_map(|name| request.header(name))
        .filter_map(|value| value.split(',').next())
        .map(str::trim)
        .find(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_IP)
        .to_string()
}

/// SHA256 of the entry's canonical JSON, with the `id` field left blank.
pub fn entry_id(entry: &AuditEntry) -> Result<String> {
    let mut value = serde_json::to_value(entry).map_err(|e| ClairError::AuditError {
        detail: format!("Failed to serialize audit entry: {e}"),
    })?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }

    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&value).as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
