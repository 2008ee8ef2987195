use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::errors::ClairError;

/// Generates `as_str`, `ALL`, `Display` and `FromStr` for a unit enum whose
/// serialized form is the snake_case tag listed next to each variant.
macro_rules! tagged_enum {
    ($name:ident, $what:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored tag for this variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ClairError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                Self::ALL
                    .iter()
                    .find(|v| v.as_str() == wanted)
                    .cloned()
                    .ok_or_else(|| ClairError::InvalidInput {
                        detail: format!(
                            "Unknown {} '{s}'. Expected one of: {}",
                            $what,
                            Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
                        ),
                    })
            }
        }
    };
}

/// Actions that get recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    View,
    Export,
    Import,
    Login,
    Logout,
    LoginAttempt,
    BulkUpdate,
    BulkDelete,
    Archive,
    Restore,
    GenerateReport,
    SendCommunication,
    Approve,
    Reject,
}

tagged_enum!(AuditAction, "action", {
    Create => "create",
    Update => "update",
    Delete => "delete",
    View => "view",
    Export => "export",
    Import => "import",
    Login => "login",
    Logout => "logout",
    LoginAttempt => "login_attempt",
    BulkUpdate => "bulk_update",
    BulkDelete => "bulk_delete",
    Archive => "archive",
    Restore => "restore",
    GenerateReport => "generate_report",
    SendCommunication => "send_communication",
    Approve => "approve",
    Reject => "reject",
});

/// Functional area of the application that issued an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditModule {
    Dashboard,
    Patients,
    Reports,
    Communications,
    Observations,
    Bristol,
    Admin,
    Auth,
    Export,
    Maintenance,
    System,
}

tagged_enum!(AuditModule, "module", {
    Dashboard => "dashboard",
    Patients => "patients",
    Reports => "reports",
    Communications => "communications",
    Observations => "observations",
    Bristol => "bristol",
    Admin => "admin",
    Auth => "auth",
    Export => "export",
    Maintenance => "maintenance",
    System => "system",
});

/// Caller-assigned importance tier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

tagged_enum!(Severity, "severity", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

/// A single entry in the audit trail (JSON lines format).
///
/// Entries are written once by the writer and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Hex SHA-256 of the entry's other fields.
    #[serde(default)]
    pub id: String,
    pub action: AuditAction,
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub user_role: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_employee_number: Option<String>,
    #[serde(default)]
    pub is_replacement: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    pub description: String,
    pub module: AuditModule,
    #[serde(default)]
    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_data: Option<Map<String, Value>>,
    #[serde(default)]
    pub changed_fields: Vec<String>,

    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Elapsed time of the audited operation, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_success() -> bool {
    true
}

/// Caller-supplied parameters describing one audited action.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditParams {
    pub action: AuditAction,
    pub entity: String,
    pub entity_id: Option<String>,
    pub description: String,
    pub module: AuditModule,
    /// `None` stores `Severity::Low`.
    pub severity: Option<Severity>,
    pub previous_data: Option<Map<String, Value>>,
    pub new_data: Option<Map<String, Value>>,
    /// `None` stores `true`.
    pub success: Option<bool>,
    pub error_message: Option<String>,
    pub duration: Option<u64>,
    pub metadata: Option<Map<String, Value>>,
}

impl AuditParams {
    /// Parameters with only the required fields set.
    pub fn new(
        action: AuditAction,
        entity: impl Into<String>,
        description: impl Into<String>,
        module: AuditModule,
    ) -> Self {
        Self {
            action,
            entity: entity.into(),
            entity_id: None,
            description: description.into(),
            module,
            severity: None,
            previous_data: None,
            new_data: None,
            success: None,
            error_message: None,
            duration: None,
            metadata: None,
        }
    }
}
