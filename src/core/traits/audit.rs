use crate::core::errors::Result;
use crate::core::models::audit_entry::AuditEntry;
use crate::core::models::query::AuditFilter;

/// Port for persisting and retrieving audit entries.
///
/// The store is append-only: there is no update or delete path.
pub trait AuditStore: Send + Sync {
    /// Append an entry to the audit trail.
    fn append(&self, entry: &AuditEntry) -> Result<()>;

    /// Every stored entry matching `filter`, in storage order.
    fn find(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>>;
}
