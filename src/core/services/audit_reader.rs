use crate::core::errors::Result;
use crate::core::models::audit_entry::AuditEntry;
use crate::core::models::query::{ActivitySummary, AuditFilter, DateRange, Page, QueryPage};
use crate::core::traits::audit::AuditStore;

/// Read side of the audit trail: filtered listing and activity rollups.
///
/// Both `query` and `summarize` report a failed read the same way, by
/// returning their empty value. The error itself goes to the operational
/// log.
pub struct AuditReader<'a, S: AuditStore> {
    store: &'a S,
}

impl<'a, S: AuditStore> AuditReader<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Entries matching `filter`, newest first, sliced by `page`.
    ///
    /// `total` counts every match, not only the returned slice.
    pub fn query(&self, filter: &AuditFilter, page: Page) -> QueryPage {
        self.try_query(filter, page).unwrap_or_else(|e| {
            tracing::error!("failed to query audit log: {e}");
            QueryPage::empty(page)
        })
    }

    pub fn try_query(&self, filter: &AuditFilter, page: Page) -> Result<QueryPage> {
        let mut matches = self.store.find(filter)?;
        sort_newest_first(&mut matches);

        let total = matches.len();
        let entries = matches
            .into_iter()
            .skip(page.skip)
            .take(page.limit)
            .collect();

        Ok(QueryPage {
            entries,
            total,
            limit: page.limit,
            skip: page.skip,
        })
    }

    /// Counts and raw value lists over the entries in `range`.
    pub fn summarize(&self, range: Option<&DateRange>) -> ActivitySummary {
        self.try_summarize(range).unwrap_or_else(|e| {
            tracing::error!("failed to summarize audit log: {e}");
            ActivitySummary::default()
        })
    }

    pub fn try_summarize(&self, range: Option<&DateRange>) -> Result<ActivitySummary> {
        let filter = range.map(AuditFilter::in_range).unwrap_or_default();
        let entries = self.store.find(&filter)?;

        let successful = entries.iter().filter(|e| e.success).count();

        Ok(ActivitySummary {
            total: entries.len(),
            successful,
            failed: entries.len() - successful,
            modules: entries.iter().map(|e| e.module).collect(),
            user_names: entries.iter().map(|e| e.user_name.clone()).collect(),
            severities: entries.iter().map(|e| e.severity).collect(),
        })
    }
}

/// Stable sort on timestamp, most recent first. Entries written in the
/// same instant keep the reverse of their storage order.
fn sort_newest_first(entries: &mut [AuditEntry]) {
    entries.reverse();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::json_audit_store::JsonAuditStore;
    use crate::core::errors::ClairError;
    use crate::core::models::actor::ActorContext;
    use crate::core::models::audit_entry::{AuditAction, AuditModule, AuditParams, Severity};
    use crate::core::services::audit_writer::{AuditWriter, build_entry};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    struct BrokenStore;

    impl AuditStore for BrokenStore {
        fn append(&self, _entry: &AuditEntry) -> Result<()> {
            Err(ClairError::AuditError {
                detail: "connection refused".to_string(),
            })
        }

        fn find(&self, _filter: &AuditFilter) -> Result<Vec<AuditEntry>> {
            Err(ClairError::AuditError {
                detail: "connection refused".to_string(),
            })
        }
    }

    /// Append `count` entries one minute apart, oldest first.
    fn seed(store: &JsonAuditStore, count: usize) {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let actor = ActorContext::new("nurse", "Jean");
        for i in 0..count {
            let mut params = AuditParams::new(
                AuditAction::View,
                "patient",
                format!("view {i}"),
                AuditModule::Patients,
            );
            params.entity_id = Some(format!("p{i}"));
            let entry =
                build_entry(&actor, params, None, start + Duration::minutes(i as i64)).unwrap();
            store.append(&entry).unwrap();
        }
    }

    #[test]
    fn query_returns_newest_first() {
        let tmp = TempDir::new().unwrap();
        let store = JsonAuditStore::new(tmp.path(), "audit.log");
        seed(&store, 3);

        let page = AuditReader::new(&store).query(&AuditFilter::default(), Page::default());

        let ids: Vec<_> = page
            .entries
            .iter()
            .map(|e| e.entity_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["p2", "p1", "p0"]);
        assert_eq!(page.total, 3);
        assert!(!page.has_more());
    }

    #[test]
    fn pagination_slices_and_keeps_total() {
        let tmp = TempDir::new().unwrap();
        let store = JsonAuditStore::new(tmp.path(), "audit.log");
        seed(&store, 7);
        let reader = AuditReader::new(&store);

        for (limit, skip) in [(1, 0), (3, 0), (3, 3), (3, 6), (5, 7), (10, 2), (2, 20)] {
            let page = reader.query(&AuditFilter::default(), Page { limit, skip });
            let expected = limit.min(7usize.saturating_sub(skip));
            assert_eq!(page.entries.len(), expected, "limit={limit} skip={skip}");
            assert_eq!(page.total, 7);
        }
    }

    #[test]
    fn second_page_continues_first() {
        let tmp = TempDir::new().unwrap();
        let store = JsonAuditStore::new(tmp.path(), "audit.log");
        seed(&store, 5);
        let reader = AuditReader::new(&store);

        let first = reader.query(&AuditFilter::default(), Page { limit: 2, skip: 0 });
        let second = reader.query(&AuditFilter::default(), Page { limit: 2, skip: 2 });

        assert!(first.has_more());
        assert_eq!(first.entries[1].entity_id.as_deref(), Some("p3"));
        assert_eq!(second.entries[0].entity_id.as_deref(), Some("p2"));
    }

    #[test]
    fn query_failure_yields_empty_page() {
        let page = AuditReader::new(&BrokenStore).query(
            &AuditFilter::default(),
            Page { limit: 10, skip: 5 },
        );

        assert!(page.entries.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.limit, 10);
        assert_eq!(page.skip, 5);
    }

    #[test]
    fn summary_failure_yields_empty_summary() {
        let summary = AuditReader::new(&BrokenStore).summarize(None);
        assert_eq!(summary, ActivitySummary::default());
    }

    #[test]
    fn update_is_found_by_entity_with_changed_fields() {
        let tmp = TempDir::new().unwrap();
        let writer = AuditWriter::new(JsonAuditStore::new(tmp.path(), "audit.log"));
        let actor = ActorContext::new("admin", "Claire");

        let mut params = AuditParams::new(
            AuditAction::Update,
            "resident",
            "deactivate resident",
            AuditModule::Admin,
        );
        params.previous_data = json!({"isActive": true}).as_object().cloned();
        params.new_data = json!({"isActive": false}).as_object().cloned();
        writer.write(&actor, params, None).unwrap();

        let other = AuditParams::new(AuditAction::View, "patient", "view", AuditModule::Patients);
        writer.write(&actor, other, None).unwrap();

        let filter = AuditFilter {
            entity: Some("resident".to_string()),
            ..AuditFilter::default()
        };
        let page = AuditReader::new(writer.store()).query(&filter, Page::default());

        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].changed_fields, vec!["isActive"]);
    }

    #[test]
    fn filters_combine_with_and() {
        let tmp = TempDir::new().unwrap();
        let writer = AuditWriter::new(JsonAuditStore::new(tmp.path(), "audit.log"));
        let actor = ActorContext::new("nurse", "Jean");

        writer.log_auth(AuditAction::Login, &actor, true, None, None);
        writer.log_auth(AuditAction::LoginAttempt, &actor, false, None, None);
        writer.log_auth(AuditAction::LoginAttempt, &actor, true, None, None);

        let filter = AuditFilter {
            action: Some(AuditAction::LoginAttempt),
            success: Some(false),
            ..AuditFilter::default()
        };
        let page = AuditReader::new(writer.store()).query(&filter, Page::default());
        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].severity, Severity::Medium);

        let by_module = AuditFilter {
            module: Some(AuditModule::Auth),
            severity: Some(Severity::Low),
            ..AuditFilter::default()
        };
        assert_eq!(
            AuditReader::new(writer.store())
                .query(&by_module, Page::default())
                .total,
            2
        );
    }

    #[test]
    fn summary_counts_outcomes_and_lists_values() {
        let tmp = TempDir::new().unwrap();
        let writer = AuditWriter::new(JsonAuditStore::new(tmp.path(), "audit.log"));

        writer.log_auth(
            AuditAction::Login,
            &ActorContext::new("nurse", "Jean"),
            true,
            None,
            None,
        );
        writer.log_auth(
            AuditAction::LoginAttempt,
            &ActorContext::new("replacement", "Sam"),
            false,
            None,
            None,
        );
        let params = AuditParams::new(
            AuditAction::GenerateReport,
            "report",
            "shift report",
            AuditModule::Reports,
        );
        writer.write(&ActorContext::new("admin", "Claire"), params, None);

        let summary = AuditReader::new(writer.store()).summarize(None);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            summary.modules,
            vec![AuditModule::Auth, AuditModule::Auth, AuditModule::Reports]
        );
        assert_eq!(summary.user_names, vec!["Jean", "Sam", "Claire"]);
        assert_eq!(
            summary.severities,
            vec![Severity::Low, Severity::Medium, Severity::Low]
        );
    }

    #[test]
    fn summary_respects_date_range() {
        let tmp = TempDir::new().unwrap();
        let store = JsonAuditStore::new(tmp.path(), "audit.log");
        seed(&store, 5);

        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 1, 0).unwrap();
        let range = DateRange {
            start: Some(start),
            end: Some(start + Duration::minutes(2)),
        };
        let summary = AuditReader::new(&store).summarize(Some(&range));

        assert_eq!(summary.total, 3);
    }
}
