use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::core::models::audit_entry::{AuditAction, AuditEntry, AuditModule, Severity};

/// Default number of entries returned per page.
pub const DEFAULT_LIMIT: usize = 50;

/// Inclusive bounds on an entry's timestamp. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| ts >= s) && self.end.is_none_or(|e| ts <= e)
    }
}

/// Criteria for selecting entries. Every field set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<AuditAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<AuditModule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl AuditFilter {
    /// A filter restricted to a date range only.
    pub fn in_range(range: &DateRange) -> Self {
        Self {
            start_date: range.start,
            end_date: range.end,
            ..Self::default()
        }
    }

    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if !self.date_range().contains(entry.timestamp) {
            return false;
        }
        if let Some(user_id) = &self.user_id
            && entry.user_id.as_ref() != Some(user_id)
        {
            return false;
        }
        if let Some(role) = &self.user_role
            && &entry.user_role != role
        {
            return false;
        }
        if let Some(entity) = &self.entity
            && &entry.entity != entity
        {
            return false;
        }

        self.action.is_none_or(|a| entry.action == a)
            && self.module.is_none_or(|m| entry.module == m)
            && self.severity.is_none_or(|s| entry.severity == s)
            && self.success.is_none_or(|s| entry.success == s)
    }
}

/// Which slice of the newest-first result set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub skip: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

/// One page of entries plus the uncapped match count.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub entries: Vec<AuditEntry>,
    pub total: usize,
    pub limit: usize,
    pub skip: usize,
}

impl QueryPage {
    /// The value returned when a query could not be answered.
    pub fn empty(page: Page) -> Self {
        Self {
            entries: Vec::new(),
            total: 0,
            limit: page.limit,
            skip: page.skip,
        }
    }

    /// Offset of the page after this one.
    pub fn next_skip(&self) -> usize {
        self.skip.saturating_add(self.limit)
    }

    pub fn has_more(&self) -> bool {
        self.next_skip() < self.total
    }
}

impl Serialize for QueryPage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("QueryPage", 5)?;
        state.serialize_field("entries", &self.entries)?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("limit", &self.limit)?;
        state.serialize_field("skip", &self.skip)?;
        state.serialize_field("hasMore", &self.has_more())?;
        state.end()
    }
}

/// Rollup over the entries in a date range.
///
/// The value lists are raw, one item per entry; grouping is left to the
/// presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub modules: Vec<AuditModule>,
    pub user_names: Vec<String>,
    pub severities: Vec<Severity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = DateRange {
            start: Some(at(1)),
            end: Some(at(3)),
        };
        assert!(range.contains(at(1)));
        assert!(range.contains(at(3)));
        assert!(!range.contains(at(4)));
    }

    #[test]
    fn open_range_contains_everything() {
        assert!(DateRange::default().contains(at(20)));
    }

    #[test]
    fn has_more_accounts_for_skip() {
        let page = QueryPage {
            entries: Vec::new(),
            total: 12,
            limit: 5,
            skip: 5,
        };
        assert!(page.has_more());
        assert!(!QueryPage { skip: 10, ..page }.has_more());
    }

    #[test]
    fn unbounded_limit_does_not_overflow() {
        let page = QueryPage {
            entries: Vec::new(),
            total: 3,
            limit: usize::MAX,
            skip: 1,
        };
        assert!(!page.has_more());
        assert_eq!(page.next_skip(), usize::MAX);
    }

    #[test]
    fn page_json_includes_has_more() {
        let page = QueryPage {
            entries: Vec::new(),
            total: 12,
            limit: 5,
            skip: 0,
        };
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"entries": [], "total": 12, "limit": 5, "skip": 0, "hasMore": true})
        );
    }

    #[test]
    fn empty_filter_serializes_to_empty_object() {
        let json = serde_json::to_string(&AuditFilter::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
