//! Read side of the audit log: filters, raw entries and statistics
//!
//! Readers work on the raw JSON object of each line rather than the typed
//! [`AuditRecord`](super::AuditRecord), so fields added by newer writers
//! survive a query untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::entry::EntryType;

/// One entry as read back from a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredEntry(Map<String, Value>);

impl StoredEntry {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The `type` field, if present and a string
    pub fn entry_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// The `user_id` field, if present and a string
    pub fn user_id(&self) -> Option<&str> {
        self.0.get("user_id").and_then(Value::as_str)
    }
}

/// Equality filters over top-level entry fields
///
/// An entry matches when it carries every filtered field with exactly the
/// filtered value. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditFilter(BTreeMap<String, Value>);

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn by_type(self, entry_type: EntryType) -> Self {
        self.eq("type", entry_type.as_str())
    }

    pub fn by_user(self, user_id: impl Into<String>) -> Self {
        self.eq("user_id", user_id.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, entry: &StoredEntry) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| entry.get(field) == Some(expected))
    }
}

/// Aggregate view over the whole audit stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditStatistics {
    pub total_interactions: usize,
    pub total_maintenance_ops: usize,
    pub total_setting_proposals: usize,
    pub total_copilot_escalations: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_user: BTreeMap<String, usize>,
    /// Newest first
    pub recent_entries: Vec<StoredEntry>,
}

impl AuditStatistics {
    /// Rebuild the projection by replaying entries in file order
    pub fn replay(entries: Vec<StoredEntry>, recent_limit: usize) -> Self {
        let mut stats = Self::default();

        for entry in &entries {
            let entry_type = entry.entry_type().unwrap_or("unknown");
            *stats.by_type.entry(entry_type.to_string()).or_default() += 1;

            if let Some(user) = entry.user_id() {
                *stats.by_user.entry(user.to_string()).or_default() += 1;
            }

            match entry_type {
                "ai_interaction" => stats.total_interactions += 1,
                "maintenance_operation" => stats.total_maintenance_ops += 1,
                "setting_proposal" => stats.total_setting_proposals += 1,
                "copilot_escalation" => stats.total_copilot_escalations += 1,
                _ => {}
            }
        }

        stats.recent_entries = entries.into_iter().rev().take(recent_limit).collect();
        stats
    }

    pub fn total_entries(&self) -> usize {
        self.by_type.values().sum()
    }
}
