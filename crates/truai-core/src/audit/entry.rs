//! Audit entry schema
//!
//! One struct per entry type. Required fields are plain values, optional
//! fields carry serde defaults so partially-filled payloads coming from the
//! dashboard can be accepted as long as the required keys are present.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Result, TruAiError};
use crate::maintenance::MaintenancePlan;
use crate::types::{now, AiSource, RiskLevel, Tier, Timestamp};

/// Discriminant of an audit entry, as written in its `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    AiInteraction,
    MaintenanceOperation,
    SettingProposal,
    PolicyCheck,
    CopilotEscalation,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AiInteraction => "ai_interaction",
            Self::MaintenanceOperation => "maintenance_operation",
            Self::SettingProposal => "setting_proposal",
            Self::PolicyCheck => "policy_check",
            Self::CopilotEscalation => "copilot_escalation",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle outcome recorded on an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Pending,
    Success,
    Fail,
    Rejected,
    AwaitingApproval,
    Executing,
    Arbitrated,
}

/// User decision on a proposed setting change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDecision {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Typed entry payloads that can also be built from loose JSON
pub trait AuditPayload: DeserializeOwned {
    /// Keys that must be present and non-null
    const REQUIRED: &'static [&'static str];

    /// Validate required keys, then decode the rest with serde defaults
    fn from_payload(payload: &Value) -> Result<Self> {
        let Some(object) = payload.as_object() else {
            return Err(TruAiError::InvalidPayload(
                "payload must be a JSON object".to_string(),
            ));
        };

        for field in Self::REQUIRED {
            match object.get(*field) {
                None | Some(Value::Null) => {
                    return Err(TruAiError::MissingField((*field).to_string()))
                }
                Some(_) => {}
            }
        }

        serde_json::from_value(payload.clone())
            .map_err(|e| TruAiError::InvalidPayload(e.to_string()))
    }
}

fn default_true() -> bool {
    true
}

/// A single exchange with an AI source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiInteraction {
    pub user_id: String,
    pub input_text: String,
    pub context_items: Vec<Value>,
    pub ai_tier: Tier,
    #[serde(default)]
    pub ai_source: Option<String>,
    #[serde(default)]
    pub suggested_changes: Vec<Value>,
    #[serde(default)]
    pub user_approvals: Vec<Value>,
    #[serde(default)]
    pub outcome: Outcome,
}

impl AiInteraction {
    pub fn new(user_id: impl Into<String>, input_text: impl Into<String>, ai_tier: Tier) -> Self {
        Self {
            user_id: user_id.into(),
            input_text: input_text.into(),
            context_items: Vec::new(),
            ai_tier,
            ai_source: None,
            suggested_changes: Vec::new(),
            user_approvals: Vec::new(),
            outcome: Outcome::Pending,
        }
    }

    pub fn with_source(mut self, source: AiSource) -> Self {
        self.ai_source = Some(source.as_str().to_string());
        self
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }
}

impl AuditPayload for AiInteraction {
    const REQUIRED: &'static [&'static str] =
        &["user_id", "input_text", "ai_tier", "context_items"];
}

/// A maintenance decision or execution step
///
/// `risk_level` is optional on the struct because a request denied for a
/// missing risk level is still recorded as submitted; payloads arriving from
/// outside must carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceOperation {
    pub user_id: String,
    pub command: String,
    #[serde(default)]
    pub summary: String,
    pub files_affected: Vec<String>,
    pub ai_source: String,
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub authorized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<MaintenancePlan>,
    #[serde(default)]
    pub user_approval: Option<bool>,
    #[serde(default)]
    pub outcome: Outcome,
    #[serde(default = "default_true")]
    pub rollback_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl AuditPayload for MaintenanceOperation {
    const REQUIRED: &'static [&'static str] =
        &["user_id", "command", "files_affected", "ai_source", "risk_level"];
}

/// A proposed change to a system setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingProposal {
    #[serde(default)]
    pub user_id: Option<String>,
    pub setting_name: String,
    pub current_value: Value,
    pub proposed_value: Value,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub ai_source: Option<String>,
    #[serde(default)]
    pub user_decision: UserDecision,
    #[serde(default)]
    pub applied: bool,
}

impl AuditPayload for SettingProposal {
    const REQUIRED: &'static [&'static str] = &["setting_name", "current_value", "proposed_value"];
}

/// The result of evaluating a policy against some context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCheck {
    pub policy_name: String,
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub violations: Vec<String>,
}

impl AuditPayload for PolicyCheck {
    const REQUIRED: &'static [&'static str] = &["policy_name"];
}

/// A task handed up to the high tier
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CopilotEscalation {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub task_description: String,
    #[serde(default)]
    pub context_provided: Vec<Value>,
    #[serde(default)]
    pub outcome: Outcome,
}

impl AuditPayload for CopilotEscalation {
    const REQUIRED: &'static [&'static str] = &[];
}

/// Any audit entry, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEntry {
    AiInteraction(AiInteraction),
    MaintenanceOperation(MaintenanceOperation),
    SettingProposal(SettingProposal),
    PolicyCheck(PolicyCheck),
    CopilotEscalation(CopilotEscalation),
}

impl AuditEntry {
    pub fn entry_type(&self) -> EntryType {
        match self {
            Self::AiInteraction(_) => EntryType::AiInteraction,
            Self::MaintenanceOperation(_) => EntryType::MaintenanceOperation,
            Self::SettingProposal(_) => EntryType::SettingProposal,
            Self::PolicyCheck(_) => EntryType::PolicyCheck,
            Self::CopilotEscalation(_) => EntryType::CopilotEscalation,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::AiInteraction(e) => Some(&e.user_id),
            Self::MaintenanceOperation(e) => Some(&e.user_id),
            Self::SettingProposal(e) => e.user_id.as_deref(),
            Self::PolicyCheck(_) => None,
            Self::CopilotEscalation(e) => e.user_id.as_deref(),
        }
    }
}

/// An entry stamped with the moment it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub timestamp: Timestamp,
}

impl AuditRecord {
    pub fn new(entry: AuditEntry) -> Self {
        Self {
            entry,
            timestamp: now(),
        }
    }
}

/// Kinds of decision events written to the core event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreEventKind {
    AiArbitration,
    MaintenanceModeChanged,
    MaintenanceAuthorization,
}

/// A line of the core event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreEvent {
    pub event_type: CoreEventKind,
    pub data: Value,
    pub timestamp: Timestamp,
}

impl CoreEvent {
    pub fn new(event_type: CoreEventKind, data: Value) -> Self {
        Self {
            event_type,
            data,
            timestamp: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_flat_with_type_tag() {
        let record = AuditRecord::new(AuditEntry::AiInteraction(
            AiInteraction::new("u1", "hello", Tier::Cheap).with_source(AiSource::Chatgpt),
        ));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["type"], "ai_interaction");
        assert_eq!(value["user_id"], "u1");
        assert_eq!(value["ai_tier"], "cheap");
        assert_eq!(value["outcome"], "pending");
        assert!(value["timestamp"].is_string());

        let back: AuditRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_payload_missing_required_field() {
        let payload = json!({ "user_id": "u1", "input_text": "hi", "ai_tier": "mid" });
        let err = AiInteraction::from_payload(&payload).unwrap_err();
        assert!(matches!(err, TruAiError::MissingField(f) if f == "context_items"));
    }

    #[test]
    fn test_payload_null_counts_as_missing() {
        let payload = json!({
            "user_id": "u1",
            "command": "Fix x",
            "files_affected": ["a.php"],
            "ai_source": "copilot",
            "risk_level": null
        });
        let err = MaintenanceOperation::from_payload(&payload).unwrap_err();
        assert!(matches!(err, TruAiError::MissingField(f) if f == "risk_level"));
    }

    #[test]
    fn test_payload_defaults_applied() {
        let payload = json!({
            "user_id": "u1",
            "command": "Fix x",
            "files_affected": ["a.php"],
            "ai_source": "copilot",
            "risk_level": "medium"
        });
        let op = MaintenanceOperation::from_payload(&payload).unwrap();

        assert!(!op.authorized);
        assert!(op.rollback_available);
        assert_eq!(op.outcome, Outcome::Pending);
        assert_eq!(op.summary, "");
    }

    #[test]
    fn test_escalation_accepts_empty_object() {
        let esc = CopilotEscalation::from_payload(&json!({})).unwrap();
        assert_eq!(esc, CopilotEscalation::default());
        assert!(CopilotEscalation::from_payload(&json!("nope")).is_err());
    }
}
