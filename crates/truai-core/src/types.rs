//! Core types for TruAi
//!
//! This module defines the vocabulary shared by every component:
//! - Timestamps
//! - Approved AI sources
//! - Capability tiers and task types
//! - Risk levels
//! - The free-form request context passed in by callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Timestamp type alias
pub type Timestamp = DateTime<Utc>;

/// Create a timestamp for the current moment
pub fn now() -> Timestamp {
    Utc::now()
}

/// External AI sources the system is allowed to delegate work to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiSource {
    Github,
    Copilot,
    Chatgpt,
    Claude,
}

impl AiSource {
    /// Every approved source, in declaration order
    pub const ALL: [AiSource; 4] = [
        AiSource::Github,
        AiSource::Copilot,
        AiSource::Chatgpt,
        AiSource::Claude,
    ];

    /// Wire name of the source
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Copilot => "copilot",
            Self::Chatgpt => "chatgpt",
            Self::Claude => "claude",
        }
    }

    /// What the source is approved for
    pub fn description(self) -> &'static str {
        match self {
            Self::Github => "Reference code, issues, PRs",
            Self::Copilot => "High-tier production code",
            Self::Chatgpt => "Planning, refactors, documentation",
            Self::Claude => "Long-form reasoning, audits",
        }
    }

    /// Look up an approved source by its exact wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.as_str() == name)
    }

    /// Whether `name` is a member of the approved-source set
    pub fn is_approved(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl fmt::Display for AiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost/capability class of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Cheap,
    Mid,
    High,
}

impl Tier {
    /// Cheapest first
    pub const ALL: [Tier; 3] = [Tier::Cheap, Tier::Mid, Tier::High];

    /// Relative cost used for ROI reporting only
    pub fn cost_multiplier(self) -> f64 {
        match self {
            Self::Cheap => 1.0,
            Self::Mid => 5.0,
            Self::High => 20.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cheap => "cheap",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of work a task description asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    BasicResponse,
    Review,
    CodeGeneration,
    Testing,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BasicResponse => "basic_response",
            Self::Review => "review",
            Self::CodeGeneration => "code_generation",
            Self::Testing => "testing",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk tier of a maintenance operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied context accompanying a task or command
///
/// Only `user_id` and `user_preference` carry meaning for the core; any other
/// keys are kept in `extra` and passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_preference: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_preference(mut self, source: impl Into<String>) -> Self {
        self.user_preference = Some(source.into());
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// User id, or `system` when the caller is anonymous
    pub fn user_or_system(&self) -> &str {
        self.user_id.as_deref().unwrap_or("system")
    }

    /// The override preference, if one was given and is non-empty
    pub fn preference(&self) -> Option<&str> {
        self.user_preference
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approved_sources_are_exact_names() {
        assert!(AiSource::is_approved("claude"));
        assert!(AiSource::is_approved("github"));
        assert!(!AiSource::is_approved("Claude"));
        assert!(!AiSource::is_approved("gemini"));
        assert_eq!(AiSource::from_name("copilot"), Some(AiSource::Copilot));
    }

    #[test]
    fn test_tier_cost_multipliers() {
        assert_eq!(Tier::Cheap.cost_multiplier(), 1.0);
        assert_eq!(Tier::Mid.cost_multiplier(), 5.0);
        assert_eq!(Tier::High.cost_multiplier(), 20.0);
    }

    #[test]
    fn test_risk_levels_are_ordered() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
    }

    #[test]
    fn test_context_keeps_unknown_keys() {
        let json = r#"{"user_id":"admin","tier":"mid","files":["a.php"]}"#;
        let ctx: RequestContext = serde_json::from_str(json).unwrap();

        assert_eq!(ctx.user_or_system(), "admin");
        assert_eq!(ctx.extra.get("tier"), Some(&Value::from("mid")));
        assert!(ctx.preference().is_none());
    }

    #[test]
    fn test_blank_preference_is_ignored() {
        let ctx = RequestContext::new().with_preference("   ");
        assert!(ctx.preference().is_none());
        assert_eq!(ctx.user_or_system(), "system");
    }
}
