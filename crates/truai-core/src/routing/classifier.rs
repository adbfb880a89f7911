//! Tier classification
//!
//! A priority-ordered keyword classifier: the first family with any
//! substring match decides the tier, no scoring involved. The families are
//! plain data so the keyword lists can be tested on their own.

use serde::{Deserialize, Serialize};

use crate::types::{RequestContext, TaskType, Tier};

/// One row of the classification table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordFamily {
    pub task_type: TaskType,
    pub tier: Tier,
    pub reason: &'static str,
    pub keywords: &'static [&'static str],
}

impl KeywordFamily {
    /// `lowered` must already be lower-case
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Families in priority order: code generation, then review, then testing
pub const CLASSIFICATION_RULES: [KeywordFamily; 3] = [
    KeywordFamily {
        task_type: TaskType::CodeGeneration,
        tier: Tier::High,
        reason: "Requires code implementation",
        keywords: &[
            "implement",
            "create",
            "build",
            "generate",
            "add function",
            "write code",
            "develop",
            "code",
        ],
    },
    KeywordFamily {
        task_type: TaskType::Review,
        tier: Tier::Mid,
        reason: "Requires code review or validation",
        keywords: &["review", "check", "validate", "verify", "analyze", "inspect"],
    },
    KeywordFamily {
        task_type: TaskType::Testing,
        tier: Tier::Mid,
        reason: "Requires testing or verification",
        keywords: &["test", "run tests", "unit test", "integration test"],
    },
];

const FALLBACK_REASON: &str = "Basic response or planning task";

/// Result of classifying a task description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskClassification {
    pub tier: Tier,
    pub task_type: TaskType,
    pub reason: String,
}

impl TaskClassification {
    fn fallback() -> Self {
        Self {
            tier: Tier::Cheap,
            task_type: TaskType::BasicResponse,
            reason: FALLBACK_REASON.to_string(),
        }
    }

    pub fn cost_multiplier(&self) -> f64 {
        self.tier.cost_multiplier()
    }
}

impl From<&KeywordFamily> for TaskClassification {
    fn from(family: &KeywordFamily) -> Self {
        Self {
            tier: family.tier,
            task_type: family.task_type,
            reason: family.reason.to_string(),
        }
    }
}

/// Maps free-text task descriptions to a tier and task type
#[derive(Debug, Clone)]
pub struct TierClassifier {
    rules: Vec<KeywordFamily>,
}

impl Default for TierClassifier {
    fn default() -> Self {
        Self {
            rules: CLASSIFICATION_RULES.to_vec(),
        }
    }
}

impl TierClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom, already priority-ordered table
    pub fn with_rules(rules: Vec<KeywordFamily>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[KeywordFamily] {
        &self.rules
    }

    /// Classify a task; the context is accepted for interface stability and not consulted
    pub fn classify(&self, description: &str, _context: &RequestContext) -> TaskClassification {
        let lowered = description.to_lowercase();

        self.rules
            .iter()
            .find(|family| family.matches(&lowered))
            .map(TaskClassification::from)
            .unwrap_or_else(TaskClassification::fallback)
    }
}
