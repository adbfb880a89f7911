//! AI source arbitration
//!
//! Decides which approved AI source handles a task type. A caller may name a
//! preferred source; it wins only when it is in the approved set; otherwise
//! it is ignored and the routing table decides. Arbitration never fails.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::audit::{AuditLog, CoreEventKind};
use crate::types::{now, AiSource, RequestContext};

/// Task type → source, consulted when no valid override is present
pub const ROUTING_TABLE: [(&str, AiSource); 7] = [
    ("planning", AiSource::Chatgpt),
    ("design", AiSource::Chatgpt),
    ("code_review", AiSource::Claude),
    ("refactor", AiSource::Claude),
    ("production_code", AiSource::Copilot),
    ("research", AiSource::Github),
    ("references", AiSource::Github),
];

/// Source used for task types missing from the routing table
pub const DEFAULT_SOURCE: AiSource = AiSource::Chatgpt;

/// How the source was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbitrationMethod {
    Automatic,
    UserOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationResult {
    pub source: AiSource,
    pub reason: String,
    pub method: ArbitrationMethod,
}

/// Look up the routing table
pub fn route_task_type(task_type: &str) -> AiSource {
    ROUTING_TABLE
        .iter()
        .find(|(name, _)| *name == task_type)
        .map(|(_, source)| *source)
        .unwrap_or(DEFAULT_SOURCE)
}

#[derive(Debug, Clone)]
pub struct SourceArbitrator {
    audit: Arc<AuditLog>,
}

impl SourceArbitrator {
    pub fn new(audit: Arc<AuditLog>) -> Self {
        Self { audit }
    }

    pub fn arbitrate(&self, task_type: &str, context: &RequestContext) -> ArbitrationResult {
        let result = match context.preference().and_then(AiSource::from_name) {
            Some(source) => ArbitrationResult {
                source,
                reason: "User override".to_string(),
                method: ArbitrationMethod::UserOverride,
            },
            None => {
                if let Some(rejected) = context.preference() {
                    tracing::debug!("Ignoring unapproved source preference '{}'", rejected);
                }
                let source = route_task_type(task_type);
                ArbitrationResult {
                    source,
                    reason: source.description().to_string(),
                    method: ArbitrationMethod::Automatic,
                }
            }
        };

        self.record(task_type, &result);
        result
    }

    fn record(&self, task_type: &str, result: &ArbitrationResult) {
        tracing::info!(
            "Arbitrated '{}' to {} ({:?})",
            task_type,
            result.source,
            result.method
        );

        let data = json!({
            "task_type": task_type,
            "ai_source": result.source,
            "method": result.method,
            "timestamp": now().timestamp(),
        });

        if let Err(e) = self.audit.record_event(CoreEventKind::AiArbitration, data) {
            tracing::warn!("Arbitration event for '{}' not recorded: {}", task_type, e);
        }
    }
}
