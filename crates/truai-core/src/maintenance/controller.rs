//! Maintenance command pipeline
//!
//! Parses a natural-language command, builds a [`MaintenanceRequest`] and
//! hands it to the authorizer. Approved plans wait for a human before
//! [`MaintenanceController::execute_plan`] runs them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::authorizer::{AuthorizationDecision, MaintenanceAuthorizer};
use super::command::{risk_level, CommandParser, MaintenanceAction, ParsedCommand, USAGE_EXAMPLES};
use super::executor::{ExecutionReport, PlanExecutor};
use super::mode::MaintenanceMode;
use super::plan::{MaintenancePlan, RollbackStrategy};
use super::request::MaintenanceRequest;
use crate::audit::{AuditLog, StoredEntry};
use crate::error::Result;
use crate::policy::PolicyViolation;
use crate::types::{AiSource, RequestContext, RiskLevel};

/// What a parsed command is expected to do, before authorization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceIntent {
    pub command: String,
    pub summary: String,
    pub action: MaintenanceAction,
    pub target: String,
    pub files_affected: Vec<String>,
    pub ai_source: AiSource,
    pub risk_level: RiskLevel,
    pub user_id: String,
}

impl MaintenanceIntent {
    pub fn to_request(&self) -> MaintenanceRequest {
        MaintenanceRequest::new(self.command.clone(), self.summary.clone())
            .with_files(self.files_affected.clone())
            .with_approved_source(self.ai_source)
            .with_risk_level(self.risk_level)
            .with_user(self.user_id.clone())
    }
}

/// Result of processing one maintenance command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MaintenanceResponse {
    /// Refused before authorization was attempted
    Rejected {
        error: String,
        message: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        examples: Vec<String>,
    },
    Denied {
        intent: MaintenanceIntent,
        reason: String,
        violations: Vec<PolicyViolation>,
    },
    AwaitingApproval {
        intent: MaintenanceIntent,
        plan: MaintenancePlan,
        rollback_strategy: RollbackStrategy,
        message: String,
    },
}

impl MaintenanceResponse {
    pub fn success(&self) -> bool {
        matches!(self, Self::AwaitingApproval { .. })
    }

    pub fn plan(&self) -> Option<&MaintenancePlan> {
        match self {
            Self::AwaitingApproval { plan, .. } => Some(plan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceStatistics {
    pub total_operations: usize,
    pub maintenance_mode_enabled: bool,
    /// Newest first
    pub recent_operations: Vec<StoredEntry>,
}

/// Turns free-text maintenance commands into authorized, approvable plans
#[derive(Debug)]
pub struct MaintenanceController {
    mode: MaintenanceMode,
    authorizer: Arc<MaintenanceAuthorizer>,
    parser: CommandParser,
    executor: Box<dyn PlanExecutor>,
    audit: Arc<AuditLog>,
}

impl MaintenanceController {
    pub fn new(
        authorizer: Arc<MaintenanceAuthorizer>,
        parser: CommandParser,
        executor: Box<dyn PlanExecutor>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            mode: authorizer.mode().clone(),
            authorizer,
            parser,
            executor,
            audit,
        }
    }

    pub fn is_maintenance_mode_enabled(&self) -> bool {
        self.mode.is_enabled()
    }

    pub fn set_maintenance_mode(&self, enabled: bool) -> Result<()> {
        self.authorizer.set_maintenance_mode(enabled)
    }

    pub fn process(&self, command: &str, context: &RequestContext) -> Result<MaintenanceResponse> {
        if !self.mode.is_enabled() {
            tracing::info!("Maintenance command refused, mode is off: '{}'", command);
            return Ok(MaintenanceResponse::Rejected {
                error: "maintenance mode is not enabled".to_string(),
                message: "Enable maintenance mode before executing maintenance commands".to_string(),
                examples: Vec::new(),
            });
        }

        let parsed = match self.parser.parse(command) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::info!("{}", e);
                return Ok(MaintenanceResponse::Rejected {
                    error: "invalid command format".to_string(),
                    message: "Command must follow the pattern: <action> <target>".to_string(),
                    examples: USAGE_EXAMPLES.iter().map(|s| s.to_string()).collect(),
                });
            }
        };

        let intent = self.intent(parsed, context);

        match self.authorizer.authorize(&intent.to_request())? {
            AuthorizationDecision::Approved { plan, rollback } => {
                Ok(MaintenanceResponse::AwaitingApproval {
                    intent,
                    plan,
                    rollback_strategy: rollback,
                    message: "Maintenance plan generated. Review and approve it to proceed."
                        .to_string(),
                })
            }
            AuthorizationDecision::Denied(denial) => Ok(MaintenanceResponse::Denied {
                reason: denial.message(),
                violations: denial.violations,
                intent,
            }),
        }
    }

    /// Hand an approved plan to the executor
    pub fn execute_plan(
        &self,
        plan: &MaintenancePlan,
        context: &RequestContext,
    ) -> Result<ExecutionReport> {
        self.executor.execute(plan, context)
    }

    pub fn statistics(&self) -> Result<MaintenanceStatistics> {
        let total_operations = self.audit.statistics()?.total_maintenance_ops;
        let recent_operations = self
            .audit
            .maintenance_entries()?
            .into_iter()
            .rev()
            .take(self.audit.recent_limit())
            .collect();

        Ok(MaintenanceStatistics {
            total_operations,
            maintenance_mode_enabled: self.mode.is_enabled(),
            recent_operations,
        })
    }

    fn intent(&self, parsed: ParsedCommand, context: &RequestContext) -> MaintenanceIntent {
        let files_affected = self.parser.estimate_affected_files(&parsed.target);
        let risk = risk_level(&files_affected, parsed.action);

        MaintenanceIntent {
            summary: format!("Action: {}, Target: {}", parsed.action, parsed.target),
            ai_source: parsed.action.source(),
            risk_level: risk,
            user_id: context.user_or_system().to_string(),
            files_affected,
            action: parsed.action,
            target: parsed.target,
            command: parsed.original,
        }
    }
}
