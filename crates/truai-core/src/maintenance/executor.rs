//! Plan execution seam
//!
//! [`PendingExecutor`] records that execution started and contacts no AI
//! service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::plan::MaintenancePlan;
use crate::audit::{AuditLog, MaintenanceOperation, Outcome};
use crate::error::{Result, TruAiError};
use crate::types::RequestContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    ExecutionStarted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub status: ExecutionStatus,
    pub message: String,
    pub plan: MaintenancePlan,
    pub next_step: String,
}

/// Carries out a plan the user has approved
pub trait PlanExecutor: fmt::Debug + Send + Sync {
    fn execute(&self, plan: &MaintenancePlan, context: &RequestContext) -> Result<ExecutionReport>;
}

/// Records the start of execution without contacting any AI service
#[derive(Debug, Clone)]
pub struct PendingExecutor {
    audit: Arc<AuditLog>,
}

impl PendingExecutor {
    pub fn new(audit: Arc<AuditLog>) -> Self {
        Self { audit }
    }
}

impl PlanExecutor for PendingExecutor {
    fn execute(&self, plan: &MaintenancePlan, context: &RequestContext) -> Result<ExecutionReport> {
        if plan.summary.trim().is_empty() {
            return Err(TruAiError::MissingField("summary".to_string()));
        }

        self.audit.log_maintenance_operation(MaintenanceOperation {
            user_id: context.user_or_system().to_string(),
            command: plan.summary.clone(),
            summary: plan.summary.clone(),
            files_affected: plan.files_to_modify.clone(),
            ai_source: plan.ai_source.to_string(),
            risk_level: Some(plan.risk_level),
            authorized: true,
            plan: Some(plan.clone()),
            user_approval: Some(true),
            outcome: Outcome::Executing,
            rollback_available: true,
            rejection_reason: None,
        })?;

        tracing::info!("Execution started for '{}' via {}", plan.summary, plan.ai_source);

        Ok(ExecutionReport {
            status: ExecutionStatus::ExecutionStarted,
            message: format!(
                "Maintenance operation handed to {}. AI integration is pending; no files were changed.",
                plan.ai_source
            ),
            plan: plan.clone(),
            next_step: "Review output and validate changes".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditFilter, EntryType};
    use crate::config::CoreConfig;
    use crate::types::{AiSource, RiskLevel};

    fn plan(summary: &str) -> MaintenancePlan {
        MaintenancePlan::new(
            summary,
            vec!["phantom-ai/Workflow/*.php".to_string()],
            AiSource::Claude,
            RiskLevel::Medium,
        )
    }

    #[test]
    fn test_execution_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let audit = Arc::new(AuditLog::new(&CoreConfig::new().with_data_dir(dir.path())));
        let executor = PendingExecutor::new(audit.clone());

        let report = executor
            .execute(
                &plan("Action: refactor, Target: review workflow"),
                &RequestContext::new().with_user("admin"),
            )
            .unwrap();

        assert_eq!(report.status, ExecutionStatus::ExecutionStarted);
        assert_eq!(report.next_step, "Review output and validate changes");

        let ops = audit
            .query(&AuditFilter::new().by_type(EntryType::MaintenanceOperation))
            .unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].get("outcome").unwrap(), "executing");
        assert_eq!(ops[0].get("user_approval").unwrap(), true);
        assert_eq!(ops[0].user_id(), Some("admin"));
    }

    #[test]
    fn test_plan_without_summary_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let audit = Arc::new(AuditLog::new(&CoreConfig::new().with_data_dir(dir.path())));
        let executor = PendingExecutor::new(audit.clone());

        let err = executor.execute(&plan(" "), &RequestContext::default()).unwrap_err();
        assert!(matches!(err, TruAiError::MissingField(f) if f == "summary"));
        assert!(audit.query(&AuditFilter::new()).unwrap().is_empty());
    }
}
