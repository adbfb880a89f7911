//! The [`TruAiCore`] facade
//!
//! Wires one audit log, one maintenance-mode flag and one policy guard into
//! every component, and exposes the inbound operations callers use.

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::audit::{
    AiInteraction, AuditEntry, AuditFilter, AuditLog, AuditPayload, AuditStatistics,
    CopilotEscalation, MaintenanceOperation, Outcome, SettingProposal, StoredEntry,
};
use crate::config::CoreConfig;
use crate::error::{Result, TruAiError};
use crate::learning::{
    LearningEngine, Lesson, MetadataStore, PerformanceStats, Recommendation, TaskMetadata,
};
use crate::maintenance::{
    AuthorizationDecision, CommandParser, ExecutionReport, MaintenanceAuthorizer,
    MaintenanceController, MaintenanceMode, MaintenancePlan, MaintenanceRequest,
    MaintenanceResponse, MaintenanceStatistics, PendingExecutor,
};
use crate::policy::PolicyGuard;
use crate::routing::{
    escalation_prompt, ArbitrationResult, EscalationBrief, RoutedTask, SourceArbitrator,
    TaskClassification, TaskRouter, TierClassifier,
};
use crate::types::{RequestContext, Tier};

#[derive(Debug)]
pub struct TruAiCore {
    config: CoreConfig,
    audit: Arc<AuditLog>,
    guard: Arc<PolicyGuard>,
    classifier: TierClassifier,
    arbitrator: SourceArbitrator,
    router: TaskRouter,
    authorizer: Arc<MaintenanceAuthorizer>,
    controller: MaintenanceController,
    learning: LearningEngine,
}

impl TruAiCore {
    pub fn new(config: CoreConfig) -> Self {
        Self::with_policy_guard(config, PolicyGuard::new())
    }

    /// Build the core around a guard with custom policy checks
    pub fn with_policy_guard(config: CoreConfig, guard: PolicyGuard) -> Self {
        let audit = Arc::new(AuditLog::new(&config));
        let guard = Arc::new(guard);
        let classifier = TierClassifier::new();

        let authorizer = Arc::new(MaintenanceAuthorizer::new(
            MaintenanceMode::new(),
            guard.clone(),
            audit.clone(),
        ));
        let controller = MaintenanceController::new(
            authorizer.clone(),
            CommandParser::new(config.subsystem_hints.clone()),
            Box::new(PendingExecutor::new(audit.clone())),
            audit.clone(),
        );

        let learning = LearningEngine::new(Arc::new(MetadataStore::new(config.metadata_dir())));

        tracing::debug!("TruAi core initialized at {}", config.data_dir.display());

        Self {
            arbitrator: SourceArbitrator::new(audit.clone()),
            router: TaskRouter::new(classifier.clone()),
            classifier,
            authorizer,
            controller,
            learning,
            guard,
            audit,
            config,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    // ---- routing ----

    pub fn classify_task(&self, description: &str, context: &RequestContext) -> TaskClassification {
        self.classifier.classify(description, context)
    }

    pub fn route_task(
        &self,
        task_id: &str,
        description: &str,
        context: &RequestContext,
    ) -> RoutedTask {
        self.router.route(task_id, description, context)
    }

    pub fn arbitrate_source(&self, task_type: &str, context: &RequestContext) -> ArbitrationResult {
        self.arbitrator.arbitrate(task_type, context)
    }

    /// Arbitrate, then record the exchange as an AI interaction when the
    /// caller is identified
    pub fn arbitrate_and_record(
        &self,
        task_type: &str,
        description: &str,
        context: &RequestContext,
    ) -> ArbitrationResult {
        let result = self.arbitrator.arbitrate(task_type, context);

        if let Some(user_id) = context.user_id.as_deref() {
            let tier = self.classifier.classify(description, context).tier;
            let interaction = AiInteraction::new(user_id, description, tier)
                .with_source(result.source)
                .with_outcome(Outcome::Arbitrated);

            if let Err(e) = self.audit.log_ai_interaction(interaction) {
                tracing::warn!("Arbitrated interaction for {} not recorded: {}", user_id, e);
            }
        }

        result
    }

    /// Render the high-tier prompt for a ready task and record the escalation
    pub fn escalate_to_copilot(
        &self,
        task: &RoutedTask,
        brief: &EscalationBrief,
        context: &RequestContext,
    ) -> Result<String> {
        let RoutedTask::ReadyForExecution {
            task_id,
            reason,
            compressed_prompt,
            ..
        } = task
        else {
            return Err(TruAiError::InvalidPayload(format!(
                "task {} needs clarification before escalation",
                task.task_id()
            )));
        };

        let prompt = escalation_prompt(task, brief);
        self.audit.log_copilot_escalation(CopilotEscalation {
            user_id: context.user_id.clone(),
            task_id: Some(task_id.clone()),
            reason: reason.clone(),
            task_description: compressed_prompt.clone(),
            context_provided: brief.files_to_modify.iter().cloned().map(Value::from).collect(),
            outcome: Outcome::Pending,
        })?;

        tracing::info!("Task {} escalated to copilot", task_id);
        Ok(prompt)
    }

    // ---- maintenance ----

    pub fn set_maintenance_mode(&self, enabled: bool) -> Result<()> {
        self.authorizer.set_maintenance_mode(enabled)
    }

    pub fn is_maintenance_mode_enabled(&self) -> bool {
        self.authorizer.is_maintenance_mode_enabled()
    }

    pub fn process_maintenance_command(
        &self,
        command: &str,
        context: &RequestContext,
    ) -> Result<MaintenanceResponse> {
        self.controller.process(command, context)
    }

    /// Authorize a request built outside the command parser
    pub fn authorize_maintenance(
        &self,
        request: &MaintenanceRequest,
    ) -> Result<AuthorizationDecision> {
        self.authorizer.authorize(request)
    }

    pub fn execute_plan(
        &self,
        plan: &MaintenancePlan,
        context: &RequestContext,
    ) -> Result<ExecutionReport> {
        self.controller.execute_plan(plan, context)
    }

    pub fn maintenance_statistics(&self) -> Result<MaintenanceStatistics> {
        self.controller.statistics()
    }

    // ---- learning ----

    /// Validate and store task metadata; returns the lessons it teaches
    pub fn record_task_metadata(&self, payload: &Value) -> Result<Vec<Lesson>> {
        let task = TaskMetadata::from_payload(payload)?;
        self.learning.record(&task)
    }

    pub fn task_metadata(&self, task_id: &str) -> Result<Option<TaskMetadata>> {
        self.learning.store().get(task_id)
    }

    pub fn performance_stats(&self) -> Result<PerformanceStats> {
        self.learning.performance_stats()
    }

    pub fn performance_report(&self) -> Result<String> {
        Ok(self.learning.performance_stats()?.report())
    }

    pub fn optimization_recommendations(&self) -> Result<Vec<Recommendation>> {
        self.learning.recommendations()
    }

    /// Historically best tier for `task_type`; cheap without history
    pub fn suggest_tier(&self, task_type: &str) -> Result<Tier> {
        self.learning.suggest_tier(task_type)
    }

    // ---- policy ----

    pub fn enforce_policy(&self, policy_id: &str, context: &RequestContext) -> bool {
        self.guard.enforce(policy_id, context)
    }

    // ---- audit ----

    pub fn log_ai_interaction(&self, payload: &Value) -> bool {
        self.log_payload::<AiInteraction>(payload, AuditEntry::AiInteraction)
    }

    pub fn log_maintenance_operation(&self, payload: &Value) -> bool {
        self.log_payload::<MaintenanceOperation>(payload, AuditEntry::MaintenanceOperation)
    }

    pub fn log_setting_proposal(&self, payload: &Value) -> bool {
        self.log_payload::<SettingProposal>(payload, AuditEntry::SettingProposal)
    }

    pub fn log_copilot_escalation(&self, payload: &Value) -> bool {
        self.log_payload::<CopilotEscalation>(payload, AuditEntry::CopilotEscalation)
    }

    pub fn query(&self, filter: &AuditFilter) -> Result<Vec<StoredEntry>> {
        self.audit.query(filter)
    }

    pub fn statistics(&self) -> Result<AuditStatistics> {
        self.audit.statistics()
    }

    pub fn export_audit_log(
        &self,
        output: impl AsRef<Path>,
        filter: &AuditFilter,
    ) -> Result<usize> {
        self.audit.export(output, filter)
    }

    /// Validate and append a loose payload; false when it was not written
    fn log_payload<T: AuditPayload>(&self, payload: &Value, wrap: fn(T) -> AuditEntry) -> bool {
        let entry = match T::from_payload(payload) {
            Ok(typed) => wrap(typed),
            Err(e) => {
                tracing::warn!("Audit payload refused: {}", e);
                return false;
            }
        };

        match self.audit.append(entry) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Audit payload not written: {}", e);
                false
            }
        }
    }
}
