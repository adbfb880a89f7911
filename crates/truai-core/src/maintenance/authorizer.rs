//! Maintenance authorization
//!
//! Deny-first: a request passes only if every required field is present,
//! maintenance mode is on, the AI source is approved and the policy guard
//! finds nothing. Each call writes exactly one `maintenance_operation` entry
//! describing the outcome.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

use super::mode::MaintenanceMode;
use super::plan::{MaintenancePlan, RollbackStrategy};
use super::request::MaintenanceRequest;
use crate::audit::{AuditLog, CoreEventKind, MaintenanceOperation, Outcome, PolicyCheck};
use crate::error::Result;
use crate::policy::{PolicyGuard, PolicyViolation};
use crate::types::{now, AiSource};

/// Policy name under which the pre-authorization violation scan is audited
pub const VIOLATION_SCAN_POLICY: &str = "maintenance_violation_scan";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    MissingField(String),
    MaintenanceModeDisabled,
    SourceNotApproved,
    PolicyViolations,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::MaintenanceModeDisabled => f.write_str("maintenance mode is not enabled"),
            Self::SourceNotApproved => f.write_str("AI source not approved"),
            Self::PolicyViolations => f.write_str("policy violations detected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Denial {
    pub reason: DenialReason,
    /// Non-empty only for [`DenialReason::PolicyViolations`]
    pub violations: Vec<PolicyViolation>,
}

impl Denial {
    fn new(reason: DenialReason) -> Self {
        Self {
            reason,
            violations: Vec::new(),
        }
    }

    pub fn message(&self) -> String {
        self.reason.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AuthorizationDecision {
    Approved {
        plan: MaintenancePlan,
        rollback: RollbackStrategy,
    },
    Denied(Denial),
}

impl AuthorizationDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    pub fn plan(&self) -> Option<&MaintenancePlan> {
        match self {
            Self::Approved { plan, .. } => Some(plan),
            Self::Denied(_) => None,
        }
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Approved { .. } => None,
            Self::Denied(denial) => Some(denial),
        }
    }
}

#[derive(Debug)]
pub struct MaintenanceAuthorizer {
    mode: MaintenanceMode,
    guard: Arc<PolicyGuard>,
    audit: Arc<AuditLog>,
}

impl MaintenanceAuthorizer {
    pub fn new(mode: MaintenanceMode, guard: Arc<PolicyGuard>, audit: Arc<AuditLog>) -> Self {
        Self { mode, guard, audit }
    }

    /// Handle on the shared mode flag
    pub fn mode(&self) -> &MaintenanceMode {
        &self.mode
    }

    pub fn is_maintenance_mode_enabled(&self) -> bool {
        self.mode.is_enabled()
    }

    /// Record the transition, then flip the flag; the flag is untouched if
    /// the transition cannot be recorded
    pub fn set_maintenance_mode(&self, enabled: bool) -> Result<()> {
        self.audit.record_event(
            CoreEventKind::MaintenanceModeChanged,
            json!({ "enabled": enabled, "timestamp": now().timestamp() }),
        )?;

        let previous = self.mode.set(enabled);
        if previous != enabled {
            tracing::info!("Maintenance mode {}", if enabled { "enabled" } else { "disabled" });
        }
        Ok(())
    }

    /// Decide on `request` and record exactly one maintenance operation.
    /// The approval event is emitted only once that entry is durable.
    pub fn authorize(&self, request: &MaintenanceRequest) -> Result<AuthorizationDecision> {
        let decision = self.decide(request)?;

        self.audit
            .log_maintenance_operation(operation_entry(request, &decision))?;

        match &decision {
            AuthorizationDecision::Approved { plan, .. } => {
                tracing::info!("Authorized maintenance '{}'", request.command);
                let event = json!({
                    "command": request.command,
                    "authorized": true,
                    "plan": plan,
                    "timestamp": now().timestamp(),
                });
                if let Err(e) = self
                    .audit
                    .record_event(CoreEventKind::MaintenanceAuthorization, event)
                {
                    tracing::warn!(
                        "Authorization event for '{}' not recorded: {}",
                        request.command,
                        e
                    );
                }
            }
            AuthorizationDecision::Denied(denial) => {
                tracing::info!("Denied maintenance '{}': {}", request.command, denial.reason);
            }
        }

        Ok(decision)
    }

    fn decide(&self, request: &MaintenanceRequest) -> Result<AuthorizationDecision> {
        if let Some(field) = request.missing_field() {
            return Ok(denied(DenialReason::MissingField(field.to_string())));
        }

        if !self.mode.is_enabled() {
            return Ok(denied(DenialReason::MaintenanceModeDisabled));
        }

        let Some(source) = AiSource::from_name(&request.ai_source) else {
            return Ok(denied(DenialReason::SourceNotApproved));
        };

        let violations = self.guard.violations(request);
        self.audit.log_policy_check(PolicyCheck {
            policy_name: VIOLATION_SCAN_POLICY.to_string(),
            context: json!({
                "command": request.command,
                "files_affected": request.files_affected,
                "new_dependencies": request.new_dependencies,
            }),
            result: violations.is_empty(),
            violations: violations.iter().map(|v| v.message.clone()).collect(),
        })?;

        if !violations.is_empty() {
            return Ok(AuthorizationDecision::Denied(Denial {
                reason: DenialReason::PolicyViolations,
                violations,
            }));
        }

        // missing_field() guarantees a risk level here
        let Some(risk_level) = request.risk_level else {
            return Ok(denied(DenialReason::MissingField("risk_level".to_string())));
        };

        Ok(AuthorizationDecision::Approved {
            plan: MaintenancePlan::new(
                request.summary.clone(),
                request.files_affected.clone(),
                source,
                risk_level,
            ),
            rollback: RollbackStrategy::for_files(request.files_affected.clone()),
        })
    }
}

fn denied(reason: DenialReason) -> AuthorizationDecision {
    AuthorizationDecision::Denied(Denial::new(reason))
}

fn operation_entry(
    request: &MaintenanceRequest,
    decision: &AuthorizationDecision,
) -> MaintenanceOperation {
    let mut entry = MaintenanceOperation {
        user_id: request.user_id.clone(),
        command: request.command.clone(),
        summary: request.summary.clone(),
        files_affected: request.files_affected.clone(),
        ai_source: request.ai_source.clone(),
        risk_level: request.risk_level,
        authorized: false,
        plan: None,
        user_approval: None,
        outcome: Outcome::Rejected,
        rollback_available: true,
        rejection_reason: None,
    };

    match decision {
        AuthorizationDecision::Approved { plan, .. } => {
            entry.authorized = true;
            entry.plan = Some(plan.clone());
            entry.outcome = Outcome::AwaitingApproval;
        }
        AuthorizationDecision::Denied(denial) => {
            entry.rejection_reason = Some(denial.message());
        }
    }

    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditFilter, EntryType};
    use crate::config::CoreConfig;
    use crate::types::RiskLevel;

    struct Fixture {
        _dir: tempfile::TempDir,
        audit: Arc<AuditLog>,
        authorizer: MaintenanceAuthorizer,
    }

    fn fixture(enabled: bool) -> Fixture {
        let dir = tempfile::Builder::new()
            .prefix("truai_authorizer_")
            .tempdir()
            .unwrap();
        let audit = Arc::new(AuditLog::new(&CoreConfig::new().with_data_dir(dir.path())));
        let authorizer = MaintenanceAuthorizer::new(
            MaintenanceMode::new(),
            Arc::new(PolicyGuard::new()),
            audit.clone(),
        );
        if enabled {
            authorizer.set_maintenance_mode(true).unwrap();
        }
        Fixture {
            _dir: dir,
            audit,
            authorizer,
        }
    }

    fn docs_request() -> MaintenanceRequest {
        MaintenanceRequest::new(
            "Update documentation",
            "Action: update, Target: documentation",
        )
        .with_files(vec!["*.md".to_string()])
        .with_approved_source(AiSource::Chatgpt)
        .with_risk_level(RiskLevel::Low)
        .with_user("admin")
    }

    fn maintenance_ops(audit: &AuditLog) -> Vec<crate::audit::StoredEntry> {
        audit
            .query(&AuditFilter::new().by_type(EntryType::MaintenanceOperation))
            .unwrap()
    }

    #[test]
    fn test_approval_builds_plan_and_records_once() {
        let f = fixture(true);
        let decision = f.authorizer.authorize(&docs_request()).unwrap();

        let plan = decision.plan().unwrap();
        assert!(plan.approval_required);
        assert_eq!(plan.estimated_duration, "5-10 minutes");
        assert_eq!(plan.ai_source, AiSource::Chatgpt);

        let ops = maintenance_ops(&f.audit);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].get("outcome").unwrap(), "awaiting_approval");
        assert_eq!(ops[0].get("authorized").unwrap(), true);
        assert!(ops[0].get("plan").is_some());

        let events = f.audit.events().unwrap();
        assert!(events
            .iter()
            .any(|e| e.event_type == CoreEventKind::MaintenanceAuthorization));
    }

    #[test]
    fn test_missing_field_denied_first() {
        let f = fixture(false);
        let request = MaintenanceRequest::new("Fix it", "").with_source("skynet");

        let decision = f.authorizer.authorize(&request).unwrap();
        let denial = decision.denial().unwrap();
        assert_eq!(denial.reason, DenialReason::MissingField("summary".to_string()));
        assert_eq!(denial.message(), "missing required field: summary");

        let ops = maintenance_ops(&f.audit);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].get("outcome").unwrap(), "rejected");
        assert_eq!(
            ops[0].get("rejection_reason").unwrap(),
            "missing required field: summary"
        );
    }

    #[test]
    fn test_mode_disabled_denied_without_policy_check() {
        let f = fixture(false);
        let decision = f.authorizer.authorize(&docs_request()).unwrap();

        assert_eq!(
            decision.denial().unwrap().reason,
            DenialReason::MaintenanceModeDisabled
        );
        let checks = f
            .audit
            .query(&AuditFilter::new().by_type(EntryType::PolicyCheck))
            .unwrap();
        assert!(checks.is_empty());
    }

    #[test]
    fn test_unapproved_source_denied() {
        let f = fixture(true);
        let decision = f
            .authorizer
            .authorize(&docs_request().with_source("gemini"))
            .unwrap();
        assert_eq!(decision.denial().unwrap().reason, DenialReason::SourceNotApproved);
        assert!(decision.plan().is_none());
    }

    #[test]
    fn test_policy_violations_denied_with_list() {
        let f = fixture(true);
        let request = docs_request()
            .with_files(vec!["auth.php".to_string()])
            .with_risk_level(RiskLevel::High);

        let decision = f.authorizer.authorize(&request).unwrap();
        let denial = decision.denial().unwrap();
        assert_eq!(denial.reason, DenialReason::PolicyViolations);
        assert_eq!(denial.violations.len(), 1);
        assert_eq!(
            denial.violations[0].message,
            "Cannot modify authentication system without special approval"
        );

        let checks = f
            .audit
            .query(&AuditFilter::new().by_type(EntryType::PolicyCheck))
            .unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].get("result").unwrap(), false);
        assert_eq!(maintenance_ops(&f.audit).len(), 1);
    }

    #[test]
    fn test_mode_transitions_are_recorded() {
        let f = fixture(false);
        f.authorizer.set_maintenance_mode(true).unwrap();
        f.authorizer.set_maintenance_mode(false).unwrap();

        assert!(!f.authorizer.is_maintenance_mode_enabled());
        let events = f.audit.events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data["enabled"], true);
        assert_eq!(events[1].data["enabled"], false);
    }

    fn blocked_fixture(configure: impl FnOnce(&mut CoreConfig)) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blocked"), "plain file").unwrap();

        let mut config = CoreConfig::new().with_data_dir(dir.path());
        configure(&mut config);
        let audit = Arc::new(AuditLog::new(&config));
        let authorizer = MaintenanceAuthorizer::new(
            MaintenanceMode::new(),
            Arc::new(PolicyGuard::new()),
            audit.clone(),
        );
        authorizer.set_maintenance_mode(true).unwrap();
        Fixture {
            _dir: dir,
            audit,
            authorizer,
        }
    }

    fn approval_events(audit: &AuditLog) -> usize {
        audit
            .events()
            .unwrap()
            .iter()
            .filter(|e| e.event_type == CoreEventKind::MaintenanceAuthorization)
            .count()
    }

    #[test]
    fn test_unrecorded_decision_emits_no_approval_event() {
        let f = blocked_fixture(|c| c.streams.audit_log = "blocked/audit.log".into());

        assert!(f.authorizer.authorize(&docs_request()).is_err());
        assert_eq!(approval_events(&f.audit), 0);
        assert!(f.audit.maintenance_entries().unwrap().is_empty());
    }

    #[test]
    fn test_approval_event_follows_recorded_operation() {
        let f = blocked_fixture(|c| c.streams.maintenance_log = "blocked/maintenance.log".into());

        let decision = f.authorizer.authorize(&docs_request()).unwrap();
        assert!(decision.is_approved());

        let ops = maintenance_ops(&f.audit);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].get("outcome").unwrap(), "awaiting_approval");
        assert_eq!(approval_events(&f.audit), 1);
        assert!(f.audit.maintenance_entries().unwrap().is_empty());
    }

    #[test]
    fn test_mode_unchanged_when_transition_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logs"), "blocking file").unwrap();
        let audit = Arc::new(AuditLog::new(&CoreConfig::new().with_data_dir(dir.path())));
        let authorizer =
            MaintenanceAuthorizer::new(MaintenanceMode::new(), Arc::new(PolicyGuard::new()), audit);

        assert!(authorizer.set_maintenance_mode(true).is_err());
        assert!(!authorizer.is_maintenance_mode_enabled());
    }
}
