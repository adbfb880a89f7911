//! # Policy Guard
//!
//! Two jobs:
//!
//! - [`PolicyGuard::enforce`] evaluates one of the fixed immutable policies
//!   against a request context. The set is closed; unknown ids are refused.
//! - [`PolicyGuard::violations`] scans a maintenance request for changes that
//!   may never be authorized automatically (authentication, audit logging,
//!   new dependencies).
//!
//! Each immutable policy is backed by a [`PolicyPredicate`]. The shipped
//! predicates are [`PendingPredicate`]s that always pass; a real check can be
//! swapped in per policy with [`PolicyGuard::with_check`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, TruAiError};
use crate::maintenance::MaintenanceRequest;
use crate::types::RequestContext;

/// The closed set of policies the core will enforce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImmutablePolicy {
    #[serde(rename = "PHANTOM-UI-001")]
    UiFramework,
    #[serde(rename = "localhost_only")]
    LocalhostOnly,
    #[serde(rename = "security_immutability")]
    SecurityImmutability,
    #[serde(rename = "audit_completeness")]
    AuditCompleteness,
    #[serde(rename = "deterministic_behavior")]
    DeterministicBehavior,
}

impl ImmutablePolicy {
    pub const ALL: [ImmutablePolicy; 5] = [
        ImmutablePolicy::UiFramework,
        ImmutablePolicy::LocalhostOnly,
        ImmutablePolicy::SecurityImmutability,
        ImmutablePolicy::AuditCompleteness,
        ImmutablePolicy::DeterministicBehavior,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::UiFramework => "PHANTOM-UI-001",
            Self::LocalhostOnly => "localhost_only",
            Self::SecurityImmutability => "security_immutability",
            Self::AuditCompleteness => "audit_completeness",
            Self::DeterministicBehavior => "deterministic_behavior",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|policy| policy.id() == id)
    }

    pub fn parse(id: &str) -> Result<Self> {
        Self::from_id(id).ok_or_else(|| TruAiError::UnknownPolicy(id.to_string()))
    }
}

impl fmt::Display for ImmutablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A check backing one immutable policy
pub trait PolicyPredicate: fmt::Debug + Send + Sync {
    /// Must not depend on anything but `context`
    fn check(&self, context: &RequestContext) -> bool;
}

/// Stand-in for a policy whose check has not been written yet; always passes
#[derive(Debug, Clone, Copy)]
pub struct PendingPredicate {
    pub policy: ImmutablePolicy,
}

impl PolicyPredicate for PendingPredicate {
    fn check(&self, _context: &RequestContext) -> bool {
        tracing::debug!("Policy {} has no concrete check, passing", self.policy);
        true
    }
}

/// A file-based violation rule: any file containing one of `keywords`
/// (case-insensitive) trips it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViolationRule {
    pub code: &'static str,
    pub message: &'static str,
    pub keywords: &'static [&'static str],
}

impl ViolationRule {
    pub fn matches(&self, files: &[String]) -> bool {
        files.iter().any(|file| {
            let lowered = file.to_lowercase();
            self.keywords.iter().any(|keyword| lowered.contains(keyword))
        })
    }

    fn violation(&self) -> PolicyViolation {
        PolicyViolation {
            code: self.code.to_string(),
            message: self.message.to_string(),
        }
    }
}

/// File rules, evaluated in order
pub const VIOLATION_RULES: [ViolationRule; 2] = [
    ViolationRule {
        code: "auth_system",
        message: "Cannot modify authentication system without special approval",
        keywords: &["auth", "login"],
    },
    ViolationRule {
        code: "audit_system",
        message: "Cannot modify audit logging system",
        keywords: &["audit", "log"],
    },
];

/// Code of the violation raised when a request adds dependencies
pub const NEW_DEPENDENCIES_CODE: &str = "new_dependencies";
const NEW_DEPENDENCIES_MESSAGE: &str = "Cannot add new dependencies without approval";

/// One reason a maintenance request may not proceed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyViolation {
    pub code: String,
    pub message: String,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Debug)]
pub struct PolicyGuard {
    checks: HashMap<ImmutablePolicy, Box<dyn PolicyPredicate>>,
}

impl Default for PolicyGuard {
    fn default() -> Self {
        let checks = ImmutablePolicy::ALL
            .into_iter()
            .map(|policy| {
                (
                    policy,
                    Box::new(PendingPredicate { policy }) as Box<dyn PolicyPredicate>,
                )
            })
            .collect();
        Self { checks }
    }
}

impl PolicyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the check behind `policy`
    pub fn with_check(
        mut self,
        policy: ImmutablePolicy,
        check: impl PolicyPredicate + 'static,
    ) -> Self {
        self.checks.insert(policy, Box::new(check));
        self
    }

    /// Evaluate a policy by id; unknown ids are refused
    pub fn enforce(&self, policy_id: &str, context: &RequestContext) -> bool {
        let policy = match ImmutablePolicy::parse(policy_id) {
            Ok(policy) => policy,
            Err(e) => {
                tracing::warn!("Refusing to enforce: {}", e);
                return false;
            }
        };

        self.checks
            .get(&policy)
            .map(|check| check.check(context))
            .unwrap_or(false)
    }

    /// Every violation `request` triggers, in rule order
    pub fn violations(&self, request: &MaintenanceRequest) -> Vec<PolicyViolation> {
        let mut found: Vec<PolicyViolation> = VIOLATION_RULES
            .iter()
            .filter(|rule| rule.matches(&request.files_affected))
            .map(ViolationRule::violation)
            .collect();

        if !request.new_dependencies.is_empty() {
            found.push(PolicyViolation {
                code: NEW_DEPENDENCIES_CODE.to_string(),
                message: NEW_DEPENDENCIES_MESSAGE.to_string(),
            });
        }

        if !found.is_empty() {
            tracing::info!(
                "Maintenance request '{}' violates {} rule(s)",
                request.command,
                found.len()
            );
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct RequireUser;

    impl PolicyPredicate for RequireUser {
        fn check(&self, context: &RequestContext) -> bool {
            context.user_id.is_some()
        }
    }

    fn request(files: &[&str]) -> MaintenanceRequest {
        MaintenanceRequest::new("Fix things", "Action: fix, Target: things")
            .with_files(files.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn test_known_policies_pass() {
        let guard = PolicyGuard::new();
        for policy in ImmutablePolicy::ALL {
            assert!(guard.enforce(policy.id(), &RequestContext::default()));
        }
    }

    #[test]
    fn test_unknown_policy_refused() {
        let guard = PolicyGuard::new();
        assert!(!guard.enforce("phantom-ui-001", &RequestContext::default()));
        assert!(!guard.enforce("allow_everything", &RequestContext::default()));
    }

    #[test]
    fn test_check_is_replaceable() {
        let guard = PolicyGuard::new().with_check(ImmutablePolicy::LocalhostOnly, RequireUser);

        assert!(!guard.enforce("localhost_only", &RequestContext::default()));
        assert!(guard.enforce("localhost_only", &RequestContext::new().with_user("admin")));
        assert!(guard.enforce("audit_completeness", &RequestContext::default()));
    }

    #[test]
    fn test_policy_ids_serialize_as_ids() {
        let value = serde_json::to_value(ImmutablePolicy::UiFramework).unwrap();
        assert_eq!(value, "PHANTOM-UI-001");
    }

    #[test]
    fn test_auth_and_audit_rules() {
        let guard = PolicyGuard::new();

        let v = guard.violations(&request(&["src/Auth.php"]));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].code, "auth_system");

        let v = guard.violations(&request(&["views/login.html", "logs/rotate.php"]));
        let codes: Vec<&str> = v.iter().map(|x| x.code.as_str()).collect();
        assert_eq!(codes, vec!["auth_system", "audit_system"]);

        assert!(guard.violations(&request(&["*.md"])).is_empty());
    }

    #[test]
    fn test_all_rules_run() {
        let guard = PolicyGuard::new();
        let req = request(&["auth_audit.php"]).with_new_dependencies(vec!["left-pad".to_string()]);

        let v = guard.violations(&req);
        assert_eq!(v.len(), 3);
        assert_eq!(v[2].code, NEW_DEPENDENCIES_CODE);
        assert_eq!(v[2].message, "Cannot add new dependencies without approval");
    }
}
