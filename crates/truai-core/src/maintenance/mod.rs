//! # Self-maintenance
//!
//! The path from a free-text command to an approvable plan:
//!
//! ```text
//! "Fix security issue in auth.php"
//!     │ CommandParser        action = fix, target = "security issue in auth.php"
//!     │ estimate / risk      files = [auth.php], risk = high, source = copilot
//!     ▼
//! MaintenanceAuthorizer      fields → mode → source → policy guard
//!     ▼
//! Approved { plan, rollback }  or  Denied(reason, violations)
//! ```
//!
//! Nothing here modifies files. An approved plan only becomes work when it is
//! handed to a [`PlanExecutor`].

mod authorizer;
mod command;
mod controller;
mod executor;
mod mode;
mod plan;
mod request;

pub use authorizer::{
    AuthorizationDecision, Denial, DenialReason, MaintenanceAuthorizer, VIOLATION_SCAN_POLICY,
};
pub use command::{
    risk_level, CommandParser, MaintenanceAction, ParsedCommand, HIGH_RISK_KEYWORDS,
    MEDIUM_RISK_KEYWORDS, UNDETERMINED_FILES, USAGE_EXAMPLES,
};
pub use controller::{
    MaintenanceController, MaintenanceIntent, MaintenanceResponse, MaintenanceStatistics,
};
pub use executor::{ExecutionReport, ExecutionStatus, PendingExecutor, PlanExecutor};
pub use mode::MaintenanceMode;
pub use plan::{
    estimate_duration, MaintenancePlan, RollbackMethod, RollbackStrategy, MAINTENANCE_STEPS,
};
pub use request::MaintenanceRequest;
