//! TruAi Core - AI arbitration and policy-gated self-maintenance
//!
//! TruAi Core decides which approved AI source handles a task, and whether a
//! requested change to the system itself may proceed. Every decision lands in
//! an append-only audit log.
//!
//! # Architecture
//!
//! 1. **Routing** (`routing`): tier classification, source arbitration and the
//!    compress/clarify/classify task pipeline
//! 2. **Policy** (`policy`): the fixed set of immutable policies and the
//!    violation scan applied to maintenance requests
//! 3. **Maintenance** (`maintenance`): command parsing, deny-first
//!    authorization, plans with rollback strategies
//! 4. **Audit** (`audit`): newline-delimited JSON streams, queries, statistics
//! 5. **Learning** (`learning`): per-task metadata, performance and cost
//!    reporting, tier suggestions
//!
//! # Quick Start
//!
//! ```no_run
//! use truai_core::{CoreConfig, RequestContext, TruAiCore};
//!
//! # fn main() -> truai_core::Result<()> {
//! let core = TruAiCore::new(CoreConfig::new().with_data_dir("/var/lib/truai"));
//!
//! let classification = core.classify_task("Implement JWT login", &RequestContext::default());
//! println!("tier: {}", classification.tier);
//!
//! let source = core.arbitrate_source("code_review", &RequestContext::default());
//! println!("routed to {} ({})", source.source, source.reason);
//!
//! core.set_maintenance_mode(true)?;
//! let response = core.process_maintenance_command(
//!     "Update documentation for TruAi Core",
//!     &RequestContext::new().with_user("admin"),
//! )?;
//! if let Some(plan) = response.plan() {
//!     println!("plan needs approval: {}", plan.approval_required);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations)]

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod learning;
pub mod maintenance;
pub mod policy;
pub mod routing;
pub mod types;

pub use audit::{AuditFilter, AuditLog, AuditStatistics, EntryType, StoredEntry};
pub use config::CoreConfig;
pub use engine::TruAiCore;
pub use error::{Result, ResultExt, TruAiError};
pub use learning::{PerformanceStats, TaskMetadata};
pub use maintenance::{
    AuthorizationDecision, MaintenancePlan, MaintenanceRequest, MaintenanceResponse,
};
pub use policy::{ImmutablePolicy, PolicyGuard, PolicyViolation};
pub use routing::{ArbitrationResult, RoutedTask, TaskClassification};
pub use types::{AiSource, RequestContext, RiskLevel, TaskType, Tier};

/// Version of TruAi Core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
