//! Maintenance plans and rollback strategies

use serde::{Deserialize, Serialize};

use crate::types::{AiSource, RiskLevel};

/// The fixed lifecycle every maintenance plan walks through
pub const MAINTENANCE_STEPS: [&str; 7] = [
    "Analyze current state",
    "Generate proposed changes",
    "Review changes for policy compliance",
    "Present changes to user for approval",
    "Execute approved changes",
    "Validate changes",
    "Update audit log",
];

/// Rough duration bucket by number of affected files
pub fn estimate_duration(file_count: usize) -> &'static str {
    match file_count {
        0..=2 => "5-10 minutes",
        3..=5 => "10-20 minutes",
        _ => "20+ minutes",
    }
}

/// An authorized change awaiting human approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenancePlan {
    pub summary: String,
    pub files_to_modify: Vec<String>,
    pub ai_source: AiSource,
    pub risk_level: RiskLevel,
    pub estimated_duration: String,
    pub approval_required: bool,
    pub steps: Vec<String>,
}

impl MaintenancePlan {
    pub fn new(
        summary: impl Into<String>,
        files_to_modify: Vec<String>,
        ai_source: AiSource,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            summary: summary.into(),
            estimated_duration: estimate_duration(files_to_modify.len()).to_string(),
            files_to_modify,
            ai_source,
            risk_level,
            approval_required: true,
            steps: MAINTENANCE_STEPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackMethod {
    RevertToPreviousState,
}

/// How to undo a plan once executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackStrategy {
    pub method: RollbackMethod,
    pub backup_required: bool,
    pub affected_files: Vec<String>,
    pub instructions: String,
}

impl RollbackStrategy {
    pub fn for_files(affected_files: Vec<String>) -> Self {
        Self {
            method: RollbackMethod::RevertToPreviousState,
            backup_required: true,
            affected_files,
            instructions: "Back up the affected files before execution and restore them to revert the change if issues occur".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_buckets() {
        assert_eq!(estimate_duration(1), "5-10 minutes");
        assert_eq!(estimate_duration(2), "5-10 minutes");
        assert_eq!(estimate_duration(3), "10-20 minutes");
        assert_eq!(estimate_duration(5), "10-20 minutes");
        assert_eq!(estimate_duration(6), "20+ minutes");
    }

    #[test]
    fn test_plan_always_requires_approval() {
        let plan = MaintenancePlan::new(
            "Action: update, Target: docs",
            vec!["*.md".to_string()],
            AiSource::Chatgpt,
            RiskLevel::Low,
        );
        assert!(plan.approval_required);
        assert_eq!(plan.steps.len(), 7);
        assert_eq!(plan.steps[0], "Analyze current state");
        assert_eq!(plan.steps[6], "Update audit log");

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["ai_source"], "chatgpt");
        assert_eq!(value["risk_level"], "low");
    }

    #[test]
    fn test_rollback_method_wire_name() {
        let rollback = RollbackStrategy::for_files(vec!["a.css".to_string()]);
        let value = serde_json::to_value(&rollback).unwrap();
        assert_eq!(value["method"], "revert_to_previous_state");
        assert_eq!(value["backup_required"], true);
    }
}
