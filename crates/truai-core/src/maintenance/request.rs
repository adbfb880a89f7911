//! Maintenance requests submitted for authorization

use serde::{Deserialize, Serialize};

use crate::types::{AiSource, RiskLevel};

fn system_user() -> String {
    "system".to_string()
}

/// A request to change the system, as submitted for authorization
///
/// Every field has a default so a request can be decoded from partial JSON;
/// [`MaintenanceRequest::missing_field`] reports what authorization will
/// reject it for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub files_affected: Vec<String>,
    #[serde(default)]
    pub ai_source: String,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default = "system_user")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_dependencies: Vec<String>,
}

impl MaintenanceRequest {
    pub fn new(command: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            summary: summary.into(),
            files_affected: Vec::new(),
            ai_source: String::new(),
            risk_level: None,
            user_id: system_user(),
            new_dependencies: Vec::new(),
        }
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files_affected = files;
        self
    }

    /// Accepts any name so unapproved sources can be submitted and refused
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.ai_source = source.into();
        self
    }

    pub fn with_approved_source(self, source: AiSource) -> Self {
        self.with_source(source.as_str())
    }

    pub fn with_risk_level(mut self, risk: RiskLevel) -> Self {
        self.risk_level = Some(risk);
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_new_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.new_dependencies = dependencies;
        self
    }

    /// First required field that is absent or blank, in checking order
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.command.trim().is_empty() {
            Some("command")
        } else if self.summary.trim().is_empty() {
            Some("summary")
        } else if self.files_affected.is_empty() {
            Some("files_affected")
        } else if self.ai_source.trim().is_empty() {
            Some("ai_source")
        } else if self.risk_level.is_none() {
            Some("risk_level")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_in_order() {
        let req = MaintenanceRequest::new("", "");
        assert_eq!(req.missing_field(), Some("command"));

        let req = MaintenanceRequest::new("Fix x", "  ");
        assert_eq!(req.missing_field(), Some("summary"));

        let req = MaintenanceRequest::new("Fix x", "fix x");
        assert_eq!(req.missing_field(), Some("files_affected"));

        let req = req.with_files(vec!["x.php".to_string()]);
        assert_eq!(req.missing_field(), Some("ai_source"));

        let req = req.with_approved_source(AiSource::Copilot);
        assert_eq!(req.missing_field(), Some("risk_level"));

        let req = req.with_risk_level(RiskLevel::Medium);
        assert_eq!(req.missing_field(), None);
    }

    #[test]
    fn test_decode_partial_json() {
        let req: MaintenanceRequest =
            serde_json::from_str(r#"{"command":"Align styles","risk_level":"low"}"#).unwrap();
        assert_eq!(req.user_id, "system");
        assert_eq!(req.risk_level, Some(RiskLevel::Low));
        assert_eq!(req.missing_field(), Some("summary"));
    }
}
