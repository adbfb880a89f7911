//! Maintenance command parsing
//!
//! Commands are free text of the form `<verb> <target>`, e.g. "Fix security
//! issue in auth.php". The verb may appear anywhere; the first verb in
//! [`MaintenanceAction::ALL`] order that matches wins.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SubsystemHint;
use crate::error::{Result, TruAiError};
use crate::types::{AiSource, RiskLevel};

/// Placeholder file entry when a target names nothing recognizable
pub const UNDETERMINED_FILES: &str = "TBD - will be determined during analysis";

/// Files containing any of these are high risk
pub const HIGH_RISK_KEYWORDS: [&str; 5] = ["auth", "login", "security", "audit", "core"];

/// Files containing any of these are at least medium risk
pub const MEDIUM_RISK_KEYWORDS: [&str; 4] = ["workflow", "api", "database", "config"];

/// Example commands shown when parsing fails
pub const USAGE_EXAMPLES: [&str; 5] = [
    "Upgrade Phantom.ai dashboard",
    "Refactor review workflow",
    "Fix security issue in auth.php",
    "Improve performance",
    "Update documentation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceAction {
    Upgrade,
    Refactor,
    Fix,
    Improve,
    Align,
    Update,
    Prepare,
}

impl MaintenanceAction {
    /// Matching order
    pub const ALL: [MaintenanceAction; 7] = [
        MaintenanceAction::Upgrade,
        MaintenanceAction::Refactor,
        MaintenanceAction::Fix,
        MaintenanceAction::Improve,
        MaintenanceAction::Align,
        MaintenanceAction::Update,
        MaintenanceAction::Prepare,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Refactor => "refactor",
            Self::Fix => "fix",
            Self::Improve => "improve",
            Self::Align => "align",
            Self::Update => "update",
            Self::Prepare => "prepare",
        }
    }

    /// The source that carries out this kind of change
    pub fn source(self) -> AiSource {
        match self {
            Self::Upgrade | Self::Fix => AiSource::Copilot,
            Self::Refactor | Self::Improve => AiSource::Claude,
            Self::Align | Self::Update | Self::Prepare => AiSource::Chatgpt,
        }
    }

    /// Actions that are medium risk regardless of the files involved
    pub fn raises_risk(self) -> bool {
        matches!(self, Self::Upgrade | Self::Fix)
    }
}

impl fmt::Display for MaintenanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

lazy_static! {
    static ref VERB_PATTERNS: Vec<(MaintenanceAction, Regex)> = MaintenanceAction::ALL
        .into_iter()
        .map(|action| {
            let pattern = format!(r"(?i){}\s+(.+)", action.as_str());
            (action, Regex::new(&pattern).unwrap())
        })
        .collect();
    static ref FILE_MENTION: Regex = Regex::new(r"(\S+\.(?:php|js|html|css|json))").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub action: MaintenanceAction,
    pub target: String,
    pub original: String,
}

#[derive(Debug, Clone)]
pub struct CommandParser {
    hints: Vec<SubsystemHint>,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new(SubsystemHint::defaults())
    }
}

impl CommandParser {
    pub fn new(hints: Vec<SubsystemHint>) -> Self {
        Self { hints }
    }

    pub fn parse(&self, command: &str) -> Result<ParsedCommand> {
        VERB_PATTERNS
            .iter()
            .find_map(|(action, pattern)| {
                pattern.captures(command).map(|caps| ParsedCommand {
                    action: *action,
                    target: caps[1].to_string(),
                    original: command.to_string(),
                })
            })
            .ok_or_else(|| TruAiError::UnknownCommand(command.to_string()))
    }

    /// First explicit file name, then one glob per subsystem the target mentions
    pub fn estimate_affected_files(&self, target: &str) -> Vec<String> {
        let mut files = Vec::new();

        if let Some(caps) = FILE_MENTION.captures(target) {
            files.push(caps[1].to_string());
        }

        let lowered = target.to_lowercase();
        files.extend(
            self.hints
                .iter()
                .filter(|hint| lowered.contains(&hint.keyword.to_lowercase()))
                .map(|hint| hint.glob.clone()),
        );

        if files.is_empty() {
            files.push(UNDETERMINED_FILES.to_string());
        }
        files
    }
}

/// Risk of touching `files` with `action`; file risk outranks action risk
pub fn risk_level(files: &[String], action: MaintenanceAction) -> RiskLevel {
    let known: Vec<String> = files
        .iter()
        .filter(|file| file.as_str() != UNDETERMINED_FILES)
        .map(|file| file.to_lowercase())
        .collect();

    let any_contains = |keywords: &[&str]| {
        known
            .iter()
            .any(|file| keywords.iter().any(|keyword| file.contains(keyword)))
    };

    if any_contains(&HIGH_RISK_KEYWORDS) {
        RiskLevel::High
    } else if any_contains(&MEDIUM_RISK_KEYWORDS) || action.raises_risk() {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
