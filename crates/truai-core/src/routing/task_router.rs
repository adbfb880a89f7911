//! Task routing pipeline
//!
//! compress → comprehension gate → classify. A task that reads as vague, or
//! asks to change code without naming a file, is bounced back with questions
//! instead of being classified.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::classifier::TierClassifier;
use crate::types::{RequestContext, TaskType, Tier};

lazy_static! {
    static ref FILLER: Regex = Regex::new(r"(?i)please|kindly|could you|would you").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref CHANGE_VERB: Regex =
        Regex::new(r"(?i)\b(create|modify|update|change|edit)\b").unwrap();
    static ref FILE_NAME: Regex = Regex::new(r"\b[a-zA-Z0-9_\-]+\.(php|js|css|json)\b").unwrap();
}

/// Terms that make a task too ambiguous to hand to a model
pub const VAGUE_TERMS: [&str; 5] = ["something", "somehow", "maybe", "probably", "might"];

const MISSING_FILES_QUESTION: &str = "Which files need to be created or modified?";

/// Outcome of routing one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoutedTask {
    ClarificationNeeded {
        task_id: String,
        questions: Vec<String>,
        compressed_prompt: String,
    },
    ReadyForExecution {
        task_id: String,
        tier: Tier,
        task_type: TaskType,
        reason: String,
        compressed_prompt: String,
        copilot_ready: bool,
    },
}

impl RoutedTask {
    pub fn task_id(&self) -> &str {
        match self {
            Self::ClarificationNeeded { task_id, .. } | Self::ReadyForExecution { task_id, .. } => {
                task_id
            }
        }
    }

    pub fn compressed_prompt(&self) -> &str {
        match self {
            Self::ClarificationNeeded {
                compressed_prompt, ..
            }
            | Self::ReadyForExecution {
                compressed_prompt, ..
            } => compressed_prompt,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::ReadyForExecution { .. })
    }
}

/// Strip filler phrases and collapse whitespace
pub fn compress_prompt(description: &str) -> String {
    let stripped = FILLER.replace_all(description, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Questions that must be answered before the task can run; empty when clear
pub fn comprehension_questions(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut questions: Vec<String> = VAGUE_TERMS
        .iter()
        .filter(|term| lowered.contains(*term))
        .map(|term| {
            format!("Task contains vague term '{term}'. Please specify exactly what is needed.")
        })
        .collect();

    if CHANGE_VERB.is_match(text) && !FILE_NAME.is_match(text) {
        questions.push(MISSING_FILES_QUESTION.to_string());
    }

    questions
}

/// Sections of a high-tier escalation prompt beyond the task itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscalationBrief {
    pub files_to_modify: Vec<String>,
    pub constraints: Vec<String>,
    pub design_assets: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskRouter {
    classifier: TierClassifier,
}

impl TaskRouter {
    pub fn new(classifier: TierClassifier) -> Self {
        Self { classifier }
    }

    pub fn route(&self, task_id: &str, description: &str, context: &RequestContext) -> RoutedTask {
        let compressed = compress_prompt(description);
        let questions = comprehension_questions(&compressed);

        if !questions.is_empty() {
            tracing::info!(
                "Task {} needs clarification ({} questions)",
                task_id,
                questions.len()
            );
            return RoutedTask::ClarificationNeeded {
                task_id: task_id.to_string(),
                questions,
                compressed_prompt: compressed,
            };
        }

        let classification = self.classifier.classify(description, context);
        tracing::info!(
            "Task {} ready: {} / {}",
            task_id,
            classification.tier,
            classification.task_type
        );

        RoutedTask::ReadyForExecution {
            task_id: task_id.to_string(),
            copilot_ready: classification.tier == Tier::High,
            tier: classification.tier,
            task_type: classification.task_type,
            reason: classification.reason,
            compressed_prompt: compressed,
        }
    }
}

/// Render the structured prompt handed to the high-tier source
pub fn escalation_prompt(task: &RoutedTask, brief: &EscalationBrief) -> String {
    let mut prompt = String::new();

    prompt.push_str("ROLE:\n");
    prompt.push_str("You are the production code author for a TruAi-managed codebase.\n\n");

    prompt.push_str("PROJECT CONTEXT:\n");
    prompt.push_str("- TruAi Core handles task routing, policy checks and verification\n");
    prompt.push_str("- High-tier code execution is your responsibility\n");
    prompt.push_str("- Every change is audited and must be reversible\n\n");

    prompt.push_str("TASK:\n");
    prompt.push_str(task.compressed_prompt());
    prompt.push_str("\n\n");

    if !brief.design_assets.is_empty() {
        prompt.push_str("DESIGN ASSETS:\n");
        push_items(&mut prompt, &brief.design_assets);
        prompt.push_str("Use these assets without modification unless explicitly instructed.\n\n");
    }

    if !brief.files_to_modify.is_empty() {
        prompt.push_str("FILES TO MODIFY:\n");
        push_items(&mut prompt, &brief.files_to_modify);
        prompt.push('\n');
    }

    prompt.push_str("CONSTRAINTS:\n");
    prompt.push_str("- Only modify designated files\n");
    if !brief.design_assets.is_empty() {
        prompt.push_str("- Do not alter design asset internals\n");
    }
    prompt.push_str("- Do not refactor unrelated code\n");
    push_items(&mut prompt, &brief.constraints);
    prompt.push('\n');

    prompt.push_str("OUTPUT:\n");
    prompt.push_str("- Full code / diffs for modified files\n");
    prompt.push_str("- Include comments for any assumptions made\n");
    prompt.push_str("- Minimal prose, only what is needed to verify the change\n");

    prompt
}

fn push_items(prompt: &mut String, items: &[String]) {
    for item in items {
        prompt.push_str("- ");
        prompt.push_str(item);
        prompt.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(description: &str) -> RoutedTask {
        TaskRouter::default().route("t-1", description, &RequestContext::default())
    }

    #[test]
    fn test_compress_strips_filler() {
        assert_eq!(
            compress_prompt("  Please   could you  review   the api docs "),
            "review the api docs"
        );
        assert_eq!(compress_prompt("KINDLY summarize"), "summarize");
    }

    #[test]
    fn test_vague_terms_each_ask_a_question() {
        let questions = comprehension_questions("maybe fix something in the header");
        assert_eq!(questions.len(), 2);
        assert!(questions[0].contains("'something'"));
        assert!(questions[1].contains("'maybe'"));
    }

    #[test]
    fn test_change_without_file_asks_for_files() {
        assert_eq!(
            comprehension_questions("Update the login form"),
            vec![MISSING_FILES_QUESTION.to_string()]
        );
        assert!(comprehension_questions("Update the login form in login.php").is_empty());
        // "updated" is not the whole word
        assert!(comprehension_questions("Summarize the updated roadmap").is_empty());
    }

    #[test]
    fn test_route_needs_clarification() {
        let task = route("Please create a widget");
        assert!(!task.is_ready());
        match task {
            RoutedTask::ClarificationNeeded {
                questions,
                compressed_prompt,
                ..
            } => {
                assert_eq!(questions, vec![MISSING_FILES_QUESTION.to_string()]);
                assert_eq!(compressed_prompt, "create a widget");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_route_ready_and_copilot_flag() {
        let task = route("Implement pagination in list.js");
        match &task {
            RoutedTask::ReadyForExecution {
                tier,
                task_type,
                copilot_ready,
                ..
            } => {
                assert_eq!(*tier, Tier::High);
                assert_eq!(*task_type, TaskType::CodeGeneration);
                assert!(copilot_ready);
            }
            other => panic!("unexpected {other:?}"),
        }

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["status"], "ready_for_execution");
        assert_eq!(value["task_id"], "t-1");

        match route("Review the release notes") {
            RoutedTask::ReadyForExecution { copilot_ready, .. } => assert!(!copilot_ready),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_escalation_prompt_sections() {
        let task = route("Implement pagination in list.js");
        let brief = EscalationBrief {
            files_to_modify: vec!["list.js".to_string()],
            constraints: vec!["Keep the public API".to_string()],
            design_assets: Vec::new(),
        };
        let prompt = escalation_prompt(&task, &brief);

        for section in [
            "ROLE:",
            "PROJECT CONTEXT:",
            "TASK:",
            "FILES TO MODIFY:",
            "CONSTRAINTS:",
            "OUTPUT:",
        ] {
            assert!(prompt.contains(section), "missing {section}");
        }
        assert!(!prompt.contains("DESIGN ASSETS:"));
        assert!(prompt.contains("- list.js\n"));
        assert!(prompt.contains("- Keep the public API\n"));
        assert!(prompt.contains("Implement pagination in list.js\n"));
    }
}
