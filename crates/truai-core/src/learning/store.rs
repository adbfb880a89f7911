//! Per-task metadata records
//!
//! Each task is one pretty-printed JSON document named after its id. Storing
//! the same id again replaces the earlier document.

use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audit::AuditPayload;
use crate::error::{Result, TruAiError};
use crate::types::{now, Tier, Timestamp};

lazy_static! {
    static ref TASK_ID: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").unwrap();
}

/// Answer of the comprehension gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Comprehension {
    Yes,
    No,
}

/// Verdict of the post-execution review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewResult {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

/// What happened to one routed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub task_id: String,
    pub tier_used: Tier,
    pub comprehension: Comprehension,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_result: Option<ReviewResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    #[serde(default = "now")]
    pub timestamp: Timestamp,

    /// Fields this build does not interpret, kept as written
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskMetadata {
    pub fn new(task_id: impl Into<String>, tier_used: Tier, comprehension: Comprehension) -> Self {
        Self {
            task_id: task_id.into(),
            tier_used,
            comprehension,
            task_type: None,
            review_result: None,
            iterations: None,
            token_usage: None,
            timestamp: now(),
            extra: Map::new(),
        }
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn with_review(mut self, result: ReviewResult) -> Self {
        self.review_result = Some(result);
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.token_usage = Some(TokenUsage { input, output });
        self
    }
}

impl AuditPayload for TaskMetadata {
    const REQUIRED: &'static [&'static str] = &["task_id", "tier_used", "comprehension"];
}

/// Directory of task metadata documents
#[derive(Debug)]
pub struct MetadataStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl MetadataStore {
    /// Nothing is created on disk until the first store
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self, metadata: &TaskMetadata) -> Result<()> {
        let path = self.path_for(&metadata.task_id)?;
        let content = serde_json::to_string_pretty(metadata)?;

        let _guard = self.write_lock.lock();
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, content))
            .map_err(|e| TruAiError::storage("metadata", e))?;

        tracing::debug!("Stored metadata for task {}", metadata.task_id);
        Ok(())
    }

    pub fn get(&self, task_id: &str) -> Result<Option<TaskMetadata>> {
        let path = self.path_for(task_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| TruAiError::storage("metadata", e))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Every readable document, ordered by task id; unreadable ones are skipped
    pub fn all(&self) -> Result<Vec<TaskMetadata>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)
            .map_err(|e| TruAiError::storage("metadata", e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut tasks = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str::<TaskMetadata>(&c).map_err(|e| e.to_string()));
            match parsed {
                Ok(task) => tasks.push(task),
                Err(e) => tracing::warn!("Skipping metadata {}: {}", path.display(), e),
            }
        }
        Ok(tasks)
    }

    fn path_for(&self, task_id: &str) -> Result<PathBuf> {
        if !TASK_ID.is_match(task_id) {
            return Err(TruAiError::InvalidPayload(format!(
                "task_id '{task_id}' is not usable as a file name"
            )));
        }
        Ok(self.dir.join(format!("{task_id}.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, MetadataStore) {
        let dir = tempfile::Builder::new()
            .prefix("truai_metadata_")
            .tempdir()
            .unwrap();
        let store = MetadataStore::new(dir.path().join("metadata"));
        (dir, store)
    }

    #[test]
    fn test_store_and_get() {
        let (_dir, store) = temp_store();
        let task = TaskMetadata::new("task-1", Tier::Mid, Comprehension::Yes)
            .with_review(ReviewResult::Pass)
            .with_tokens(120, 80);

        store.store(&task).unwrap();
        let loaded = store.get("task-1").unwrap().unwrap();
        assert_eq!(loaded, task);
        assert!(store.get("task-2").unwrap().is_none());
    }

    #[test]
    fn test_restore_replaces_document() {
        let (_dir, store) = temp_store();
        store
            .store(&TaskMetadata::new("t", Tier::Cheap, Comprehension::No))
            .unwrap();
        store
            .store(&TaskMetadata::new("t", Tier::High, Comprehension::Yes))
            .unwrap();

        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].tier_used, Tier::High);
    }

    #[test]
    fn test_task_id_must_be_a_plain_name() {
        let (_dir, store) = temp_store();
        for bad in ["", "../escape", "a/b", ".hidden"] {
            let err = store
                .store(&TaskMetadata::new(bad, Tier::Cheap, Comprehension::Yes))
                .unwrap_err();
            assert!(matches!(err, TruAiError::InvalidPayload(_)), "{bad}");
        }
    }

    #[test]
    fn test_payload_requires_core_fields() {
        let err = TaskMetadata::from_payload(&json!({ "task_id": "t", "tier_used": "mid" }))
            .unwrap_err();
        assert!(matches!(err, TruAiError::MissingField(f) if f == "comprehension"));

        let task = TaskMetadata::from_payload(&json!({
            "task_id": "t",
            "tier_used": "mid",
            "comprehension": "YES",
            "review_result": "FAIL",
            "reviewer": "ci"
        }))
        .unwrap();
        assert_eq!(task.review_result, Some(ReviewResult::Fail));
        assert_eq!(task.extra["reviewer"], "ci");
    }

    #[test]
    fn test_all_skips_unreadable_documents() {
        let (_dir, store) = temp_store();
        store
            .store(&TaskMetadata::new("b", Tier::Cheap, Comprehension::Yes))
            .unwrap();
        store
            .store(&TaskMetadata::new("a", Tier::Mid, Comprehension::Yes))
            .unwrap();
        fs::write(store.dir().join("broken.json"), "{not json").unwrap();
        fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        let ids: Vec<String> = store.all().unwrap().into_iter().map(|t| t.task_id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.all().unwrap().is_empty());
        assert!(!store.dir().exists());
    }
}
