//! Lessons, recommendations and tier suggestions drawn from task history

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::stats::PerformanceStats;
use super::store::{Comprehension, MetadataStore, ReviewResult, TaskMetadata};
use crate::error::Result;
use crate::types::Tier;

/// High-tier share above which routing is flagged as too expensive
pub const HIGH_TIER_SHARE_LIMIT: f64 = 50.0;

/// Success rate below which prompt templates are flagged
pub const SUCCESS_RATE_FLOOR: f64 = 80.0;

/// Average iteration count above which comprehension gates are flagged
pub const AVG_ITERATIONS_LIMIT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    HighIterations,
    HighTierFailure,
    ComprehensionFailure,
}

impl LessonKind {
    pub fn message(self) -> &'static str {
        match self {
            Self::HighIterations => {
                "Task required multiple iterations. Consider improving prompt clarity."
            }
            Self::HighTierFailure => {
                "High-tier execution failed. Review prompt structure and constraints."
            }
            Self::ComprehensionFailure => {
                "Task failed comprehension gate. Improve initial task description."
            }
        }
    }
}

/// One observation about a finished task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(rename = "type")]
    pub kind: LessonKind,
    pub message: String,
    pub task_id: String,
}

impl Lesson {
    fn new(kind: LessonKind, task_id: &str) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            task_id: task_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    CostOptimization,
    Quality,
    Efficiency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: RecommendationCategory,
    pub message: String,
}

/// What a single task teaches
pub fn learn_from_task(task: &TaskMetadata) -> Vec<Lesson> {
    let mut lessons = Vec::new();

    if task.iterations.is_some_and(|n| n > 1) {
        lessons.push(Lesson::new(LessonKind::HighIterations, &task.task_id));
    }
    if task.tier_used == Tier::High && task.review_result == Some(ReviewResult::Fail) {
        lessons.push(Lesson::new(LessonKind::HighTierFailure, &task.task_id));
    }
    if task.comprehension == Comprehension::No {
        lessons.push(Lesson::new(LessonKind::ComprehensionFailure, &task.task_id));
    }

    lessons
}

/// Workflow recommendations for a performance snapshot; none without history
pub fn recommendations(stats: &PerformanceStats) -> Vec<Recommendation> {
    let mut out = Vec::new();
    if stats.total_tasks == 0 {
        return out;
    }

    let high_share = stats.tier_share(Tier::High);
    if high_share > HIGH_TIER_SHARE_LIMIT {
        out.push(Recommendation {
            priority: Priority::High,
            category: RecommendationCategory::CostOptimization,
            message: format!(
                "High-tier usage is {high_share:.1}%. Consider better task classification to reduce costs."
            ),
        });
    }

    if stats.success_rate < SUCCESS_RATE_FLOOR {
        out.push(Recommendation {
            priority: Priority::High,
            category: RecommendationCategory::Quality,
            message: format!(
                "Success rate is {:.1}%. Review failed tasks and improve prompt templates.",
                stats.success_rate
            ),
        });
    }

    if stats.avg_iterations > AVG_ITERATIONS_LIMIT {
        out.push(Recommendation {
            priority: Priority::Medium,
            category: RecommendationCategory::Efficiency,
            message: format!(
                "Average iterations is {:.2}. Improve comprehension gates and prompt clarity.",
                stats.avg_iterations
            ),
        });
    }

    out
}

/// Tier with the best review pass rate among `tasks` of `task_type`
///
/// Only reviewed tasks count. Ties go to the cheaper tier; with no
/// reviewed history the answer is [`Tier::Cheap`].
pub fn suggest_tier(tasks: &[TaskMetadata], task_type: &str) -> Tier {
    let mut best = Tier::Cheap;
    let mut best_rate = 0.0;

    for tier in Tier::ALL {
        let reviewed: Vec<&TaskMetadata> = tasks
            .iter()
            .filter(|t| t.task_type.as_deref() == Some(task_type) && t.tier_used == tier)
            .filter(|t| t.review_result.is_some())
            .collect();
        if reviewed.is_empty() {
            continue;
        }

        let passed = reviewed
            .iter()
            .filter(|t| t.review_result == Some(ReviewResult::Pass))
            .count();
        let rate = passed as f64 / reviewed.len() as f64;
        if rate > best_rate {
            best_rate = rate;
            best = tier;
        }
    }

    best
}

/// Task history plus the analyses above, over one metadata store
#[derive(Debug, Clone)]
pub struct LearningEngine {
    store: Arc<MetadataStore>,
}

impl LearningEngine {
    pub fn new(store: Arc<MetadataStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<MetadataStore> {
        &self.store
    }

    /// Persist `task` and return what it teaches
    pub fn record(&self, task: &TaskMetadata) -> Result<Vec<Lesson>> {
        self.store.store(task)?;
        let lessons = learn_from_task(task);
        for lesson in &lessons {
            tracing::info!("Lesson from task {}: {}", lesson.task_id, lesson.message);
        }
        Ok(lessons)
    }

    pub fn performance_stats(&self) -> Result<PerformanceStats> {
        Ok(PerformanceStats::from_tasks(&self.store.all()?))
    }

    pub fn recommendations(&self) -> Result<Vec<Recommendation>> {
        Ok(recommendations(&self.performance_stats()?))
    }

    pub fn suggest_tier(&self, task_type: &str) -> Result<Tier> {
        Ok(suggest_tier(&self.store.all()?, task_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, tier: Tier) -> TaskMetadata {
        TaskMetadata::new(id, tier, Comprehension::Yes)
    }

    fn reviewed(id: &str, task_type: &str, tier: Tier, result: ReviewResult) -> TaskMetadata {
        task(id, tier).with_task_type(task_type).with_review(result)
    }

    #[test]
    fn test_clean_task_teaches_nothing() {
        let t = task("t", Tier::High)
            .with_iterations(1)
            .with_review(ReviewResult::Pass);
        assert!(learn_from_task(&t).is_empty());
    }

    #[test]
    fn test_lessons_in_order() {
        let t = TaskMetadata::new("t9", Tier::High, Comprehension::No)
            .with_iterations(3)
            .with_review(ReviewResult::Fail);

        let kinds: Vec<LessonKind> = learn_from_task(&t).into_iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LessonKind::HighIterations,
                LessonKind::HighTierFailure,
                LessonKind::ComprehensionFailure
            ]
        );
    }

    #[test]
    fn test_failed_mid_tier_is_not_a_high_tier_lesson() {
        let t = task("t", Tier::Mid).with_review(ReviewResult::Fail);
        assert!(learn_from_task(&t).is_empty());
    }

    #[test]
    fn test_no_recommendations_without_history() {
        assert!(recommendations(&PerformanceStats::default()).is_empty());
    }

    #[test]
    fn test_recommendations_thresholds() {
        let tasks = vec![
            task("1", Tier::High).with_review(ReviewResult::Fail).with_iterations(4),
            task("2", Tier::High).with_review(ReviewResult::Pass).with_iterations(3),
            task("3", Tier::Cheap).with_review(ReviewResult::Pass).with_iterations(1),
        ];
        let recs = recommendations(&PerformanceStats::from_tasks(&tasks));

        let categories: Vec<_> = recs.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                RecommendationCategory::CostOptimization,
                RecommendationCategory::Quality,
                RecommendationCategory::Efficiency
            ]
        );
        assert_eq!(recs[2].priority, Priority::Medium);
        assert!(recs[0].message.starts_with("High-tier usage is 66.7%"));
    }

    #[test]
    fn test_healthy_history_has_no_recommendations() {
        let tasks: Vec<_> = (0..5)
            .map(|i| task(&i.to_string(), Tier::Cheap).with_review(ReviewResult::Pass))
            .collect();
        assert!(recommendations(&PerformanceStats::from_tasks(&tasks)).is_empty());
    }

    #[test]
    fn test_suggest_tier_defaults_to_cheap() {
        assert_eq!(suggest_tier(&[], "review"), Tier::Cheap);

        let unreviewed = vec![task("1", Tier::High).with_task_type("review")];
        assert_eq!(suggest_tier(&unreviewed, "review"), Tier::Cheap);
    }

    #[test]
    fn test_suggest_tier_picks_best_pass_rate() {
        let tasks = vec![
            reviewed("1", "code_generation", Tier::Cheap, ReviewResult::Fail),
            reviewed("2", "code_generation", Tier::Mid, ReviewResult::Pass),
            reviewed("3", "code_generation", Tier::Mid, ReviewResult::Fail),
            reviewed("4", "code_generation", Tier::High, ReviewResult::Pass),
            reviewed("5", "review", Tier::Cheap, ReviewResult::Pass),
        ];
        assert_eq!(suggest_tier(&tasks, "code_generation"), Tier::High);
        assert_eq!(suggest_tier(&tasks, "review"), Tier::Cheap);
    }

    #[test]
    fn test_suggest_tier_ties_go_to_cheaper() {
        let tasks = vec![
            reviewed("1", "testing", Tier::High, ReviewResult::Pass),
            reviewed("2", "testing", Tier::Mid, ReviewResult::Pass),
        ];
        assert_eq!(suggest_tier(&tasks, "testing"), Tier::Mid);
    }

    #[test]
    fn test_engine_records_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let engine = LearningEngine::new(Arc::new(MetadataStore::new(dir.path())));

        let lessons = engine
            .record(&TaskMetadata::new("t1", Tier::Mid, Comprehension::No).with_task_type("review"))
            .unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].kind, LessonKind::ComprehensionFailure);

        engine
            .record(&reviewed("t2", "review", Tier::Mid, ReviewResult::Pass))
            .unwrap();

        assert_eq!(engine.performance_stats().unwrap().total_tasks, 2);
        assert_eq!(engine.suggest_tier("review").unwrap(), Tier::Mid);
        assert!(!engine.recommendations().unwrap().is_empty());
    }
}
