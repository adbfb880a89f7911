//! # Learning
//!
//! Records what happened to each routed task (tier used, comprehension gate
//! answer, review verdict, iterations, tokens) and turns that history into
//! feedback for routing:
//!
//! - per-task lessons as soon as a task is recorded
//! - a performance projection with the relative cost of the tier mix
//! - workflow recommendations when the mix, pass rate or iteration count drift
//! - a tier suggestion per task type, from review pass rates
//!
//! History lives in one JSON document per task under the configured
//! metadata directory. It is separate from the audit log and never feeds
//! authorization.

mod advisor;
mod stats;
mod store;

pub use advisor::{
    learn_from_task, recommendations, suggest_tier, LearningEngine, Lesson, LessonKind, Priority,
    Recommendation, RecommendationCategory, AVG_ITERATIONS_LIMIT, HIGH_TIER_SHARE_LIMIT,
    SUCCESS_RATE_FLOOR,
};
pub use stats::{PerformanceStats, TierDistribution};
pub use store::{Comprehension, MetadataStore, ReviewResult, TaskMetadata, TokenUsage};
