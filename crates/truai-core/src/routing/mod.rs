//! Task classification, source arbitration and the routing pipeline

pub mod arbitrator;
pub mod classifier;
pub mod task_router;

pub use arbitrator::{
    route_task_type, ArbitrationMethod, ArbitrationResult, SourceArbitrator, DEFAULT_SOURCE,
    ROUTING_TABLE,
};
pub use classifier::{KeywordFamily, TaskClassification, TierClassifier, CLASSIFICATION_RULES};
pub use task_router::{
    compress_prompt, comprehension_questions, escalation_prompt, EscalationBrief, RoutedTask,
    TaskRouter, VAGUE_TERMS,
};
