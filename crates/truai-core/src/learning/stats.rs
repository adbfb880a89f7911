//! Performance projection over stored task metadata

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::store::{ReviewResult, TaskMetadata, TokenUsage};
use crate::types::Tier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDistribution {
    pub cheap: usize,
    pub mid: usize,
    pub high: usize,
}

impl TierDistribution {
    pub fn count(&self, tier: Tier) -> usize {
        match tier {
            Tier::Cheap => self.cheap,
            Tier::Mid => self.mid,
            Tier::High => self.high,
        }
    }

    fn add(&mut self, tier: Tier) {
        match tier {
            Tier::Cheap => self.cheap += 1,
            Tier::Mid => self.mid += 1,
            Tier::High => self.high += 1,
        }
    }
}

/// Aggregate outcome of every recorded task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_tasks: usize,
    pub tier_distribution: TierDistribution,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
    pub total_iterations: u64,
    pub total_tokens: TokenUsage,

    /// Percentage of all tasks whose review passed; unreviewed tasks count against it
    pub success_rate: f64,
    pub avg_iterations: f64,

    /// Sum of tier cost multipliers over every task
    pub relative_cost: f64,

    /// Percentage saved against running every task on the high tier
    pub savings_vs_high_tier: f64,
}

impl PerformanceStats {
    pub fn from_tasks(tasks: &[TaskMetadata]) -> Self {
        let mut stats = Self {
            total_tasks: tasks.len(),
            ..Default::default()
        };
        if tasks.is_empty() {
            return stats;
        }

        for task in tasks {
            stats.tier_distribution.add(task.tier_used);
            stats.relative_cost += task.tier_used.cost_multiplier();

            match task.review_result {
                Some(ReviewResult::Pass) => stats.successful_tasks += 1,
                Some(ReviewResult::Fail) => stats.failed_tasks += 1,
                None => {}
            }
            if let Some(iterations) = task.iterations {
                stats.total_iterations += u64::from(iterations);
            }
            if let Some(tokens) = task.token_usage {
                stats.total_tokens.input += tokens.input;
                stats.total_tokens.output += tokens.output;
            }
        }

        let total = tasks.len() as f64;
        stats.success_rate = stats.successful_tasks as f64 / total * 100.0;
        stats.avg_iterations = stats.total_iterations as f64 / total;

        let all_high = total * Tier::High.cost_multiplier();
        stats.savings_vs_high_tier = (1.0 - stats.relative_cost / all_high) * 100.0;
        stats
    }

    /// Share of tasks run on `tier`, as a percentage
    pub fn tier_share(&self, tier: Tier) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.tier_distribution.count(tier) as f64 / self.total_tasks as f64 * 100.0
    }

    /// Plain-text summary for terminals and logs
    pub fn report(&self) -> String {
        let mut out = String::from("=== TruAi Performance Report ===\n\n");
        let _ = writeln!(out, "Total Tasks: {}", self.total_tasks);
        let _ = writeln!(out, "Success Rate: {:.2}%", self.success_rate);
        let _ = writeln!(out, "Average Iterations: {:.2}\n", self.avg_iterations);

        out.push_str("Tier Distribution:\n");
        for tier in Tier::ALL {
            let _ = writeln!(
                out,
                "  - {}: {} ({:.1}%)",
                capitalize(tier.as_str()),
                self.tier_distribution.count(tier),
                self.tier_share(tier)
            );
        }

        out.push_str("\nToken Usage:\n");
        let _ = writeln!(out, "  - Input: {}", self.total_tokens.input);
        let _ = writeln!(out, "  - Output: {}", self.total_tokens.output);
        let _ = writeln!(out, "  - Total: {}", self.total_tokens.total());

        out.push_str("\nRelative Cost:\n");
        let _ = writeln!(out, "  - Units: {:.1}", self.relative_cost);
        let _ = writeln!(out, "  - Saved vs high tier: {:.1}%", self.savings_vs_high_tier);
        out
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::store::Comprehension;

    fn tasks() -> Vec<TaskMetadata> {
        vec![
            TaskMetadata::new("1", Tier::Cheap, Comprehension::Yes)
                .with_review(ReviewResult::Pass)
                .with_iterations(1)
                .with_tokens(100, 50),
            TaskMetadata::new("2", Tier::Mid, Comprehension::Yes)
                .with_review(ReviewResult::Pass)
                .with_iterations(2)
                .with_tokens(300, 200),
            TaskMetadata::new("3", Tier::High, Comprehension::Yes)
                .with_review(ReviewResult::Fail)
                .with_iterations(3),
            TaskMetadata::new("4", Tier::Cheap, Comprehension::No),
        ]
    }

    #[test]
    fn test_empty_projection() {
        let stats = PerformanceStats::from_tasks(&[]);
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_iterations, 0.0);
        assert_eq!(stats.tier_share(Tier::High), 0.0);
    }

    #[test]
    fn test_projection_counts() {
        let stats = PerformanceStats::from_tasks(&tasks());

        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.tier_distribution.cheap, 2);
        assert_eq!(stats.tier_distribution.mid, 1);
        assert_eq!(stats.tier_distribution.high, 1);
        assert_eq!(stats.successful_tasks, 2);
        assert_eq!(stats.failed_tasks, 1);
        assert_eq!(stats.total_iterations, 6);
        assert_eq!(stats.total_tokens.input, 400);
        assert_eq!(stats.total_tokens.output, 250);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(stats.avg_iterations, 1.5);
    }

    #[test]
    fn test_relative_cost_uses_tier_multipliers() {
        let stats = PerformanceStats::from_tasks(&tasks());
        // 1 + 5 + 20 + 1
        assert_eq!(stats.relative_cost, 27.0);
        // against 4 * 20
        assert!((stats.savings_vs_high_tier - 66.25).abs() < 1e-9);
    }

    #[test]
    fn test_report_text() {
        let report = PerformanceStats::from_tasks(&tasks()).report();
        assert!(report.starts_with("=== TruAi Performance Report ==="));
        assert!(report.contains("Total Tasks: 4"));
        assert!(report.contains("Success Rate: 50.00%"));
        assert!(report.contains("  - Cheap: 2 (50.0%)"));
        assert!(report.contains("  - High: 1 (25.0%)"));
        assert!(report.contains("  - Total: 650"));
        assert!(report.contains("  - Saved vs high tier: 66."));
    }
}
