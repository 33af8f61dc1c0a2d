//! Built-in ranking rules.
//!
//! # Categories
//!
//! - **Difficulty**: DIFF
//! - **Usage history**: RECENCY
//! - **Duplication**: PEAK_SIM
//!
//! # Score Convention
//! All rules return lower scores for questions that should be drawn first.

use super::{RuleScore, SelectionContext, SelectionRule};
use crate::models::QuestionItem;
use crate::similarity::peak_similarity;

/// Difficulty distance.
///
/// Prioritizes questions whose difficulty is closest to the target.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyDistance;

impl SelectionRule for DifficultyDistance {
    fn name(&self) -> &'static str {
        "DIFF"
    }

    fn evaluate(&self, item: &QuestionItem, context: &SelectionContext) -> RuleScore {
        item.difficulty_distance(context.target_difficulty)
    }

    fn description(&self) -> &'static str {
        "Distance to Target Difficulty"
    }
}

/// History recency.
///
/// Penalizes questions used in recent papers. A question used today scores
/// 1.0, one never used (or used outside the window) scores 0.0.
#[derive(Debug, Clone, Copy)]
pub struct HistoryRecency;

impl SelectionRule for HistoryRecency {
    fn name(&self) -> &'static str {
        "RECENCY"
    }

    fn evaluate(&self, item: &QuestionItem, context: &SelectionContext) -> RuleScore {
        context.recency_of(item.id)
    }

    fn description(&self) -> &'static str {
        "Recent Usage Penalty"
    }
}

/// Peak similarity.
///
/// Penalizes questions structurally close to anything already selected
/// in this run.
#[derive(Debug, Clone, Copy)]
pub struct PeakSimilarity;

impl SelectionRule for PeakSimilarity {
    fn name(&self) -> &'static str {
        "PEAK_SIM"
    }

    fn evaluate(&self, item: &QuestionItem, context: &SelectionContext) -> RuleScore {
        peak_similarity(item, context.selected.iter().map(|s| s.as_ref()))
    }

    fn description(&self) -> &'static str {
        "Peak Similarity to Selected"
    }
}
