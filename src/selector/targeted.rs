//! Difficulty-targeted selector.
//!
//! Picks a fixed number of questions around a target difficulty. Every
//! pick re-scores the remaining candidates with a weighted rule engine:
//!
//! | Rule | Weight |
//! |------|--------|
//! | Difficulty distance | 0.4 |
//! | History recency | 0.3 |
//! | Peak similarity to already-picked questions | 0.3 |
//!
//! and draws one at random with weight `exp(-4 * (score - min_score))`,
//! so the best-scored candidates dominate without being certain.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use super::weighted_index;
use crate::dispatching::{rules, EvaluationMode, RuleEngine, SelectionContext};
use crate::error::SelectionError;
use crate::history::HistoryIndex;
use crate::models::{QuestionId, QuestionItem, Selection};
use crate::validation::validate_pool;

/// Sharpness of the pick distribution.
const PICK_SHARPNESS: f64 = 4.0;

/// Input of a targeted pick.
#[derive(Debug, Clone, Default)]
pub struct TargetedRequest {
    /// Desired difficulty (1.0..=5.0).
    pub target_difficulty: f64,
    /// Number of questions to pick.
    pub count: usize,
    /// Reuse penalty per question (0.0..=1.0).
    pub recency: HashMap<QuestionId, f64>,
}

impl TargetedRequest {
    /// Creates a request without usage history.
    pub fn new(target_difficulty: f64, count: usize) -> Self {
        Self {
            target_difficulty,
            count,
            recency: HashMap::new(),
        }
    }

    /// Sets reuse penalties.
    pub fn with_recency(mut self, recency: HashMap<QuestionId, f64>) -> Self {
        self.recency = recency;
        self
    }

    /// Derives reuse penalties from a history index as of `now`.
    pub fn with_history(self, index: &HistoryIndex, now: DateTime<Utc>) -> Self {
        self.with_recency(index.recency_weights(now))
    }
}

/// Weighted-random selector around a target difficulty.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use u_exam::models::{QuestionItem, QuestionType};
/// use u_exam::selector::{DifficultyTargetedSelector, TargetedRequest};
///
/// let pool: Vec<QuestionItem> = (1..=10)
///     .map(|id| QuestionItem::new(id, QuestionType::FillIn, 2.0).with_difficulty((id % 5 + 1) as u8))
///     .collect();
///
/// let mut rng = SmallRng::seed_from_u64(42);
/// let picked = DifficultyTargetedSelector::new()
///     .select(&pool, &TargetedRequest::new(3.0, 4), &mut rng)
///     .unwrap();
/// assert_eq!(picked.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct DifficultyTargetedSelector {
    engine: RuleEngine,
}

impl DifficultyTargetedSelector {
    /// Creates the selector with the standard rule weights.
    pub fn new() -> Self {
        Self {
            engine: RuleEngine::new()
                .with_mode(EvaluationMode::Weighted)
                .with_weighted_rule(rules::DifficultyDistance, 0.4)
                .with_weighted_rule(rules::HistoryRecency, 0.3)
                .with_weighted_rule(rules::PeakSimilarity, 0.3),
        }
    }

    /// Replaces the scoring engine.
    pub fn with_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Picks `request.count` questions, or the whole pool when smaller.
    ///
    /// # Errors
    /// - `InvalidConstraint` for a zero count, a target outside [1, 5],
    ///   or a malformed pool
    /// - `EmptyResult` for an empty pool
    pub fn select<R: Rng>(
        &self,
        pool: &[QuestionItem],
        request: &TargetedRequest,
        rng: &mut R,
    ) -> Result<Selection, SelectionError> {
        let target = request.target_difficulty;
        if request.count == 0 {
            return Err(SelectionError::InvalidConstraint(
                "question count must be positive".into(),
            ));
        }
        let range = f64::from(QuestionItem::MIN_DIFFICULTY)..=f64::from(QuestionItem::MAX_DIFFICULTY);
        if !range.contains(&target) {
            return Err(SelectionError::InvalidConstraint(format!(
                "target difficulty {target} outside [1, 5]"
            )));
        }
        if pool.is_empty() {
            return Err(SelectionError::EmptyResult);
        }
        validate_pool(pool)?;

        let mut remaining: Vec<Arc<QuestionItem>> =
            pool.iter().map(|q| Arc::new(q.clone())).collect();
        let mut context =
            SelectionContext::at_difficulty(target).with_recency(request.recency.clone());
        let mut selection = Selection::new();

        while selection.len() < request.count && !remaining.is_empty() {
            let scores = self.engine.weighted_scores(&remaining, &context);
            let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let weights: Vec<f64> = scores
                .iter()
                .map(|s| (-PICK_SHARPNESS * (s - min)).exp())
                .collect();

            let idx = weighted_index(&weights, rng).unwrap_or(0);
            let item = remaining.remove(idx);
            context.push_selected(Arc::clone(&item));
            selection.push(item);
        }

        debug!(
            event = "targeted_selection_finished",
            picked = selection.len(),
            requested = request.count,
            average_difficulty = selection.average_difficulty(),
        );
        Ok(selection)
    }
}

impl Default for DifficultyTargetedSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionType;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn pool() -> Vec<QuestionItem> {
        (1..=50)
            .map(|id| {
                QuestionItem::new(id, QuestionType::MultipleChoice, 5.0)
                    .with_difficulty((id % 5 + 1) as u8)
                    .with_knowledge(format!("K{}", id % 7))
            })
            .collect()
    }

    #[test]
    fn test_picks_requested_count() {
        let mut rng = SmallRng::seed_from_u64(1);
        let picked = DifficultyTargetedSelector::new()
            .select(&pool(), &TargetedRequest::new(3.0, 10), &mut rng)
            .unwrap();
        assert_eq!(picked.len(), 10);
        assert!(picked.has_unique_ids());
    }

    #[test]
    fn test_count_larger_than_pool() {
        let small: Vec<QuestionItem> = pool().into_iter().take(3).collect();
        let mut rng = SmallRng::seed_from_u64(1);
        let picked = DifficultyTargetedSelector::new()
            .select(&small, &TargetedRequest::new(3.0, 10), &mut rng)
            .unwrap();
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_prefers_target_difficulty() {
        let mut rng = SmallRng::seed_from_u64(9);
        let selector = DifficultyTargetedSelector::new();
        let mut near = 0;
        let mut trials = 0;
        for _ in 0..20 {
            let picked = selector
                .select(&pool(), &TargetedRequest::new(1.0, 5), &mut rng)
                .unwrap();
            near += picked.iter().filter(|q| q.difficulty <= 2).count();
            trials += picked.len();
        }
        // difficulty <= 2 is 40% of the pool
        assert!(near * 2 > trials, "near = {near} of {trials}");
    }

    #[test]
    fn test_recency_penalty_avoids_used() {
        let pool: Vec<QuestionItem> = (1..=2)
            .map(|id| QuestionItem::new(id, QuestionType::FillIn, 2.0))
            .collect();
        let request = TargetedRequest::new(3.0, 1).with_recency(HashMap::from([(1, 1.0)]));
        let selector = DifficultyTargetedSelector::new();
        let mut rng = SmallRng::seed_from_u64(3);

        let fresh = (0..200)
            .filter(|_| selector.select(&pool, &request, &mut rng).unwrap().contains(2))
            .count();
        // weight ratio exp(-4 * 0.3) ~ 0.30, so item 2 wins ~77% of draws
        assert!(fresh > 120, "fresh = {fresh}");
    }

    #[test]
    fn test_invalid_requests() {
        let mut rng = SmallRng::seed_from_u64(0);
        let selector = DifficultyTargetedSelector::new();

        let zero = selector.select(&pool(), &TargetedRequest::new(3.0, 0), &mut rng);
        assert!(matches!(zero, Err(SelectionError::InvalidConstraint(_))));

        let high = selector.select(&pool(), &TargetedRequest::new(6.0, 3), &mut rng);
        assert!(matches!(high, Err(SelectionError::InvalidConstraint(_))));

        let nan = selector.select(&pool(), &TargetedRequest::new(f64::NAN, 3), &mut rng);
        assert!(matches!(nan, Err(SelectionError::InvalidConstraint(_))));

        let empty = selector.select(&[], &TargetedRequest::new(3.0, 3), &mut rng);
        assert_eq!(empty, Err(SelectionError::EmptyResult));
    }
}
