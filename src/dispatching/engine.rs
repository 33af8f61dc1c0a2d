//! Rule engine for multi-criteria candidate ranking.
//!
//! Composes multiple ranking rules with configurable evaluation modes
//! and tie-breaking strategies.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{RuleScore, SelectionContext, SelectionRule};
use crate::models::{QuestionItem, SCORE_EPSILON};

/// How multiple rules are combined.
#[derive(Debug, Clone, Default)]
pub enum EvaluationMode {
    /// Apply rules in sequence; use next rule only on ties.
    #[default]
    Sequential,
    /// Compute weighted sum of all rule scores.
    Weighted,
}

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Default)]
pub enum TieBreaker {
    /// Keep encounter order (the sort is stable).
    #[default]
    NextRule,
    /// Deterministic by question ID.
    ById,
}

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn SelectionRule>,
    weight: f64,
}

/// A composable rule engine for candidate ranking.
///
/// Supports sequential multi-layer evaluation (primary rule, then
/// tie-breakers) and weighted combination.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use u_exam::dispatching::{RuleEngine, SelectionContext};
/// use u_exam::dispatching::rules;
/// use u_exam::models::{QuestionItem, QuestionType};
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::DifficultyDistance)
///     .with_tie_breaker(rules::HistoryRecency);
///
/// let candidates = vec![
///     Arc::new(QuestionItem::new(1, QuestionType::FillIn, 2.0).with_difficulty(5)),
///     Arc::new(QuestionItem::new(2, QuestionType::FillIn, 2.0).with_difficulty(2)),
/// ];
/// let context = SelectionContext::at_difficulty(2.0);
/// assert_eq!(engine.select_best(&candidates, &context), Some(1));
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<WeightedRule>,
    mode: EvaluationMode,
    tie_breaker: TieBreaker,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            mode: EvaluationMode::Sequential,
            tie_breaker: TieBreaker::NextRule,
        }
    }

    /// Adds a primary rule (weight 1.0).
    pub fn with_rule<R: SelectionRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 1.0,
        });
        self
    }

    /// Adds a weighted rule.
    pub fn with_weighted_rule<R: SelectionRule + 'static>(mut self, rule: R, weight: f64) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight,
        });
        self
    }

    /// Adds a tie-breaking rule (weight 0.0, used only in Sequential mode).
    pub fn with_tie_breaker<R: SelectionRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 0.0,
        });
        self
    }

    /// Sets the evaluation mode.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Sorts candidates by priority (highest priority first).
    ///
    /// Returns indices into the candidate slice. Equal candidates keep
    /// their encounter order.
    pub fn sort_indices(
        &self,
        candidates: &[Arc<QuestionItem>],
        context: &SelectionContext,
    ) -> Vec<usize> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut indices: Vec<usize> = (0..candidates.len()).collect();

        match &self.mode {
            EvaluationMode::Sequential => {
                indices.sort_by(|&a, &b| {
                    self.compare_sequential(&candidates[a], &candidates[b], context)
                });
            }
            EvaluationMode::Weighted => {
                let scores = self.weighted_scores(candidates, context);
                indices.sort_by(|&a, &b| {
                    scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal)
                });
            }
        }

        indices
    }

    /// Returns the index of the highest-priority candidate.
    pub fn select_best(
        &self,
        candidates: &[Arc<QuestionItem>],
        context: &SelectionContext,
    ) -> Option<usize> {
        self.sort_indices(candidates, context).first().copied()
    }

    /// Evaluates a single candidate and returns weighted scores from each rule.
    pub fn evaluate(&self, item: &QuestionItem, context: &SelectionContext) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(item, context) * wr.weight)
            .collect()
    }

    /// Weighted sum of all rule scores for every candidate.
    pub fn weighted_scores(
        &self,
        candidates: &[Arc<QuestionItem>],
        context: &SelectionContext,
    ) -> Vec<f64> {
        candidates
            .iter()
            .map(|c| self.weighted_score(c, context))
            .collect()
    }

    fn compare_sequential(
        &self,
        a: &QuestionItem,
        b: &QuestionItem,
        context: &SelectionContext,
    ) -> Ordering {
        for wr in &self.rules {
            let score_a = wr.rule.evaluate(a, context);
            let score_b = wr.rule.evaluate(b, context);

            if (score_a - score_b).abs() > SCORE_EPSILON {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }

        match &self.tie_breaker {
            TieBreaker::NextRule => Ordering::Equal,
            TieBreaker::ById => a.id.cmp(&b.id),
        }
    }

    fn weighted_score(&self, item: &QuestionItem, context: &SelectionContext) -> f64 {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(item, context) * wr.weight)
            .sum()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| format!("{}(w={})", r.rule.name(), r.weight))
                    .collect::<Vec<_>>(),
            )
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::rules;
    use crate::models::QuestionType;
    use std::collections::HashMap;

    fn make_item(id: u64, difficulty: u8) -> Arc<QuestionItem> {
        Arc::new(
            QuestionItem::new(id, QuestionType::MultipleChoice, 5.0)
                .with_difficulty(difficulty)
                .with_knowledge("A"),
        )
    }

    #[test]
    fn test_difficulty_ordering() {
        let items = vec![make_item(1, 5), make_item(2, 3), make_item(3, 4)];
        let ctx = SelectionContext::at_difficulty(3.0);
        let engine = RuleEngine::new().with_rule(rules::DifficultyDistance);

        let indices = engine.sort_indices(&items, &ctx);
        assert_eq!(items[indices[0]].id, 2);
        assert_eq!(items[indices[1]].id, 3);
        assert_eq!(items[indices[2]].id, 1);
    }

    #[test]
    fn test_sequential_with_tie_breaker() {
        let items = vec![make_item(1, 2), make_item(2, 4)];
        let recency = HashMap::from([(1, 0.9)]);
        let ctx = SelectionContext::at_difficulty(3.0).with_recency(recency);
        let engine = RuleEngine::new()
            .with_rule(rules::DifficultyDistance)
            .with_tie_breaker(rules::HistoryRecency);

        // both 1 away from the target; item 1 was used recently
        let indices = engine.sort_indices(&items, &ctx);
        assert_eq!(items[indices[0]].id, 2);
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let items = vec![make_item(9, 3), make_item(4, 3), make_item(7, 3)];
        let ctx = SelectionContext::at_difficulty(3.0);
        let engine = RuleEngine::new().with_rule(rules::DifficultyDistance);

        let ids: Vec<u64> = engine
            .sort_indices(&items, &ctx)
            .into_iter()
            .map(|i| items[i].id)
            .collect();
        assert_eq!(ids, vec![9, 4, 7]);
    }

    #[test]
    fn test_by_id_tie_breaker() {
        let items = vec![make_item(9, 3), make_item(4, 3)];
        let ctx = SelectionContext::at_difficulty(3.0);
        let engine = RuleEngine::new()
            .with_rule(rules::DifficultyDistance)
            .with_final_tie_breaker(TieBreaker::ById);

        assert_eq!(engine.select_best(&items, &ctx), Some(1));
    }

    #[test]
    fn test_weighted_mode() {
        let items = vec![make_item(1, 3), make_item(2, 4)];
        let recency = HashMap::from([(1, 1.0)]);
        let ctx = SelectionContext::at_difficulty(3.0).with_recency(recency);
        let engine = RuleEngine::new()
            .with_mode(EvaluationMode::Weighted)
            .with_weighted_rule(rules::DifficultyDistance, 0.4)
            .with_weighted_rule(rules::HistoryRecency, 0.6);

        // item 1: 0.4*0 + 0.6*1 = 0.6; item 2: 0.4*1 + 0.6*0 = 0.4
        let indices = engine.sort_indices(&items, &ctx);
        assert_eq!(items[indices[0]].id, 2);

        let scores = engine.weighted_scores(&items, &ctx);
        assert!((scores[0] - 0.6).abs() < 1e-10);
        assert!((scores[1] - 0.4).abs() < 1e-10);
    }

    #[test]
    fn test_empty_candidates() {
        let ctx = SelectionContext::at_difficulty(3.0);
        let engine = RuleEngine::new().with_rule(rules::DifficultyDistance);
        assert!(engine.sort_indices(&[], &ctx).is_empty());
        assert!(engine.select_best(&[], &ctx).is_none());
    }

    #[test]
    fn test_evaluate_scores() {
        let item = make_item(1, 5);
        let ctx = SelectionContext::at_difficulty(3.0);
        let engine = RuleEngine::new()
            .with_rule(rules::DifficultyDistance)
            .with_rule(rules::PeakSimilarity);

        let scores = engine.evaluate(&item, &ctx);
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 2.0).abs() < 1e-10);
        assert!(scores[1].abs() < 1e-10);
    }
}
