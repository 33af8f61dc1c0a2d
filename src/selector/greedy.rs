//! Knowledge-weighted greedy selector.
//!
//! # Algorithm
//!
//! One construction attempt:
//!
//! 1. Seed with manual-include questions (pool order).
//! 2. Guarantee a floor of short-answer questions: draw a knowledge label
//!    by weight, then take that label's short-answer question closest to the
//!    target difficulty.
//! 3. Meet the minimum count of every other declared type the same way.
//! 4. Fill: split the remaining budget across labels (biased toward labels
//!    below their weight-implied share) and draw per label, short-answer
//!    first, until each sub-budget is spent. Draws that would overshoot the
//!    total are discarded.
//! 5. Splice in one question whose score matches the residual.
//!
//! Attempts repeat until the total equals the target exactly, up to
//! `max_attempts`.
//!
//! # Complexity
//! O(a * n log n) per pick in the worst case, a = attempts, n = bucket size.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::weighted_index;
use crate::config::PaperConfig;
use crate::dispatching::{rules, RuleEngine, SelectionContext};
use crate::error::SelectionError;
use crate::models::{
    scores_equal, ConstraintSpec, QuestionId, QuestionItem, QuestionType, Selection,
    SCORE_EPSILON,
};
use crate::validation::validate_input;

/// How a question is taken out of a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PickStrategy {
    /// Closest difficulty to the target, first encountered on ties.
    #[default]
    ClosestDifficulty,
    /// Uniformly random.
    Random,
}

/// Remaining candidates of one attempt, grouped by type and label-1.
///
/// Buckets keep pool order. Each attempt builds its own.
#[derive(Debug, Clone, Default)]
pub struct CandidateBuckets {
    buckets: HashMap<QuestionType, HashMap<String, Vec<Arc<QuestionItem>>>>,
    taken: HashSet<QuestionId>,
}

impl CandidateBuckets {
    /// Groups candidates by type and knowledge label.
    pub fn from_items(items: &[Arc<QuestionItem>]) -> Self {
        let mut buckets: HashMap<QuestionType, HashMap<String, Vec<Arc<QuestionItem>>>> =
            HashMap::new();
        for item in items {
            buckets
                .entry(item.question_type)
                .or_default()
                .entry(item.knowledge().to_string())
                .or_default()
                .push(Arc::clone(item));
        }
        Self {
            buckets,
            taken: HashSet::new(),
        }
    }

    /// Whether the (type, label) bucket still holds a question.
    pub fn has(&self, qtype: QuestionType, label: &str) -> bool {
        self.buckets
            .get(&qtype)
            .and_then(|by_label| by_label.get(label))
            .is_some_and(|bucket| !bucket.is_empty())
    }

    /// Whether any type still holds a question for `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.buckets
            .values()
            .filter_map(|by_label| by_label.get(label))
            .any(|bucket| !bucket.is_empty())
    }

    /// Number of questions left across all buckets.
    pub fn remaining(&self) -> usize {
        self.buckets
            .values()
            .flat_map(|by_label| by_label.values())
            .map(Vec::len)
            .sum()
    }

    /// Whether the question was already taken out.
    pub fn is_taken(&self, id: QuestionId) -> bool {
        self.taken.contains(&id)
    }

    /// Removes one question from the (type, label) bucket.
    pub fn take<R: Rng>(
        &mut self,
        qtype: QuestionType,
        label: &str,
        picker: &Picker,
        rng: &mut R,
    ) -> Option<Arc<QuestionItem>> {
        let bucket = self.buckets.get_mut(&qtype)?.get_mut(label)?;
        if bucket.is_empty() {
            return None;
        }
        let idx = match picker.strategy {
            PickStrategy::ClosestDifficulty => picker.engine.select_best(bucket, &picker.context)?,
            PickStrategy::Random => rng.random_range(0..bucket.len()),
        };
        let item = bucket.remove(idx);
        self.taken.insert(item.id);
        Some(item)
    }

    /// Removes a specific question, if it is still available.
    pub fn take_id(&mut self, item: &QuestionItem) -> Option<Arc<QuestionItem>> {
        let bucket = self
            .buckets
            .get_mut(&item.question_type)?
            .get_mut(item.knowledge())?;
        let idx = bucket.iter().position(|q| q.id == item.id)?;
        let taken = bucket.remove(idx);
        self.taken.insert(taken.id);
        Some(taken)
    }
}

/// Bucket pick policy: a ranking engine plus its context.
#[derive(Debug, Clone)]
pub struct Picker {
    engine: RuleEngine,
    context: SelectionContext,
    strategy: PickStrategy,
}

impl Picker {
    /// Picks by closest difficulty to `target_difficulty`.
    pub fn closest_difficulty(target_difficulty: f64) -> Self {
        Self {
            engine: RuleEngine::new().with_rule(rules::DifficultyDistance),
            context: SelectionContext::at_difficulty(target_difficulty),
            strategy: PickStrategy::ClosestDifficulty,
        }
    }

    /// Sets the pick strategy.
    pub fn with_strategy(mut self, strategy: PickStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Splits `total` across shares, rounding to whole points.
///
/// Whole points are assigned by floor first. Leftover points go to budgets
/// whose floored value is odd (so they become even), then to the largest
/// fractional parts. A fractional remainder of `total` is added to the
/// largest share. The result always sums to `total`.
///
/// Non-positive share sums fall back to equal shares.
///
/// # Example
/// ```
/// use u_exam::selector::split_budget;
///
/// let budgets = split_budget(9.0, &[0.5, 0.3, 0.2]);
/// assert_eq!(budgets, vec![4.0, 3.0, 2.0]);
/// ```
pub fn split_budget(total: f64, shares: &[f64]) -> Vec<f64> {
    let n = shares.len();
    if n == 0 {
        return Vec::new();
    }

    let share_sum: f64 = shares.iter().filter(|s| **s > 0.0).sum();
    let normalized: Vec<f64> = if share_sum > 0.0 {
        shares.iter().map(|s| s.max(0.0) / share_sum).collect()
    } else {
        vec![1.0 / n as f64; n]
    };

    let whole = total.max(0.0).floor();
    let fraction = total.max(0.0) - whole;
    let raw: Vec<f64> = normalized.iter().map(|s| s * whole).collect();
    let mut budgets: Vec<f64> = raw.iter().map(|r| r.floor()).collect();
    let leftover = (whole - budgets.iter().sum::<f64>()).round().max(0.0) as usize;

    let mut order: Vec<usize> = (0..n).filter(|&i| normalized[i] > 0.0).collect();
    order.sort_by(|&a, &b| {
        let odd_a = budgets[a] % 2.0 == 1.0;
        let odd_b = budgets[b] % 2.0 == 1.0;
        let frac_a = raw[a] - budgets[a];
        let frac_b = raw[b] - budgets[b];
        odd_b
            .cmp(&odd_a)
            .then(frac_b.partial_cmp(&frac_a).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.cmp(&b))
    });
    for &i in order.iter().cycle().take(leftover) {
        budgets[i] += 1.0;
    }

    if fraction > 0.0 {
        let largest = (0..n).fold(0, |best, i| {
            if normalized[i] > normalized[best] {
                i
            } else {
                best
            }
        });
        budgets[largest] += fraction;
    }

    budgets
}

/// Outcome of a construction that never hit the exact target.
#[derive(Debug, Clone)]
pub(crate) struct PartialConstruction {
    /// Attempt whose total came closest to the target.
    pub best: Selection,
    /// Attempts spent.
    pub attempts: usize,
}

/// Constructive procedure shared by the greedy selector and GA seeding.
#[derive(Debug, Clone)]
pub(crate) struct Constructor {
    spec: ConstraintSpec,
    config: PaperConfig,
    manual: Vec<Arc<QuestionItem>>,
    drawable: Vec<Arc<QuestionItem>>,
    label_shares: Vec<(String, f64)>,
    picker: Picker,
}

impl Constructor {
    /// Validates the request and prepares the candidate lists.
    ///
    /// # Errors
    /// - `InvalidConstraint` when the pool or the constraints fail validation
    /// - `EmptyResult` when nothing is left after exclusion filtering
    pub(crate) fn new(
        pool: &[QuestionItem],
        spec: &ConstraintSpec,
        config: &PaperConfig,
    ) -> Result<Self, SelectionError> {
        validate_input(pool, spec)?;

        let manual: Vec<Arc<QuestionItem>> = pool
            .iter()
            .filter(|q| spec.is_included(q.id))
            .map(|q| Arc::new(q.clone()))
            .collect();
        let drawable: Vec<Arc<QuestionItem>> = pool
            .iter()
            .filter(|q| spec.is_drawable(q))
            .map(|q| Arc::new(q.clone()))
            .collect();

        if manual.is_empty() && drawable.is_empty() {
            return Err(SelectionError::EmptyResult);
        }
        if manual.len() < spec.include_ids.len() {
            debug!(
                event = "manual_includes_missing",
                requested = spec.include_ids.len(),
                found = manual.len(),
            );
        }

        let label_shares = Self::label_shares(spec, &drawable);

        Ok(Self {
            spec: spec.clone(),
            config: config.clone(),
            manual,
            drawable,
            label_shares,
            picker: Picker::closest_difficulty(spec.target_difficulty),
        })
    }

    /// Declared weight shares, or equal shares over the pool's labels.
    fn label_shares(spec: &ConstraintSpec, drawable: &[Arc<QuestionItem>]) -> Vec<(String, f64)> {
        let shares = spec.weight_shares();
        if !shares.is_empty() {
            return shares
                .into_iter()
                .map(|(label, share)| (label.to_string(), share))
                .collect();
        }

        let mut labels: Vec<&str> = Vec::new();
        for item in drawable {
            if !labels.contains(&item.knowledge()) {
                labels.push(item.knowledge());
            }
        }
        let share = 1.0 / labels.len().max(1) as f64;
        labels
            .into_iter()
            .map(|label| (label.to_string(), share))
            .collect()
    }

    /// Sets how questions are taken out of buckets.
    pub(crate) fn with_strategy(mut self, strategy: PickStrategy) -> Self {
        self.picker = self.picker.with_strategy(strategy);
        self
    }

    pub(crate) fn spec(&self) -> &ConstraintSpec {
        &self.spec
    }

    pub(crate) fn drawable(&self) -> &[Arc<QuestionItem>] {
        &self.drawable
    }

    pub(crate) fn manual(&self) -> &[Arc<QuestionItem>] {
        &self.manual
    }

    fn manual_total(&self) -> f64 {
        self.manual.iter().map(|q| q.score).sum()
    }

    /// Runs attempts until one reaches the target exactly.
    ///
    /// Stops after the first attempt when the manual includes alone
    /// overshoot the target.
    pub(crate) fn construct<R: Rng>(
        &self,
        max_attempts: usize,
        rng: &mut R,
    ) -> Result<Selection, PartialConstruction> {
        let target = self.spec.target_total_score;
        let overshooting_manual = self.manual_total() > target + SCORE_EPSILON;
        let mut best: Option<Selection> = None;
        let mut attempts = 0;

        for attempt in 1..=max_attempts.max(1) {
            attempts = attempt;
            let selection = self.build_attempt(rng);
            let total = selection.total_score();

            if scores_equal(total, target) {
                debug!(event = "construction_succeeded", attempt, items = selection.len());
                return Ok(selection);
            }
            debug!(event = "construction_attempt_failed", attempt, total, target);

            let closer = best
                .as_ref()
                .map_or(true, |b| (target - total).abs() < (target - b.total_score()).abs());
            if closer {
                best = Some(selection);
            }
            if overshooting_manual {
                break;
            }
        }

        Err(PartialConstruction {
            best: best.unwrap_or_default(),
            attempts,
        })
    }

    /// Builds one candidate selection. The total may miss the target.
    pub(crate) fn build_attempt<R: Rng>(&self, rng: &mut R) -> Selection {
        let target = self.spec.target_total_score;
        let mut buckets = CandidateBuckets::from_items(&self.drawable);
        let mut selection = Selection::from_items(self.manual.clone());
        let mut total = selection.total_score();
        if total > target + SCORE_EPSILON {
            return selection;
        }

        let floor = self
            .config
            .short_answer_floor
            .max(self.spec.min_count(QuestionType::ShortAnswer));
        self.fill_quota(QuestionType::ShortAnswer, floor, &mut buckets, &mut selection, &mut total, rng);

        for qtype in QuestionType::ALL {
            if qtype == QuestionType::ShortAnswer || !self.spec.type_requirements.contains_key(&qtype) {
                continue;
            }
            let min = self.spec.min_count(qtype);
            self.fill_quota(qtype, min, &mut buckets, &mut selection, &mut total, rng);
        }

        for round in 0..self.config.fill_rounds {
            let remaining = target - total;
            if remaining <= SCORE_EPSILON {
                break;
            }
            let before = total;
            let shares = self.fill_shares(&buckets);
            let budgets = split_budget(remaining, &shares);

            for ((label, _), budget) in self.label_shares.iter().zip(budgets) {
                if budget <= SCORE_EPSILON {
                    continue;
                }
                self.fill_label(label, budget, &mut buckets, &mut selection, &mut total, rng);
                if total + SCORE_EPSILON >= target {
                    break;
                }
            }

            if scores_equal(total, before) {
                debug!(event = "fill_stalled", round, total);
                break;
            }
        }

        if total + SCORE_EPSILON < target {
            if let Some(item) = self.residual_match(target - total, &mut buckets) {
                selection.push(item);
            }
        }

        selection
    }

    /// Draws questions of `qtype` until its quota is met.
    fn fill_quota<R: Rng>(
        &self,
        qtype: QuestionType,
        min_count: usize,
        buckets: &mut CandidateBuckets,
        selection: &mut Selection,
        total: &mut f64,
        rng: &mut R,
    ) {
        let target = self.spec.target_total_score;
        while *total + SCORE_EPSILON < target && !self.quota_met(selection, qtype, min_count) {
            let Some(label) = self.draw_label(buckets, qtype, rng) else {
                break;
            };
            let Some(item) = buckets.take(qtype, label, &self.picker, rng) else {
                break;
            };
            if *total + item.score > target + SCORE_EPSILON {
                continue;
            }
            *total += item.score;
            selection.push(item);
        }
    }

    fn quota_met(&self, selection: &Selection, qtype: QuestionType, min_count: usize) -> bool {
        if selection.count_of(qtype) < min_count {
            return false;
        }
        match self
            .spec
            .type_requirements
            .get(&qtype)
            .and_then(|r| r.target_score)
        {
            Some(score) => {
                let type_score: f64 = selection
                    .iter()
                    .filter(|q| q.question_type == qtype)
                    .map(|q| q.score)
                    .sum();
                type_score + SCORE_EPSILON >= score
            }
            None => true,
        }
    }

    /// Draws one label by weight among labels whose (type, label) bucket
    /// is non-empty.
    fn draw_label<R: Rng>(
        &self,
        buckets: &CandidateBuckets,
        qtype: QuestionType,
        rng: &mut R,
    ) -> Option<&str> {
        let weights: Vec<f64> = self
            .label_shares
            .iter()
            .map(|(label, share)| if buckets.has(qtype, label) { *share } else { 0.0 })
            .collect();
        let idx = weighted_index(&weights, rng)?;
        Some(self.label_shares[idx].0.as_str())
    }

    /// Per-label shares for the next fill round.
    ///
    /// Knowledge weights, restricted to labels that still hold a candidate
    /// of any type. With every label exhausted, plain weights.
    fn fill_shares(&self, buckets: &CandidateBuckets) -> Vec<f64> {
        let live: Vec<f64> = self
            .label_shares
            .iter()
            .map(|(label, share)| if buckets.has_label(label) { *share } else { 0.0 })
            .collect();

        if live.iter().sum::<f64>() > 0.0 {
            live
        } else {
            self.label_shares.iter().map(|(_, share)| *share).collect()
        }
    }

    /// Spends one label's sub-budget, short-answer first.
    ///
    /// A draw that would overshoot the total is discarded and the label
    /// moves on to the next type.
    fn fill_label<R: Rng>(
        &self,
        label: &str,
        budget: f64,
        buckets: &mut CandidateBuckets,
        selection: &mut Selection,
        total: &mut f64,
        rng: &mut R,
    ) {
        let target = self.spec.target_total_score;
        let mut spent = 0.0;

        for qtype in QuestionType::FILL_PRIORITY {
            while spent + SCORE_EPSILON < budget {
                let Some(item) = buckets.take(qtype, label, &self.picker, rng) else {
                    break;
                };
                if *total + item.score > target + SCORE_EPSILON {
                    break;
                }
                spent += item.score;
                *total += item.score;
                selection.push(item);
            }
            if spent + SCORE_EPSILON >= budget {
                return;
            }
        }
    }

    /// Closest remaining question within tolerance of the residual.
    fn residual_match(
        &self,
        residual: f64,
        buckets: &mut CandidateBuckets,
    ) -> Option<Arc<QuestionItem>> {
        let tolerance = self.config.residual_tolerance + SCORE_EPSILON;
        let mut best: Option<(&Arc<QuestionItem>, f64)> = None;
        for item in &self.drawable {
            if buckets.is_taken(item.id) {
                continue;
            }
            let gap = (item.score - residual).abs();
            if gap <= tolerance && best.map_or(true, |(_, g)| gap < g) {
                best = Some((item, gap));
            }
        }
        let (item, _) = best?;
        buckets.take_id(item)
    }
}

/// Knowledge-weighted greedy selector.
///
/// Produces one selection whose total equals the target exactly, or
/// reports infeasibility after the configured number of attempts.
///
/// # Example
///
/// ```
/// use u_exam::models::{ConstraintSpec, QuestionItem, QuestionType};
/// use u_exam::selector::GreedyWeightedSelector;
///
/// let pool: Vec<QuestionItem> = (1..=20)
///     .map(|id| QuestionItem::new(id, QuestionType::ShortAnswer, 5.0))
///     .collect();
/// let spec = ConstraintSpec::new(3.0);
///
/// let selection = GreedyWeightedSelector::new().select_seeded(&pool, &spec, 42).unwrap();
/// assert_eq!(selection.total_score(), 100.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyWeightedSelector {
    config: PaperConfig,
}

impl GreedyWeightedSelector {
    /// Creates a selector with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the heuristic settings.
    pub fn with_config(mut self, config: PaperConfig) -> Self {
        self.config = config;
        self
    }

    /// Current settings.
    pub fn config(&self) -> &PaperConfig {
        &self.config
    }

    /// Selects questions from `pool` for `spec`.
    ///
    /// # Errors
    /// - `InvalidConstraint` for malformed input
    /// - `EmptyResult` when exclusion filtering leaves nothing
    /// - `InfeasibleSelection` when no attempt reaches the exact target
    pub fn select<R: Rng>(
        &self,
        pool: &[QuestionItem],
        spec: &ConstraintSpec,
        rng: &mut R,
    ) -> Result<Selection, SelectionError> {
        let constructor = Constructor::new(pool, spec, &self.config)?;
        info!(
            event = "greedy_selection_started",
            candidates = constructor.drawable().len(),
            manual = constructor.manual().len(),
            target = spec.target_total_score,
        );

        match constructor.construct(self.config.max_attempts, rng) {
            Ok(selection) => {
                info!(
                    event = "greedy_selection_finished",
                    items = selection.len(),
                    average_difficulty = selection.average_difficulty(),
                );
                Ok(selection)
            }
            Err(partial) => {
                warn!(
                    event = "greedy_selection_infeasible",
                    attempts = partial.attempts,
                    best_total = partial.best.total_score(),
                );
                Err(SelectionError::InfeasibleSelection {
                    attempts: partial.attempts,
                })
            }
        }
    }

    /// Same as [`select`](Self::select) with a seeded generator.
    pub fn select_seeded(
        &self,
        pool: &[QuestionItem],
        spec: &ConstraintSpec,
        seed: u64,
    ) -> Result<Selection, SelectionError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        self.select(pool, spec, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TypeRequirement;

    fn items(
        ids: std::ops::RangeInclusive<u64>,
        qtype: QuestionType,
        score: f64,
        label: &str,
    ) -> Vec<QuestionItem> {
        ids.map(|id| QuestionItem::new(id, qtype, score).with_knowledge(label))
            .collect()
    }

    #[test]
    fn test_short_answer_floor() {
        let pool = items(1..=20, QuestionType::ShortAnswer, 5.0, "A");
        let spec = ConstraintSpec::new(3.0);

        let selection = GreedyWeightedSelector::new()
            .select_seeded(&pool, &spec, 42)
            .unwrap();
        assert!(selection.count_of(QuestionType::ShortAnswer) >= 5);
        assert!(selection.reaches(100.0));
        assert!(selection.has_unique_ids());
    }

    #[test]
    fn test_mixed_pool_meets_type_minimum() {
        let mut pool = items(1..=10, QuestionType::ShortAnswer, 5.0, "A");
        pool.extend(items(11..=20, QuestionType::TrueFalse, 2.0, "A"));
        pool.extend(items(21..=40, QuestionType::MultipleChoice, 5.0, "A"));
        let spec = ConstraintSpec::new(3.0)
            .with_target_score(60.0)
            .with_type_requirement(QuestionType::TrueFalse, TypeRequirement::at_least(3));

        let selection = GreedyWeightedSelector::new()
            .select_seeded(&pool, &spec, 7)
            .unwrap();
        assert!(selection.reaches(60.0));
        assert!(selection.count_of(QuestionType::TrueFalse) >= 3);
        assert!(selection.count_of(QuestionType::ShortAnswer) >= 5);
    }

    #[test]
    fn test_exclusions_and_includes() {
        let pool: Vec<QuestionItem> = (1..=40)
            .map(|id| {
                let label = if id % 2 == 1 { "A" } else { "B" };
                QuestionItem::new(id, QuestionType::MultipleChoice, 5.0).with_knowledge(label)
            })
            .collect();
        let spec = ConstraintSpec::new(3.0)
            .with_target_score(50.0)
            .with_included([3, 8])
            .with_excluded([1, 2, 5]);

        for seed in 0..10 {
            let selection = GreedyWeightedSelector::new()
                .select_seeded(&pool, &spec, seed)
                .unwrap();
            assert!(selection.reaches(50.0));
            assert!(selection.contains(3) && selection.contains(8));
            assert!(![1, 2, 5].iter().any(|&id| selection.contains(id)));
        }
    }

    #[test]
    fn test_empty_pool() {
        let spec = ConstraintSpec::new(3.0);
        let result = GreedyWeightedSelector::new().select_seeded(&[], &spec, 1);
        assert_eq!(result, Err(SelectionError::EmptyResult));

        let pool = items(1..=3, QuestionType::FillIn, 2.0, "A");
        let spec = ConstraintSpec::new(3.0).with_excluded([1, 2, 3]);
        let result = GreedyWeightedSelector::new().select_seeded(&pool, &spec, 1);
        assert_eq!(result, Err(SelectionError::EmptyResult));
    }

    #[test]
    fn test_balanced_knowledge_weights() {
        let mut pool = items(1..=40, QuestionType::MultipleChoice, 5.0, "A");
        pool.extend(items(41..=80, QuestionType::MultipleChoice, 5.0, "B"));
        let spec = ConstraintSpec::new(3.0)
            .with_knowledge_weight("A", 1.0)
            .with_knowledge_weight("B", 1.0);

        let selection = GreedyWeightedSelector::new()
            .select_seeded(&pool, &spec, 3)
            .unwrap();
        let scores = selection.label_scores();
        assert!(selection.reaches(100.0));
        assert!((scores["A"] - 50.0).abs() < 1e-9);
        assert!((scores["B"] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_exhausted_label_leaves_budget_to_others() {
        let mut pool = items(1..=10, QuestionType::MultipleChoice, 10.0, "A");
        pool.extend(items(11..=12, QuestionType::MultipleChoice, 5.0, "B"));
        let spec = ConstraintSpec::new(3.0)
            .with_knowledge_weight("A", 1.0)
            .with_knowledge_weight("B", 1.0);

        for seed in 0..20 {
            let selection = GreedyWeightedSelector::new()
                .select_seeded(&pool, &spec, seed)
                .unwrap();
            assert!(selection.reaches(100.0), "seed {seed}");
            assert!(selection.has_unique_ids());
        }
    }

    #[test]
    fn test_scarce_heavy_label() {
        let mut pool = items(1..=4, QuestionType::MultipleChoice, 5.0, "A");
        pool.extend(items(5..=44, QuestionType::MultipleChoice, 5.0, "B"));
        let spec = ConstraintSpec::new(3.0)
            .with_knowledge_weight("A", 3.0)
            .with_knowledge_weight("B", 1.0);

        for seed in 0..10 {
            let selection = GreedyWeightedSelector::new()
                .select_seeded(&pool, &spec, seed)
                .unwrap();
            let scores = selection.label_scores();
            assert!(selection.reaches(100.0), "seed {seed}");
            assert!((scores["A"] - 20.0).abs() < 1e-9);
            assert!((scores["B"] - 80.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_type_target_score_extends_quota() {
        let mut pool = items(1..=20, QuestionType::TrueFalse, 2.0, "A");
        pool.extend(items(21..=80, QuestionType::MultipleChoice, 2.0, "A"));
        let spec = ConstraintSpec::new(3.0).with_type_requirement(
            QuestionType::TrueFalse,
            TypeRequirement::at_least(1).with_target_score(20.0),
        );

        let selection = GreedyWeightedSelector::new()
            .select_seeded(&pool, &spec, 11)
            .unwrap();
        let true_false: f64 = selection
            .iter()
            .filter(|q| q.question_type == QuestionType::TrueFalse)
            .map(|q| q.score)
            .sum();
        assert!(selection.reaches(100.0));
        assert!(true_false >= 20.0);
    }

    #[test]
    fn test_label_scope_limits_draws() {
        let mut pool = items(1..=20, QuestionType::MultipleChoice, 5.0, "A");
        pool.extend(items(21..=40, QuestionType::MultipleChoice, 5.0, "B"));
        pool.extend(items(41..=60, QuestionType::MultipleChoice, 5.0, "C"));
        let spec = ConstraintSpec::new(3.0).with_label_scope(["A", "B"]);

        for seed in 0..5 {
            let selection = GreedyWeightedSelector::new()
                .select_seeded(&pool, &spec, seed)
                .unwrap();
            assert!(selection.reaches(100.0));
            assert!(selection.iter().all(|q| q.knowledge() != "C"));
        }

        let narrow = ConstraintSpec::new(3.0).with_label_scope(["C"]);
        let result = GreedyWeightedSelector::new().select_seeded(&pool[..40], &narrow, 0);
        assert_eq!(result, Err(SelectionError::EmptyResult));
    }

    #[test]
    fn test_single_item_matches_target() {
        let pool = vec![QuestionItem::new(1, QuestionType::MultipleChoice, 100.0)];
        let spec = ConstraintSpec::new(3.0);

        let selection = GreedyWeightedSelector::new()
            .select_seeded(&pool, &spec, 0)
            .unwrap();
        assert_eq!(selection.ids(), vec![1]);
    }

    #[test]
    fn test_infeasible_reports_attempts() {
        let pool = items(1..=10, QuestionType::MultipleChoice, 3.0, "A");
        let spec = ConstraintSpec::new(3.0);
        let config = PaperConfig {
            max_attempts: 5,
            ..Default::default()
        };

        let result = GreedyWeightedSelector::new()
            .with_config(config)
            .select_seeded(&pool, &spec, 0);
        assert_eq!(result, Err(SelectionError::InfeasibleSelection { attempts: 5 }));
    }

    #[test]
    fn test_overshooting_includes_fail_fast() {
        let pool = vec![
            QuestionItem::new(1, QuestionType::ShortAnswer, 60.0),
            QuestionItem::new(2, QuestionType::ShortAnswer, 60.0),
            QuestionItem::new(3, QuestionType::ShortAnswer, 40.0),
        ];
        let spec = ConstraintSpec::new(3.0).with_included([1, 2]);

        let result = GreedyWeightedSelector::new().select_seeded(&pool, &spec, 0);
        assert_eq!(result, Err(SelectionError::InfeasibleSelection { attempts: 1 }));
    }

    #[test]
    fn test_invalid_difficulty_rejected() {
        let pool = items(1..=3, QuestionType::FillIn, 2.0, "A");
        let spec = ConstraintSpec::new(7.0);
        let result = GreedyWeightedSelector::new().select_seeded(&pool, &spec, 0);
        assert!(matches!(result, Err(SelectionError::InvalidConstraint(_))));
    }

    #[test]
    fn test_closest_difficulty_preferred() {
        let pool = vec![
            QuestionItem::new(1, QuestionType::MultipleChoice, 50.0).with_difficulty(5),
            QuestionItem::new(2, QuestionType::MultipleChoice, 50.0).with_difficulty(2),
            QuestionItem::new(3, QuestionType::MultipleChoice, 50.0).with_difficulty(1),
        ];
        let spec = ConstraintSpec::new(1.5);

        let selection = GreedyWeightedSelector::new()
            .select_seeded(&pool, &spec, 0)
            .unwrap();
        let mut ids = selection.ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_residual_splice() {
        let pool = vec![
            QuestionItem::new(1, QuestionType::ShortAnswer, 10.0).with_knowledge("A"),
            QuestionItem::new(2, QuestionType::FillIn, 2.5).with_knowledge("Z"),
        ];
        // "Z" carries no weight, so only the residual step can reach it
        let spec = ConstraintSpec::new(3.0)
            .with_target_score(12.5)
            .with_knowledge_weight("A", 1.0);

        let selection = GreedyWeightedSelector::new()
            .select_seeded(&pool, &spec, 0)
            .unwrap();
        assert!(selection.reaches(12.5));
        assert!(selection.contains(2));
    }

    #[test]
    fn test_split_budget_preserves_sum() {
        assert_eq!(split_budget(9.0, &[0.5, 0.3, 0.2]), vec![4.0, 3.0, 2.0]);
        assert_eq!(split_budget(10.0, &[1.0, 1.0, 1.0]), vec![4.0, 3.0, 3.0]);
        assert_eq!(split_budget(7.5, &[1.0, 1.0]), vec![4.5, 3.0]);
        assert_eq!(split_budget(6.0, &[0.0, 0.0]), vec![3.0, 3.0]);
        assert_eq!(split_budget(8.0, &[1.0, 0.0]), vec![8.0, 0.0]);
        assert!(split_budget(5.0, &[]).is_empty());

        let budgets = split_budget(97.0, &[0.37, 0.21, 0.42]);
        assert!((budgets.iter().sum::<f64>() - 97.0).abs() < 1e-9);
        assert!(budgets.iter().all(|b| b.fract() == 0.0));
    }

    #[test]
    fn test_buckets_take_in_difficulty_order() {
        let pool: Vec<Arc<QuestionItem>> = vec![
            Arc::new(QuestionItem::new(1, QuestionType::FillIn, 2.0).with_difficulty(5).with_knowledge("A")),
            Arc::new(QuestionItem::new(2, QuestionType::FillIn, 2.0).with_difficulty(3).with_knowledge("A")),
            Arc::new(QuestionItem::new(3, QuestionType::FillIn, 2.0).with_difficulty(3).with_knowledge("A")),
        ];
        let mut buckets = CandidateBuckets::from_items(&pool);
        let picker = Picker::closest_difficulty(3.0);
        let mut rng = SmallRng::seed_from_u64(0);

        let ids: Vec<u64> = std::iter::from_fn(|| buckets.take(QuestionType::FillIn, "A", &picker, &mut rng))
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(buckets.remaining(), 0);
        assert!(!buckets.has(QuestionType::FillIn, "A"));
        assert!(buckets.is_taken(1));
    }
}
