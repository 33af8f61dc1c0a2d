//! Paper composition as a GA problem.
//!
//! # Fitness
//!
//! 0 when the total misses the target. Otherwise
//! `100 * (1 - 0.2 D - 0.3 K - 0.3 T - 0.2 S)`, floored at 0:
//!
//! | Term | Meaning | Cap |
//! |------|---------|-----|
//! | D | Mean abs(difficulty - target difficulty) | 1 |
//! | K | Sum of abs(label score - expected label score) / target total | 1 |
//! | T | Sum of max(0, min - count) over required types / requirements | 1 |
//! | S | Duplicate-ID pairs / selection size | 1 |

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;

use super::chromosome::PaperChromosome;
use super::operators::{replace_mutation, two_point_crossover, AlternativePool};
use super::GaProblem;
use crate::config::PaperConfig;
use crate::error::SelectionError;
use crate::models::{scores_equal, ConstraintSpec, QuestionItem, Selection};
use crate::selector::{Constructor, PickStrategy};

/// Weight of the difficulty term.
pub const DIFFICULTY_WEIGHT: f64 = 0.2;
/// Weight of the knowledge-share term.
pub const KNOWLEDGE_WEIGHT: f64 = 0.3;
/// Weight of the type-requirement term.
pub const TYPE_WEIGHT: f64 = 0.3;
/// Weight of the duplicate term.
pub const DUPLICATE_WEIGHT: f64 = 0.2;

/// Fitness of a selection against its constraints.
///
/// Pure and independent of question order.
pub fn calculate_fitness(selection: &Selection, spec: &ConstraintSpec) -> f64 {
    if selection.is_empty() {
        return 0.0;
    }

    let mut items: Vec<&QuestionItem> = selection.iter().map(|q| q.as_ref()).collect();
    items.sort_by_key(|q| q.id);

    let total: f64 = items.iter().map(|q| q.score).sum();
    if !scores_equal(total, spec.target_total_score) {
        return 0.0;
    }
    let n = items.len() as f64;

    let d = (items
        .iter()
        .map(|q| q.difficulty_distance(spec.target_difficulty))
        .sum::<f64>()
        / n)
        .min(1.0);

    let mut label_scores: BTreeMap<&str, f64> = BTreeMap::new();
    for q in &items {
        *label_scores.entry(q.knowledge()).or_insert(0.0) += q.score;
    }
    let k = (spec
        .knowledge_weights
        .iter()
        .map(|kw| {
            let actual = label_scores.get(kw.label.as_str()).copied().unwrap_or(0.0);
            (actual - spec.expected_label_score(&kw.label)).abs()
        })
        .sum::<f64>()
        / spec.target_total_score)
        .min(1.0);

    let t = if spec.type_requirements.is_empty() {
        0.0
    } else {
        let shortfall: usize = spec
            .type_requirements
            .iter()
            .map(|(qtype, req)| {
                let count = items.iter().filter(|q| q.question_type == *qtype).count();
                req.min_count.saturating_sub(count)
            })
            .sum();
        (shortfall as f64 / spec.type_requirements.len() as f64).min(1.0)
    };

    let s = (selection.duplicate_pairs() as f64 / n).min(1.0);

    let penalty = DIFFICULTY_WEIGHT * d + KNOWLEDGE_WEIGHT * k + TYPE_WEIGHT * t + DUPLICATE_WEIGHT * s;
    (100.0 * (1.0 - penalty)).max(0.0)
}

/// GA problem definition for paper composition.
///
/// Individuals are seeded with the constructive heuristic (half by closest
/// difficulty, half by random picks). Crossover children that break the
/// total, duplicate a question, or drop a manual include are replaced by
/// fresh constructive draws.
///
/// # Example
/// ```
/// use u_exam::config::PaperConfig;
/// use u_exam::ga::{GaConfig, GaRunner, PaperGaProblem};
/// use u_exam::models::{ConstraintSpec, QuestionItem, QuestionType};
///
/// let pool: Vec<QuestionItem> = (1..=40)
///     .map(|id| QuestionItem::new(id, QuestionType::MultipleChoice, 5.0).with_difficulty((id % 5 + 1) as u8))
///     .collect();
/// let spec = ConstraintSpec::new(3.0);
/// let problem = PaperGaProblem::new(&pool, &spec, &PaperConfig::default()).unwrap();
///
/// let config = GaConfig::for_generations(10).with_population_size(10).with_seed(42);
/// let result = GaRunner::run(&problem, &config);
/// assert!(result.best.selection.reaches(100.0));
/// ```
#[derive(Debug, Clone)]
pub struct PaperGaProblem {
    closest: Constructor,
    diverse: Constructor,
    alternatives: AlternativePool,
    rebuild_attempts: usize,
}

impl PaperGaProblem {
    /// Default attempt budget of fresh constructive draws.
    pub const DEFAULT_REBUILD_ATTEMPTS: usize = 10;

    /// Creates a problem from a candidate pool and constraints.
    ///
    /// # Errors
    /// `InvalidConstraint` or `EmptyResult`, as for the greedy selector.
    pub fn new(
        pool: &[QuestionItem],
        spec: &ConstraintSpec,
        config: &PaperConfig,
    ) -> Result<Self, SelectionError> {
        let closest = Constructor::new(pool, spec, config)?;
        let diverse = closest.clone().with_strategy(PickStrategy::Random);

        let mut alternatives = AlternativePool::new();
        for item in closest.drawable() {
            alternatives
                .entry((item.question_type, item.knowledge().to_string()))
                .or_default()
                .push(Arc::clone(item));
        }

        Ok(Self {
            closest,
            diverse,
            alternatives,
            rebuild_attempts: Self::DEFAULT_REBUILD_ATTEMPTS,
        })
    }

    /// Sets the attempt budget of fresh constructive draws.
    pub fn with_rebuild_attempts(mut self, attempts: usize) -> Self {
        self.rebuild_attempts = attempts.max(1);
        self
    }

    /// Constraints being optimized.
    pub fn spec(&self) -> &ConstraintSpec {
        self.closest.spec()
    }

    /// Number of drawable candidates.
    pub fn candidate_count(&self) -> usize {
        self.closest.drawable().len()
    }

    /// Builds a new selection with the constructive heuristic.
    ///
    /// When no attempt reaches the target, returns `fallback` if given,
    /// else the attempt closest to the target.
    pub fn fresh_selection<R: Rng>(&self, fallback: Option<&Selection>, rng: &mut R) -> Selection {
        let constructor = if rng.random_bool(0.5) {
            &self.closest
        } else {
            &self.diverse
        };
        match constructor.construct(self.rebuild_attempts, rng) {
            Ok(selection) => selection,
            Err(partial) => match fallback {
                Some(parent) => parent.clone(),
                None => partial.best,
            },
        }
    }

    /// Whether a child may enter the population as is.
    pub fn is_valid_child(&self, selection: &Selection) -> bool {
        selection.reaches(self.spec().target_total_score)
            && selection.has_unique_ids()
            && self
                .closest
                .manual()
                .iter()
                .all(|m| selection.contains(m.id))
    }
}

impl GaProblem for PaperGaProblem {
    type Individual = PaperChromosome;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> PaperChromosome {
        PaperChromosome::new(self.fresh_selection(None, rng))
    }

    fn evaluate(&self, individual: &PaperChromosome) -> f64 {
        calculate_fitness(&individual.selection, self.spec())
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &PaperChromosome,
        parent2: &PaperChromosome,
        rng: &mut R,
    ) -> Vec<PaperChromosome> {
        let Some((child1, child2)) = two_point_crossover(&parent1.selection, &parent2.selection, rng)
        else {
            return vec![PaperChromosome::new(
                self.fresh_selection(Some(&parent1.selection), rng),
            )];
        };

        let mut children = Vec::with_capacity(2);
        for (child, parent) in [(child1, parent1), (child2, parent2)] {
            let selection = if self.is_valid_child(&child) {
                child
            } else {
                self.fresh_selection(Some(&parent.selection), rng)
            };
            children.push(PaperChromosome::new(selection));
        }
        children
    }

    fn mutate<R: Rng>(&self, individual: &mut PaperChromosome, rng: &mut R) {
        let spec = self.spec();
        replace_mutation(
            &mut individual.selection,
            &self.alternatives,
            |id| spec.is_included(id),
            rng,
        );
    }
}
