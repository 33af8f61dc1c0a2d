//! Genetic optimizer facade.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{GaConfig, GaRunner, PaperGaProblem};
use crate::config::{ComposerConfig, GeneticSettings, PaperConfig};
use crate::error::SelectionError;
use crate::models::{ConstraintSpec, QuestionItem, Selection};

/// Outcome of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best-ever selection.
    pub selection: Selection,
    /// Its fitness (0.0 when the target was never reached).
    pub fitness: f64,
    /// Generations evaluated.
    pub generations: usize,
    /// Population fitness variance per generation.
    pub variance: Vec<f64>,
    /// Population best fitness per generation.
    pub generation_best: Vec<f64>,
    /// Whether the patience rule ended the run.
    pub stopped_early: bool,
}

impl OptimizationResult {
    /// Whether the selection scores exactly the target.
    ///
    /// Always check this: the optimizer returns its best selection even
    /// when no individual ever reached the target.
    pub fn is_feasible(&self, spec: &ConstraintSpec) -> bool {
        self.selection.reaches(spec.target_total_score)
    }
}

/// Population-based paper optimizer.
///
/// Never reports infeasibility: input problems are errors, everything
/// else yields the best selection found.
///
/// # Example
/// ```
/// use u_exam::ga::GeneticOptimizer;
/// use u_exam::models::{ConstraintSpec, QuestionItem, QuestionType};
///
/// let pool: Vec<QuestionItem> = (1..=60)
///     .map(|id| {
///         QuestionItem::new(id, QuestionType::MultipleChoice, 5.0)
///             .with_difficulty((id % 5 + 1) as u8)
///             .with_knowledge(if id % 2 == 0 { "A" } else { "B" })
///     })
///     .collect();
/// let spec = ConstraintSpec::new(3.0)
///     .with_knowledge_weight("A", 1.0)
///     .with_knowledge_weight("B", 1.0);
///
/// let result = GeneticOptimizer::new().with_seed(42).optimize(&pool, &spec, 20).unwrap();
/// assert!(result.is_feasible(&spec));
/// assert!(result.fitness > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GeneticOptimizer {
    paper: PaperConfig,
    settings: GeneticSettings,
    seed: Option<u64>,
}

impl GeneticOptimizer {
    /// Creates an optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an optimizer from loaded configuration.
    pub fn from_config(config: &ComposerConfig) -> Self {
        Self {
            paper: config.paper.clone(),
            settings: config.genetic.clone(),
            seed: None,
        }
    }

    /// Sets the constructive heuristic settings used for seeding.
    pub fn with_paper_config(mut self, paper: PaperConfig) -> Self {
        self.paper = paper;
        self
    }

    /// Sets the GA settings.
    pub fn with_settings(mut self, settings: GeneticSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Optimizes for up to `generations` generations.
    ///
    /// # Errors
    /// `InvalidConstraint` or `EmptyResult` for unusable input.
    pub fn optimize(
        &self,
        pool: &[QuestionItem],
        spec: &ConstraintSpec,
        generations: usize,
    ) -> Result<OptimizationResult, SelectionError> {
        let mut config = self.settings.to_ga_config(generations);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        self.optimize_with(pool, spec, &config)
    }

    /// Optimizes with explicit run parameters.
    pub fn optimize_with(
        &self,
        pool: &[QuestionItem],
        spec: &ConstraintSpec,
        config: &GaConfig,
    ) -> Result<OptimizationResult, SelectionError> {
        let problem = PaperGaProblem::new(pool, spec, &self.paper)?
            .with_rebuild_attempts(config.rebuild_attempts);

        info!(
            event = "ga_started",
            candidates = problem.candidate_count(),
            population = config.population_size,
            generations = config.generations,
            target = spec.target_total_score,
        );

        let result = GaRunner::run(&problem, config);
        let selection = result.best.selection;

        if !selection.reaches(spec.target_total_score) {
            warn!(
                event = "ga_best_infeasible",
                total = selection.total_score(),
                target = spec.target_total_score,
            );
        }

        Ok(OptimizationResult {
            selection,
            fitness: result.best_fitness,
            generations: result.generations,
            variance: result.variance,
            generation_best: result.generation_best,
            stopped_early: result.stopped_early,
        })
    }
}
