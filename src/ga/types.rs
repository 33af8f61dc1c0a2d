//! Core trait definitions for the GA engine.
//!
//! [`Individual`] and [`GaProblem`] define the contract between the
//! generic runner and a domain-specific problem.
//!
//! # Fitness convention
//! **Higher fitness is better** (maximization). Infeasible individuals
//! score 0.0.

use rand::Rng;

/// A candidate solution in the GA population.
///
/// Individuals carry their own fitness value. The runner calls
/// [`GaProblem::evaluate`] and stores the result via
/// [`set_fitness`](Individual::set_fitness).
pub trait Individual: Clone + Send + Sync {
    /// Current fitness.
    fn fitness(&self) -> f64;

    /// Stores the fitness computed by the runner.
    fn set_fitness(&mut self, fitness: f64);
}

/// Defines a GA optimization problem.
///
/// 1. **Initialization**: how to create individuals
/// 2. **Evaluation**: how to compute fitness
/// 3. **Crossover**: how to recombine two parents
/// 4. **Mutation**: how to perturb an individual
pub trait GaProblem: Send + Sync {
    /// The individual (solution) type for this problem.
    type Individual: Individual;

    /// Creates an individual for the initial population.
    fn create_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual;

    /// Evaluates an individual. Must be pure: same input, same fitness.
    fn evaluate(&self, individual: &Self::Individual) -> f64;

    /// Produces one or two offspring.
    ///
    /// The default implementation clones parent1 (no crossover).
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        _parent2: &Self::Individual,
        _rng: &mut R,
    ) -> Vec<Self::Individual> {
        vec![parent1.clone()]
    }

    /// Mutates an individual in place.
    ///
    /// The default implementation is a no-op.
    fn mutate<R: Rng>(&self, _individual: &mut Self::Individual, _rng: &mut R) {}

    /// Called at the end of each generation with the population best.
    fn on_generation(&self, _generation: usize, _best_fitness: f64) {}
}
