//! Generational GA runner.
//!
//! # Generation loop
//!
//! 1. Evaluate every individual.
//! 2. Record the population best and fitness variance.
//! 3. Update the best-ever individual (strict improvement) or the stall
//!    counter.
//! 4. Stop when stall >= patience and the minimum generation count ran.
//! 5. Carry the elites unchanged; fill the rest with tournament-selected
//!    crossover children, each mutated with the configured probability.

use std::cmp::Ordering;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::operators::tournament_select;
use super::{GaConfig, GaProblem, Individual};

/// Outcome of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I> {
    /// Best-ever individual.
    pub best: I,
    /// Fitness of `best`.
    pub best_fitness: f64,
    /// Generations evaluated.
    pub generations: usize,
    /// Population fitness variance per generation.
    pub variance: Vec<f64>,
    /// Population best fitness per generation.
    pub generation_best: Vec<f64>,
    /// Whether the patience rule ended the run.
    pub stopped_early: bool,
}

/// Runs a [`GaProblem`] to completion.
#[derive(Debug, Clone, Copy)]
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA with `config`.
    pub fn run<P: GaProblem>(problem: &P, config: &GaConfig) -> GaResult<P::Individual> {
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self::run_with_rng(problem, config, &mut rng)
    }

    /// Runs the GA drawing randomness from `rng`.
    pub fn run_with_rng<P: GaProblem, R: Rng>(
        problem: &P,
        config: &GaConfig,
        rng: &mut R,
    ) -> GaResult<P::Individual> {
        let pop_size = config.population_size.max(1);
        let max_generations = config.generations.max(1);
        let elite = config.elite_count().min(pop_size);

        let mut population: Vec<P::Individual> = (0..pop_size)
            .map(|_| problem.create_individual(rng))
            .collect();

        let mut best = population[0].clone();
        let mut best_fitness = f64::NEG_INFINITY;
        let mut stall = 0usize;
        let mut variance = Vec::with_capacity(max_generations);
        let mut generation_best = Vec::with_capacity(max_generations);
        let mut stopped_early = false;
        let mut generations = 0;

        for generation in 0..max_generations {
            for individual in population.iter_mut() {
                let fitness = problem.evaluate(individual);
                individual.set_fitness(fitness);
            }
            population.sort_by(|a, b| {
                b.fitness()
                    .partial_cmp(&a.fitness())
                    .unwrap_or(Ordering::Equal)
            });

            let current_best = population[0].fitness();
            let current_variance = fitness_variance(&population);
            variance.push(current_variance);
            generation_best.push(current_best);
            generations = generation + 1;

            if current_best > best_fitness {
                best_fitness = current_best;
                best = population[0].clone();
                stall = 0;
            } else {
                stall += 1;
            }

            problem.on_generation(generation, current_best);
            debug!(
                event = "ga_generation",
                generation,
                best = current_best,
                variance = current_variance,
                stall,
            );

            if stall >= config.patience && generations >= config.min_generations {
                stopped_early = true;
                break;
            }
            if generations == max_generations {
                break;
            }

            let mut next: Vec<P::Individual> = population[..elite].to_vec();
            while next.len() < pop_size {
                let p1 = tournament_select(&population, config.tournament_size, rng);
                let p2 = tournament_select(&population, config.tournament_size, rng);
                let mut children = problem.crossover(p1, p2, rng);
                if children.is_empty() {
                    children.push(p1.clone());
                }
                for mut child in children {
                    if next.len() >= pop_size {
                        break;
                    }
                    if rng.random_bool(config.mutation_rate.clamp(0.0, 1.0)) {
                        problem.mutate(&mut child, rng);
                    }
                    next.push(child);
                }
            }
            population = next;
        }

        info!(
            event = "ga_finished",
            generations,
            best_fitness,
            stopped_early,
        );

        GaResult {
            best,
            best_fitness,
            generations,
            variance,
            generation_best,
            stopped_early,
        }
    }
}

/// Population variance of fitness values (divides by n).
pub fn fitness_variance<I: Individual>(population: &[I]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let n = population.len() as f64;
    let mean = population.iter().map(Individual::fitness).sum::<f64>() / n;
    population
        .iter()
        .map(|i| (i.fitness() - mean).powi(2))
        .sum::<f64>()
        / n
}
