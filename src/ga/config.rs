//! GA run parameters.

use serde::{Deserialize, Serialize};

/// Parameters of one GA run.
///
/// # Example
/// ```
/// use u_exam::ga::GaConfig;
///
/// let config = GaConfig::for_generations(2000).with_seed(7);
/// assert_eq!(config.population_size, 40);
/// assert_eq!(config.elite_count(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Generation cap.
    pub generations: usize,
    /// Per-child mutation probability.
    pub mutation_rate: f64,
    /// Share of the population carried over unchanged.
    pub elite_fraction: f64,
    /// Contestants per tournament (drawn with replacement).
    pub tournament_size: usize,
    /// Generations without improvement before stopping early.
    pub patience: usize,
    /// Generations that always run before early stop is allowed.
    pub min_generations: usize,
    /// Attempt budget of fresh constructive draws.
    pub rebuild_attempts: usize,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl GaConfig {
    /// Population size suited to a generation count.
    ///
    /// Long runs use smaller populations: more than 5000 generations → 30,
    /// fewer than 1000 → 50, otherwise 40.
    pub fn population_for(generations: usize) -> usize {
        if generations > 5000 {
            30
        } else if generations < 1000 {
            50
        } else {
            40
        }
    }

    /// Default parameters for a run of `generations`.
    pub fn for_generations(generations: usize) -> Self {
        Self {
            population_size: Self::population_for(generations),
            generations,
            mutation_rate: 0.05,
            elite_fraction: 1.0 / 3.0,
            tournament_size: 5,
            patience: 100,
            min_generations: 200,
            rebuild_attempts: 10,
            seed: None,
        }
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the mutation probability (clamped to [0, 1]).
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elite share (clamped to [0, 1]).
    pub fn with_elite_fraction(mut self, fraction: f64) -> Self {
        self.elite_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament size (at least 1).
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size.max(1);
        self
    }

    /// Sets the early-stop rule.
    pub fn with_patience(mut self, patience: usize, min_generations: usize) -> Self {
        self.patience = patience;
        self.min_generations = min_generations;
        self
    }

    /// Sets the attempt budget of fresh constructive draws.
    pub fn with_rebuild_attempts(mut self, attempts: usize) -> Self {
        self.rebuild_attempts = attempts.max(1);
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of elites, at least one and at most the population.
    pub fn elite_count(&self) -> usize {
        let size = self.population_size.max(1);
        ((size as f64 * self.elite_fraction).floor() as usize).clamp(1, size)
    }
}

impl Default for GaConfig {
    fn default() -> Self {
        Self::for_generations(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_auto_tuning() {
        assert_eq!(GaConfig::for_generations(10).population_size, 50);
        assert_eq!(GaConfig::for_generations(999).population_size, 50);
        assert_eq!(GaConfig::for_generations(1000).population_size, 40);
        assert_eq!(GaConfig::for_generations(5000).population_size, 40);
        assert_eq!(GaConfig::for_generations(5001).population_size, 30);
    }

    #[test]
    fn test_builders_clamp() {
        let config = GaConfig::default()
            .with_mutation_rate(1.5)
            .with_elite_fraction(-0.2)
            .with_tournament_size(0)
            .with_rebuild_attempts(0);
        assert_eq!(config.mutation_rate, 1.0);
        assert_eq!(config.elite_fraction, 0.0);
        assert_eq!(config.tournament_size, 1);
        assert_eq!(config.rebuild_attempts, 1);
        // at least one elite survives
        assert_eq!(config.elite_count(), 1);
    }
}
