//! Tuning configuration.
//!
//! Load composition settings from TOML so attempt budgets, GA parameters
//! and history windows can change without code changes. Every field has a
//! default, so a partial (or empty) file is valid.
//!
//! # Examples
//!
//! ```
//! use u_exam::config::ComposerConfig;
//!
//! let config = ComposerConfig::from_toml_str(r#"
//!     [paper]
//!     short_answer_floor = 3
//!
//!     [genetic]
//!     mutation_rate = 0.1
//!
//!     [history]
//!     window_days = 365
//! "#).unwrap();
//!
//! assert_eq!(config.paper.short_answer_floor, 3);
//! assert_eq!(config.paper.max_attempts, 100);
//! assert_eq!(config.history.window_days, 365);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ga::GaConfig;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level composition configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Constructive heuristic settings.
    pub paper: PaperConfig,
    /// Genetic optimizer settings.
    pub genetic: GeneticSettings,
    /// Usage history settings.
    pub history: HistoryConfig,
}

impl ComposerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_toml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file without validating it.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paper.max_attempts == 0 {
            return Err(ConfigError::Invalid("paper.max_attempts must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.paper.residual_tolerance) {
            return Err(ConfigError::Invalid(
                "paper.residual_tolerance must be within [0, 1)".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.genetic.mutation_rate) {
            return Err(ConfigError::Invalid(
                "genetic.mutation_rate must be within [0, 1]".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.genetic.elite_fraction) {
            return Err(ConfigError::Invalid(
                "genetic.elite_fraction must be within [0, 1)".into(),
            ));
        }
        if self.genetic.tournament_size == 0 {
            return Err(ConfigError::Invalid(
                "genetic.tournament_size must be > 0".into(),
            ));
        }
        if self.history.window_days <= 0 {
            return Err(ConfigError::Invalid("history.window_days must be > 0".into()));
        }
        if self.history.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "history.refresh_interval_secs must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.history.reuse_threshold) {
            return Err(ConfigError::Invalid(
                "history.reuse_threshold must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Constructive heuristic settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PaperConfig {
    /// Short-answer questions guaranteed before other types are drawn.
    pub short_answer_floor: usize,
    /// Construction attempts before reporting infeasibility.
    pub max_attempts: usize,
    /// Budget-splitting rounds per attempt.
    pub fill_rounds: usize,
    /// Allowed gap between a spliced question's score and the residual.
    pub residual_tolerance: f64,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            short_answer_floor: 5,
            max_attempts: 100,
            fill_rounds: 100,
            residual_tolerance: 0.1,
        }
    }
}

/// Genetic optimizer settings independent of the run length.
///
/// Population size is derived from the generation count in
/// [`to_ga_config`](Self::to_ga_config).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneticSettings {
    /// Per-child mutation probability.
    pub mutation_rate: f64,
    /// Share of the population carried over unchanged.
    pub elite_fraction: f64,
    /// Contestants per tournament.
    pub tournament_size: usize,
    /// Generations without improvement before stopping early.
    pub patience: usize,
    /// Generations that always run before early stop is allowed.
    pub min_generations: usize,
    /// Attempt budget for fallback constructive draws.
    pub rebuild_attempts: usize,
}

impl Default for GeneticSettings {
    fn default() -> Self {
        Self {
            mutation_rate: 0.05,
            elite_fraction: 1.0 / 3.0,
            tournament_size: 5,
            patience: 100,
            min_generations: 200,
            rebuild_attempts: 10,
        }
    }
}

impl GeneticSettings {
    /// Builds a run configuration for the requested generation count.
    pub fn to_ga_config(&self, generations: usize) -> GaConfig {
        GaConfig::for_generations(generations)
            .with_mutation_rate(self.mutation_rate)
            .with_elite_fraction(self.elite_fraction)
            .with_tournament_size(self.tournament_size)
            .with_patience(self.patience, self.min_generations)
            .with_rebuild_attempts(self.rebuild_attempts)
    }
}

/// Usage history settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Trailing window of past papers considered, in days.
    pub window_days: i64,
    /// Background refresh interval, in seconds.
    pub refresh_interval_secs: u64,
    /// Reuse threshold t: a `(1 - t)` share of recent questions is excluded.
    pub reuse_threshold: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_days: 730,
            refresh_interval_secs: 30 * 60,
            reuse_threshold: 0.3,
        }
    }
}

impl HistoryConfig {
    /// Trailing window as a calendar duration.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(self.window_days)
    }

    /// Refresh interval as a timer duration.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ComposerConfig::default();
        assert_eq!(config.paper.short_answer_floor, 5);
        assert_eq!(config.genetic.tournament_size, 5);
        assert_eq!(config.genetic.patience, 100);
        assert_eq!(config.genetic.min_generations, 200);
        assert_eq!(config.history.refresh_interval(), Duration::from_secs(1800));
        assert_eq!(config.history.window(), chrono::Duration::days(730));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ComposerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ComposerConfig::default());
    }

    #[test]
    fn test_partial_section() {
        let config = ComposerConfig::from_toml_str(
            r#"
            [genetic]
            patience = 20
            min_generations = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.genetic.patience, 20);
        assert_eq!(config.genetic.min_generations, 50);
        assert!((config.genetic.mutation_rate - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ComposerConfig::default();
        config.genetic.mutation_rate = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ComposerConfig::default();
        config.history.reuse_threshold = -0.1;
        assert!(config.validate().is_err());

        let mut config = ComposerConfig::default();
        config.paper.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_toml() {
        let err = ComposerConfig::from_toml_str("[paper\nmax_attempts = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ComposerConfig::load("/nonexistent/u-exam.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_settings_to_ga_config() {
        let settings = GeneticSettings {
            mutation_rate: 0.2,
            ..Default::default()
        };
        let ga = settings.to_ga_config(500);
        assert_eq!(ga.generations, 500);
        assert_eq!(ga.population_size, 50);
        assert!((ga.mutation_rate - 0.2).abs() < 1e-12);
    }
}
