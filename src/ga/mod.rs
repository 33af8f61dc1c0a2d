//! GA-based paper optimization.
//!
//! A generic generational engine ([`GaProblem`], [`Individual`],
//! [`GaRunner`]) plus the paper composition problem built on it.
//!
//! # Encoding
//!
//! A chromosome is the selection itself: an ordered list of question
//! references. Seeds come from the constructive heuristic, so every
//! individual starts feasible whenever the heuristic can reach the target.
//!
//! # Submodules
//!
//! - [`operators`]: tournament selection, two-point crossover, replacement
//!   mutation

mod chromosome;
mod config;
pub mod operators;
mod optimizer;
mod problem;
mod runner;
mod types;

pub use chromosome::PaperChromosome;
pub use config::GaConfig;
pub use optimizer::{GeneticOptimizer, OptimizationResult};
pub use problem::{
    calculate_fitness, PaperGaProblem, DIFFICULTY_WEIGHT, DUPLICATE_WEIGHT, KNOWLEDGE_WEIGHT,
    TYPE_WEIGHT,
};
pub use runner::{fitness_variance, GaResult, GaRunner};
pub use types::{GaProblem, Individual};
