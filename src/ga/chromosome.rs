//! Paper chromosome: a selection plus its fitness.

use serde::{Deserialize, Serialize};

use super::Individual;
use crate::models::{QuestionId, Selection};

/// GA individual for paper composition.
///
/// The genome is the selection itself: an ordered list of distinct
/// questions. Crossover works on positions of that list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperChromosome {
    /// Chosen questions.
    pub selection: Selection,
    /// Last evaluated fitness (0.0 until evaluated).
    pub fitness: f64,
}

impl PaperChromosome {
    /// Wraps a selection with zero fitness.
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            fitness: 0.0,
        }
    }

    /// Number of genes (questions).
    pub fn len(&self) -> usize {
        self.selection.len()
    }

    /// Whether the chromosome carries no question.
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// Question IDs in gene order.
    pub fn ids(&self) -> Vec<QuestionId> {
        self.selection.ids()
    }
}

impl Individual for PaperChromosome {
    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}
