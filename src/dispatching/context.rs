//! Selection context for rule evaluation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{QuestionId, QuestionItem};

/// Per-run selection state passed to ranking rules.
///
/// Holds the difficulty target, the questions already chosen in this run,
/// and reuse penalties. Each selector run owns its own context; nothing is
/// shared between runs.
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    /// Desired difficulty.
    pub target_difficulty: f64,
    /// Questions already chosen in this run.
    pub selected: Vec<Arc<QuestionItem>>,
    /// Reuse penalty per question (0.0..=1.0), absent = never used.
    pub recency: HashMap<QuestionId, f64>,
}

impl SelectionContext {
    /// Creates a context for the given difficulty target.
    pub fn at_difficulty(target_difficulty: f64) -> Self {
        Self {
            target_difficulty,
            ..Default::default()
        }
    }

    /// Sets the already-selected questions.
    pub fn with_selected(mut self, selected: Vec<Arc<QuestionItem>>) -> Self {
        self.selected = selected;
        self
    }

    /// Sets reuse penalties.
    pub fn with_recency(mut self, recency: HashMap<QuestionId, f64>) -> Self {
        self.recency = recency;
        self
    }

    /// Records a newly chosen question.
    pub fn push_selected(&mut self, item: Arc<QuestionItem>) {
        self.selected.push(item);
    }

    /// Reuse penalty of a question.
    pub fn recency_of(&self, id: QuestionId) -> f64 {
        self.recency.get(&id).copied().unwrap_or(0.0)
    }
}
