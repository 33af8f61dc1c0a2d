//! Paper quality metrics (KPIs).
//!
//! Computes quality indicators of a finished selection against the
//! constraint set it was built for.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total score | Sum of question scores |
//! | Meets target | Total equals the target exactly |
//! | Difficulty gap | abs(average difficulty - target difficulty) |
//! | Label shares | Score share per knowledge label |
//! | Knowledge deviation | Sum of abs(actual - expected label score) / target |
//! | Unmet types | Types below their minimum count |
//! | History similarity | Mean Jaccard against past papers (optional) |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::history::HistoryIndex;
use crate::models::{scores_equal, ConstraintSpec, QuestionType, Selection};

/// Paper quality indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperKpi {
    /// Sum of question scores.
    pub total_score: f64,
    /// Requested total.
    pub target_score: f64,
    /// Whether the total equals the target.
    pub meets_target: bool,
    /// Number of questions.
    pub item_count: usize,
    /// Mean difficulty (0.0 for an empty selection).
    pub average_difficulty: f64,
    /// Distance between mean and target difficulty.
    pub difficulty_gap: f64,
    /// Share of the total score per knowledge label (0.0..1.0).
    pub label_shares: BTreeMap<String, f64>,
    /// Weighted-label deviation relative to the target (0.0 = exact).
    pub knowledge_deviation: f64,
    /// Question count per type.
    pub type_counts: BTreeMap<QuestionType, usize>,
    /// Types whose minimum count is not met.
    pub unmet_types: Vec<QuestionType>,
    /// Mean similarity against past papers, when history was supplied.
    pub history_similarity: Option<f64>,
}

impl PaperKpi {
    /// Computes KPIs of a selection.
    ///
    /// # Arguments
    /// * `selection` - The finished selection.
    /// * `spec` - The constraints it was built for.
    pub fn calculate(selection: &Selection, spec: &ConstraintSpec) -> Self {
        let total = selection.total_score();
        let average = selection.average_difficulty();
        let label_scores = selection.label_scores();

        let label_shares = if total > 0.0 {
            label_scores
                .iter()
                .map(|(label, score)| (label.clone(), score / total))
                .collect()
        } else {
            BTreeMap::new()
        };

        let knowledge_deviation = if spec.target_total_score > 0.0 {
            spec.knowledge_weights
                .iter()
                .map(|kw| {
                    let actual = label_scores.get(&kw.label).copied().unwrap_or(0.0);
                    (actual - spec.expected_label_score(&kw.label)).abs()
                })
                .sum::<f64>()
                / spec.target_total_score
        } else {
            0.0
        };

        let unmet_types = spec
            .type_requirements
            .iter()
            .filter(|(qtype, req)| selection.count_of(**qtype) < req.min_count)
            .map(|(qtype, _)| *qtype)
            .collect();

        Self {
            total_score: total,
            target_score: spec.target_total_score,
            meets_target: scores_equal(total, spec.target_total_score),
            item_count: selection.len(),
            average_difficulty: average,
            difficulty_gap: if selection.is_empty() {
                0.0
            } else {
                (average - spec.target_difficulty).abs()
            },
            label_shares,
            knowledge_deviation,
            type_counts: selection.type_counts(),
            unmet_types,
            history_similarity: None,
        }
    }

    /// Adds the similarity of `selection` against a history index.
    pub fn with_history(mut self, selection: &Selection, index: &HistoryIndex) -> Self {
        self.history_similarity = Some(index.similarity_of(&selection.ids()));
        self
    }
}
