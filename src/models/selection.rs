//! Selection (solution) model.
//!
//! A selection is one candidate paper: an ordered list of distinct
//! questions. Selections are values. Operators build new ones rather
//! than editing selections already handed out.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::{QuestionId, QuestionItem, QuestionType};

/// Tolerance for comparing score sums.
///
/// Integral and half-integral scores sum exactly in `f64`; the epsilon only
/// absorbs representation noise of unusual fractional scores.
pub const SCORE_EPSILON: f64 = 1e-9;

/// Whether two score sums are equal.
#[inline]
pub fn scores_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < SCORE_EPSILON
}

/// A candidate paper composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Chosen questions, in selection order.
    pub items: Vec<Arc<QuestionItem>>,
}

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a selection from items.
    pub fn from_items(items: Vec<Arc<QuestionItem>>) -> Self {
        Self { items }
    }

    /// Appends a question.
    pub fn push(&mut self, item: Arc<QuestionItem>) {
        self.items.push(item);
    }

    /// Removes and returns the last question.
    pub fn pop(&mut self) -> Option<Arc<QuestionItem>> {
        self.items.pop()
    }

    /// Number of questions.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no question is selected.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the questions.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<QuestionItem>> {
        self.items.iter()
    }

    /// Sum of question scores.
    pub fn total_score(&self) -> f64 {
        self.items.iter().map(|q| q.score).sum()
    }

    /// Whether the total score equals `target`.
    pub fn reaches(&self, target: f64) -> bool {
        scores_equal(self.total_score(), target)
    }

    /// Mean difficulty, 0.0 for an empty selection.
    pub fn average_difficulty(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.items.iter().map(|q| f64::from(q.difficulty)).sum();
        sum / self.items.len() as f64
    }

    /// Question IDs in selection order.
    pub fn ids(&self) -> Vec<QuestionId> {
        self.items.iter().map(|q| q.id).collect()
    }

    /// Whether the question is selected.
    pub fn contains(&self, id: QuestionId) -> bool {
        self.items.iter().any(|q| q.id == id)
    }

    /// Whether every ID appears at most once.
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.items.len());
        self.items.iter().all(|q| seen.insert(q.id))
    }

    /// Number of unordered pairs sharing an ID.
    pub fn duplicate_pairs(&self) -> usize {
        let mut counts: BTreeMap<QuestionId, usize> = BTreeMap::new();
        for q in &self.items {
            *counts.entry(q.id).or_insert(0) += 1;
        }
        counts.values().map(|&n| n * n.saturating_sub(1) / 2).sum()
    }

    /// Score carried by each knowledge point (label-1).
    pub fn label_scores(&self) -> BTreeMap<String, f64> {
        let mut scores = BTreeMap::new();
        for q in &self.items {
            *scores.entry(q.knowledge().to_string()).or_insert(0.0) += q.score;
        }
        scores
    }

    /// Number of questions of each type.
    pub fn type_counts(&self) -> BTreeMap<QuestionType, usize> {
        let mut counts = BTreeMap::new();
        for q in &self.items {
            *counts.entry(q.question_type).or_insert(0) += 1;
        }
        counts
    }

    /// Number of questions of one type.
    pub fn count_of(&self, qtype: QuestionType) -> usize {
        self.items.iter().filter(|q| q.question_type == qtype).count()
    }

    /// Splits the selection into per-type sections for rendering.
    pub fn partition_by_type(&self) -> PaperSections {
        let mut sections = PaperSections {
            total_score: self.total_score(),
            ..Default::default()
        };
        for q in &self.items {
            sections.section_mut(q.question_type).push(Arc::clone(q));
        }
        sections
    }
}

/// A selection grouped by question type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperSections {
    /// Fill-in questions.
    pub fill_in: Vec<Arc<QuestionItem>>,
    /// Multiple-choice questions.
    pub multiple_choice: Vec<Arc<QuestionItem>>,
    /// True/false questions.
    pub true_false: Vec<Arc<QuestionItem>>,
    /// Short-answer questions.
    pub short_answer: Vec<Arc<QuestionItem>>,
    /// Total score over all sections.
    pub total_score: f64,
}

impl PaperSections {
    /// Questions of one type.
    pub fn section(&self, qtype: QuestionType) -> &[Arc<QuestionItem>] {
        match qtype {
            QuestionType::FillIn => &self.fill_in,
            QuestionType::MultipleChoice => &self.multiple_choice,
            QuestionType::TrueFalse => &self.true_false,
            QuestionType::ShortAnswer => &self.short_answer,
        }
    }

    fn section_mut(&mut self, qtype: QuestionType) -> &mut Vec<Arc<QuestionItem>> {
        match qtype {
            QuestionType::FillIn => &mut self.fill_in,
            QuestionType::MultipleChoice => &mut self.multiple_choice,
            QuestionType::TrueFalse => &mut self.true_false,
            QuestionType::ShortAnswer => &mut self.short_answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: QuestionId, qtype: QuestionType, score: f64, difficulty: u8, label: &str) -> Arc<QuestionItem> {
        Arc::new(
            QuestionItem::new(id, qtype, score)
                .with_difficulty(difficulty)
                .with_knowledge(label),
        )
    }

    #[test]
    fn test_selection_totals() {
        let sel = Selection::from_items(vec![
            item(1, QuestionType::ShortAnswer, 10.0, 4, "A"),
            item(2, QuestionType::FillIn, 2.5, 2, "B"),
            item(3, QuestionType::FillIn, 2.5, 3, "A"),
        ]);
        assert!((sel.total_score() - 15.0).abs() < 1e-12);
        assert!(sel.reaches(15.0));
        assert!(!sel.reaches(14.5));
        assert!((sel.average_difficulty() - 3.0).abs() < 1e-12);
        assert_eq!(sel.ids(), vec![1, 2, 3]);
        assert_eq!(sel.count_of(QuestionType::FillIn), 2);
        assert_eq!(sel.label_scores().get("A"), Some(&12.5));
    }

    #[test]
    fn test_duplicates_detected() {
        let a = item(1, QuestionType::TrueFalse, 2.0, 3, "A");
        let sel = Selection::from_items(vec![a.clone(), a.clone(), a]);
        assert!(!sel.has_unique_ids());
        assert_eq!(sel.duplicate_pairs(), 3);
        assert!(Selection::new().has_unique_ids());
        assert_eq!(Selection::new().average_difficulty(), 0.0);
    }

    #[test]
    fn test_partition_by_type() {
        let sel = Selection::from_items(vec![
            item(1, QuestionType::ShortAnswer, 10.0, 4, "A"),
            item(2, QuestionType::MultipleChoice, 2.0, 2, "B"),
            item(3, QuestionType::ShortAnswer, 10.0, 3, "A"),
        ]);
        let sections = sel.partition_by_type();
        assert_eq!(sections.short_answer.len(), 2);
        assert_eq!(sections.section(QuestionType::MultipleChoice).len(), 1);
        assert!(sections.fill_in.is_empty());
        assert!((sections.total_score - 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_selection_serializes() {
        let sel = Selection::from_items(vec![item(5, QuestionType::TrueFalse, 2.0, 1, "A")]);
        let json = serde_json::to_string(&sel).unwrap();
        let back: Selection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sel);
    }
}
