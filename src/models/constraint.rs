//! Composition constraints.
//!
//! A [`ConstraintSpec`] states what the finished paper must look like.
//! Exact total score is a hard constraint; difficulty, knowledge balance
//! and type counts are objectives the selectors approximate.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{QuestionId, QuestionItem, QuestionType};

/// Relative weight of a knowledge point (label-1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeWeight {
    /// Knowledge point.
    pub label: String,
    /// Non-negative relative weight. Need not sum to 1 across labels.
    pub weight: f64,
}

/// Requirement for one question type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeRequirement {
    /// Minimum number of questions of this type.
    pub min_count: usize,
    /// Score this type must carry before the greedy quota phase moves on.
    #[serde(default)]
    pub target_score: Option<f64>,
}

impl TypeRequirement {
    /// Requires at least `min_count` questions.
    pub fn at_least(min_count: usize) -> Self {
        Self {
            min_count,
            target_score: None,
        }
    }

    /// Sets the desired score for the type.
    pub fn with_target_score(mut self, score: f64) -> Self {
        self.target_score = Some(score);
        self
    }
}

/// Everything the caller asks of a paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    /// Exact total score the paper must reach.
    pub target_total_score: f64,
    /// Desired average difficulty (1.0..=5.0).
    pub target_difficulty: f64,
    /// Knowledge point weights, in caller order.
    #[serde(default)]
    pub knowledge_weights: Vec<KnowledgeWeight>,
    /// Per-type requirements.
    #[serde(default)]
    pub type_requirements: BTreeMap<QuestionType, TypeRequirement>,
    /// Questions that must appear in every result.
    #[serde(default)]
    pub include_ids: BTreeSet<QuestionId>,
    /// Questions that must never appear.
    #[serde(default)]
    pub exclude_ids: BTreeSet<QuestionId>,
    /// When non-empty, only questions whose label-1 is listed are eligible.
    #[serde(default)]
    pub label_scope: BTreeSet<String>,
}

impl ConstraintSpec {
    /// Default exact total score.
    pub const DEFAULT_TARGET_SCORE: f64 = 100.0;

    /// Creates constraints targeting the given average difficulty and a 100-point paper.
    pub fn new(target_difficulty: f64) -> Self {
        Self {
            target_total_score: Self::DEFAULT_TARGET_SCORE,
            target_difficulty,
            knowledge_weights: Vec::new(),
            type_requirements: BTreeMap::new(),
            include_ids: BTreeSet::new(),
            exclude_ids: BTreeSet::new(),
            label_scope: BTreeSet::new(),
        }
    }

    /// Sets the exact total score.
    pub fn with_target_score(mut self, score: f64) -> Self {
        self.target_total_score = score;
        self
    }

    /// Adds (or replaces) a knowledge point weight.
    pub fn with_knowledge_weight(mut self, label: impl Into<String>, weight: f64) -> Self {
        let label = label.into();
        match self.knowledge_weights.iter_mut().find(|kw| kw.label == label) {
            Some(existing) => existing.weight = weight,
            None => self.knowledge_weights.push(KnowledgeWeight { label, weight }),
        }
        self
    }

    /// Sets the requirement for a question type.
    pub fn with_type_requirement(mut self, qtype: QuestionType, req: TypeRequirement) -> Self {
        self.type_requirements.insert(qtype, req);
        self
    }

    /// Adds questions that must be included.
    pub fn with_included(mut self, ids: impl IntoIterator<Item = QuestionId>) -> Self {
        self.include_ids.extend(ids);
        self
    }

    /// Adds questions that must be excluded.
    pub fn with_excluded(mut self, ids: impl IntoIterator<Item = QuestionId>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    /// Restricts eligible questions to the given knowledge points.
    pub fn with_label_scope<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.label_scope.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Whether the question must be included.
    #[inline]
    pub fn is_included(&self, id: QuestionId) -> bool {
        self.include_ids.contains(&id)
    }

    /// Whether the question must be excluded.
    #[inline]
    pub fn is_excluded(&self, id: QuestionId) -> bool {
        self.exclude_ids.contains(&id)
    }

    /// Whether a question may be drawn by a selector.
    ///
    /// Manual includes are placed separately and are never drawn.
    pub fn is_drawable(&self, item: &QuestionItem) -> bool {
        !self.is_excluded(item.id)
            && !self.is_included(item.id)
            && (self.label_scope.is_empty() || self.label_scope.contains(item.knowledge()))
    }

    /// Sum of all knowledge weights.
    pub fn total_weight(&self) -> f64 {
        self.knowledge_weights.iter().map(|kw| kw.weight).sum()
    }

    /// Knowledge weights normalized to shares summing to 1.
    ///
    /// Returns an empty list when no label carries positive weight.
    pub fn weight_shares(&self) -> Vec<(&str, f64)> {
        let total = self.total_weight();
        if total <= 0.0 {
            return Vec::new();
        }
        self.knowledge_weights
            .iter()
            .map(|kw| (kw.label.as_str(), kw.weight / total))
            .collect()
    }

    /// Score a label should carry according to its weight share.
    pub fn expected_label_score(&self, label: &str) -> f64 {
        self.weight_shares()
            .into_iter()
            .find(|(l, _)| *l == label)
            .map(|(_, share)| share * self.target_total_score)
            .unwrap_or(0.0)
    }

    /// Minimum count required for a type (0 when undeclared).
    pub fn min_count(&self, qtype: QuestionType) -> usize {
        self.type_requirements
            .get(&qtype)
            .map(|r| r.min_count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder() {
        let spec = ConstraintSpec::new(3.0)
            .with_knowledge_weight("A", 2.0)
            .with_knowledge_weight("B", 1.0)
            .with_knowledge_weight("A", 3.0)
            .with_type_requirement(QuestionType::TrueFalse, TypeRequirement::at_least(4))
            .with_included([1, 2])
            .with_excluded([9]);

        assert_eq!(spec.knowledge_weights.len(), 2);
        assert!((spec.total_weight() - 4.0).abs() < 1e-12);
        assert_eq!(spec.min_count(QuestionType::TrueFalse), 4);
        assert_eq!(spec.min_count(QuestionType::FillIn), 0);
        assert!(spec.is_included(2));
        assert!(spec.is_excluded(9));
    }

    #[test]
    fn test_weight_shares_normalize() {
        let spec = ConstraintSpec::new(3.0)
            .with_knowledge_weight("A", 1.0)
            .with_knowledge_weight("B", 3.0);
        let shares = spec.weight_shares();
        assert_eq!(shares, vec![("A", 0.25), ("B", 0.75)]);
        assert!((spec.expected_label_score("B") - 75.0).abs() < 1e-9);
        assert_eq!(spec.expected_label_score("missing"), 0.0);
    }

    #[test]
    fn test_zero_weights_have_no_shares() {
        let spec = ConstraintSpec::new(3.0).with_knowledge_weight("A", 0.0);
        assert!(spec.weight_shares().is_empty());
    }

    #[test]
    fn test_drawable_respects_scope_and_lists() {
        let spec = ConstraintSpec::new(3.0)
            .with_included([1])
            .with_excluded([2])
            .with_label_scope(["A"]);
        let q = |id, label: &str| QuestionItem::new(id, QuestionType::FillIn, 2.0).with_knowledge(label);

        assert!(!spec.is_drawable(&q(1, "A")));
        assert!(!spec.is_drawable(&q(2, "A")));
        assert!(!spec.is_drawable(&q(3, "B")));
        assert!(spec.is_drawable(&q(3, "A")));
    }
}
