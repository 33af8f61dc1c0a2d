//! Question (candidate item) model.
//!
//! A question is an immutable catalog record. The persistence layer owns
//! the catalog; composition only reads snapshots of it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog identifier of a question.
pub type QuestionId = u64;

/// Question format.
///
/// The declaration order is also the rendering order of paper sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    /// Fill in the blank.
    FillIn,
    /// Multiple choice.
    MultipleChoice,
    /// True / false.
    TrueFalse,
    /// Short answer (free text).
    ShortAnswer,
}

impl QuestionType {
    /// All question types in section order.
    pub const ALL: [QuestionType; 4] = [
        QuestionType::FillIn,
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::ShortAnswer,
    ];

    /// Order in which types are drawn when filling the score budget.
    ///
    /// Short-answer items carry the largest scores, so they go first.
    pub const FILL_PRIORITY: [QuestionType; 4] = [
        QuestionType::ShortAnswer,
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::FillIn,
    ];

    /// Stable short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::FillIn => "fill-in",
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::TrueFalse => "true-false",
            QuestionType::ShortAnswer => "short-answer",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topical tags of a question.
///
/// `label1` is the knowledge point used for weighting; the other fields
/// only feed structural similarity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnowledgeLabels {
    /// Chapter.
    pub chapter1: String,
    /// Section within the chapter.
    pub chapter2: String,
    /// Primary knowledge point.
    pub label1: String,
    /// Secondary knowledge point.
    pub label2: String,
}

impl KnowledgeLabels {
    /// Creates labels with only the primary knowledge point set.
    pub fn primary(label1: impl Into<String>) -> Self {
        Self {
            label1: label1.into(),
            ..Default::default()
        }
    }
}

/// A candidate question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    /// Unique question identifier.
    pub id: QuestionId,
    /// Question format.
    pub question_type: QuestionType,
    /// Points awarded (positive, usually integral or half-integral).
    pub score: f64,
    /// Difficulty level, 1 (easiest) to 5 (hardest).
    pub difficulty: u8,
    /// Knowledge labels.
    pub labels: KnowledgeLabels,
    /// Reference to an attached image, resolved by the storage layer.
    pub image: Option<String>,
}

impl QuestionItem {
    /// Lowest valid difficulty.
    pub const MIN_DIFFICULTY: u8 = 1;
    /// Highest valid difficulty.
    pub const MAX_DIFFICULTY: u8 = 5;

    /// Creates a question with difficulty 3 and empty labels.
    pub fn new(id: QuestionId, question_type: QuestionType, score: f64) -> Self {
        Self {
            id,
            question_type,
            score,
            difficulty: 3,
            labels: KnowledgeLabels::default(),
            image: None,
        }
    }

    /// Sets the difficulty.
    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Sets the primary knowledge point (label-1).
    pub fn with_knowledge(mut self, label1: impl Into<String>) -> Self {
        self.labels.label1 = label1.into();
        self
    }

    /// Replaces all knowledge labels.
    pub fn with_labels(mut self, labels: KnowledgeLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Sets the image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Primary knowledge point.
    #[inline]
    pub fn knowledge(&self) -> &str {
        &self.labels.label1
    }

    /// Absolute distance between this question's difficulty and a target.
    #[inline]
    pub fn difficulty_distance(&self, target: f64) -> f64 {
        (f64::from(self.difficulty) - target).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_builder() {
        let q = QuestionItem::new(7, QuestionType::ShortAnswer, 10.0)
            .with_difficulty(4)
            .with_knowledge("Algebra")
            .with_image("img/7.png");

        assert_eq!(q.id, 7);
        assert_eq!(q.question_type, QuestionType::ShortAnswer);
        assert_eq!(q.knowledge(), "Algebra");
        assert_eq!(q.image.as_deref(), Some("img/7.png"));
        assert!((q.difficulty_distance(2.5) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_type_serde_names() {
        let json = serde_json::to_string(&QuestionType::MultipleChoice).unwrap();
        assert_eq!(json, "\"multiple-choice\"");
        let back: QuestionType = serde_json::from_str("\"short-answer\"").unwrap();
        assert_eq!(back, QuestionType::ShortAnswer);
        assert_eq!(QuestionType::TrueFalse.to_string(), "true-false");
    }
}
