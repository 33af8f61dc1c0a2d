//! Input validation for composition requests.
//!
//! Checks structural integrity of the candidate pool and the constraint
//! set before any selection runs. Detects:
//! - Duplicate question IDs
//! - Non-positive or non-finite scores
//! - Difficulty levels outside 1..=5
//! - Non-positive target score, target difficulty outside [1, 5]
//! - Negative knowledge weights
//! - IDs that are both force-included and excluded
//!
//! All problems are collected, not just the first one.

use std::collections::HashSet;

use crate::models::{ConstraintSpec, QuestionItem};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two questions share the same ID.
    DuplicateId,
    /// A question has a non-positive or non-finite score.
    InvalidScore,
    /// A question difficulty or the target difficulty is out of range.
    DifficultyOutOfRange,
    /// The target total score is not positive.
    NonPositiveTarget,
    /// A knowledge weight is negative or not finite.
    NegativeWeight,
    /// An ID is both included and excluded.
    ConflictingIds,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates candidate questions.
///
/// Checks:
/// 1. No duplicate question IDs
/// 2. Every score is finite and positive
/// 3. Every difficulty is within 1..=5
pub fn validate_pool(pool: &[QuestionItem]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::with_capacity(pool.len());

    for q in pool {
        if !ids.insert(q.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate question ID: {}", q.id),
            ));
        }
        if !q.score.is_finite() || q.score <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidScore,
                format!("Question {} has invalid score {}", q.id, q.score),
            ));
        }
        if !(QuestionItem::MIN_DIFFICULTY..=QuestionItem::MAX_DIFFICULTY).contains(&q.difficulty) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DifficultyOutOfRange,
                format!("Question {} has difficulty {} outside 1..=5", q.id, q.difficulty),
            ));
        }
    }

    into_result(errors)
}

/// Validates a constraint set.
///
/// Checks:
/// 1. Target total score is finite and positive
/// 2. Target difficulty is within [1.0, 5.0]
/// 3. Knowledge weights are finite and non-negative
/// 4. No ID is both included and excluded
pub fn validate_constraints(spec: &ConstraintSpec) -> ValidationResult {
    let mut errors = Vec::new();

    if !spec.target_total_score.is_finite() || spec.target_total_score <= 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveTarget,
            format!("Target score must be positive, got {}", spec.target_total_score),
        ));
    }

    if !(1.0..=5.0).contains(&spec.target_difficulty) {
        errors.push(ValidationError::new(
            ValidationErrorKind::DifficultyOutOfRange,
            format!(
                "Target difficulty must be within [1, 5], got {}",
                spec.target_difficulty
            ),
        ));
    }

    for kw in &spec.knowledge_weights {
        if !kw.weight.is_finite() || kw.weight < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeWeight,
                format!("Knowledge '{}' has invalid weight {}", kw.label, kw.weight),
            ));
        }
    }

    for id in spec.include_ids.intersection(&spec.exclude_ids) {
        errors.push(ValidationError::new(
            ValidationErrorKind::ConflictingIds,
            format!("Question {id} is both included and excluded"),
        ));
    }

    into_result(errors)
}

/// Validates a pool together with its constraint set.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(pool: &[QuestionItem], spec: &ConstraintSpec) -> ValidationResult {
    let mut errors = Vec::new();
    if let Err(e) = validate_pool(pool) {
        errors.extend(e);
    }
    if let Err(e) = validate_constraints(spec) {
        errors.extend(e);
    }
    into_result(errors)
}

fn into_result(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
