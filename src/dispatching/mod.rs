//! Candidate ranking rules and rule engine.
//!
//! Provides priority rules (difficulty distance, history recency, peak
//! similarity) and a composable rule engine for multi-criteria candidate
//! ranking. Selectors use the engine to decide which question to draw next.
//!
//! # Usage
//!
//! ```
//! use u_exam::dispatching::{RuleEngine, SelectionContext};
//! use u_exam::dispatching::rules;
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::DifficultyDistance)
//!     .with_tie_breaker(rules::PeakSimilarity);
//!
//! let context = SelectionContext::at_difficulty(3.0);
//! // let best = engine.select_best(&candidates, &context);
//! ```

mod context;
mod engine;
pub mod rules;

pub use context::SelectionContext;
pub use engine::{EvaluationMode, RuleEngine, TieBreaker};

use crate::models::QuestionItem;
use std::fmt::Debug;

/// Score returned by a ranking rule.
///
/// Lower scores = higher priority (drawn first).
pub type RuleScore = f64;

/// A rule that evaluates how desirable a candidate question is.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules return smaller values for
/// questions that should be drawn first.
pub trait SelectionRule: Send + Sync + Debug {
    /// Rule name (e.g., "DIFF", "RECENCY").
    fn name(&self) -> &'static str;

    /// Evaluates a candidate given the current selection context.
    ///
    /// Returns a score where lower = higher priority.
    fn evaluate(&self, item: &QuestionItem, context: &SelectionContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
