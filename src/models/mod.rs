//! Exam composition domain models.
//!
//! Provides the data types for describing a composition problem
//! (candidate questions and constraints) and its solution (a selection).
//!
//! # Domain Mappings
//!
//! | u-exam | Paper | Optimization |
//! |--------|-------|--------------|
//! | QuestionItem | Question | Gene |
//! | ConstraintSpec | Paper requirements | Objective + hard constraint |
//! | Selection | Paper draft | Chromosome |
//! | PaperSections | Rendered sections | Decoded output |

mod constraint;
mod question;
mod selection;

pub use constraint::{ConstraintSpec, KnowledgeWeight, TypeRequirement};
pub use question::{KnowledgeLabels, QuestionId, QuestionItem, QuestionType};
pub use selection::{scores_equal, PaperSections, Selection, SCORE_EPSILON};
