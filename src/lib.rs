//! Exam paper composition for the U-Engine ecosystem.
//!
//! Selects questions from a candidate pool so that the paper's total score
//! equals a fixed target exactly, its average difficulty approximates a
//! requested level, its knowledge-label score shares follow requested
//! weights, per-type minimum counts are met, and recently issued questions
//! are not reused wholesale.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `QuestionItem`, `ConstraintSpec`, `Selection`
//! - **`validation`**: Input integrity checks (duplicate IDs, ranges, conflicts)
//! - **`similarity`**: Structural question similarity and paper overlap
//! - **`history`**: Periodically refreshed index of recently used questions
//! - **`dispatching`**: Candidate ranking rules and rule engine
//! - **`selector`**: Greedy and difficulty-targeted selectors, paper KPIs
//! - **`ga`**: Genetic optimizer evolving constructive solutions
//! - **`config`**: TOML-loadable tuning parameters
//!
//! # Quick start
//!
//! ```
//! use u_exam::models::{ConstraintSpec, QuestionItem, QuestionType};
//! use u_exam::selector::GreedyWeightedSelector;
//!
//! let pool: Vec<QuestionItem> = (1..=40)
//!     .map(|id| {
//!         QuestionItem::new(id, QuestionType::MultipleChoice, 5.0)
//!             .with_knowledge(if id % 2 == 0 { "Algebra" } else { "Geometry" })
//!     })
//!     .collect();
//! let spec = ConstraintSpec::new(3.0)
//!     .with_knowledge_weight("Algebra", 1.0)
//!     .with_knowledge_weight("Geometry", 1.0);
//!
//! let paper = GreedyWeightedSelector::new().select_seeded(&pool, &spec, 7).unwrap();
//! assert!(paper.reaches(100.0));
//! ```

pub mod config;
pub mod dispatching;
pub mod error;
pub mod ga;
pub mod history;
pub mod models;
pub mod selector;
pub mod similarity;
pub mod validation;

pub use error::{HistoryError, SelectionError};
