//! Error taxonomy for paper composition.
//!
//! | Error | Raised by | Meaning |
//! |-------|-----------|---------|
//! | `InvalidConstraint` | validation | Request is malformed (difficulty out of range, non-positive target, ...) |
//! | `EmptyResult` | selectors | Nothing left to choose from after exclusion filtering |
//! | `InfeasibleSelection` | greedy selector | Exact target not reachable within the attempt budget |
//!
//! The genetic optimizer never returns `InfeasibleSelection`; it always
//! yields its best-ever selection and callers check the total themselves.

use thiserror::Error;

use crate::validation::ValidationError;

/// Failure of a selection run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    /// The constraint set itself is invalid.
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    /// The candidate pool is empty after exclusion filtering.
    #[error("no candidate questions remain after exclusion filtering")]
    EmptyResult,

    /// No combination reached the exact target within the retry budget.
    #[error("constraints cannot be satisfied after {attempts} attempts; relax and retry")]
    InfeasibleSelection {
        /// Construction attempts spent before giving up.
        attempts: usize,
    },
}

impl SelectionError {
    /// Whether relaxing the request (and resubmitting) could help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InfeasibleSelection { .. })
    }
}

impl From<Vec<ValidationError>> for SelectionError {
    fn from(errors: Vec<ValidationError>) -> Self {
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Self::InvalidConstraint(joined)
    }
}

/// Failure while reading usage history from its backing store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The backing store could not be queried.
    #[error("history source unavailable: {0}")]
    Unavailable(String),

    /// The background refresher thread could not be started.
    #[error("failed to start history refresher: {0}")]
    Spawn(String),
}
