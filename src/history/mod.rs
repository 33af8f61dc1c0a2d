//! Usage history of past papers.
//!
//! Questions that appeared in recently issued papers should not be reused
//! wholesale. This module keeps a periodically rebuilt index of those
//! questions.
//!
//! # Components
//!
//! - [`HistorySource`]: where paper records come from (database, file,
//!   test double). Injected, never global.
//! - [`HistoryIndex`]: immutable snapshot built from one query.
//! - [`HistoryExclusionCache`]: holds the current snapshot, swaps in a new
//!   one on refresh, and answers lookups concurrently.
//! - [`HistoryLookup`]: read interface consumed by selectors.
//!
//! # Consistency
//!
//! Readers see either the previous or the next complete index. The write
//! lock covers only the pointer swap; the source query runs unlocked.

mod cache;
mod index;

pub use cache::{HistoryExclusionCache, RefreshHandle};
pub use index::HistoryIndex;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::models::QuestionId;

/// A previously issued paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Paper identifier.
    pub paper_uid: String,
    /// Last time the paper was generated or updated.
    pub updated_at: DateTime<Utc>,
    /// Questions the paper contains.
    pub question_ids: Vec<QuestionId>,
}

impl PaperRecord {
    /// Creates a paper record.
    pub fn new(
        paper_uid: impl Into<String>,
        updated_at: DateTime<Utc>,
        question_ids: Vec<QuestionId>,
    ) -> Self {
        Self {
            paper_uid: paper_uid.into(),
            updated_at,
            question_ids,
        }
    }
}

/// Backing store of issued papers.
pub trait HistorySource: Send + Sync {
    /// Returns papers updated at or after `since`.
    fn papers_since(&self, since: DateTime<Utc>) -> Result<Vec<PaperRecord>, HistoryError>;
}

/// Read access to recent question usage.
pub trait HistoryLookup {
    /// Whether the question was used inside the window.
    fn contains(&self, id: QuestionId) -> bool;

    /// Most recent use of the question inside the window.
    fn last_used(&self, id: QuestionId) -> Option<DateTime<Utc>>;
}

/// Process-local history store.
///
/// Suitable as a test double or for callers that persist papers themselves
/// and feed them back with [`record`](Self::record).
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: RwLock<Vec<PaperRecord>>,
}

impl InMemoryHistory {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with records.
    pub fn with_records(records: Vec<PaperRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Appends an issued paper.
    pub fn record(&self, paper: PaperRecord) {
        self.records.write().push(paper);
    }

    /// Number of stored papers.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no paper is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl HistorySource for InMemoryHistory {
    fn papers_since(&self, since: DateTime<Utc>) -> Result<Vec<PaperRecord>, HistoryError> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| r.updated_at >= since)
            .cloned()
            .collect())
    }
}
