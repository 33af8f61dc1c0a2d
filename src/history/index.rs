//! Immutable snapshot of recent question usage.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashMap;

use super::{HistoryLookup, PaperRecord};
use crate::models::QuestionId;
use crate::similarity;

/// Questions used by papers inside the trailing window.
///
/// Built once, never mutated. The cache replaces the whole index on refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryIndex {
    last_used: HashMap<QuestionId, DateTime<Utc>>,
    papers: Vec<Vec<QuestionId>>,
    built_at: DateTime<Utc>,
    window: chrono::Duration,
}

impl HistoryIndex {
    /// Builds an index from paper records, keeping those updated within
    /// `window` before `now`.
    pub fn build(records: &[PaperRecord], now: DateTime<Utc>, window: chrono::Duration) -> Self {
        let since = now - window;
        let mut last_used: HashMap<QuestionId, DateTime<Utc>> = HashMap::new();
        let mut papers = Vec::new();

        for record in records.iter().filter(|r| r.updated_at >= since) {
            for &id in &record.question_ids {
                last_used
                    .entry(id)
                    .and_modify(|t| *t = (*t).max(record.updated_at))
                    .or_insert(record.updated_at);
            }
            papers.push(record.question_ids.clone());
        }

        Self {
            last_used,
            papers,
            built_at: now,
            window,
        }
    }

    /// An index with no usage.
    pub fn empty(now: DateTime<Utc>, window: chrono::Duration) -> Self {
        Self::build(&[], now, window)
    }

    /// Number of distinct recently used questions.
    pub fn len(&self) -> usize {
        self.last_used.len()
    }

    /// Whether no question was used recently.
    pub fn is_empty(&self) -> bool {
        self.last_used.is_empty()
    }

    /// When the index was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Question ID sets of the papers inside the window.
    pub fn papers(&self) -> &[Vec<QuestionId>] {
        &self.papers
    }

    /// Recently used question IDs, ascending.
    pub fn question_ids(&self) -> Vec<QuestionId> {
        let mut ids: Vec<QuestionId> = self.last_used.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Reuse penalty per recently used question, relative to `now`.
    pub fn recency_weights(&self, now: DateTime<Utc>) -> HashMap<QuestionId, f64> {
        self.last_used
            .iter()
            .map(|(&id, &used)| (id, similarity::recency_weight(used, now, self.window)))
            .filter(|(_, w)| *w > 0.0)
            .collect()
    }

    /// Randomly picks recently used questions to exclude at reuse threshold `t`.
    pub fn sample_exclusions<R: Rng>(&self, reuse_threshold: f64, rng: &mut R) -> Vec<QuestionId> {
        similarity::sample_history_exclusions(&self.question_ids(), reuse_threshold, rng)
    }

    /// Mean Jaccard similarity of a paper against the papers in this index.
    pub fn similarity_of(&self, paper: &[QuestionId]) -> f64 {
        similarity::history_similarity(paper, &self.papers)
    }
}

impl HistoryLookup for HistoryIndex {
    fn contains(&self, id: QuestionId) -> bool {
        self.last_used.contains_key(&id)
    }

    fn last_used(&self, id: QuestionId) -> Option<DateTime<Utc>> {
        self.last_used.get(&id).copied()
    }
}
