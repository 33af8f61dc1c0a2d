//! Similarity scoring between questions and between papers.
//!
//! Only structural proxies are used: shared labels, difficulty closeness,
//! and question type. There is no semantic comparison of question text.
//!
//! # Question similarity
//!
//! | Dimension | Contribution |
//! |-----------|--------------|
//! | chapter-1 match | 0.15 |
//! | chapter-2 match | 0.15 |
//! | label-1 match | 0.15 |
//! | label-2 match | 0.15 |
//! | difficulty closeness | `max(0, 1 - |Δ|/5) × 0.2` |
//! | type match | 0.2 |
//!
//! # Paper similarity
//!
//! Jaccard index over question ID sets, plus an overlap coefficient
//! (shared / smaller paper) for "how much of this paper was reused".

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::models::{QuestionId, QuestionItem};

const LABEL_MATCH: f64 = 0.15;
const DIFFICULTY_WEIGHT: f64 = 0.2;
const TYPE_MATCH: f64 = 0.2;

/// Structural similarity of two questions in [0, 1].
///
/// Reaches 1.0 only when every label, the difficulty and the type match.
pub fn question_similarity(a: &QuestionItem, b: &QuestionItem) -> f64 {
    let la = &a.labels;
    let lb = &b.labels;
    let matched = [
        la.chapter1 == lb.chapter1,
        la.chapter2 == lb.chapter2,
        la.label1 == lb.label1,
        la.label2 == lb.label2,
    ]
    .iter()
    .filter(|&&m| m)
    .count();

    let delta = (f64::from(a.difficulty) - f64::from(b.difficulty)).abs();
    let closeness = (1.0 - delta / 5.0).max(0.0);
    let type_sim = if a.question_type == b.question_type {
        TYPE_MATCH
    } else {
        0.0
    };

    matched as f64 * LABEL_MATCH + closeness * DIFFICULTY_WEIGHT + type_sim
}

/// Highest similarity between `item` and any already-selected question.
///
/// Returns 0.0 when nothing is selected yet.
pub fn peak_similarity<'a, I>(item: &QuestionItem, selected: I) -> f64
where
    I: IntoIterator<Item = &'a QuestionItem>,
{
    selected
        .into_iter()
        .map(|s| question_similarity(item, s))
        .fold(0.0, f64::max)
}

/// Jaccard index of two papers' question ID sets.
///
/// 1.0 for identical non-empty sets, 0.0 for disjoint sets or when both
/// papers are empty.
pub fn jaccard_similarity(a: &[QuestionId], b: &[QuestionId]) -> f64 {
    let set_a: HashSet<QuestionId> = a.iter().copied().collect();
    let set_b: HashSet<QuestionId> = b.iter().copied().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Share of the smaller paper that also appears in the other one.
///
/// 0.0 when either paper is empty.
pub fn overlap_coefficient(a: &[QuestionId], b: &[QuestionId]) -> f64 {
    let set_a: HashSet<QuestionId> = a.iter().copied().collect();
    let set_b: HashSet<QuestionId> = b.iter().copied().collect();
    let smaller = set_a.len().min(set_b.len());
    if smaller == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / smaller as f64
}

/// Mean Jaccard similarity of `current` against past papers.
///
/// The divisor is `history.len() + 1`, which pulls the score toward 0
/// when little history exists. An empty history scores 0.0.
pub fn history_similarity(current: &[QuestionId], history: &[Vec<QuestionId>]) -> f64 {
    let total: f64 = history
        .iter()
        .map(|past| jaccard_similarity(current, past))
        .sum();
    total / (history.len() + 1) as f64
}

/// Randomly picks recently used questions to keep out of this run.
///
/// With reuse threshold `t`, `floor((1 - t) × n)` of the `n` recent IDs are
/// excluded. This is a coarse stand-in for "avoid reuse above similarity
/// `t`", not exact deduplication.
pub fn sample_history_exclusions<R: Rng>(
    recent: &[QuestionId],
    reuse_threshold: f64,
    rng: &mut R,
) -> Vec<QuestionId> {
    let ratio = 1.0 - reuse_threshold.clamp(0.0, 1.0);
    let count = (recent.len() as f64 * ratio).floor() as usize;
    if count == 0 {
        return Vec::new();
    }
    let mut ids = recent.to_vec();
    ids.shuffle(rng);
    ids.truncate(count);
    ids
}

/// Reuse penalty weight of a question last used at `last_used`.
///
/// Decays linearly from 1.0 (used just now) to 0.0 at the end of the
/// window. Uses outside the window (or in the future) weigh 0.0 and 1.0
/// respectively.
pub fn recency_weight(last_used: DateTime<Utc>, now: DateTime<Utc>, window: chrono::Duration) -> f64 {
    let window_secs = window.num_seconds();
    if window_secs <= 0 {
        return 0.0;
    }
    let elapsed = (now - last_used).num_seconds().max(0);
    if elapsed >= window_secs {
        return 0.0;
    }
    1.0 - elapsed as f64 / window_secs as f64
}
