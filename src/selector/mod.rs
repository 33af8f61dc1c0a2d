//! Constructive selectors and paper quality metrics.
//!
//! # Algorithm
//!
//! `GreedyWeightedSelector` builds one exact-score paper with a
//! knowledge-weighted constructive heuristic. It is not optimal, but fast,
//! and its construction procedure also seeds the genetic optimizer.
//!
//! `DifficultyTargetedSelector` picks a fixed number of questions around a
//! target difficulty, steering away from recently used and mutually
//! similar questions.
//!
//! # KPI
//!
//! `PaperKpi` reports total, difficulty, knowledge shares and type counts
//! of a finished selection.

mod greedy;
mod kpi;
mod targeted;

pub use greedy::{split_budget, CandidateBuckets, GreedyWeightedSelector, PickStrategy, Picker};
pub use kpi::PaperKpi;
pub use targeted::{DifficultyTargetedSelector, TargetedRequest};

pub(crate) use greedy::Constructor;

use rand::Rng;

use crate::history::HistoryIndex;
use crate::models::ConstraintSpec;

/// Adds a random share of recently used questions to the exclusions.
///
/// With reuse threshold `t`, `floor((1 - t) * n)` of the `n` questions in
/// `index` are excluded. Manual includes are never excluded.
///
/// # Example
/// ```
/// use chrono::Utc;
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use u_exam::history::{HistoryIndex, PaperRecord};
/// use u_exam::models::ConstraintSpec;
/// use u_exam::selector::exclude_recent;
///
/// let now = Utc::now();
/// let records = vec![PaperRecord::new("p1", now, vec![1, 2, 3, 4])];
/// let index = HistoryIndex::build(&records, now, chrono::Duration::days(730));
///
/// let mut rng = SmallRng::seed_from_u64(1);
/// let spec = exclude_recent(ConstraintSpec::new(3.0), &index, 0.5, &mut rng);
/// assert_eq!(spec.exclude_ids.len(), 2);
/// ```
pub fn exclude_recent<R: Rng>(
    spec: ConstraintSpec,
    index: &HistoryIndex,
    reuse_threshold: f64,
    rng: &mut R,
) -> ConstraintSpec {
    let sampled: Vec<_> = index
        .sample_exclusions(reuse_threshold, rng)
        .into_iter()
        .filter(|id| !spec.is_included(*id))
        .collect();
    spec.with_excluded(sampled)
}

/// Draws an index with probability proportional to its weight.
///
/// Non-positive and non-finite weights never win. Returns `None` when no
/// weight is positive.
pub(crate) fn weighted_index<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let usable = |w: f64| w.is_finite() && w > 0.0;
    let total: f64 = weights.iter().copied().filter(|w| usable(*w)).sum();
    if total <= 0.0 {
        return None;
    }

    let mut r = rng.random::<f64>() * total;
    let mut last = None;
    for (i, &w) in weights.iter().enumerate() {
        if !usable(w) {
            continue;
        }
        if r < w {
            return Some(i);
        }
        r -= w;
        last = Some(i);
    }
    last
}
