//! Genetic operators.
//!
//! - [`tournament_select`]: generic parent selection
//! - [`two_point_crossover`]: positional segment exchange between papers
//! - [`replace_mutation`]: swaps one question for an equivalent one
//!
//! Operators never validate totals themselves; the problem decides whether
//! a child is kept.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;

use super::Individual;
use crate::models::{scores_equal, QuestionId, QuestionItem, QuestionType, Selection};

/// Candidates grouped by (type, label-1), used as mutation alternatives.
pub type AlternativePool = HashMap<(QuestionType, String), Vec<Arc<QuestionItem>>>;

/// Tournament selection with replacement.
///
/// Draws `size` contestants uniformly and returns the fittest.
///
/// # Panics
/// Panics if `population` is empty.
pub fn tournament_select<'a, I: Individual, R: Rng>(
    population: &'a [I],
    size: usize,
    rng: &mut R,
) -> &'a I {
    let mut best = &population[rng.random_range(0..population.len())];
    for _ in 1..size.max(1) {
        let contestant = &population[rng.random_range(0..population.len())];
        if contestant.fitness() > best.fitness() {
            best = contestant;
        }
    }
    best
}

/// Two-point crossover over the shorter parent's length.
///
/// Picks a segment `[lo, hi)` and swaps it between the parents. Returns
/// `None` when the shorter parent has fewer than two questions.
pub fn two_point_crossover<R: Rng>(
    parent1: &Selection,
    parent2: &Selection,
    rng: &mut R,
) -> Option<(Selection, Selection)> {
    let a = &parent1.items;
    let b = &parent2.items;
    let len = a.len().min(b.len());
    if len < 2 {
        return None;
    }

    let lo = rng.random_range(0..len);
    let hi = rng.random_range(lo + 1..=len);

    let splice = |head: &[Arc<QuestionItem>], mid: &[Arc<QuestionItem>], tail: &[Arc<QuestionItem>]| {
        let mut items = Vec::with_capacity(head.len() + mid.len() + tail.len());
        items.extend_from_slice(head);
        items.extend_from_slice(mid);
        items.extend_from_slice(tail);
        Selection::from_items(items)
    };

    let child1 = splice(&a[..lo], &b[lo..hi], &a[hi..]);
    let child2 = splice(&b[..lo], &a[lo..hi], &b[hi..]);
    Some((child1, child2))
}

/// Replaces one unlocked question with an unused question of the same
/// type, label-1 and score.
///
/// The total score is unchanged by construction. Returns whether a
/// replacement happened.
pub fn replace_mutation<R: Rng>(
    selection: &mut Selection,
    alternatives: &AlternativePool,
    is_locked: impl Fn(QuestionId) -> bool,
    rng: &mut R,
) -> bool {
    let movable: Vec<usize> = selection
        .items
        .iter()
        .enumerate()
        .filter(|(_, q)| !is_locked(q.id))
        .map(|(i, _)| i)
        .collect();
    if movable.is_empty() {
        return false;
    }

    let pos = movable[rng.random_range(0..movable.len())];
    let current = Arc::clone(&selection.items[pos]);
    let key = (current.question_type, current.knowledge().to_string());
    let Some(bucket) = alternatives.get(&key) else {
        return false;
    };

    let options: Vec<&Arc<QuestionItem>> = bucket
        .iter()
        .filter(|q| {
            q.id != current.id && scores_equal(q.score, current.score) && !selection.contains(q.id)
        })
        .collect();
    if options.is_empty() {
        return false;
    }

    selection.items[pos] = Arc::clone(options[rng.random_range(0..options.len())]);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::PaperChromosome;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn item(id: u64, score: f64) -> Arc<QuestionItem> {
        Arc::new(QuestionItem::new(id, QuestionType::MultipleChoice, score).with_knowledge("A"))
    }

    fn selection(ids: &[u64]) -> Selection {
        Selection::from_items(ids.iter().map(|&id| item(id, 5.0)).collect())
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let population: Vec<PaperChromosome> = (0..10)
            .map(|i| PaperChromosome {
                selection: Selection::new(),
                fitness: i as f64,
            })
            .collect();
        let mut rng = SmallRng::seed_from_u64(42);

        let total: f64 = (0..200)
            .map(|_| tournament_select(&population, 5, &mut rng).fitness)
            .sum();
        // mean of the max of 5 uniform draws over 0..10 is well above 4.5
        assert!(total / 200.0 > 6.0);

        let single = tournament_select(&population[..1], 5, &mut rng);
        assert_eq!(single.fitness, 0.0);
    }

    #[test]
    fn test_two_point_crossover_segments() {
        let p1 = selection(&[1, 2, 3, 4]);
        let p2 = selection(&[5, 6, 7, 8, 9]);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..50 {
            let (c1, c2) = two_point_crossover(&p1, &p2, &mut rng).unwrap();
            assert_eq!(c1.len(), 4);
            assert_eq!(c2.len(), 5);
            // every position comes from one of the two parents
            for (i, q) in c1.iter().enumerate() {
                assert!(q.id == p1.items[i].id || q.id == p2.items[i].id);
            }
        }
    }

    #[test]
    fn test_crossover_needs_two_genes() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert!(two_point_crossover(&selection(&[1]), &selection(&[2, 3]), &mut rng).is_none());
        assert!(two_point_crossover(&Selection::new(), &selection(&[2, 3]), &mut rng).is_none());
    }

    #[test]
    fn test_replace_mutation_keeps_total() {
        let mut paper = selection(&[1, 2, 3]);
        let mut alternatives = AlternativePool::new();
        alternatives.insert(
            (QuestionType::MultipleChoice, "A".into()),
            vec![item(1, 5.0), item(2, 5.0), item(3, 5.0), item(4, 5.0), item(5, 8.0)],
        );
        let mut rng = SmallRng::seed_from_u64(3);

        let before = paper.total_score();
        let mut replaced = 0;
        for _ in 0..20 {
            if replace_mutation(&mut paper, &alternatives, |id| id == 1, &mut rng) {
                replaced += 1;
            }
            assert_eq!(paper.total_score(), before);
            assert!(paper.contains(1));
            assert!(!paper.contains(5));
            assert!(paper.has_unique_ids());
        }
        assert!(replaced > 0);
    }

    #[test]
    fn test_replace_mutation_all_locked() {
        let mut paper = selection(&[1, 2]);
        let alternatives = AlternativePool::new();
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(!replace_mutation(&mut paper, &alternatives, |_| true, &mut rng));
    }
}
