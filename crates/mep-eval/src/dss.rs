//! Dynamic Subset Selection (§4.9): cheaper-than-full-dataset fitness by reweighting examples
//! toward the hard and the stale, then sampling a subset without replacement.
use mep_core::random_provider;

use crate::dataset::Dataset;

/// `min(0.6, 0.2 + 100/(N+100)) * N`, floored at `min(N, 10)` so a tiny dataset never loses
/// more than it can spare (§8 boundary behavior).
pub fn subset_size(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let nf = n as f32;
    let fraction = (0.2 + 100.0 / (nf + 100.0)).min(0.6);
    let size = (fraction * nf).round() as usize;
    size.max(n.min(10)).min(n)
}

/// Samples a subset of `dataset`'s indices weighted by `difficulty + stale^3`, resets the
/// difficulty/staleness of the chosen examples, and ages every example left out. Returns the
/// chosen indices in ascending order (evaluators iterate the subset in dataset order).
pub fn select_subset(dataset: &Dataset) -> Vec<usize> {
    let n = dataset.len();
    let size = subset_size(n);
    if size >= n {
        for example in dataset.examples() {
            example.reset_difficulty();
        }
        return (0..n).collect();
    }

    let mut weights: Vec<f32> = dataset
        .examples()
        .iter()
        .map(|e| e.difficulty() + (e.stale() as f32).powi(3) + 1.0)
        .collect();
    let mut pool: Vec<usize> = (0..n).collect();
    let mut chosen = Vec::with_capacity(size);

    for _ in 0..size {
        let total: f32 = pool.iter().map(|&i| weights[i]).sum();
        let mut draw = random_provider::range(0.0..total);
        let mut pick = pool.len() - 1;
        for (pos, &idx) in pool.iter().enumerate() {
            draw -= weights[idx];
            if draw <= 0.0 {
                pick = pos;
                break;
            }
        }
        chosen.push(pool.swap_remove(pick));
    }

    let chosen_set: std::collections::BTreeSet<usize> = chosen.iter().copied().collect();
    for (index, example) in dataset.examples().iter().enumerate() {
        if chosen_set.contains(&index) {
            example.reset_difficulty();
        } else {
            example.age();
        }
    }
    weights.clear();

    chosen_set.into_iter().collect()
}
