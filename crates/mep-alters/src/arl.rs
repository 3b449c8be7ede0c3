//! Adaptive Representation through Learning (§4.5 ARL candidate selection): identifies active
//! function blocks whose removal costs the individual more than a threshold fraction of its
//! fitness, i.e. blocks worth promoting into reusable terminals for subsequent runs. This module
//! only scores candidates; turning a candidate into a new [`mep_ops::Primitive`] and inserting it
//! into a [`SymbolSet`] is a search-level concern (the block itself, plus the dataset it closes
//! over, is all a caller needs to build one).
//!
//! Fitness here is assumed maximize-oriented (higher is better), the convention used by every
//! evaluator in this crate family: a destroyed block that *drops* fitness below baseline yields a
//! positive `relative_loss`.
use mep_error::MepResult;
use mep_genome::{Genome, Locus};
use mep_ops::SymbolSet;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArlCandidate {
    pub locus: Locus,
    pub relative_loss: f32,
}

/// Scores every block in `genome` by how much fitness is lost when it is destroyed, returning
/// only those exceeding `threshold` (e.g. `0.10` for a "more than 10%" rule), sorted worst-loss
/// first. `fitness_of` is expected to run the same evaluator that produced `baseline`.
pub fn useful_blocks(
    genome: &Genome,
    sset: &SymbolSet,
    baseline: f32,
    threshold: f32,
    mut fitness_of: impl FnMut(&Genome) -> MepResult<f32>,
) -> MepResult<Vec<ArlCandidate>> {
    let denom = baseline.abs().max(f32::EPSILON);
    let mut out = Vec::new();

    for locus in genome.blocks(sset) {
        let destroyed = genome.destroy_block(locus.index, sset)?;
        let destroyed_fitness = fitness_of(&destroyed)?;
        let relative_loss = (baseline - destroyed_fitness) / denom;
        if relative_loss > threshold {
            out.push(ArlCandidate { locus, relative_loss });
        }
    }

    out.sort_by(|a, b| b.relative_loss.partial_cmp(&a.relative_loss).unwrap());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mep_ops::{Arity, Category, Primitive, Value};

    fn sample_sset() -> SymbolSet {
        let mut set = SymbolSet::new(1);
        set.insert_default(Primitive::Var {
            name: "X0",
            category: Category(0),
            index: 0,
        })
        .unwrap();
        set.insert_default(Primitive::Const {
            name: "one",
            category: Category(0),
            value: Value::Double(1.0),
        })
        .unwrap();
        set.insert_default(Primitive::Fn {
            name: "add",
            category: Category(0),
            arity: Arity::Exact(2),
            arg_categories: vec![Category(0), Category(0)],
            func: |p| {
                let a = p.arg(0).as_f64().unwrap_or(0.0);
                let b = p.arg(1).as_f64().unwrap_or(0.0);
                Value::Double(a + b)
            },
        })
        .unwrap();
        set
    }

    #[test]
    fn threshold_filters_low_impact_blocks() {
        let set = sample_sset();
        let genome = Genome::random(&set, 12, 4, Category(0)).unwrap();
        // A constant fitness function never drops, so nothing should clear any positive threshold.
        let candidates = useful_blocks(&genome, &set, 1.0, 0.10, |_| Ok(1.0)).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn candidates_are_sorted_worst_first() {
        let set = sample_sset();
        let genome = Genome::random(&set, 12, 4, Category(0)).unwrap();
        if genome.blocks(&set).len() < 2 {
            return;
        }
        let mut n = 0u32;
        let candidates = useful_blocks(&genome, &set, 1.0, -10.0, |_| {
            n += 1;
            Ok(1.0 - n as f32 % 3 as f32)
        })
        .unwrap();
        for pair in candidates.windows(2) {
            assert!(pair[0].relative_loss >= pair[1].relative_loss);
        }
    }
}
