//! Point mutation (§4.5): every active (exon) gene is independently replaced with probability
//! `p_mutation`. Patch-section slots draw terminals only; body-section slots draw the usual free
//! roulette. Introns (loci unreachable from `best`) are never touched — mutation affects only
//! exons.
use mep_core::random_provider;
use mep_error::MepResult;
use mep_genome::{Genome, random_gene, random_terminal_gene};
use mep_ops::SymbolSet;

/// Mutates `genome` in place, returning the number of gene cells actually changed (a no-op
/// redraw that happens to pick the same gene back does not count).
pub fn mutate(genome: &mut Genome, sset: &SymbolSet, p_mutation: f32) -> MepResult<u32> {
    let patch_start = genome.patch_start();
    let active = genome.active_loci(sset);
    let mut changed = 0;

    for locus in active {
        if !random_provider::bool(p_mutation) {
            continue;
        }
        let candidate = if locus.index < patch_start {
            random_gene(sset, locus.category, locus.index, genome.size())?
        } else {
            random_terminal_gene(sset, locus.category)?
        };
        if candidate != *genome.gene(locus) {
            genome.set_gene(locus, candidate);
            changed += 1;
        }
    }

    Ok(changed)
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
    fn zero_probability_never_changes_anything() {
        let set = sample_sset();
        let mut genome = Genome::random(&set, 12, 4, Category(0)).unwrap();
        let before = genome.clone();
        let changed = mutate(&mut genome, &set, 0.0).unwrap();
        assert_eq!(changed, 0);
        assert_eq!(genome, before);
    }

    #[test]
    fn mutation_only_touches_active_loci() {
        let set = sample_sset();
        let mut genome = Genome::random(&set, 20, 6, Category(0)).unwrap();
        let active = genome.active_loci(&set);
        let inactive_before: Vec<_> = (0..genome.size())
            .flat_map(|i| (0..genome.categories()).map(move |c| mep_genome::Locus::new(i, Category(c))))
            .filter(|l| !active.contains(l))
            .map(|l| (l, genome.gene(l).clone()))
            .collect();

        let _ = mutate(&mut genome, &set, 1.0).unwrap();

        for (locus, gene) in inactive_before {
            assert_eq!(*genome.gene(locus), gene, "mutation touched an intron locus");
        }
    }

    #[test]
    fn full_probability_keeps_genome_valid() {
        use mep_core::Valid;
        let set = sample_sset();
        let mut genome = Genome::random(&set, 15, 5, Category(0)).unwrap();
        let _ = mutate(&mut genome, &set, 1.0).unwrap();
        assert!(genome.is_valid());
    }
}
