//! Binary crossover (§4.5): the offspring starts as a clone of one randomly chosen parent and
//! is overwritten according to the *other* parent's inherited [`CrossoverStrategy`] tag. Because
//! the donor's tag propagates to the offspring, and selection keeps fitter offspring around, the
//! population's mixture of strategies drifts toward whatever works for the problem at hand
//! (§4.7's "self-adaptive crossover").
use mep_core::random_provider;
use mep_error::{MepResult, mep_err};
use mep_genome::{CrossoverStrategy, Genome, Locus};
use mep_ops::{Category, Primitive, SymbolSet};

pub fn crossover(lhs: &Genome, rhs: &Genome, sset: &SymbolSet) -> MepResult<Genome> {
    if lhs.size() != rhs.size() || lhs.categories() != rhs.categories() {
        return Err(mep_err!(
            InvalidParameter: "crossover requires parents of equal dimensions"
        ));
    }

    let (from, mut to) = if random_provider::bool(0.5) {
        (lhs, rhs.clone())
    } else {
        (rhs, lhs.clone())
    };

    match from.crossover_strategy() {
        CrossoverStrategy::OnePoint => one_point(from, &mut to),
        CrossoverStrategy::TwoPoint => two_point(from, &mut to),
        CrossoverStrategy::Uniform => uniform(from, &mut to),
        CrossoverStrategy::Tree => tree(from, &mut to, sset),
    }

    to.set_crossover_strategy(from.crossover_strategy());
    to.set_age(lhs.age().max(rhs.age()));
    Ok(to)
}

fn copy_range(from: &Genome, to: &mut Genome, rows: std::ops::Range<usize>) {
    for index in rows {
        for c in 0..from.categories() {
            let locus = Locus::new(index, Category(c));
            to.set_gene(locus, from.gene(locus).clone());
        }
    }
}

fn one_point(from: &Genome, to: &mut Genome) {
    let size = from.size();
    if size < 2 {
        return;
    }
    let cut = random_provider::range(1..size);
    copy_range(from, to, cut..size);
}

fn two_point(from: &Genome, to: &mut Genome) {
    let size = from.size();
    if size < 2 {
        return;
    }
    let cut1 = random_provider::range(0..size - 1);
    let cut2 = random_provider::range((cut1 + 1)..size);
    copy_range(from, to, cut1..cut2);
}

fn uniform(from: &Genome, to: &mut Genome) {
    for index in 0..from.size() {
        for c in 0..from.categories() {
            if random_provider::bool(0.5) {
                let locus = Locus::new(index, Category(c));
                to.set_gene(locus, from.gene(locus).clone());
            }
        }
    }
}

fn tree(from: &Genome, to: &mut Genome, sset: &SymbolSet) {
    let active: Vec<Locus> = from.active_loci(sset).into_iter().collect();
    if active.is_empty() {
        return;
    }
    let start = *random_provider::choose(&active);
    copy_subtree(from, to, start, sset);
}

fn copy_subtree(from: &Genome, to: &mut Genome, locus: Locus, sset: &SymbolSet) {
    let gene = from.gene(locus).clone();
    if let Some(prim @ Primitive::Fn { .. }) = sset.decode_opcode(gene.opcode) {
        for (i, &arg_row) in gene.args.iter().enumerate() {
            let arg_category = prim.arg_category(i).unwrap();
            copy_subtree(from, to, Locus::new(arg_row, arg_category), sset);
        }
    }
    to.set_gene(locus, gene);
}
