//! The linear, strongly-typed MEP genome (§3, §4.5): a `code_length x categories` matrix of
//! [`Gene`]s addressed by [`Locus`], with a distinguished entry point (`best`) and a patch
//! section holding only terminals.
use std::cell::Cell;
use std::collections::BTreeSet;

use mep_core::Valid;
use mep_error::{MepResult, mep_err};
use mep_ops::{Category, Primitive, SymbolSet};

use crate::fingerprint::{self, Signature};
use crate::gene::Gene;
use crate::locus::Locus;

/// Which elementary crossover operator an individual's offspring should use if it becomes a
/// donor parent (§4.5's self-adaptive crossover). Assigned randomly at genome creation and
/// thereafter inherited, never mutated directly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CrossoverStrategy {
    OnePoint,
    TwoPoint,
    Uniform,
    Tree,
}

impl CrossoverStrategy {
    pub const ALL: [CrossoverStrategy; 4] = [
        CrossoverStrategy::OnePoint,
        CrossoverStrategy::TwoPoint,
        CrossoverStrategy::Uniform,
        CrossoverStrategy::Tree,
    ];

    pub fn random() -> Self {
        *mep_core::random_provider::choose(&Self::ALL)
    }
}

/// A single evolvable program (a "multi expression programming" individual). Dimensions are
/// fixed at construction; mutation and crossover only ever replace individual [`Gene`]s, never
/// resize the matrix.
#[derive(Clone, Debug)]
pub struct Genome {
    rows: usize,
    categories: u16,
    genes: Vec<Gene>,
    best: Locus,
    patch_length: usize,
    age: u32,
    crossover_strategy: CrossoverStrategy,
    signature: Cell<Option<Signature>>,
}

impl Genome {
    fn cell_index(&self, locus: Locus) -> usize {
        locus.index * self.categories as usize + locus.category.0 as usize
    }

    /// Builds a genome from an already-populated gene matrix. Used by random initialization,
    /// by the codec (deserialization), and internally by crossover/mutation after they've
    /// assembled a full replacement matrix.
    pub fn from_genes(
        genes: Vec<Gene>,
        rows: usize,
        categories: u16,
        patch_length: usize,
        best: Locus,
    ) -> Self {
        debug_assert_eq!(genes.len(), rows * categories as usize);
        Genome {
            rows,
            categories,
            genes,
            best,
            patch_length,
            age: 0,
            crossover_strategy: CrossoverStrategy::random(),
            signature: Cell::new(None),
        }
    }

    /// Generates a random individual per §4.5: every body-section slot is filled by a free
    /// (function-or-terminal) roulette draw whose function arguments are wired to uniformly
    /// random later rows; every patch-section slot is a terminal.
    pub fn random(
        sset: &SymbolSet,
        code_length: usize,
        patch_length: usize,
        output_category: Category,
    ) -> MepResult<Self> {
        if patch_length == 0 || code_length <= patch_length {
            return Err(mep_err!(
                InvalidParameter: "code_length ({code_length}) must exceed patch_length ({patch_length})"
            ));
        }
        sset.validate()?;

        let categories = sset.categories();
        let patch_start = code_length - patch_length;
        let mut genes = Vec::with_capacity(code_length * categories as usize);

        for index in 0..code_length {
            for c in 0..categories {
                let category = Category(c);
                let gene = if index < patch_start {
                    random_gene(sset, category, index, code_length)?
                } else {
                    random_terminal_gene(sset, category)?
                };
                genes.push(gene);
            }
        }

        Ok(Genome::from_genes(
            genes,
            code_length,
            categories,
            patch_length,
            Locus::new(0, output_category),
        ))
    }

    pub fn size(&self) -> usize {
        self.rows
    }

    pub fn categories(&self) -> u16 {
        self.categories
    }

    pub fn patch_length(&self) -> usize {
        self.patch_length
    }

    pub fn patch_start(&self) -> usize {
        self.rows - self.patch_length
    }

    pub fn best(&self) -> Locus {
        self.best
    }

    pub fn category(&self) -> Category {
        self.best.category
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    pub fn crossover_strategy(&self) -> CrossoverStrategy {
        self.crossover_strategy
    }

    pub fn set_crossover_strategy(&mut self, strategy: CrossoverStrategy) {
        self.crossover_strategy = strategy;
    }

    pub fn gene(&self, locus: Locus) -> &Gene {
        &self.genes[self.cell_index(locus)]
    }

    pub fn set_gene(&mut self, locus: Locus, gene: Gene) {
        let idx = self.cell_index(locus);
        self.genes[idx] = gene;
        self.clear_signature();
    }

    pub fn set_best(&mut self, locus: Locus) {
        if self.best != locus {
            self.best = locus;
            self.clear_signature();
        }
    }

    pub fn clear_signature(&self) {
        self.signature.set(None);
    }

    /// Lazily computed, memoized structural hash of the active subtree (§4.3). Any mutation
    /// performed through [`Genome::set_gene`]/[`Genome::set_best`] clears the cache.
    pub fn signature(&self, sset: &SymbolSet) -> Signature {
        if let Some(sig) = self.signature.get() {
            return sig;
        }
        let sig = fingerprint::signature_of(self, sset);
        self.signature.set(Some(sig));
        sig
    }

    /// Every locus reachable from `best`, computed by walking function genes' argument
    /// references. Order is unspecified; callers needing determinism should iterate a `BTreeSet`
    /// (which this returns).
    pub fn active_loci(&self, sset: &SymbolSet) -> BTreeSet<Locus> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![self.best];
        while let Some(locus) = stack.pop() {
            if !seen.insert(locus) {
                continue;
            }
            let gene = self.gene(locus);
            if let Some(prim) = sset.decode_opcode(gene.opcode) {
                if let Primitive::Fn { .. } = prim {
                    for (i, &arg_index) in gene.args.iter().enumerate() {
                        if let Some(arg_category) = prim.arg_category(i) {
                            stack.push(Locus::new(arg_index, arg_category));
                        }
                    }
                }
            }
        }
        seen
    }

    pub fn active_symbols(&self, sset: &SymbolSet) -> usize {
        self.active_loci(sset).len()
    }

    /// Loci of every active function gene (§4.5 `blocks`) — candidates for ARL block
    /// extraction/destruction.
    pub fn blocks(&self, sset: &SymbolSet) -> BTreeSet<Locus> {
        self.active_loci(sset)
            .into_iter()
            .filter(|&locus| {
                sset.decode_opcode(self.gene(locus).opcode)
                    .map(|p| !p.is_terminal())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// A clone whose entry point is relocated to `locus` (§4.5 `get_block`).
    pub fn get_block(&self, locus: Locus) -> Genome {
        let mut ret = self.clone();
        ret.set_best(locus);
        ret
    }

    /// A clone in which every category's gene at `index` has been replaced by a random
    /// terminal (§4.5 `destroy_block`). Used by ARL to excise a block that proved useless.
    pub fn destroy_block(&self, index: usize, sset: &SymbolSet) -> MepResult<Genome> {
        if index >= self.rows {
            return Err(mep_err!(
                InvalidParameter: "destroy_block index {index} out of range (size {})", self.rows
            ));
        }
        let mut ret = self.clone();
        for c in 0..self.categories {
            let category = Category(c);
            let gene = random_terminal_gene(sset, category)?;
            ret.set_gene(Locus::new(index, category), gene);
        }
        Ok(ret)
    }

    /// A clone with the gene at `locus` replaced by `gene` (§4.5 `replace`).
    pub fn replace(&self, locus: Locus, gene: Gene) -> Genome {
        let mut ret = self.clone();
        ret.set_gene(locus, gene);
        ret
    }

    /// Common-subexpression elimination (§4.5): scanning from the last row upward, redirects
    /// references to structurally duplicate genes toward the first (highest-index) occurrence
    /// seen. The result shares the original's signature and interpreter output, but may have
    /// fewer active symbols.
    pub fn cse(&self, sset: &SymbolSet) -> Genome {
        use std::collections::HashMap;

        let mut ret = self.clone();
        // Canonical key for a gene: its opcode plus, for a parametric terminal, its raw
        // parameter bits, or for a function, its (already-redirected) argument rows.
        let mut canonical: HashMap<(u32, Option<u64>, Vec<usize>), Locus> = HashMap::new();

        for index in (0..self.rows).rev() {
            for c in 0..self.categories {
                let locus = Locus::new(index, Category(c));
                let gene = ret.gene(locus).clone();
                let Some(prim) = sset.decode_opcode(gene.opcode) else {
                    continue;
                };

                let mut args = gene.args.clone();
                if let Primitive::Fn { .. } = prim {
                    for (i, arg_index) in args.iter_mut().enumerate() {
                        let arg_category = prim.arg_category(i).unwrap();
                        let arg_locus = Locus::new(*arg_index, arg_category);
                        let arg_gene = ret.gene(arg_locus);
                        if let Some(arg_prim) = sset.decode_opcode(arg_gene.opcode) {
                            let key = canonical_key(arg_gene, arg_prim);
                            if let Some(&mapped) = canonical.get(&key) {
                                *arg_index = mapped.index;
                            }
                        }
                    }
                }

                if args != gene.args {
                    ret.set_gene(
                        locus,
                        Gene {
                            opcode: gene.opcode,
                            param: gene.param,
                            args,
                        },
                    );
                }

                let key = canonical_key(ret.gene(locus), prim);
                canonical.entry(key).or_insert(locus);
            }
        }

        ret
    }

    /// Number of gene cells differing between `self` and `other` (requires equal dimensions).
    pub fn distance(&self, other: &Genome) -> MepResult<u32> {
        if self.rows != other.rows || self.categories != other.categories {
            return Err(mep_err!(
                InvalidParameter: "distance requires genomes of equal dimensions"
            ));
        }
        Ok(self
            .genes
            .iter()
            .zip(other.genes.iter())
            .filter(|(a, b)| a != b)
            .count() as u32)
    }
}

fn canonical_key(gene: &Gene, prim: &Primitive) -> (u32, Option<u64>, Vec<usize>) {
    if prim.is_terminal() {
        let param = prim.is_parametric().then(|| gene.param.to_bits());
        (gene.opcode.0, param, Vec::new())
    } else {
        (gene.opcode.0, None, gene.args.clone())
    }
}

/// Draws a body-section gene per §4.5: free roulette for the primitive, then (if it turned out
/// to be a function) uniformly random argument rows in `(index, code_length)`.
pub fn random_gene(
    sset: &SymbolSet,
    category: Category,
    index: usize,
    code_length: usize,
) -> MepResult<Gene> {
    let prim = sset.roulette_free(category).ok_or_else(|| {
        mep_err!(InvalidConfig: "no primitive registered for category {}", category.0)
    })?;
    build_gene(sset, prim, index, code_length)
}

/// Draws a patch-section gene: a terminal only, per §4.5's patch-section rule.
pub fn random_terminal_gene(sset: &SymbolSet, category: Category) -> MepResult<Gene> {
    let prim = sset.roulette_terminal(category).ok_or_else(|| {
        mep_err!(InvalidConfig: "no terminal registered for category {}", category.0)
    })?;
    // A terminal has no arguments, so `index`/`code_length` are irrelevant here.
    build_gene(sset, prim, 0, 1)
}

fn build_gene(sset: &SymbolSet, prim: &Primitive, index: usize, code_length: usize) -> MepResult<Gene> {
    let opcode = sset
        .opcode_of(prim.name())
        .ok_or_else(|| mep_err!(Engine: "primitive {} missing from symbol set", prim.name()))?;

    if prim.is_terminal() {
        let param = prim.draw_param();
        return Ok(Gene::parametric_terminal(opcode, param));
    }

    let arity = prim.arity().as_usize();
    let mut args = Vec::with_capacity(arity);
    for _ in 0..arity {
        args.push(mep_core::random_provider::range(
            (index + 1)..code_length.max(index + 2),
        ));
    }
    Ok(Gene::function(opcode, args))
}

impl Valid for Genome {
    fn is_valid(&self) -> bool {
        self.rows > 0
            && self.categories > 0
            && self.patch_length > 0
            && self.patch_length < self.rows
            && self.best.index < self.rows
            && (self.best.category.0 as u16) < self.categories
    }
}

impl PartialEq for Genome {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.categories == other.categories && self.genes == other.genes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mep_ops::{Arity, Primitive, Value};

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
    fn random_genome_is_valid_and_has_correct_dimensions() {
        let set = sample_sset();
        let genome = Genome::random(&set, 10, 4, Category(0)).unwrap();
        assert!(genome.is_valid());
        assert_eq!(genome.size(), 10);
        assert_eq!(genome.categories(), 1);
    }

    #[test]
    fn patch_section_is_terminal_only() {
        let set = sample_sset();
        let genome = Genome::random(&set, 10, 4, Category(0)).unwrap();
        for index in genome.patch_start()..genome.size() {
            let gene = genome.gene(Locus::new(index, Category(0)));
            let prim = set.decode_opcode(gene.opcode).unwrap();
            assert!(prim.is_terminal());
        }
    }

    #[test]
    fn function_args_reference_strictly_later_rows() {
        let set = sample_sset();
        let genome = Genome::random(&set, 20, 5, Category(0)).unwrap();
        for index in 0..genome.patch_start() {
            let gene = genome.gene(Locus::new(index, Category(0)));
            let prim = set.decode_opcode(gene.opcode).unwrap();
            if !prim.is_terminal() {
                for &arg in &gene.args {
                    assert!(arg > index);
                }
            }
        }
    }

    #[test]
    fn signature_is_stable_across_intron_changes() {
        let set = sample_sset();
        let mut genome = Genome::random(&set, 10, 4, Category(0)).unwrap();
        let before = genome.signature(&set);

        // Mutate a row that is not in the active subtree (if one exists).
        let active = genome.active_loci(&set);
        if let Some(inactive_index) = (0..genome.patch_start()).find(|i| !active.contains(&Locus::new(*i, Category(0))))
        {
            let gene = random_terminal_gene(&set, Category(0)).unwrap();
            genome.set_gene(Locus::new(inactive_index, Category(0)), gene);
            let after = genome.signature(&set);
            assert_eq!(before, after);
        }
    }

    #[test]
    fn set_gene_clears_cached_signature() {
        let set = sample_sset();
        let mut genome = Genome::random(&set, 6, 2, Category(0)).unwrap();
        let _ = genome.signature(&set);
        let best = genome.best();
        let gene = random_terminal_gene(&set, best.category).unwrap();
        genome.set_gene(best, gene);
        // Internal cache cleared; recomputation still succeeds and is self-consistent.
        let sig1 = genome.signature(&set);
        let sig2 = genome.signature(&set);
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn cse_preserves_signature() {
        let set = sample_sset();
        let genome = Genome::random(&set, 12, 4, Category(0)).unwrap();
        let before = genome.signature(&set);
        let reduced = genome.cse(&set);
        let after = reduced.signature(&set);
        assert_eq!(before, after);
        assert!(reduced.active_symbols(&set) <= genome.active_symbols(&set));
    }

    #[test]
    fn cse_is_idempotent() {
        let set = sample_sset();
        let genome = Genome::random(&set, 12, 4, Category(0)).unwrap();
        let once = genome.cse(&set);
        let twice = once.cse(&set);
        assert_eq!(once.signature(&set), twice.signature(&set));
        assert_eq!(once.active_symbols(&set), twice.active_symbols(&set));
    }

    #[test]
    fn get_block_relocates_entry_point() {
        let set = sample_sset();
        let genome = Genome::random(&set, 10, 3, Category(0)).unwrap();
        let blocks = genome.blocks(&set);
        if let Some(&locus) = blocks.iter().next() {
            let block = genome.get_block(locus);
            assert_eq!(block.best(), locus);
        }
    }

    #[test]
    fn distance_requires_matching_dimensions() {
        let set = sample_sset();
        let a = Genome::random(&set, 10, 3, Category(0)).unwrap();
        let b = Genome::random(&set, 11, 3, Category(0)).unwrap();
        assert!(a.distance(&b).is_err());
        assert!(a.distance(&a).unwrap() == 0);
    }
}
