//! Opcode-addressed (de)serialization of a genome (§6 persistence): a flat list of
//! `(opcode, parameter?, arg_indices...)` rows preceded by the genome's dimensions and best
//! locus. A load that fails (unknown opcode, truncated row) leaves the destination untouched —
//! callers get a fresh `Genome` or an error, never a half-applied mutation.
use mep_error::{MepResult, mep_err};
use mep_ops::{Opcode, SymbolSet};

use crate::gene::Gene;
use crate::genome::Genome;
use crate::locus::Locus;

/// One serialized gene cell, row-major in `(index, category)` order — the same order
/// `GenomeRecord::rows` is built and consumed in.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneRecord {
    pub opcode: u32,
    pub param: f64,
    pub args: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenomeRecord {
    pub rows: usize,
    pub categories: u16,
    pub patch_length: usize,
    pub best_index: usize,
    pub best_category: u16,
    pub genes: Vec<GeneRecord>,
}

pub fn encode(genome: &Genome) -> GenomeRecord {
    let mut genes = Vec::with_capacity(genome.size() * genome.categories() as usize);
    for index in 0..genome.size() {
        for c in 0..genome.categories() {
            let gene = genome.gene(Locus::new(index, mep_ops::Category(c)));
            genes.push(GeneRecord {
                opcode: gene.opcode.0,
                param: gene.param,
                args: gene.args.clone(),
            });
        }
    }
    GenomeRecord {
        rows: genome.size(),
        categories: genome.categories(),
        patch_length: genome.patch_length(),
        best_index: genome.best().index,
        best_category: genome.best().category.0,
        genes,
    }
}

pub fn decode(record: &GenomeRecord, sset: &SymbolSet) -> MepResult<Genome> {
    let expected = record.rows * record.categories as usize;
    if record.genes.len() != expected {
        return Err(mep_err!(
            Codec: "genome record has {} genes, expected {} ({} rows x {} categories)",
            record.genes.len(), expected, record.rows, record.categories
        ));
    }

    let mut genes = Vec::with_capacity(expected);
    for rec in &record.genes {
        let opcode = Opcode(rec.opcode);
        let prim = sset
            .decode_opcode(opcode)
            .ok_or_else(|| mep_err!(Codec: "opcode {} not present in symbol set", rec.opcode))?;

        if prim.is_terminal() {
            if !rec.args.is_empty() {
                return Err(mep_err!(Codec: "terminal opcode {} has stored arguments", rec.opcode));
            }
            genes.push(Gene::parametric_terminal(opcode, rec.param));
        } else {
            let arity = prim.arity().as_usize();
            if rec.args.len() != arity {
                return Err(mep_err!(
                    Codec: "opcode {} expects {} arguments, record has {}",
                    rec.opcode, arity, rec.args.len()
                ));
            }
            genes.push(Gene::function(opcode, rec.args.clone()));
        }
    }

    let best = Locus::new(record.best_index, mep_ops::Category(record.best_category));
    if best.index >= record.rows || best.category.0 >= record.categories {
        return Err(mep_err!(Codec: "best locus {:?} out of range", best));
    }

    Ok(Genome::from_genes(
        genes,
        record.rows,
        record.categories,
        record.patch_length,
        best,
    ))
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
        set.insert_default(Primitive::Ephemeral {
            name: "erc",
            category: Category(0),
            sample: || 1.5,
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
    fn round_trip_preserves_structure_and_output() {
        let set = sample_sset();
        let genome = Genome::random(&set, 12, 4, Category(0)).unwrap();

        let record = encode(&genome);
        let reloaded = decode(&record, &set).unwrap();

        assert_eq!(genome, reloaded);
        assert_eq!(genome.signature(&set), reloaded.signature(&set));

        let input = [Value::Double(2.0)];
        assert_eq!(
            crate::interpreter::run(&genome, &set, &input),
            crate::interpreter::run(&reloaded, &set, &input)
        );
    }

    #[test]
    fn ephemeral_constant_round_trips_bit_identical() {
        let set = sample_sset();
        let genome = Genome::random(&set, 6, 2, Category(0)).unwrap();
        let record = encode(&genome);
        let reloaded = decode(&record, &set).unwrap();

        for sample in 0..10 {
            let input = [Value::Double(sample as f64 - 5.0)];
            let a = crate::interpreter::run(&genome, &set, &input);
            let b = crate::interpreter::run(&reloaded, &set, &input);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn decode_rejects_unknown_opcode() {
        let set = sample_sset();
        let genome = Genome::random(&set, 6, 2, Category(0)).unwrap();
        let mut record = encode(&genome);
        record.genes[0].opcode = 9999;
        assert!(decode(&record, &set).is_err());
    }
}
