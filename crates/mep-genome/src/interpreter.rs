//! Context-propagating evaluator (§4.2): recursively walks a [`Genome`] from `best`, evaluating
//! a function gene's arguments lazily (only when the primitive's `eval` actually reads them),
//! so a conditional primitive can short-circuit its untaken branch.
use mep_ops::{Params, Primitive, SymbolSet, Value};

use crate::genome::Genome;
use crate::locus::Locus;

struct NoParams;

impl Params for NoParams {
    fn arg(&self, _index: usize) -> Value {
        Value::Void
    }
}

struct InputParams<'a> {
    input: &'a [Value],
}

impl Params for InputParams<'_> {
    fn arg(&self, index: usize) -> Value {
        self.input.get(index).cloned().unwrap_or(Value::Void)
    }
}

struct ArgsParams<'g, 's> {
    genome: &'g Genome,
    sset: &'s SymbolSet,
    input: &'g [Value],
    gene_args: &'g [usize],
    prim: &'s Primitive,
}

impl Params for ArgsParams<'_, '_> {
    fn arg(&self, index: usize) -> Value {
        let arg_row = self.gene_args[index];
        let arg_category = self
            .prim
            .arg_category(index)
            .expect("function arity must match declared argument categories");
        eval_locus(
            self.genome,
            self.sset,
            self.input,
            Locus::new(arg_row, arg_category),
        )
    }
}

fn eval_locus(genome: &Genome, sset: &SymbolSet, input: &[Value], locus: Locus) -> Value {
    let gene = genome.gene(locus);
    let Some(prim) = sset.decode_opcode(gene.opcode) else {
        return Value::Void;
    };

    match prim {
        Primitive::Fn { .. } => {
            let params = ArgsParams {
                genome,
                sset,
                input,
                gene_args: &gene.args,
                prim,
            };
            prim.eval(&params, gene.param)
        }
        Primitive::Var { .. } => {
            let params = InputParams { input };
            prim.eval(&params, gene.param)
        }
        Primitive::Const { .. } | Primitive::Ephemeral { .. } => prim.eval(&NoParams, gene.param),
    }
}

/// Runs `genome` against `input`, starting at its `best` locus. Returns [`Value::Void`] if the
/// genome's opcodes don't resolve against `sset` (a mismatched symbol set) rather than
/// panicking — the caller (the evaluator, §4.4) is responsible for turning that into an
/// illegal-value penalty.
pub fn run(genome: &Genome, sset: &SymbolSet, input: &[Value]) -> Value {
    eval_locus(genome, sset, input, genome.best())
}
