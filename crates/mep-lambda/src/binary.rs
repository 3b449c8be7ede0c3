//! Binary classification lambda (§4.8): for exactly 2 classes, the sign of the program's raw
//! output is the class decision and its magnitude is the confidence — no training-time fitting
//! needed, unlike the slot/Gaussian classifiers.
use mep_genome::{Genome, run};
use mep_ops::{SymbolSet, Value};

#[derive(Clone)]
pub struct BinaryLambda {
    genome: Genome,
}

impl BinaryLambda {
    pub fn new(genome: Genome) -> Self {
        BinaryLambda { genome }
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Class 1 if the output is positive, else class 0; confidence is `|output|` (§4.8).
    pub fn tag(&self, sset: &SymbolSet, input: &[Value]) -> (usize, f64) {
        let output = run(&self.genome, sset, input);
        let x = output.as_f64().unwrap_or(0.0);
        let class = if x > 0.0 { 1 } else { 0 };
        (class, x.abs())
    }
}
