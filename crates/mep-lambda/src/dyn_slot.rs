//! Slotted Dynamic Class Boundary Determination (§4.8 "Dynamic Slot classifier"): the genome's
//! raw numeric output is squashed into `[0,1]` by an arctangent sigmoid, scaled to
//! `classes * x_slot` slots, and each slot's predicted class is whichever class landed there
//! most often during training.
use mep_error::{MepResult, mep_err};
use mep_eval::Dataset;
use mep_genome::{Genome, run};
use mep_ops::{SymbolSet, Value};

/// Sentinel meaning "no training example ever landed in this slot".
const UNKNOWN: usize = usize::MAX;

pub struct DynSlotLambda {
    genome: Genome,
    /// `slot_matrix[slot][class]` = count of training examples of `class` mapped to `slot`.
    slot_matrix: Vec<Vec<u32>>,
    /// `slot_class[slot]` = the predominant class for that slot, after neighbour back-fill.
    slot_class: Vec<usize>,
    dataset_size: usize,
}

impl DynSlotLambda {
    /// Builds the slot matrix from `dataset` (§4.8: given genome `g` and training set `D` with
    /// `C` classes, allocate `C * x_slot` slots).
    pub fn fit(genome: Genome, sset: &SymbolSet, dataset: &Dataset, x_slot: usize) -> MepResult<Self> {
        let classes = dataset
            .class_count()
            .ok_or_else(|| mep_err!(InvalidConfig: "dynamic-slot lambda requires a classification dataset"))?;
        if classes < 2 {
            return Err(mep_err!(InvalidConfig: "dynamic-slot lambda requires at least 2 classes, got {classes}"));
        }
        if x_slot == 0 {
            return Err(mep_err!(InvalidParameter: "x_slot must be positive"));
        }

        let n_slots = classes * x_slot;
        let mut slot_matrix = vec![vec![0u32; classes]; n_slots];
        let mut dataset_size = 0usize;

        for example in dataset.examples() {
            dataset_size += 1;
            let output = run(&genome, sset, &example.input);
            let slot = Self::slot_of(output, n_slots);
            slot_matrix[slot][example.class()] += 1;
        }

        let mut slot_class = vec![UNKNOWN; n_slots];
        for (slot, row) in slot_matrix.iter().enumerate() {
            let mut best = 0usize;
            for (class, &count) in row.iter().enumerate().skip(1) {
                if count >= row[best] {
                    best = class;
                }
            }
            if row[best] > 0 {
                slot_class[slot] = best;
            }
        }

        // Unknown (never-populated) slots inherit a neighbour's class (§4.8), falling back to
        // class 0 if neither neighbour is populated either.
        for slot in 0..n_slots {
            if slot_class[slot] == UNKNOWN {
                if slot > 0 && slot_class[slot - 1] != UNKNOWN {
                    slot_class[slot] = slot_class[slot - 1];
                } else if slot + 1 < n_slots && slot_class[slot + 1] != UNKNOWN {
                    slot_class[slot] = slot_class[slot + 1];
                } else {
                    slot_class[slot] = 0;
                }
            }
        }

        Ok(DynSlotLambda {
            genome,
            slot_matrix,
            slot_class,
            dataset_size,
        })
    }

    /// Arctangent sigmoid mapping a raw program output to `[0,1]` (§4.8).
    fn normalize_01(x: f64) -> f64 {
        0.5 + x.atan() / std::f64::consts::PI
    }

    fn slot_of(output: Value, n_slots: usize) -> usize {
        let last = n_slots - 1;
        match output.as_f64() {
            None => last,
            Some(x) => {
                let where_ = (Self::normalize_01(x) * n_slots as f64) as usize;
                where_.min(last)
            }
        }
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn dataset_size(&self) -> usize {
        self.dataset_size
    }

    /// Class + purity-of-slot confidence for `input` (§4.8 "the output is the slot's class
    /// plus a confidence equal to the purity of that slot").
    pub fn tag(&self, sset: &SymbolSet, input: &[Value]) -> (usize, f64) {
        let output = run(&self.genome, sset, input);
        let slot = Self::slot_of(output, self.slot_matrix.len());
        let class = self.slot_class[slot];
        let row = &self.slot_matrix[slot];
        let total: u32 = row.iter().sum();
        let confidence = if total == 0 { 0.0 } else { row[class] as f64 / total as f64 };
        (class, confidence)
    }

    pub fn training_accuracy(&self, sset: &SymbolSet, dataset: &Dataset) -> f64 {
        if dataset.is_empty() {
            return 0.0;
        }
        let correct = dataset
            .examples()
            .iter()
            .filter(|e| self.tag(sset, &e.input).0 == e.class())
            .count();
        correct as f64 / dataset.len() as f64
    }
}
