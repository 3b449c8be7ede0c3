//! Training data (§3 Dataset, §4.9 DSS bookkeeping): an ordered sequence of examples, each an
//! input vector of domain-tagged [`Value`]s plus a target output. Per-example `difficulty` and
//! `stale` counters live on the example itself (interior-mutable, atomics rather than `Cell` so
//! an evaluator can bump them mid-pass through a shared `&Dataset` from more than one thread at
//! once) without needing `&mut Dataset`.
use std::sync::atomic::{AtomicU32, Ordering};

use mep_ops::Value;

/// One training case. `difficulty` counts mispredictions since it was last reset by DSS;
/// `stale` counts generations since it was last selected into a DSS subset.
#[derive(Debug)]
pub struct Example {
    pub input: Vec<Value>,
    pub output: Value,
    difficulty: AtomicU32,
    stale: AtomicU32,
}

impl Clone for Example {
    fn clone(&self) -> Self {
        Example {
            input: self.input.clone(),
            output: self.output.clone(),
            difficulty: AtomicU32::new(self.difficulty.load(Ordering::Relaxed)),
            stale: AtomicU32::new(self.stale.load(Ordering::Relaxed)),
        }
    }
}

impl Example {
    pub fn new(input: Vec<Value>, output: Value) -> Self {
        Example {
            input,
            output,
            difficulty: AtomicU32::new(0.0f32.to_bits()),
            stale: AtomicU32::new(0),
        }
    }

    pub fn difficulty(&self) -> f32 {
        f32::from_bits(self.difficulty.load(Ordering::Relaxed))
    }

    pub fn stale(&self) -> u32 {
        self.stale.load(Ordering::Relaxed)
    }

    /// Called by an evaluator on every misprediction (§4.4/§4.9).
    pub fn record_miss(&self) {
        let mut current = self.difficulty.load(Ordering::Relaxed);
        loop {
            let updated = (f32::from_bits(current) + 1.0).to_bits();
            match self
                .difficulty
                .compare_exchange_weak(current, updated, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    pub(crate) fn reset_difficulty(&self) {
        self.difficulty.store(0.0f32.to_bits(), Ordering::Relaxed);
        self.stale.store(0, Ordering::Relaxed);
    }

    pub(crate) fn age(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    /// Decodes a classification target (always stored as `Value::Int`) to a 0-based class
    /// index. Panics on a malformed dataset — a classification [`Dataset`] guarantees every
    /// `output` is `Int` at construction.
    pub fn class(&self) -> usize {
        match self.output {
            Value::Int(c) => c as usize,
            _ => panic!("classification example output is not an encoded class tag"),
        }
    }
}

/// The full training set for one run, plus optional class metadata for classification tasks.
pub struct Dataset {
    examples: Vec<Example>,
    feature_count: usize,
    class_count: Option<usize>,
}

impl Dataset {
    pub fn regression(examples: Vec<Example>) -> Self {
        let feature_count = examples.first().map_or(0, |e| e.input.len());
        Dataset {
            examples,
            feature_count,
            class_count: None,
        }
    }

    pub fn classification(examples: Vec<Example>, class_count: usize) -> Self {
        let feature_count = examples.first().map_or(0, |e| e.input.len());
        Dataset {
            examples,
            feature_count,
            class_count: Some(class_count),
        }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn class_count(&self) -> Option<usize> {
        self.class_count
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn example(&self, index: usize) -> &Example {
        &self.examples[index]
    }
}
