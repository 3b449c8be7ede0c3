//! A Rust library for Multi Expression Programming.
//!
//! This crate re-exports the public API of the `mep-*` crates that make up the engine: error
//! handling, primitives and symbol sets, the genome representation, genetic operators, dataset
//! evaluation, the evolution engine, post-evolution models, and dataset I/O. Pull in `mep`
//! rather than the individual crates unless a binary only needs one slice of the stack.

pub use mep_alters::*;
pub use mep_core::*;
pub use mep_data::*;
pub use mep_error::*;
pub use mep_eval::*;
pub use mep_evolve::*;
pub use mep_genome::*;
pub use mep_lambda::*;
pub use mep_ops::*;
