pub mod dataset;
pub mod dss;
pub mod evaluator;

pub use dataset::{Dataset, Example};
pub use evaluator::{Evaluator, EvaluatorKind};
