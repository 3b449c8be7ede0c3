pub mod arl;
pub mod crossover;
pub mod mutation;

pub use arl::{ArlCandidate, useful_blocks};
pub use crossover::crossover;
pub use mutation::mutate;
