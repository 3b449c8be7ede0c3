pub mod cache;
pub mod codec;
pub mod fingerprint;
pub mod gene;
pub mod genome;
pub mod interpreter;
pub mod locus;

pub use cache::EvalCache;
pub use codec::{GeneRecord, GenomeRecord};
pub use fingerprint::Signature;
pub use gene::Gene;
pub use genome::{CrossoverStrategy, Genome, random_gene, random_terminal_gene};
pub use interpreter::run;
pub use locus::Locus;
