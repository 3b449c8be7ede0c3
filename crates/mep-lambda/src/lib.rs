//! Post-evolution executable models (§4.8): turns a trained [`mep_genome::Genome`] (or a team
//! of them) into a stable `predict`/`tag` interface, decoupled from the evolution loop. The
//! evaluator (`mep-eval`) scores genomes *during* a run; this crate wraps the *winning* genome
//! once the run is over, so a deployed model never needs to carry the evolution machinery with
//! it.
pub mod binary;
pub mod dyn_slot;
pub mod gaussian;
pub mod regression;
pub mod team;

pub use binary::BinaryLambda;
pub use dyn_slot::DynSlotLambda;
pub use gaussian::GaussianLambda;
pub use regression::{RegressionLambda, RegressionTeam};
pub use team::{ClassLambda, Team, TeamComposition, aggregate};
