//! Layered population management and the two evolution strategies (ALPS, standard) that drive
//! a run: generation stepping, parent selection, offspring placement, promotion, and
//! termination (§4.6/§4.7/§4.10).
pub mod config;
pub mod engine;
pub mod population;
pub mod strategy;
pub mod tune;

pub use config::{Config, ResolvedConfig};
pub use engine::{Engine, StopReason, Summary};
pub use population::{Coord, Individual, Layer, Population};
pub use strategy::{AlpsStrategy, EvolutionStrategy, StandardStrategy};
