//! Command-line surface (§6 "CLI"): a positional dataset path plus a flat list of optional
//! tuning flags, each mapping directly onto a [`mep_evolve::Config`] field or a piece of
//! ingestion/reporting setup. Modeled on the derive-`Parser` style used for `exiv`'s CLI.
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "mep", about = "Multi Expression Programming engine for symbolic regression and classification", version)]
pub struct Cli {
    /// Path to the training dataset (CSV or XRFF, guessed from the extension).
    pub dataset: PathBuf,

    /// Path to a custom primitive/symbol definition file. Not implemented in this build — the
    /// primitive library is treated as an external collaborator outside this engine's scope, so
    /// passing this flag logs a warning and falls back to the built-in arithmetic/comparison
    /// library sized to the dataset's feature count.
    #[arg(long)]
    pub symbols: Option<PathBuf>,

    /// Held-out dataset file, evaluated after training but not used to drive evolution.
    #[arg(long)]
    pub testset: Option<PathBuf>,

    /// Percentage of the training dataset to hold out as a validation split when `--testset`
    /// is not given.
    #[arg(long)]
    pub validation: Option<f32>,

    /// `count|mae|rmae|mse|binary|dynslot|gaussian[:args]`, e.g. `dynslot:4`.
    #[arg(long)]
    pub evaluator: Option<String>,

    #[arg(long = "random-seed")]
    pub random_seed: Option<u64>,

    /// Cache size in bits (2^bits slots).
    #[arg(long)]
    pub cache: Option<u32>,

    #[arg(long = "population-size")]
    pub population_size: Option<usize>,

    #[arg(long)]
    pub layers: Option<usize>,

    #[arg(long = "code-length")]
    pub code_length: Option<usize>,

    #[arg(long)]
    pub elitism: Option<bool>,

    #[arg(long = "mutation-rate")]
    pub mutation_rate: Option<f32>,

    #[arg(long = "crossover-rate")]
    pub crossover_rate: Option<f32>,

    #[arg(long = "tournament-size")]
    pub tournament_size: Option<usize>,

    #[arg(long)]
    pub brood: Option<usize>,

    #[arg(long)]
    pub dss: Option<bool>,

    #[arg(long)]
    pub generations: Option<usize>,

    /// Generations without improvement before a stuck run gives up.
    #[arg(long)]
    pub gwi: Option<usize>,

    #[arg(long)]
    pub runs: Option<usize>,

    #[arg(long = "mate-zone")]
    pub mate_zone: Option<usize>,

    #[arg(long)]
    pub arl: Option<bool>,

    #[arg(long = "stat-dir")]
    pub stat_dir: Option<PathBuf>,

    #[arg(long = "stat-arl")]
    pub stat_arl: bool,

    #[arg(long = "stat-dynamic")]
    pub stat_dynamic: bool,

    #[arg(long = "stat-layers")]
    pub stat_layers: bool,

    #[arg(long = "stat-population")]
    pub stat_population: bool,

    #[arg(long = "stat-summary")]
    pub stat_summary: bool,

    /// A fitness or accuracy threshold; a trailing `%` means accuracy (e.g. `95%`),
    /// otherwise a raw fitness value.
    #[arg(long)]
    pub threshold: Option<String>,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
