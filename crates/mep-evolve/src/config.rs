//! Run configuration (§4.10, ambient-stack addition): every tunable the CLI exposes, with
//! `Option`/sentinel fields that [`crate::tune::resolve`] derives from the dataset shape when
//! left unset.
#[derive(Clone, Debug)]
pub struct Config {
    pub code_length: Option<usize>,
    pub patch_length: Option<usize>,
    pub layers: Option<usize>,
    pub individuals_per_layer: Option<usize>,
    pub dss: Option<bool>,
    pub mutation_rate: f32,
    pub crossover_rate: f32,
    pub tournament_size: Option<usize>,
    pub brood_recombination: usize,
    pub generations: usize,
    pub max_stuck_time: usize,
    pub mate_zone: Option<usize>,
    pub age_gap: u32,
    pub p_same_layer: f32,
    pub elitism: bool,
    pub arl: bool,
    pub threshold_fitness: Option<f32>,
    pub threshold_accuracy: Option<f32>,
    pub cache_bits: u32,
    pub runs: usize,
    pub random_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            code_length: None,
            patch_length: None,
            layers: None,
            individuals_per_layer: None,
            dss: None,
            mutation_rate: 0.04,
            crossover_rate: 0.9,
            tournament_size: None,
            brood_recombination: 1,
            generations: 100,
            max_stuck_time: 50,
            mate_zone: None,
            age_gap: 20,
            p_same_layer: 0.75,
            elitism: true,
            arl: false,
            threshold_fitness: None,
            threshold_accuracy: None,
            cache_bits: 16,
            runs: 1,
            random_seed: None,
        }
    }
}

/// Fully resolved configuration: every field a concrete value, produced once per run by
/// [`crate::tune::resolve`] and never re-derived mid-run.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub code_length: usize,
    pub patch_length: usize,
    pub layers: usize,
    pub individuals_per_layer: usize,
    pub dss: bool,
    pub mutation_rate: f32,
    pub crossover_rate: f32,
    pub tournament_size: usize,
    pub brood_recombination: usize,
    pub generations: usize,
    pub max_stuck_time: usize,
    pub mate_zone: Option<usize>,
    pub age_gap: u32,
    pub p_same_layer: f32,
    pub elitism: bool,
    pub arl: bool,
    pub threshold_fitness: f32,
    pub threshold_accuracy: f32,
    pub cache_bits: u32,
    pub runs: usize,
}
