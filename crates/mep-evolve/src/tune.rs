//! Parameter auto-tuning (§4.10): any [`Config`] field left at its sentinel "unset" value is
//! derived here from the dataset's shape, once, at the start of a run.
use crate::config::{Config, ResolvedConfig};

/// Dataset size above which DSS (§4.9) is worthwhile (the per-generation subsampling overhead
/// only pays off once a full pass is itself expensive).
const DSS_THRESHOLD: usize = 400;

pub fn resolve(config: &Config, dataset_size: usize, is_classification: bool) -> ResolvedConfig {
    let n = dataset_size.max(1);

    let code_length = config.code_length.unwrap_or(50);
    let patch_length = config
        .patch_length
        .unwrap_or_else(|| (1 + code_length / 3).max(1));

    let layers = config.layers.unwrap_or_else(|| {
        let estimate = (n as f32).ln().ceil() as usize;
        estimate.clamp(1, 10)
    });

    let individuals_per_layer = config.individuals_per_layer.unwrap_or_else(|| {
        let log2n = (n as f32).log2().max(1.0);
        let estimate = (2.0 * log2n.powi(3) / layers as f32).round() as usize;
        estimate.max(4)
    });

    let dss = config.dss.unwrap_or(n > DSS_THRESHOLD);

    let mate_zone_cap = config.mate_zone.unwrap_or(individuals_per_layer);
    let tournament_size = config
        .tournament_size
        .unwrap_or(4)
        .clamp(2, mate_zone_cap.max(2).min(individuals_per_layer.max(2)));

    let threshold_accuracy = config.threshold_accuracy.unwrap_or(if is_classification {
        0.99
    } else {
        1.0
    });
    let threshold_fitness = config.threshold_fitness.unwrap_or(if is_classification {
        f32::NEG_INFINITY
    } else {
        -1e-6
    });

    ResolvedConfig {
        code_length,
        patch_length,
        layers,
        individuals_per_layer,
        dss,
        mutation_rate: config.mutation_rate,
        crossover_rate: config.crossover_rate,
        tournament_size,
        brood_recombination: config.brood_recombination,
        generations: config.generations,
        max_stuck_time: config.max_stuck_time,
        mate_zone: config.mate_zone,
        age_gap: config.age_gap,
        p_same_layer: config.p_same_layer,
        elitism: config.elitism,
        arl: config.arl,
        threshold_fitness,
        threshold_accuracy,
        cache_bits: config.cache_bits,
        runs: config.runs,
    }
}
