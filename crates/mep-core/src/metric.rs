use std::time::Duration;

/// A single named measurement emitted by an alter/evolution step (count, duration, or a
/// running value), collected for the `--stat-dir` reporting surface (§6). Deliberately lighter
/// than a full running-statistics accumulator — the engine only needs "what happened this
/// generation", not a windowed distribution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metric {
    pub name: &'static str,
    pub count: usize,
    pub value: Option<f32>,
    pub duration: Option<Duration>,
}

impl Metric {
    pub fn new(name: &'static str) -> Self {
        Metric {
            name,
            count: 0,
            value: None,
            duration: None,
        }
    }

    pub fn new_operations(name: &'static str, count: usize, duration: Duration) -> Self {
        Metric {
            name,
            count,
            value: None,
            duration: Some(duration),
        }
    }

    pub fn upsert(mut self, value: impl Into<f32>) -> Self {
        self.count += 1;
        self.value = Some(value.into());
        self
    }
}

pub mod metric_names {
    pub const AGE: &str = "age";
    pub const SCORES: &str = "scores";
    pub const GENOME_SIZE: &str = "genome_size";
    pub const LAYER_SIZE: &str = "layer_size";
    pub const CACHE_HIT_RATE: &str = "cache_hit_rate";
    pub const DSS_SUBSET_SIZE: &str = "dss_subset_size";
}
