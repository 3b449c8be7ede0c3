pub mod fitness;
pub mod metric;
pub mod optimize;
pub mod random_provider;
pub mod valid;

pub use fitness::{Fitness, Scored, dominates};
pub use metric::{Metric, metric_names};
pub use optimize::{Objective, Optimize};
pub use valid::Valid;
