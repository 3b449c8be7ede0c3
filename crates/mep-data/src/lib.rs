//! Dataset ingestion and run persistence (§6 External interfaces): CSV with delimiter
//! sniffing, XRFF, and the run-summary XML format a completed run is saved to and a genome is
//! reloaded from.
mod xml;

pub mod csv_reader;
pub mod summary;
pub mod xrff;

pub use csv_reader::{CsvOptions, read_csv};
pub use summary::{RunSummary, read_summary, write_summary};
pub use xrff::read_xrff;

use compact_str::CompactString;
use mep_eval::Dataset;
use mep_ops::Value;

/// A dataset read from an external source, plus the class labels recovered during ingestion
/// (present only for classification datasets) so a caller can print human-readable class names
/// instead of bare integer tags.
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub class_labels: Option<Vec<String>>,
}

/// Parses one data cell into a [`Value`]: an empty cell is `Void`, an integral literal is
/// `Int`, anything else that parses as a float is `Double`, and everything else is carried as
/// a `String` (a categorical feature, not a parse failure).
pub(crate) fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Void;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::Double(f);
    }
    Value::String(CompactString::new(trimmed))
}
