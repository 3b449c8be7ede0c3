//! CSV ingestion (§6 "CSV: UTF-8, optional header row, configurable delimiter sniffed from
//! `,;:\t|` by frequency-of-frequencies heuristic"), built on the `csv` crate the way
//! `ReaderBuilder` is used elsewhere in the pack, with custom delimiter/header detection in
//! front of it since `csv::Reader` itself has no sniffing of its own.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use mep_error::{MepResult, mep_err};
use mep_eval::{Dataset, Example};
use mep_ops::Value;

use crate::LoadedDataset;

/// The delimiter candidates tried in order. Ties in sniffed
/// weight favor the earlier candidate, so `,` wins a genuine tie.
pub const CANDIDATE_DELIMITERS: [u8; 5] = [b',', b';', b'\t', b':', b'|'];

#[derive(Clone, Debug)]
pub struct CsvOptions {
    /// `None` sniffs the delimiter from the file.
    pub delimiter: Option<u8>,
    /// `None` detects whether row 0 is a header by comparing its cell types against row 1.
    pub has_header: Option<bool>,
    /// Index of the output (target) column. Defaults to the first column (§6).
    pub target_column: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: None,
            has_header: None,
            target_column: 0,
        }
    }
}

pub fn read_csv(path: &Path, options: &CsvOptions) -> MepResult<LoadedDataset> {
    let content = fs::read_to_string(path)?;
    let delimiter = options.delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    let has_header = options.has_header.unwrap_or_else(|| sniff_header(&content, delimiter));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => rows.push(record),
            Err(err) => tracing::warn!(%err, "skipping malformed csv row"),
        }
    }
    if has_header && !rows.is_empty() {
        rows.remove(0);
    }

    build_dataset(rows, options.target_column)
}

fn build_dataset(rows: Vec<csv::StringRecord>, target_column: usize) -> MepResult<LoadedDataset> {
    let mut raw_rows = Vec::with_capacity(rows.len());
    for record in rows {
        if target_column >= record.len() {
            tracing::warn!(columns = record.len(), target_column, "skipping row: target column out of range");
            continue;
        }
        raw_rows.push(record);
    }
    if raw_rows.is_empty() {
        return Err(mep_err!(InvalidConfig: "csv dataset has zero valid rows"));
    }

    // §6: "non-numeric first-column values trigger classification mode" generalizes to
    // whichever column is the configured target: if every row's target cell parses as a
    // double, this is a regression dataset; otherwise every distinct target string becomes a
    // 0-based class tag, in order of first appearance.
    let all_numeric_targets = raw_rows
        .iter()
        .all(|r| r.get(target_column).unwrap().trim().parse::<f64>().is_ok());

    let mut examples = Vec::with_capacity(raw_rows.len());
    let mut class_index: HashMap<String, usize> = HashMap::new();
    let mut class_labels: Vec<String> = Vec::new();

    for record in &raw_rows {
        let mut input = Vec::with_capacity(record.len().saturating_sub(1));
        for (i, cell) in record.iter().enumerate() {
            if i != target_column {
                input.push(crate::parse_cell(cell));
            }
        }

        let target_cell = record.get(target_column).unwrap().trim();
        let output = if all_numeric_targets {
            Value::Double(target_cell.parse::<f64>().unwrap())
        } else {
            let label = target_cell.to_string();
            let class = *class_index.entry(label.clone()).or_insert_with(|| {
                class_labels.push(label);
                class_labels.len() - 1
            });
            Value::Int(class as i64)
        };

        examples.push(Example::new(input, output));
    }

    let dataset = if all_numeric_targets {
        Dataset::regression(examples)
    } else {
        Dataset::classification(examples, class_labels.len())
    };

    Ok(LoadedDataset {
        dataset,
        class_labels: if all_numeric_targets { None } else { Some(class_labels) },
    })
}

/// Frequency-of-frequencies delimiter sniffing (§6): for each candidate delimiter, count its
/// per-line occurrences over the first 20 non-empty lines, then take the modal occurrence
/// count across those lines as that delimiter's "weight" — a delimiter that shows up the same
/// number of times on (almost) every line is very likely the real field separator. A delimiter
/// with no unique, non-zero mode scores zero and loses to any candidate that has one.
pub fn sniff_delimiter(content: &str) -> u8 {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(20).collect();
    if lines.is_empty() {
        return b',';
    }

    let mut best_delim = CANDIDATE_DELIMITERS[0];
    let mut best_weight = 0usize;
    for &delim in &CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = lines.iter().map(|l| l.matches(delim as char).count()).collect();
        let (_, weight) = mode_weight(&counts);
        if weight > best_weight {
            best_weight = weight;
            best_delim = delim;
        }
    }
    best_delim
}

/// Returns `(modal_count, weight)` where `weight` is how many lines exhibit that modal count,
/// or `(0, 0)` if the mode is zero or not unique.
fn mode_weight(counts: &[usize]) -> (usize, usize) {
    let mut freq: HashMap<usize, usize> = HashMap::new();
    for &c in counts {
        *freq.entry(c).or_insert(0) += 1;
    }
    let max_freq = freq.values().copied().max().unwrap_or(0);
    let modes: Vec<usize> = freq.iter().filter(|&(_, &f)| f == max_freq).map(|(&v, _)| v).collect();
    if modes.len() == 1 && modes[0] > 0 {
        (modes[0], max_freq)
    } else {
        (0, 0)
    }
}

/// Header detection: compares the first two non-empty rows column by column; if any column
/// parses as a number in row 1 but not in row 0, row 0 is a header. A simplified stand-in for
/// a full multi-row type-consistency vote, adequate for the common case of a label row
/// followed by numeric data.
fn sniff_header(content: &str, delimiter: u8) -> bool {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let (Some(first), Some(second)) = (lines.next(), lines.next()) else {
        return false;
    };
    let delim = delimiter as char;
    let row0: Vec<&str> = first.split(delim).collect();
    let row1: Vec<&str> = second.split(delim).collect();
    if row0.len() != row1.len() {
        return false;
    }
    row0.iter()
        .zip(row1.iter())
        .any(|(a, b)| a.trim().parse::<f64>().is_err() && b.trim().parse::<f64>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> tempfile_path::TempCsv {
        tempfile_path::TempCsv::new(contents)
    }

    /// A tiny scratch-file helper so tests don't need an external tempfile crate.
    mod tempfile_path {
        use std::io::Write;
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicUsize, Ordering};

        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        pub struct TempCsv {
            pub path: PathBuf,
        }

        impl TempCsv {
            pub fn new(contents: &str) -> Self {
                let id = COUNTER.fetch_add(1, Ordering::Relaxed);
                let mut path = std::env::temp_dir();
                path.push(format!("mep-data-test-{}-{id}.csv", std::process::id()));
                let mut file = std::fs::File::create(&path).unwrap();
                file.write_all(contents.as_bytes()).unwrap();
                TempCsv { path }
            }
        }

        impl Drop for TempCsv {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }

    #[test]
    fn sniffs_semicolon_delimiter() {
        let content = "a;b;c\n1;2;3\n4;5;6\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn sniffs_comma_over_tab_when_comma_is_consistent() {
        let content = "1,2,3\n4,5,6\n7,8,9\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn detects_header_row_before_numeric_data() {
        let content = "x0,x1,y\n1.0,2.0,3.0\n4.0,5.0,6.0\n";
        assert!(sniff_header(content, b','));
    }

    #[test]
    fn all_numeric_rows_have_no_header() {
        let content = "1.0,2.0,3.0\n4.0,5.0,6.0\n";
        assert!(!sniff_header(content, b','));
    }

    #[test]
    fn regression_dataset_from_first_column_target() {
        let tmp = write_temp("3.0,1.0,2.0\n6.0,2.0,4.0\n9.0,3.0,6.0\n");
        let loaded = read_csv(&tmp.path, &CsvOptions::default()).unwrap();
        assert_eq!(loaded.dataset.len(), 3);
        assert!(loaded.class_labels.is_none());
        assert_eq!(loaded.dataset.example(0).output, Value::Double(3.0));
    }

    #[test]
    fn classification_dataset_assigns_class_indices_in_appearance_order() {
        let tmp = write_temp("1.0,2.0,cat\n3.0,4.0,dog\n5.0,6.0,cat\n");
        let options = CsvOptions {
            target_column: 2,
            ..CsvOptions::default()
        };
        let loaded = read_csv(&tmp.path, &options).unwrap();
        assert_eq!(loaded.class_labels, Some(vec!["cat".to_string(), "dog".to_string()]));
        assert_eq!(loaded.dataset.example(0).class(), 0);
        assert_eq!(loaded.dataset.example(1).class(), 1);
        assert_eq!(loaded.dataset.example(2).class(), 0);
    }

    #[test]
    fn zero_valid_rows_is_an_error() {
        let tmp = write_temp("header_only_column\n");
        let options = CsvOptions {
            target_column: 5,
            has_header: Some(false),
            ..CsvOptions::default()
        };
        assert!(read_csv(&tmp.path, &options).is_err());
    }
}
