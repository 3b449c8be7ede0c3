//! XRFF ingestion (§6 "XML with `<dataset><header><attributes>` and `<body><instances>`
//! sections. Attribute `type` in {numeric, real, integer, nominal, string}; attribute
//! `class=\"yes\"` marks the output column"). No XML crate is available in the dependency
//! stack for this shape, so the file is scanned by hand with [`crate::xml`]'s small
//! tag/attribute helpers rather than built as a general document tree.
use std::fs;
use std::path::Path;

use mep_error::{MepResult, mep_err};
use mep_eval::{Dataset, Example};
use mep_ops::Value;

use crate::LoadedDataset;
use crate::xml::{extract_between, find_attr, tag_attrs};

struct XrffAttribute {
    kind: String,
    is_class: bool,
}

pub fn read_xrff(path: &Path) -> MepResult<LoadedDataset> {
    let content = fs::read_to_string(path)?;

    let header = extract_between(&content, "<header", "</header>")
        .ok_or_else(|| mep_err!(Codec: "xrff file missing <header> section"))?;
    let attributes_section = extract_between(header, "<attributes>", "</attributes>")
        .ok_or_else(|| mep_err!(Codec: "xrff file missing <attributes> section"))?;
    let attributes = parse_attributes(attributes_section)?;
    if attributes.is_empty() {
        return Err(mep_err!(Codec: "xrff file declares zero attributes"));
    }

    let class_index = attributes.iter().position(|a| a.is_class).unwrap_or(attributes.len() - 1);
    let is_classification = matches!(attributes[class_index].kind.as_str(), "nominal" | "string");

    let body = extract_between(&content, "<body", "</body>")
        .ok_or_else(|| mep_err!(Codec: "xrff file missing <body> section"))?;
    let instances_section = extract_between(body, "<instances>", "</instances>")
        .ok_or_else(|| mep_err!(Codec: "xrff file missing <instances> section"))?;
    let raw_rows = parse_instances(instances_section, attributes.len());
    if raw_rows.is_empty() {
        return Err(mep_err!(InvalidConfig: "xrff dataset has zero valid instances"));
    }

    let mut examples = Vec::with_capacity(raw_rows.len());
    let mut class_labels: Vec<String> = Vec::new();

    for row in &raw_rows {
        let mut input = Vec::with_capacity(attributes.len() - 1);
        for (i, cell) in row.iter().enumerate() {
            if i != class_index {
                input.push(crate::parse_cell(cell));
            }
        }

        let target_cell = row[class_index].trim();
        let output = if is_classification {
            let label = target_cell.to_string();
            let class = match class_labels.iter().position(|l| l == &label) {
                Some(idx) => idx,
                None => {
                    class_labels.push(label);
                    class_labels.len() - 1
                }
            };
            Value::Int(class as i64)
        } else {
            match target_cell.parse::<f64>() {
                Ok(v) => Value::Double(v),
                Err(_) => {
                    tracing::warn!(value = target_cell, "skipping xrff row: non-numeric value in numeric class column");
                    continue;
                }
            }
        };
        examples.push(Example::new(input, output));
    }

    if examples.is_empty() {
        return Err(mep_err!(InvalidConfig: "xrff dataset has zero valid instances"));
    }

    let dataset = if is_classification {
        Dataset::classification(examples, class_labels.len())
    } else {
        Dataset::regression(examples)
    };

    Ok(LoadedDataset {
        dataset,
        class_labels: if is_classification { Some(class_labels) } else { None },
    })
}

fn parse_attributes(section: &str) -> MepResult<Vec<XrffAttribute>> {
    let mut attributes = Vec::new();
    let mut cursor = 0usize;
    while let Some(rel_start) = section[cursor..].find("<attribute") {
        let tag_start = cursor + rel_start;
        let tag_end = section[tag_start..]
            .find('>')
            .map(|p| tag_start + p)
            .ok_or_else(|| mep_err!(Codec: "unterminated <attribute> tag"))?;
        let self_closing = section.as_bytes()[tag_end - 1] == b'/';
        let inner_end = if self_closing { tag_end - 1 } else { tag_end };
        let inner = &section[tag_start + "<attribute".len()..inner_end];
        let attrs = tag_attrs(inner);
        let kind = find_attr(&attrs, "type").unwrap_or("numeric").to_string();
        let is_class = find_attr(&attrs, "class") == Some("yes");
        attributes.push(XrffAttribute { kind, is_class });
        cursor = tag_end + 1;
    }
    Ok(attributes)
}

fn parse_instances(section: &str, expected_columns: usize) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut cursor = 0usize;
    while let Some(rel_start) = section[cursor..].find("<instance>") {
        let start = cursor + rel_start + "<instance>".len();
        let Some(rel_end) = section[start..].find("</instance>") else {
            break;
        };
        let end = start + rel_end;
        let cells: Vec<String> = section[start..end].split(',').map(|c| c.trim().to_string()).collect();
        if cells.len() == expected_columns {
            rows.push(cells);
        } else {
            tracing::warn!(expected = expected_columns, found = cells.len(), "skipping malformed xrff instance");
        }
        cursor = end + "</instance>".len();
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!("mep-data-xrff-test-{}-{id}.xrff", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const CLASSIFICATION_DOC: &str = r#"
<dataset name="toy">
  <header>
    <attributes>
      <attribute name="x0" type="numeric"/>
      <attribute name="x1" type="numeric"/>
      <attribute name="label" type="nominal" class="yes"/>
    </attributes>
  </header>
  <body>
    <instances>
      <instance>1.0,2.0,cat</instance>
      <instance>3.0,4.0,dog</instance>
      <instance>5.0,6.0,cat</instance>
    </instances>
  </body>
</dataset>
"#;

    const REGRESSION_DOC: &str = r#"
<dataset name="toy">
  <header>
    <attributes>
      <attribute name="x0" type="numeric"/>
      <attribute name="y" type="numeric" class="yes"/>
    </attributes>
  </header>
  <body>
    <instances>
      <instance>1.0,2.0</instance>
      <instance>2.0,4.0</instance>
    </instances>
  </body>
</dataset>
"#;

    #[test]
    fn reads_classification_dataset_with_nominal_class_column() {
        let path = write_temp(CLASSIFICATION_DOC);
        let loaded = read_xrff(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.dataset.len(), 3);
        assert_eq!(loaded.class_labels, Some(vec!["cat".to_string(), "dog".to_string()]));
        assert_eq!(loaded.dataset.example(0).class(), 0);
        assert_eq!(loaded.dataset.example(1).class(), 1);
    }

    #[test]
    fn reads_regression_dataset_with_numeric_class_column() {
        let path = write_temp(REGRESSION_DOC);
        let loaded = read_xrff(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(loaded.class_labels.is_none());
        assert_eq!(loaded.dataset.example(1).output, Value::Double(4.0));
    }

    #[test]
    fn missing_attributes_section_is_an_error() {
        let path = write_temp("<dataset><header></header><body><instances></instances></body></dataset>");
        assert!(read_xrff(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
