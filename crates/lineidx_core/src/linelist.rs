//! Selection lists: tables of row numbers picked from a label table.
//!
//! The label table is streamed once; each row's label field is decoded as a
//! JSON array of label objects and tested against the inclusion rule. The
//! output is a one-field table holding the original row numbers in
//! ascending order.

use crate::config::SelectionConfig;
use crate::error::{TableError, TableResult};
use crate::field::{Field, Record};
use crate::paths::TablePaths;
use crate::reader::TableReader;
use crate::writer::try_write_table;
use lineidx_storage::StorageBackend;
use serde_json::Value;
use tracing::info;

/// Outcome of building a selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinelistSummary {
    /// Rows in the source label table.
    pub source_rows: usize,
    /// Rows written to the selection list.
    pub selected: usize,
    /// Where the selection list was written.
    pub paths: TablePaths,
}

/// Decides whether a row with these labels is kept.
///
/// - `null` or an empty array is dropped.
/// - A non-empty array where every label has at least one of
///   `ignore_attrs` set to a truthy value is dropped.
/// - Everything else is kept.
///
/// Non-object labels carry no attributes and are never ignorable.
#[must_use]
pub fn is_selected(labels: &[Value], ignore_attrs: &[String]) -> bool {
    if labels.is_empty() {
        return false;
    }
    if ignore_attrs.is_empty() {
        return true;
    }
    !labels.iter().all(|label| has_ignored_attr(label, ignore_attrs))
}

fn has_ignored_attr(label: &Value, ignore_attrs: &[String]) -> bool {
    label.as_object().is_some_and(|obj| {
        ignore_attrs
            .iter()
            .any(|attr| obj.get(attr).is_some_and(is_truthy))
    })
}

/// Truthiness of a JSON value: `null`, `false`, zero, `""`, `[]` and `{}`
/// are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Decodes the label field of one row.
///
/// # Errors
///
/// Returns [`TableError::MalformedInput`] if the field is missing, is not
/// valid JSON, or is neither an array nor `null`.
pub fn decode_labels(row: usize, fields: &[String], label_field: usize) -> TableResult<Vec<Value>> {
    let raw = fields.get(label_field).ok_or_else(|| {
        TableError::malformed(
            row,
            format!("has {} fields, label field is {label_field}", fields.len()),
        )
    })?;

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(labels)) => Ok(labels),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(other) => Err(TableError::malformed(
            row,
            format!("label field is not a JSON array: {other}"),
        )),
        Err(e) => Err(TableError::malformed(row, format!("invalid label JSON: {e}"))),
    }
}

/// Streams the row numbers of `reader` that pass the inclusion rule.
pub fn selected_rows<'a, B: StorageBackend>(
    reader: &'a TableReader<B>,
    config: &'a SelectionConfig,
) -> impl Iterator<Item = TableResult<usize>> + 'a {
    reader.rows().filter_map(move |row| {
        let (i, fields) = match row {
            Ok(row) => row,
            Err(err) => return Some(Err(err)),
        };
        match decode_labels(i, &fields, config.label_field) {
            Ok(labels) if is_selected(&labels, &config.ignore_attrs) => Some(Ok(i)),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        }
    })
}

/// Builds the selection list of the label table at `labels`.
///
/// Written to `save` if given, otherwise next to the label table as
/// `<stem>.linelist.tsv`.
///
/// # Errors
///
/// Returns [`TableError::MalformedInput`] for the first undecodable label
/// field (nothing is published), or any read or write error.
///
/// # Example
///
/// ```no_run
/// use lineidx_core::{build_linelist, SelectionConfig, TablePaths};
///
/// let labels = TablePaths::new("out/train.label.tsv");
/// let config = SelectionConfig::new().ignore_attrs(["iscrowd"]);
/// let summary = build_linelist(&labels, None, &config).unwrap();
/// println!("{} of {} rows selected", summary.selected, summary.source_rows);
/// ```
pub fn build_linelist(
    labels: &TablePaths,
    save: Option<&TablePaths>,
    config: &SelectionConfig,
) -> TableResult<LinelistSummary> {
    let reader = TableReader::open_paths(labels)?;
    let paths = save.cloned().unwrap_or_else(|| labels.linelist());

    let records = selected_rows(&reader, config)
        .map(|row| row.and_then(|i| Ok(Record::new(vec![Field::count(i)?]))));
    let written = try_write_table(&paths, records)?;

    info!(
        source = %labels.data().display(),
        linelist = %paths.data().display(),
        rows = reader.row_count(),
        selected = written.rows,
        "built selection list"
    );
    Ok(LinelistSummary {
        source_rows: reader.row_count(),
        selected: written.rows,
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write_table;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn label_table(dir: &std::path::Path, labels: &[&str]) -> TablePaths {
        let paths = TablePaths::new(dir.join("train.label.tsv"));
        let records: Vec<Record> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| Record::new(vec![Field::Int(100 + i as i64), Field::text(*l)]))
            .collect();
        write_table(&paths, records).unwrap();
        paths
    }

    fn read_linelist(paths: &TablePaths) -> Vec<usize> {
        let reader = TableReader::open_paths(paths).unwrap();
        reader
            .rows()
            .map(|r| r.unwrap().1[0].parse().unwrap())
            .collect()
    }

    #[test]
    fn ignore_attrs_rule() {
        let dir = tempdir().unwrap();
        let labels = label_table(
            dir.path(),
            &[
                "[]",
                r#"[{"a": true}]"#,
                r#"[{"a": false}, {"b": true}]"#,
                r#"[{"a": true}, {"a": true}]"#,
            ],
        );

        let config = SelectionConfig::new().ignore_attrs(["a"]);
        let summary = build_linelist(&labels, None, &config).unwrap();

        assert_eq!(summary.source_rows, 4);
        assert_eq!(summary.selected, 1);
        assert_eq!(
            summary.paths.data(),
            dir.path().join("train.label.linelist.tsv")
        );
        assert_eq!(fs::read_to_string(summary.paths.data()).unwrap(), "2\n");
        assert_eq!(read_linelist(&summary.paths), vec![2]);
    }

    #[test]
    fn without_ignore_attrs_keeps_every_labelled_row() {
        let dir = tempdir().unwrap();
        let labels = label_table(
            dir.path(),
            &[r#"[{"a": true}]"#, "[]", "null", r#"[{"class": "dog"}]"#],
        );
        let save = TablePaths::new(dir.path().join("custom.linelist.tsv"));

        let summary = build_linelist(&labels, Some(&save), &SelectionConfig::default()).unwrap();
        assert_eq!(summary.paths, save);
        assert_eq!(read_linelist(&save), vec![0, 3]);
    }

    #[test]
    fn invalid_json_is_fatal() {
        let dir = tempdir().unwrap();
        let labels = label_table(dir.path(), &["[]", "[{"]);

        let err = build_linelist(&labels, None, &SelectionConfig::default()).unwrap_err();
        assert!(matches!(err, TableError::MalformedInput { row: 1, .. }));
        assert!(!labels.linelist().data().exists());
    }

    #[test]
    fn non_array_is_malformed() {
        let fields = vec!["1".to_string(), r#"{"a": 1}"#.to_string()];
        assert!(matches!(
            decode_labels(0, &fields, 1),
            Err(TableError::MalformedInput { .. })
        ));
        assert!(matches!(
            decode_labels(0, &fields, 5),
            Err(TableError::MalformedInput { .. })
        ));
    }

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!(-0.5), json!("x"), json!([0]), json!({"k": 0})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn numeric_flags_count_as_truthy() {
        let ignore = vec!["iscrowd".to_string()];
        assert!(!is_selected(&[json!({"iscrowd": 1})], &ignore));
        assert!(is_selected(&[json!({"iscrowd": 0})], &ignore));
        assert!(is_selected(&[json!({"iscrowd": 1}), json!({"id": 4})], &ignore));
        assert!(is_selected(&[json!(7)], &ignore));
    }
}
