//! Format properties checked over generated tables.

use lineidx_core::{verify_table, TableError};
use lineidx_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn bulk_write_round_trips(records in records_strategy(40)) {
        let table = TempTable::new("t.tsv");
        table.write(records.clone());

        let expected: Vec<Vec<String>> = records.iter().map(rendered).collect();
        prop_assert_eq!(table.read_all(), expected.clone());

        let reader = table.reader();
        prop_assert_eq!(reader.row_count(), records.len());
        for (i, fields) in expected.iter().enumerate().rev() {
            prop_assert_eq!(&reader.read_row(i).unwrap(), fields);
        }
    }

    #[test]
    fn offsets_frame_every_line(records in records_strategy(40)) {
        let table = TempTable::new("t.tsv");
        table.write(records.clone());

        let data = table.data_bytes();
        let offsets = table.reader().offsets().to_vec();
        let index_lines = table.index_bytes().iter().filter(|&&b| b == b'\n').count();
        let data_lines = data.iter().filter(|&&b| b == b'\n').count();
        prop_assert_eq!(index_lines, records.len());
        prop_assert_eq!(data_lines, records.len());

        let mut ends: Vec<u64> = offsets.iter().skip(1).copied().collect();
        ends.push(data.len() as u64);
        let mut expected_start = 0u64;
        for (start, end) in offsets.iter().zip(ends) {
            prop_assert_eq!(*start, expected_start);
            prop_assert!(end > *start);
            prop_assert_eq!(data[(end - 1) as usize], b'\n');
            prop_assert!(!data[*start as usize..(end - 1) as usize].contains(&b'\n'));
            expected_start = end;
        }

        let report = verify_table(table.paths()).unwrap();
        prop_assert!(report.is_ok(), "{:?}", report.issues);
    }

    #[test]
    fn appended_batches_match_bulk_bytes(
        records in records_strategy(60),
        sizes in batch_sizes_strategy(),
    ) {
        let bulk = TempTable::new("bulk.tsv");
        bulk.write(records.clone());

        let appended = TempTable::new("appended.tsv");
        appended.append_batches(&partition(&records, &sizes));

        prop_assert_eq!(appended.data_bytes(), bulk.data_bytes());
        prop_assert_eq!(appended.index_bytes(), bulk.index_bytes());
    }

    #[test]
    fn reading_past_the_end_is_out_of_range(records in records_strategy(10)) {
        let table = TempTable::new("t.tsv");
        table.write(records.clone());
        let reader = table.reader();

        let is_out_of_range = matches!(
            reader.read_row(records.len()),
            Err(TableError::OutOfRange { .. })
        );
        prop_assert!(is_out_of_range);
        if !records.is_empty() {
            prop_assert!(reader.read_row(records.len() - 1).is_ok());
        }
    }
}

#[test]
fn selection_list_property() {
    let labels = label_table(&[
        "[]",
        r#"[{"a": true}]"#,
        r#"[{"a": false}, {"b": true}]"#,
        r#"[{"a": true}, {"a": true}]"#,
    ]);
    let config = lineidx_core::SelectionConfig::new().ignore_attrs(["a"]);
    let summary = lineidx_core::build_linelist(labels.paths(), None, &config).unwrap();

    let reader = lineidx_core::TableReader::open_paths(&summary.paths).unwrap();
    let rows: Vec<Vec<String>> = reader.rows().map(|r| r.unwrap().1).collect();
    assert_eq!(rows, vec![vec!["2".to_string()]]);
}
