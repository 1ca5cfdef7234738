//! Property-based test generators using proptest.
//!
//! Generated text never contains tabs or line breaks and never starts or
//! ends with whitespace, so every generated record reads back exactly.

use lineidx_core::{Field, Record};
use proptest::prelude::*;

/// Strategy for text fields that survive trimming.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        prop::string::string_regex("[!-~]([ -~]{0,40}[!-~])?").expect("Invalid regex"),
        prop::string::string_regex("[a-zé漢🦀]{1,8}").expect("Invalid regex"),
    ]
}

/// Strategy for binary payloads.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

/// Strategy for a single field of any variant.
pub fn field_strategy() -> impl Strategy<Value = Field> {
    prop_oneof![
        text_strategy().prop_map(Field::Text),
        any::<i64>().prop_map(Field::Int),
        prop::num::f64::NORMAL.prop_map(Field::Float),
        payload_strategy().prop_map(|bytes| Field::from_bytes(&bytes)),
    ]
}

/// Strategy for a record of exactly `arity` fields.
pub fn record_strategy(arity: usize) -> impl Strategy<Value = Record> {
    prop::collection::vec(field_strategy(), arity).prop_map(Record::new)
}

/// Strategy for up to `max_rows` records sharing one arity.
pub fn records_strategy(max_rows: usize) -> impl Strategy<Value = Vec<Record>> {
    (1usize..6).prop_flat_map(move |arity| {
        prop::collection::vec(record_strategy(arity), 0..=max_rows)
    })
}

/// Strategy for flush cadences: batch sizes applied in turn until the
/// records run out.
pub fn batch_sizes_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..16, 1..8)
}

/// Splits `records` into consecutive batches of the given sizes, cycling
/// through `sizes` until every record is placed.
///
/// # Panics
///
/// Panics if `sizes` is empty or contains a zero.
pub fn partition<T: Clone>(records: &[T], sizes: &[usize]) -> Vec<Vec<T>> {
    assert!(!sizes.is_empty() && sizes.iter().all(|&s| s > 0));
    let mut batches = Vec::new();
    let mut rest = records;
    for &size in sizes.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let (batch, tail) = rest.split_at(size.min(rest.len()));
        batches.push(batch.to_vec());
        rest = tail;
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_everything_in_order() {
        let items: Vec<u32> = (0..10).collect();
        let batches = partition(&items, &[3, 1]);
        assert_eq!(
            batches,
            vec![vec![0, 1, 2], vec![3], vec![4, 5, 6], vec![7], vec![8, 9]]
        );
        assert!(partition::<u32>(&[], &[4]).is_empty());
    }

    proptest! {
        #[test]
        fn generated_text_is_line_safe(text in text_strategy()) {
            prop_assert!(Field::Text(text.clone()).validate().is_ok());
            prop_assert_eq!(text.trim(), text.as_str());
        }

        #[test]
        fn generated_records_share_arity(records in records_strategy(20)) {
            if let Some(first) = records.first() {
                prop_assert!(records.iter().all(|r| r.arity() == first.arity()));
            }
        }
    }
}
