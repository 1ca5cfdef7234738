//! Benchmark utilities.

#![warn(missing_docs)]

use lineidx_core::{Field, Record};
use rand::Rng;

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate payload rows `[id, base64(bytes)]` with `payload_size` bytes each.
pub fn payload_records(count: usize, payload_size: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            Record::new(vec![
                Field::text(i.to_string()),
                Field::from_bytes(&random_data(payload_size)),
            ])
        })
        .collect()
}

/// Generate label rows where every `crowd_every`-th row is crowd-only.
pub fn label_records(count: usize, crowd_every: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let crowd = u8::from(crowd_every > 0 && i % crowd_every == 0);
            let labels = format!(
                r#"[{{"iscrowd":{crowd},"id":{i},"area":120.5,"class":"person","rect":[1.0,2.0,10.0,12.05]}}]"#
            );
            Record::new(vec![Field::text(i.to_string()), Field::text(labels)])
        })
        .collect()
}

/// Generate `count` random row numbers below `rows`.
pub fn random_rows(count: usize, rows: usize) -> Vec<usize> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(0..rows)).collect()
}
