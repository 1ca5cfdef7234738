//! Byte-exact format vectors.
//!
//! Each vector pins the data and index bytes a record sequence must
//! produce, whichever writer produced them.

use lineidx_core::{Field, Record};

/// Records with the exact files they must produce.
#[derive(Debug, Clone)]
pub struct FormatVector {
    /// Unique identifier for this vector.
    pub id: &'static str,
    /// Records in row order.
    pub records: Vec<Record>,
    /// Expected data file content.
    pub data: &'static str,
    /// Expected index file content.
    pub index: &'static str,
}

/// Format vectors covering each field variant and the empty table.
pub fn format_vectors() -> Vec<FormatVector> {
    vec![
        FormatVector {
            id: "empty",
            records: Vec::new(),
            data: "",
            index: "",
        },
        FormatVector {
            id: "label_rows",
            records: vec![
                Record::new(vec![Field::Int(1), Field::text("[]")]),
                Record::new(vec![
                    Field::Int(2),
                    Field::text(r#"[{"iscrowd":0,"id":7,"area":702.5,"class":"dog","rect":[1.0,2.0,3.0,4.0]}]"#),
                ]),
            ],
            data: "1\t[]\n2\t[{\"iscrowd\":0,\"id\":7,\"area\":702.5,\"class\":\"dog\",\"rect\":[1.0,2.0,3.0,4.0]}]\n",
            index: "0\n5\n",
        },
        FormatVector {
            id: "binary_payload",
            records: vec![
                Record::new(vec![Field::text("9"), Field::from_bytes(&[0xff, 0xd8, 0xff])]),
                Record::new(vec![Field::text("10"), Field::from_bytes(b"")]),
            ],
            data: "9\t/9j/\n10\t\n",
            index: "0\n7\n",
        },
        FormatVector {
            id: "floats",
            records: vec![
                Record::new(vec![Field::Float(1.0)]),
                Record::new(vec![Field::Float(702.5)]),
                Record::new(vec![Field::Float(-0.25)]),
            ],
            data: "1.0\n702.5\n-0.25\n",
            index: "0\n4\n10\n",
        },
        FormatVector {
            id: "multibyte_text",
            records: vec![
                Record::new(vec![Field::text("é")]),
                Record::new(vec![Field::text("x")]),
            ],
            data: "é\nx\n",
            index: "0\n3\n",
        },
    ]
}
