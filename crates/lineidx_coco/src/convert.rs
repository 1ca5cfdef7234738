//! The conversion run: annotations and images in, four tables out.
//!
//! Every readable image contributes one row to each of the payload, label
//! and size tables, so row `i` of all three describes the same image.
//! Unreadable images are left out of all three. After the last flush the
//! selection list is rebuilt from the complete label table.

use crate::annotation::AnnotationSource;
use crate::config::{ConvertConfig, ConvertOutputs};
use crate::error::{ConvertError, ConvertResult};
use crate::label::{label_record, labels_for_image, payload_record, size_record, ImageSize};
use crate::source::ImageSource;
use lineidx_core::{build_linelist, Appender, TableId, TablePaths};
use serde::Serialize;
use tracing::{info, warn};

/// Counters of a finished conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConvertSummary {
    /// Images listed by the annotation source.
    pub images_seen: usize,
    /// Rows added to each of the three tables by this run.
    pub rows_written: usize,
    /// Images left out because they could not be read.
    pub skipped: usize,
    /// Rows in the selection list.
    pub selected: usize,
}

/// Drives one conversion.
///
/// # Example
///
/// ```no_run
/// use lineidx_coco::{CocoIndex, ConvertConfig, Converter, FsImageSource};
/// use std::path::Path;
///
/// let index = CocoIndex::from_path(Path::new("instances_train.json")).unwrap();
/// let config = ConvertConfig::new("out", "images").ignore_attrs(["iscrowd"]);
/// let images = FsImageSource::new(&config.image_root);
/// let summary = Converter::new(config).unwrap().run(&index, &images).unwrap();
/// println!("{} rows, {} skipped", summary.rows_written, summary.skipped);
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConvertConfig,
    outputs: ConvertOutputs,
}

struct Tables {
    payload: TableId,
    labels: TableId,
    sizes: TableId,
}

impl Converter {
    /// Validates `config` and prepares the output paths.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidConfig`] for unusable settings.
    pub fn new(config: ConvertConfig) -> ConvertResult<Self> {
        config.validate()?;
        let outputs = config.outputs();
        Ok(Self { config, outputs })
    }

    /// Settings of this run.
    #[must_use]
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Where the tables are written.
    #[must_use]
    pub fn outputs(&self) -> &ConvertOutputs {
        &self.outputs
    }

    /// Converts every image of `annotations`.
    ///
    /// # Errors
    ///
    /// Any table, annotation or encoding error aborts the run. Tables are
    /// left as they were after the last successful flush.
    ///
    /// When appending, tables that came back with more rows than the others
    /// (a run killed between flushes) are cut back to the shortest one
    /// before new rows are added.
    pub fn run<A, S>(&self, annotations: &A, images: &S) -> ConvertResult<ConvertSummary>
    where
        A: AnnotationSource + ?Sized,
        S: ImageSource + ?Sized,
    {
        let mut appender = Appender::new();
        let tables = Tables {
            payload: self.open(&mut appender, &self.outputs.payload)?,
            labels: self.open(&mut appender, &self.outputs.labels)?,
            sizes: self.open(&mut appender, &self.outputs.sizes)?,
        };
        if self.config.append {
            let rows = appender.align_rows()?;
            info!(rows, "resuming tables");
        }

        let image_ids = annotations.image_ids();
        let total = image_ids.len();
        let mut summary = ConvertSummary::default();

        for id in image_ids {
            summary.images_seen += 1;
            let meta = annotations
                .image_meta(id)
                .ok_or(ConvertError::MissingImage { id })?;

            match images.load(&meta.file_name)? {
                Some(image) => {
                    let labels = labels_for_image(annotations, id)?;
                    let size = ImageSize {
                        height: image.height,
                        width: image.width,
                    };
                    appender.push(tables.payload, &payload_record(id, &image.jpeg))?;
                    appender.push(tables.labels, &label_record(id, &labels)?)?;
                    appender.push(tables.sizes, &size_record(id, size)?)?;
                    summary.rows_written += 1;
                }
                None => {
                    warn!(image = %id, file = %meta.file_name, "skipping unreadable image");
                    summary.skipped += 1;
                }
            }

            if summary.images_seen % self.config.batch_size == 0 {
                appender.flush_all()?;
                info!(
                    done = summary.images_seen,
                    total,
                    rows = summary.rows_written,
                    skipped = summary.skipped,
                    "flushed batch"
                );
            }
        }

        appender.finish_all()?;
        info!(
            split = %self.config.split,
            rows = summary.rows_written,
            skipped = summary.skipped,
            "tables published"
        );

        let linelist = build_linelist(
            &self.outputs.labels,
            Some(&self.outputs.linelist),
            &self.config.selection(),
        )?;
        summary.selected = linelist.selected;
        Ok(summary)
    }

    fn open(&self, appender: &mut Appender, paths: &TablePaths) -> ConvertResult<TableId> {
        let config = self.config.append_config.clone();
        let id = if self.config.append {
            appender.reopen_table(paths, config)?
        } else {
            appender.create_table(paths, config)?
        };
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::ImageId;
    use crate::source::LoadedImage;
    use crate::CocoIndex;
    use lineidx_core::{AppendConfig, TableAppender, TableReader};
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    /// Serves every image except the listed file names; the "JPEG" is the
    /// file name itself.
    struct FakeImages {
        unreadable: HashSet<&'static str>,
    }

    impl FakeImages {
        fn all() -> Self {
            Self::without(&[])
        }

        fn without(names: &[&'static str]) -> Self {
            Self {
                unreadable: names.iter().copied().collect(),
            }
        }
    }

    impl ImageSource for FakeImages {
        fn load(&self, file_name: &str) -> ConvertResult<Option<LoadedImage>> {
            if self.unreadable.contains(file_name) {
                return Ok(None);
            }
            Ok(Some(LoadedImage {
                jpeg: file_name.as_bytes().to_vec(),
                width: 640,
                height: 480,
            }))
        }
    }

    const DATASET: &str = r#"{
        "images": [
            {"id": 1, "file_name": "one.jpg"},
            {"id": 2, "file_name": "two.jpg"},
            {"id": 3, "file_name": "three.jpg"},
            {"id": 4, "file_name": "four.jpg"},
            {"id": 5, "file_name": "five.jpg"}
        ],
        "annotations": [
            {"id": 10, "image_id": 1, "category_id": 1, "iscrowd": 0, "area": 50.0, "bbox": [0, 0, 10, 5]},
            {"id": 20, "image_id": 2, "category_id": 2, "iscrowd": 1, "area": 8.5, "bbox": [1, 1, 2, 4.25]},
            {"id": 30, "image_id": 3, "category_id": 1, "iscrowd": 1, "area": 1.0, "bbox": [0, 0, 1, 1]},
            {"id": 31, "image_id": 3, "category_id": 2, "iscrowd": 0, "area": 2.0, "bbox": [0, 0, 1, 2]},
            {"id": 50, "image_id": 5, "category_id": 1, "iscrowd": 0, "area": 4.0, "bbox": [2, 2, 2, 2]}
        ],
        "categories": [{"id": 1, "name": "person"}, {"id": 2, "name": "car"}]
    }"#;

    fn dataset() -> CocoIndex {
        CocoIndex::from_reader(DATASET.as_bytes()).unwrap()
    }

    fn column(paths: &TablePaths, field: usize) -> Vec<String> {
        let reader = TableReader::open_paths(paths).unwrap();
        reader
            .rows()
            .map(|row| row.unwrap().1[field].clone())
            .collect()
    }

    fn run(dir: &Path, config: ConvertConfig, images: &FakeImages) -> ConvertSummary {
        let config = ConvertConfig {
            output_dir: dir.to_path_buf(),
            ..config
        };
        Converter::new(config).unwrap().run(&dataset(), images).unwrap()
    }

    #[test]
    fn writes_aligned_tables() {
        let dir = tempdir().unwrap();
        let config = ConvertConfig::default().ignore_attrs(["iscrowd"]);
        let converter = Converter::new(ConvertConfig {
            output_dir: dir.path().to_path_buf(),
            ..config
        })
        .unwrap();
        let summary = converter.run(&dataset(), &FakeImages::all()).unwrap();

        assert_eq!(
            summary,
            ConvertSummary {
                images_seen: 5,
                rows_written: 5,
                skipped: 0,
                selected: 3,
            }
        );

        let outputs = converter.outputs();
        let ids = vec!["1", "2", "3", "4", "5"];
        assert_eq!(column(&outputs.payload, 0), ids);
        assert_eq!(column(&outputs.labels, 0), ids);
        assert_eq!(column(&outputs.sizes, 0), ids);

        assert_eq!(column(&outputs.payload, 1)[0], "b25lLmpwZw==");
        assert_eq!(
            column(&outputs.labels, 1)[1],
            r#"[{"iscrowd":1,"id":20,"area":8.5,"class":"car","rect":[1.0,1.0,2.0,4.25]}]"#
        );
        assert_eq!(column(&outputs.labels, 1)[3], "[]");
        assert_eq!(column(&outputs.sizes, 1)[2], r#"[{"height":480,"width":640}]"#);

        // Image 2 is crowd-only and image 4 has no labels.
        assert_eq!(column(&outputs.linelist, 0), vec!["0", "2", "4"]);
        assert_eq!(
            outputs.linelist.data(),
            dir.path().join("train.linelist.tsv")
        );
    }

    #[test]
    fn unreadable_images_leave_no_gap() {
        let dir = tempdir().unwrap();
        let summary = run(
            dir.path(),
            ConvertConfig::default(),
            &FakeImages::without(&["two.jpg", "four.jpg"]),
        );
        assert_eq!(summary.images_seen, 5);
        assert_eq!(summary.rows_written, 3);
        assert_eq!(summary.skipped, 2);

        let outputs = ConvertConfig::new(dir.path(), ".").outputs();
        for table in [&outputs.payload, &outputs.labels, &outputs.sizes] {
            assert_eq!(column(table, 0), vec!["1", "3", "5"]);
        }
        assert_eq!(column(&outputs.linelist, 0), vec!["0", "1", "2"]);
    }

    #[test]
    fn batch_size_does_not_change_output() {
        let images = FakeImages::without(&["three.jpg"]);
        let mut outputs = Vec::new();
        for batch in [1, 2, 3, 1000] {
            let dir = tempdir().unwrap();
            run(dir.path(), ConvertConfig::default().batch_size(batch), &images);
            let files: Vec<Vec<u8>> = ["train.tsv", "train.lineidx", "train.label.tsv", "train.hw.lineidx"]
                .iter()
                .map(|name| fs::read(dir.path().join(name)).unwrap())
                .collect();
            outputs.push(files);
        }
        assert!(outputs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn append_extends_existing_tables() {
        let dir = tempdir().unwrap();
        run(
            dir.path(),
            ConvertConfig::default(),
            &FakeImages::without(&["four.jpg", "five.jpg"]),
        );
        let more = run(
            dir.path(),
            ConvertConfig::default().append(true),
            &FakeImages::without(&["one.jpg", "two.jpg", "three.jpg"]),
        );
        assert_eq!(more.rows_written, 2);
        assert_eq!(more.selected, 4);

        let outputs = ConvertConfig::new(dir.path(), ".").outputs();
        assert_eq!(column(&outputs.labels, 0), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(column(&outputs.linelist, 0), vec!["0", "1", "2", "4"]);
    }

    #[test]
    fn append_realigns_uneven_tables() {
        let dir = tempdir().unwrap();
        run(
            dir.path(),
            ConvertConfig::default(),
            &FakeImages::without(&["three.jpg", "four.jpg", "five.jpg"]),
        );

        // Payload row for image 3 landed, its label and size rows did not.
        let outputs = ConvertConfig::new(dir.path(), ".").outputs();
        let mut payload = TableAppender::reopen(&outputs.payload, AppendConfig::default()).unwrap();
        payload.push(&payload_record(ImageId(3), b"three.jpg")).unwrap();
        payload.finish().unwrap();
        drop(payload);
        assert_eq!(column(&outputs.payload, 0), vec!["1", "2", "3"]);

        let more = run(
            dir.path(),
            ConvertConfig::default().append(true),
            &FakeImages::without(&["one.jpg", "two.jpg", "three.jpg", "five.jpg"]),
        );
        assert_eq!(more.rows_written, 1);

        for table in [&outputs.payload, &outputs.labels, &outputs.sizes] {
            assert_eq!(column(table, 0), vec!["1", "2", "4"]);
        }
        assert_eq!(column(&outputs.payload, 1)[2], "Zm91ci5qcGc=");
    }

    #[test]
    fn recreate_discards_previous_rows() {
        let dir = tempdir().unwrap();
        run(dir.path(), ConvertConfig::default(), &FakeImages::all());
        run(
            dir.path(),
            ConvertConfig::default(),
            &FakeImages::without(&["one.jpg", "two.jpg", "three.jpg", "four.jpg"]),
        );
        let outputs = ConvertConfig::new(dir.path(), ".").outputs();
        assert_eq!(column(&outputs.payload, 0), vec!["5"]);
    }

    #[test]
    fn dangling_category_aborts() {
        let dir = tempdir().unwrap();
        let index = CocoIndex::from_reader(
            r#"{"images": [{"id": 1, "file_name": "a.jpg"}],
                "annotations": [{"id": 1, "image_id": 1, "category_id": 7, "area": 1, "bbox": []}],
                "categories": []}"#
                .as_bytes(),
        )
        .unwrap();
        let converter = Converter::new(ConvertConfig::new(dir.path(), ".")).unwrap();
        let err = converter.run(&index, &FakeImages::all()).unwrap_err();
        assert!(matches!(err, ConvertError::MissingCategory { .. }));
    }

    #[test]
    fn zero_batch_rejected() {
        let err = Converter::new(ConvertConfig::default().batch_size(0)).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig { .. }));
    }
}
