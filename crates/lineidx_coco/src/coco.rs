//! In-memory index over a COCO annotation file.

use crate::annotation::{
    AnnotationId, AnnotationMeta, AnnotationSource, Category, CategoryId, ImageId, ImageMeta,
};
use crate::error::ConvertResult;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CocoFile {
    images: Vec<ImageMeta>,
    #[serde(default)]
    annotations: Vec<AnnotationMeta>,
    #[serde(default)]
    categories: Vec<Category>,
}

/// Lookup tables built from a COCO `instances_*.json` file.
///
/// Image order and per-image annotation order follow the file. A repeated
/// image or annotation id keeps its first position and its last metadata.
#[derive(Debug, Default)]
pub struct CocoIndex {
    images: Vec<ImageMeta>,
    image_pos: HashMap<ImageId, usize>,
    annotations: HashMap<AnnotationId, AnnotationMeta>,
    image_annotations: HashMap<ImageId, Vec<AnnotationId>>,
    categories: HashMap<CategoryId, String>,
}

impl CocoIndex {
    /// Loads an annotation file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error or a JSON error for a malformed file.
    pub fn from_path(path: &Path) -> ConvertResult<Self> {
        let index = Self::from_reader(BufReader::new(File::open(path)?))?;
        debug!(
            path = %path.display(),
            images = index.images.len(),
            annotations = index.annotations.len(),
            categories = index.categories.len(),
            "loaded annotation index"
        );
        Ok(index)
    }

    /// Loads annotations from any reader holding COCO JSON.
    ///
    /// # Errors
    ///
    /// Returns a JSON error for malformed input.
    pub fn from_reader<R: Read>(reader: R) -> ConvertResult<Self> {
        let file: CocoFile = serde_json::from_reader(reader)?;
        Ok(Self::build(file))
    }

    fn build(file: CocoFile) -> Self {
        let mut index = Self::default();

        for image in file.images {
            match index.image_pos.get(&image.id) {
                Some(&pos) => index.images[pos] = image,
                None => {
                    index.image_pos.insert(image.id, index.images.len());
                    index.images.push(image);
                }
            }
        }

        for ann in file.annotations {
            if index.annotations.contains_key(&ann.id) {
                index.annotations.insert(ann.id, ann);
                continue;
            }
            index
                .image_annotations
                .entry(ann.image_id)
                .or_default()
                .push(ann.id);
            index.annotations.insert(ann.id, ann);
        }

        index.categories = file
            .categories
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        index
    }

    /// Number of distinct images.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Number of distinct annotations.
    #[must_use]
    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }
}

impl AnnotationSource for CocoIndex {
    fn image_ids(&self) -> Vec<ImageId> {
        self.images.iter().map(|i| i.id).collect()
    }

    fn image_meta(&self, id: ImageId) -> Option<&ImageMeta> {
        self.image_pos.get(&id).map(|&pos| &self.images[pos])
    }

    fn annotation_ids_for_image(&self, id: ImageId) -> &[AnnotationId] {
        self.image_annotations
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn annotation_meta(&self, id: AnnotationId) -> Option<&AnnotationMeta> {
        self.annotations.get(&id)
    }

    fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories.get(&id).map(String::as_str)
    }
}
