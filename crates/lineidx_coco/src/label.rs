//! Rows of the three tables produced per image.

use crate::annotation::{AnnotationId, AnnotationSource, ImageId};
use crate::error::{ConvertError, ConvertResult};
use lineidx_core::{Field, Record};
use serde::{Deserialize, Serialize};

/// One object label as stored in the label table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Crowd flag copied from the annotation.
    pub iscrowd: i64,
    /// Annotation id.
    pub id: AnnotationId,
    /// Object area in pixels.
    pub area: f64,
    /// Category name.
    pub class: String,
    /// Bounding box `[x, y, width, height]`.
    pub rect: Vec<f64>,
}

/// Image dimensions as stored in the dims table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Height in pixels.
    pub height: u32,
    /// Width in pixels.
    pub width: u32,
}

/// Collects the labels of an image in annotation order.
///
/// # Errors
///
/// Returns [`ConvertError::MissingAnnotation`] or
/// [`ConvertError::MissingCategory`] for dangling references.
pub fn labels_for_image<A: AnnotationSource + ?Sized>(
    source: &A,
    image: ImageId,
) -> ConvertResult<Vec<Label>> {
    source
        .annotation_ids_for_image(image)
        .iter()
        .map(|&id| {
            let ann = source
                .annotation_meta(id)
                .ok_or(ConvertError::MissingAnnotation { id })?;
            let class = source
                .category_name(ann.category_id)
                .ok_or(ConvertError::MissingCategory {
                    id: ann.category_id,
                })?;
            Ok(Label {
                iscrowd: ann.iscrowd,
                id: ann.id,
                area: ann.area,
                class: class.to_owned(),
                rect: ann.bbox.clone(),
            })
        })
        .collect()
}

/// `[image id, base64 JPEG]`.
#[must_use]
pub fn payload_record(image: ImageId, jpeg: &[u8]) -> Record {
    Record::new(vec![Field::text(image.to_string()), Field::from_bytes(jpeg)])
}

/// `[image id, JSON label array]`.
///
/// # Errors
///
/// Returns a JSON error if serialization fails.
pub fn label_record(image: ImageId, labels: &[Label]) -> ConvertResult<Record> {
    Ok(Record::new(vec![
        Field::text(image.to_string()),
        Field::text(serde_json::to_string(labels)?),
    ]))
}

/// `[image id, JSON [{height, width}]]`.
///
/// # Errors
///
/// Returns a JSON error if serialization fails.
pub fn size_record(image: ImageId, size: ImageSize) -> ConvertResult<Record> {
    Ok(Record::new(vec![
        Field::text(image.to_string()),
        Field::text(serde_json::to_string(&[size])?),
    ]))
}
