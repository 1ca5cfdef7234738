//! Annotation source interface and the records it yields.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw id value.
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of an image in the annotation file.
    ImageId
);
id_type!(
    /// Identifier of a single annotation.
    AnnotationId
);
id_type!(
    /// Identifier of a category.
    CategoryId
);

/// Image entry of an annotation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    /// Image id.
    pub id: ImageId,
    /// Path of the image as recorded by the dataset, usually relative.
    pub file_name: String,
    /// Recorded width, if any.
    #[serde(default)]
    pub width: Option<u32>,
    /// Recorded height, if any.
    #[serde(default)]
    pub height: Option<u32>,
}

/// Annotation entry of an annotation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationMeta {
    /// Annotation id.
    pub id: AnnotationId,
    /// Image the annotation belongs to.
    pub image_id: ImageId,
    /// Category of the annotated object.
    pub category_id: CategoryId,
    /// 1 for crowd regions, 0 otherwise.
    #[serde(default)]
    pub iscrowd: i64,
    /// Area of the object in pixels.
    #[serde(default)]
    pub area: f64,
    /// Bounding box as `[x, y, width, height]`.
    #[serde(default)]
    pub bbox: Vec<f64>,
}

/// Category entry of an annotation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    pub id: CategoryId,
    /// Human-readable class name.
    pub name: String,
}

/// Read access to a detection dataset's annotations.
///
/// [`crate::CocoIndex`] implements it over a COCO JSON file; tests and other
/// formats can supply their own.
pub trait AnnotationSource {
    /// Every image id, in dataset order.
    fn image_ids(&self) -> Vec<ImageId>;

    /// Metadata of an image.
    fn image_meta(&self, id: ImageId) -> Option<&ImageMeta>;

    /// Annotations of an image, in dataset order. Empty if it has none.
    fn annotation_ids_for_image(&self, id: ImageId) -> &[AnnotationId];

    /// Metadata of an annotation.
    fn annotation_meta(&self, id: AnnotationId) -> Option<&AnnotationMeta>;

    /// Name of a category.
    fn category_name(&self, id: CategoryId) -> Option<&str>;
}
