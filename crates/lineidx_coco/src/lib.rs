//! # lineidx COCO
//!
//! Converts a COCO detection dataset into line-indexed row tables.
//!
//! For a split named `train` the output directory receives:
//! - `train.tsv` - `[image id, base64 JPEG]`
//! - `train.label.tsv` - `[image id, JSON labels]`
//! - `train.hw.tsv` - `[image id, JSON [{height, width}]]`
//! - `train.linelist.tsv` - row numbers of images worth training on
//!
//! each with its `.lineidx` offset file. Row `i` of the first three
//! tables describes the same image.
//!
//! Annotations come from an [`AnnotationSource`] ([`CocoIndex`] for COCO
//! JSON) and pixels from an [`ImageSource`] ([`FsImageSource`] for a
//! directory of image files).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod annotation;
mod coco;
mod codec;
mod config;
mod convert;
mod error;
mod label;
mod source;

pub use annotation::{
    AnnotationId, AnnotationMeta, AnnotationSource, Category, CategoryId, ImageId, ImageMeta,
};
pub use coco::CocoIndex;
pub use codec::{ImageCodec, JpegCodec, DEFAULT_JPEG_QUALITY};
pub use config::{ConvertConfig, ConvertOutputs, DEFAULT_BATCH_SIZE, DEFAULT_SPLIT};
pub use convert::{ConvertSummary, Converter};
pub use error::{ConvertError, ConvertResult};
pub use label::{label_record, labels_for_image, payload_record, size_record, ImageSize, Label};
pub use source::{FsImageSource, ImageSource, LoadedImage};
