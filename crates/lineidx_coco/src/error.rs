//! Error types for dataset conversion.

use crate::annotation::{AnnotationId, CategoryId, ImageId};
use std::io;
use thiserror::Error;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors that abort a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Row table error.
    #[error("table error: {0}")]
    Table(#[from] lineidx_core::TableError),

    /// Annotation file or label JSON could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Re-encoding a decoded image failed.
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    /// An image id has no metadata.
    #[error("image {id} has no metadata")]
    MissingImage {
        /// The image id.
        id: ImageId,
    },

    /// An annotation id has no metadata.
    #[error("annotation {id} has no metadata")]
    MissingAnnotation {
        /// The annotation id.
        id: AnnotationId,
    },

    /// A category id has no name.
    #[error("category {id} is not defined")]
    MissingCategory {
        /// The category id.
        id: CategoryId,
    },

    /// The conversion settings are unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl ConvertError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
