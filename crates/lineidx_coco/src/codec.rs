//! Image decoding and JPEG re-encoding.

use crate::error::ConvertResult;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use tracing::debug;

/// Default JPEG quality, matching common OpenCV defaults.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Decodes source images and re-encodes them for the payload table.
pub trait ImageCodec {
    /// Decoded pixel buffer.
    type Image;

    /// Decodes the image at `path`.
    ///
    /// Returns `None` if the file is missing or cannot be decoded; the
    /// driver then skips the image instead of failing.
    fn decode(&self, path: &Path) -> Option<Self::Image>;

    /// Returns `(width, height)` in pixels.
    fn dimensions(&self, image: &Self::Image) -> (u32, u32);

    /// Encodes the image as JPEG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    fn encode_jpeg(&self, image: &Self::Image) -> ConvertResult<Vec<u8>>;
}

/// [`ImageCodec`] backed by the `image` crate.
///
/// Formats are detected from file content, not the extension.
#[derive(Debug, Clone, Copy)]
pub struct JpegCodec {
    quality: u8,
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl JpegCodec {
    /// Creates a codec with the given JPEG quality (1..=100).
    #[must_use]
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    /// JPEG quality used by [`ImageCodec::encode_jpeg`].
    #[must_use]
    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl ImageCodec for JpegCodec {
    type Image = DynamicImage;

    fn decode(&self, path: &Path) -> Option<DynamicImage> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "image not readable");
                return None;
            }
        };
        match image::load_from_memory(&bytes) {
            Ok(image) => Some(image),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "image not decodable");
                None
            }
        }
    }

    fn dimensions(&self, image: &DynamicImage) -> (u32, u32) {
        GenericImageView::dimensions(image)
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> ConvertResult<Vec<u8>> {
        let rgb = image.to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality).encode_image(&rgb)?;
        Ok(out)
    }
}
