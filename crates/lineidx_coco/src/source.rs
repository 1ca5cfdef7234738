//! Resolves dataset images on disk.

use crate::codec::{ImageCodec, JpegCodec};
use crate::error::ConvertResult;
use std::path::{Path, PathBuf};

/// An image ready to be written: re-encoded bytes plus its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// JPEG bytes.
    pub jpeg: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Supplies images by the file name recorded in the annotations.
pub trait ImageSource {
    /// Loads and re-encodes the image named `file_name`.
    ///
    /// `Ok(None)` means the image is unreadable and its row is skipped.
    ///
    /// # Errors
    ///
    /// Errors abort the conversion; use them only for failures that are not
    /// about this one image.
    fn load(&self, file_name: &str) -> ConvertResult<Option<LoadedImage>>;
}

/// [`ImageSource`] over a directory of image files.
///
/// Only the base name of `file_name` is used, so datasets recording
/// paths like `images/v1/patch0/a.jpg` resolve to `root/a.jpg`.
#[derive(Debug, Clone)]
pub struct FsImageSource<C = JpegCodec> {
    root: PathBuf,
    codec: C,
}

impl FsImageSource<JpegCodec> {
    /// Creates a source rooted at `root` with the default codec.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_codec(root, JpegCodec::default())
    }
}

impl<C: ImageCodec> FsImageSource<C> {
    /// Creates a source rooted at `root` using `codec`.
    pub fn with_codec(root: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            root: root.into(),
            codec,
        }
    }

    /// Image directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an image name resolves to.
    #[must_use]
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        let base = Path::new(file_name)
            .file_name()
            .map_or_else(|| Path::new(file_name), Path::new);
        self.root.join(base)
    }
}

impl<C: ImageCodec> ImageSource for FsImageSource<C> {
    fn load(&self, file_name: &str) -> ConvertResult<Option<LoadedImage>> {
        let Some(image) = self.codec.decode(&self.resolve(file_name)) else {
            return Ok(None);
        };
        let (width, height) = self.codec.dimensions(&image);
        let jpeg = self.codec.encode_jpeg(&image)?;
        Ok(Some(LoadedImage {
            jpeg,
            width,
            height,
        }))
    }
}
