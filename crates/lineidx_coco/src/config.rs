//! Conversion settings.

use crate::error::{ConvertError, ConvertResult};
use lineidx_core::{AppendConfig, SelectionConfig, TablePaths};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Default number of source images between flushes.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default split name, used as the file stem of every output table.
pub const DEFAULT_SPLIT: &str = "train";

/// Settings of one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Directory receiving the output tables.
    pub output_dir: PathBuf,

    /// Directory holding the source images.
    pub image_root: PathBuf,

    /// Split name, e.g. `train` or `val`.
    pub split: String,

    /// Source images between flushes, skipped images included.
    ///
    /// Trades memory for fewer writes; the output does not depend on it.
    pub batch_size: usize,

    /// Label attributes that make a label ignorable in the selection list.
    pub ignore_attrs: Vec<String>,

    /// Selection list path; defaults to `<split>.linelist.tsv`.
    pub linelist_path: Option<PathBuf>,

    /// Resume existing tables instead of recreating them.
    pub append: bool,

    /// Settings for the three output appenders.
    pub append_config: AppendConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            image_root: PathBuf::from("."),
            split: DEFAULT_SPLIT.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            ignore_attrs: Vec::new(),
            linelist_path: None,
            append: false,
            append_config: AppendConfig::default(),
        }
    }
}

impl ConvertConfig {
    /// Creates a configuration writing to `output_dir` and reading images
    /// from `image_root`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, image_root: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            image_root: image_root.into(),
            ..Self::default()
        }
    }

    /// Sets the split name.
    #[must_use]
    pub fn split(mut self, split: impl Into<String>) -> Self {
        self.split = split.into();
        self
    }

    /// Sets the flush cadence.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the ignorable label attributes.
    #[must_use]
    pub fn ignore_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_attrs = attrs.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides the selection list path.
    #[must_use]
    pub fn linelist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.linelist_path = Some(path.into());
        self
    }

    /// Sets append mode.
    #[must_use]
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Sets the appender configuration.
    #[must_use]
    pub fn append_config(mut self, config: AppendConfig) -> Self {
        self.append_config = config;
        self
    }

    /// Checks the settings before any file is touched.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidConfig`] for a zero batch size or a
    /// split name that is empty or contains a path separator.
    pub fn validate(&self) -> ConvertResult<()> {
        if self.batch_size == 0 {
            return Err(ConvertError::invalid_config("batch size must be at least 1"));
        }
        if self.split.is_empty() {
            return Err(ConvertError::invalid_config("split name is empty"));
        }
        if Path::new(&self.split).file_name() != Some(OsStr::new(&self.split)) {
            return Err(ConvertError::invalid_config(format!(
                "split name {:?} must be a plain file stem",
                self.split
            )));
        }
        Ok(())
    }

    /// Paths of every output table.
    #[must_use]
    pub fn outputs(&self) -> ConvertOutputs {
        let table = |suffix: &str| {
            TablePaths::new(self.output_dir.join(format!("{}{suffix}", self.split)))
        };
        let linelist = self
            .linelist_path
            .clone()
            .map_or_else(|| table(".linelist.tsv"), TablePaths::new);
        ConvertOutputs {
            payload: table(".tsv"),
            labels: table(".label.tsv"),
            sizes: table(".hw.tsv"),
            linelist,
        }
    }

    /// Selection settings derived from this configuration.
    #[must_use]
    pub fn selection(&self) -> SelectionConfig {
        SelectionConfig::new().ignore_attrs(self.ignore_attrs.iter().cloned())
    }
}

/// Output tables of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOutputs {
    /// `[image id, base64 JPEG]`.
    pub payload: TablePaths,
    /// `[image id, JSON labels]`.
    pub labels: TablePaths,
    /// `[image id, JSON [{height, width}]]`.
    pub sizes: TablePaths,
    /// Row numbers of selected label rows.
    pub linelist: TablePaths,
}
