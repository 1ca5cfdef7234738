//! Appender and selection configuration.

/// Configuration for incremental appends.
#[derive(Debug, Clone)]
pub struct AppendConfig {
    /// Whether each flush syncs the data file before appending index
    /// entries, and syncs the index afterwards.
    ///
    /// With this off a flush only hands bytes to the OS; a crash may then
    /// lose already-flushed rows.
    pub sync_on_flush: bool,
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            sync_on_flush: true,
        }
    }
}

impl AppendConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether flushes sync to storage.
    #[must_use]
    pub const fn sync_on_flush(mut self, value: bool) -> Self {
        self.sync_on_flush = value;
        self
    }
}

/// Configuration for building a selection list.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Zero-based field holding the JSON label array.
    pub label_field: usize,

    /// Rows whose labels all carry one of these attributes set truthy are
    /// left out.
    pub ignore_attrs: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            label_field: 1,
            ignore_attrs: Vec::new(),
        }
    }
}

impl SelectionConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label field position.
    #[must_use]
    pub fn label_field(mut self, field: usize) -> Self {
        self.label_field = field;
        self
    }

    /// Sets the attributes that mark a label as ignorable.
    #[must_use]
    pub fn ignore_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_attrs = attrs.into_iter().map(Into::into).collect();
        self
    }
}
