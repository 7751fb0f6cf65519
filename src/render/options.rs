//! Repair options and configuration.

use crate::model::LayoutMode;

/// Directives whose lines are dropped from content tables.
pub const DEFAULT_STRIP_DIRECTIVES: &[&str] = &[
    "\\toprule",
    "\\midrule",
    "\\bottomrule",
    "\\noalign",
    "\\endhead",
    "\\endfirsthead",
    "\\endfoot",
    "\\endlastfoot",
    "\\hline",
    "\\cline",
    "\\cmidrule",
    "\\addlinespace",
];

/// Options for the table normalizer.
#[derive(Debug, Clone)]
pub struct NormalizerOptions {
    /// Lines starting with one of these directives are removed
    pub strip_directives: Vec<String>,

    /// Remove embedded `minipage` blocks before line cleanup
    pub remove_minipages: bool,

    /// Drop the first line whose separator count matches the column count
    pub drop_header: bool,
}

impl NormalizerOptions {
    /// Create normalizer options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list of stripped directives.
    pub fn with_strip_directives<I, S>(mut self, directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strip_directives = directives.into_iter().map(Into::into).collect();
        self
    }

    /// Add one directive to the strip list.
    pub fn strip_directive(mut self, directive: impl Into<String>) -> Self {
        self.strip_directives.push(directive.into());
        self
    }

    /// Enable or disable minipage removal.
    pub fn with_minipage_removal(mut self, remove: bool) -> Self {
        self.remove_minipages = remove;
        self
    }

    /// Enable or disable header-line dropping.
    pub fn with_header_drop(mut self, drop: bool) -> Self {
        self.drop_header = drop;
        self
    }

    /// Check if a trimmed line starts with a stripped directive.
    pub fn is_stripped(&self, trimmed: &str) -> bool {
        self.strip_directives
            .iter()
            .any(|directive| trimmed.starts_with(directive.as_str()))
    }
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            strip_directives: DEFAULT_STRIP_DIRECTIVES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            remove_minipages: true,
            drop_header: true,
        }
    }
}

/// Options for the repair passes.
#[derive(Debug, Clone)]
pub struct RepairOptions {
    /// Directory prefix written in front of every image file name
    pub image_prefix: String,

    /// Placement specifier for generated figure environments
    pub figure_placement: String,

    /// Layout to use instead of detecting one from the template
    pub layout: Option<LayoutMode>,

    /// Table normalizer options
    pub normalizer: NormalizerOptions,

    /// Run the table normalizer
    pub repair_tables: bool,

    /// Run the image rewriter
    pub rewrite_images: bool,
}

impl RepairOptions {
    /// Create new repair options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_prefix = prefix.into();
        self
    }

    /// Set the figure placement specifier (e.g. `htbp`).
    pub fn with_figure_placement(mut self, placement: impl Into<String>) -> Self {
        self.figure_placement = placement.into();
        self
    }

    /// Force a layout mode.
    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Set normalizer options.
    pub fn with_normalizer(mut self, normalizer: NormalizerOptions) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Enable or disable the table pass.
    pub fn with_tables(mut self, enabled: bool) -> Self {
        self.repair_tables = enabled;
        self
    }

    /// Enable or disable the image pass.
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.rewrite_images = enabled;
        self
    }
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            image_prefix: "images/".to_string(),
            figure_placement: "htbp".to_string(),
            layout: None,
            normalizer: NormalizerOptions::default(),
            repair_tables: true,
            rewrite_images: true,
        }
    }
}
