//! # camready
//!
//! Turn word-processor manuscripts into camera-ready LaTeX papers.
//!
//! A DOCX manuscript is converted with pandoc, merged into a publisher's
//! LaTeX template and repaired: converter-generated tables are reduced to
//! their data rows and figures are resized for the template's column layout.
//!
//! ## Quick Start
//!
//! ```no_run
//! use camready::{convert_docx, repair_document, LayoutMode};
//!
//! fn main() -> camready::Result<()> {
//!     // Full pipeline: DOCX -> paper.tex (+ images/, paper.pdf)
//!     let report = convert_docx("paper.docx", "template/main.tex", "output")?;
//!     println!("{} tables cleaned", report.stats.tables_rewritten);
//!
//!     // Or repair LaTeX text you already have
//!     let result = repair_document("\\includegraphics{media/fig1.png}", LayoutMode::MultiColumn);
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Layout detection**: `\documentclass` options and class-file defaults
//! - **Table repair**: booktabs rules, minipage headers and pandoc bookkeeping removed
//! - **Algorithm safety**: algorithm listings inside tables are left untouched
//! - **Figure sizing**: width tiers per layout, floats for wide multi-column figures
//! - **AI correction** (feature `ai`): optional Gemini-based table rewriting

pub mod ai;
pub mod convert;
pub mod detect;
pub mod encoding;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use ai::{correct_tables, CorrectionStats, TableCorrector};
#[cfg(feature = "ai")]
pub use ai::GeminiCorrector;
pub use convert::{
    ConvertOptions, ConvertReport, ConvertStep, Converter, Invocation, ProcessOutput,
    ProcessRunner, SystemRunner, TypesetOptions, TypesetOutcome,
};
pub use detect::{
    detect_layout, detect_layout_detailed, detect_layout_from_str, LayoutDetection, LayoutSource,
};
pub use error::{Error, Result};
pub use model::{
    ImageDirective, LayoutMode, SizeTier, TableEnvironment, TableKind, TableRegion, Width,
    WidthUnit,
};
pub use parser::{PatternHeuristics, TableHeuristics};
pub use render::{
    repair, ImageRewriter, NormalizerOptions, RepairOptions, RepairResult, RepairStats,
    TableNormalizer,
};

use std::path::{Path, PathBuf};

/// Normalize every table region in LaTeX text.
///
/// # Example
///
/// ```
/// let text = "\\begin{tabular}{ll}\nA & B \\\\\n1 & 2 \\\\\n\\end{tabular}";
/// let cleaned = camready::normalize_tables(text);
/// assert_eq!(cleaned, "\\begin{tabular}{ll}\n1 & 2 \\\\\n\\end{tabular}");
/// ```
pub fn normalize_tables(text: &str) -> String {
    TableNormalizer::new().normalize(text)
}

/// Rewrite every image directive in LaTeX text for a layout.
///
/// # Example
///
/// ```
/// use camready::{rewrite_images, LayoutMode};
///
/// let text = rewrite_images("\\includegraphics{media/a.png}", LayoutMode::SingleColumn);
/// assert_eq!(text, "\\includegraphics[width=0.8\\textwidth]{images/a.png}");
/// ```
pub fn rewrite_images(text: &str, layout: LayoutMode) -> String {
    ImageRewriter::new(layout).rewrite(text)
}

/// Run both repair passes over LaTeX text with default options.
pub fn repair_document(text: &str, layout: LayoutMode) -> RepairResult {
    repair(text, layout, &RepairOptions::default())
}

/// Run the full DOCX to LaTeX pipeline with default options.
///
/// Writes `paper.tex` and `images/` into `output_dir` and typesets a PDF.
/// Use [`Converter`] directly for finer control.
pub fn convert_docx<P, T, O>(input: P, template: T, output_dir: O) -> Result<ConvertReport>
where
    P: Into<PathBuf>,
    T: Into<PathBuf>,
    O: Into<PathBuf>,
{
    let options = ConvertOptions::new(input, template).with_output_dir(output_dir);
    Converter::new(options).convert()
}

/// Builder API for repairing existing LaTeX files.
///
/// # Example
///
/// ```no_run
/// use camready::Camready;
///
/// let result = Camready::new()
///     .with_template("template/main.tex")
///     .with_image_prefix("figures/")
///     .repair_file("paper.tex")
///     .unwrap();
/// std::fs::write("paper.fixed.tex", &result.content).unwrap();
/// ```
pub struct Camready {
    options: RepairOptions,
    template: Option<PathBuf>,
    fallback_encodings: Vec<String>,
}

impl Camready {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: RepairOptions::default(),
            template: None,
            fallback_encodings: encoding::DEFAULT_FALLBACK_ENCODINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Detect the layout from this template.
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Force a layout, skipping detection.
    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.options = self.options.with_layout(layout);
        self
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options = self.options.with_image_prefix(prefix);
        self
    }

    /// Set the placement of generated figure floats.
    pub fn with_figure_placement(mut self, placement: impl Into<String>) -> Self {
        self.options = self.options.with_figure_placement(placement);
        self
    }

    /// Skip the table pass.
    pub fn without_tables(mut self) -> Self {
        self.options = self.options.with_tables(false);
        self
    }

    /// Skip the image pass.
    pub fn without_images(mut self) -> Self {
        self.options = self.options.with_images(false);
        self
    }

    /// Set table normalizer options.
    pub fn with_normalizer(mut self, normalizer: NormalizerOptions) -> Self {
        self.options = self.options.with_normalizer(normalizer);
        self
    }

    /// Replace the encodings tried after UTF-8.
    pub fn with_fallback_encodings<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_encodings = labels.into_iter().map(Into::into).collect();
        self
    }

    /// The layout these settings resolve to.
    pub fn layout(&self) -> LayoutMode {
        match (self.options.layout, &self.template) {
            (Some(layout), _) => layout,
            (None, Some(template)) => detect_layout(template),
            (None, None) => LayoutMode::default(),
        }
    }

    /// Repair LaTeX text.
    pub fn repair_str(&self, text: &str) -> RepairResult {
        repair(text, self.layout(), &self.options)
    }

    /// Read and repair a LaTeX file.
    pub fn repair_file<P: AsRef<Path>>(&self, path: P) -> Result<RepairResult> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let decoded = encoding::read_text(path, self.fallback_encodings.as_slice())?;
        Ok(self.repair_str(&decoded.text))
    }
}

impl Default for Camready {
    fn default() -> Self {
        Self::new()
    }
}
