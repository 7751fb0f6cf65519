//! DOCX to camera-ready LaTeX pipeline.
//!
//! [`Converter`] drives the external converter and typesetter through a
//! [`ProcessRunner`], merges the result into a publisher template and runs the
//! repair passes in between.
//!
//! # Example
//!
//! ```no_run
//! use camready::convert::{ConvertOptions, Converter};
//!
//! fn main() -> camready::Result<()> {
//!     let options = ConvertOptions::new("paper.docx", "template/main.tex")
//!         .with_output_dir("camera_ready")
//!         .with_pdf(false);
//!
//!     let report = Converter::new(options).convert()?;
//!     println!("{}", report.tex_path.display());
//!     Ok(())
//! }
//! ```

mod pandoc;
mod process;
mod template;
mod typeset;

pub use pandoc::{
    collect_extracted_media, conversion_invocation, convert_document, extract_media,
    CONVERTED_FILE, EXTRACTED_MEDIA_DIR,
};
pub use process::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};
pub use template::{
    document_body, ensure_packages, extract_preamble, has_package, merge_document, BEGIN_DOCUMENT,
    DEFAULT_REQUIRED_PACKAGES,
};
pub use typeset::{key_diagnostics, output_tail, typeset, TypesetOptions, TypesetOutcome};

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use crate::detect::detect_layout;
use crate::encoding::{read_text, DEFAULT_FALLBACK_ENCODINGS};
use crate::error::{Error, Result};
use crate::model::LayoutMode;
use crate::render::{repair, RepairOptions, RepairStats};

/// Name of the images directory in the work and output directories.
pub const IMAGES_DIR: &str = "images";

/// Options for the conversion pipeline.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Source word-processor document
    pub input: PathBuf,

    /// Publisher LaTeX template
    pub template: PathBuf,

    /// Directory receiving the merged file and images
    pub output_dir: PathBuf,

    /// Stem of the merged file (`paper` writes `paper.tex`)
    pub output_name: String,

    /// Typeset the merged file into a PDF
    pub compile_pdf: bool,

    /// Converter program
    pub converter: String,

    /// Timeout for the converter
    pub convert_timeout: Option<Duration>,

    /// Typesetting settings
    pub typeset: TypesetOptions,

    /// Repair pass options
    pub repair: RepairOptions,

    /// Packages appended to the template preamble when missing
    pub required_packages: Vec<String>,

    /// Encodings tried after UTF-8 when reading text
    pub fallback_encodings: Vec<String>,
}

impl ConvertOptions {
    /// Create options for converting `input` into `template`.
    pub fn new(input: impl Into<PathBuf>, template: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            template: template.into(),
            ..Self::default()
        }
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the merged file stem.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Enable or disable PDF typesetting.
    pub fn with_pdf(mut self, compile: bool) -> Self {
        self.compile_pdf = compile;
        self
    }

    /// Set the converter program.
    pub fn with_converter(mut self, program: impl Into<String>) -> Self {
        self.converter = program.into();
        self
    }

    /// Set the converter timeout.
    pub fn with_convert_timeout(mut self, timeout: Duration) -> Self {
        self.convert_timeout = Some(timeout);
        self
    }

    /// Set the typesetter program.
    pub fn with_typesetter(mut self, program: impl Into<String>) -> Self {
        self.typeset.program = program.into();
        self
    }

    /// Set the per-pass typesetting timeout.
    pub fn with_typeset_timeout(mut self, timeout: Duration) -> Self {
        self.typeset.timeout = timeout;
        self
    }

    /// Set the number of typesetting passes.
    pub fn with_typeset_passes(mut self, passes: u32) -> Self {
        self.typeset.passes = passes;
        self
    }

    /// Set repair options.
    pub fn with_repair(mut self, repair: RepairOptions) -> Self {
        self.repair = repair;
        self
    }

    /// Replace the list of required packages.
    pub fn with_required_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the fallback encodings.
    pub fn with_fallback_encodings<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_encodings = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Path of the merged LaTeX file.
    pub fn tex_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.tex", self.output_name))
    }

    /// Programs that must be installed for these options.
    pub fn required_programs(&self) -> Vec<&str> {
        let mut programs = vec![self.converter.as_str()];
        if self.compile_pdf {
            programs.push(self.typeset.program.as_str());
        }
        programs
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            template: PathBuf::new(),
            output_dir: PathBuf::from("output"),
            output_name: "paper".to_string(),
            compile_pdf: true,
            converter: "pandoc".to_string(),
            convert_timeout: Some(Duration::from_secs(300)),
            typeset: TypesetOptions::default(),
            repair: RepairOptions::default(),
            required_packages: DEFAULT_REQUIRED_PACKAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fallback_encodings: DEFAULT_FALLBACK_ENCODINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Pipeline steps, reported to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertStep {
    /// Checking external tools and inputs
    Prepare,
    /// Extracting embedded media
    ExtractMedia,
    /// Running the converter
    Convert,
    /// Merging into the template
    Merge,
    /// Running table and image repair
    Repair,
    /// Writing the merged file and images
    Write,
    /// Typesetting the PDF
    Typeset,
}

impl ConvertStep {
    /// Every step in pipeline order.
    pub const ALL: [ConvertStep; 7] = [
        ConvertStep::Prepare,
        ConvertStep::ExtractMedia,
        ConvertStep::Convert,
        ConvertStep::Merge,
        ConvertStep::Repair,
        ConvertStep::Write,
        ConvertStep::Typeset,
    ];

    /// Short progress label.
    pub fn label(&self) -> &'static str {
        match self {
            ConvertStep::Prepare => "Checking dependencies...",
            ConvertStep::ExtractMedia => "Extracting images...",
            ConvertStep::Convert => "Converting document...",
            ConvertStep::Merge => "Merging into template...",
            ConvertStep::Repair => "Repairing tables and figures...",
            ConvertStep::Write => "Writing output...",
            ConvertStep::Typeset => "Typesetting PDF...",
        }
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    /// Merged LaTeX file
    pub tex_path: PathBuf,
    /// Copied images directory, if any images existed
    pub images_dir: Option<PathBuf>,
    /// Number of images copied
    pub images_copied: usize,
    /// Layout used for image rewriting
    pub layout: LayoutMode,
    /// Repair statistics
    pub stats: RepairStats,
    /// Typesetting result, when typesetting was enabled
    pub typeset: Option<TypesetOutcome>,
}

impl ConvertReport {
    /// Produced PDF, if any.
    pub fn pdf_path(&self) -> Option<&Path> {
        self.typeset.as_ref().and_then(|t| t.pdf.as_deref())
    }
}

/// Runs the conversion pipeline.
pub struct Converter<R: ProcessRunner = SystemRunner> {
    options: ConvertOptions,
    runner: R,
}

impl Converter<SystemRunner> {
    /// Create a converter that runs real child processes.
    pub fn new(options: ConvertOptions) -> Self {
        Self::with_runner(options, SystemRunner::new())
    }
}

impl<R: ProcessRunner> Converter<R> {
    /// Create a converter with a custom process runner.
    pub fn with_runner(options: ConvertOptions, runner: R) -> Self {
        Self { options, runner }
    }

    /// Pipeline options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Fail with [`Error::MissingDependency`] if a required program is absent.
    pub fn check_dependencies(&self) -> Result<()> {
        for program in self.options.required_programs() {
            match self.runner.locate(program) {
                Some(path) => log::debug!("Found {} at {}", program, path.display()),
                None => return Err(Error::MissingDependency(program.to_string())),
            }
        }
        Ok(())
    }

    /// Fail with [`Error::MissingInput`] if the document or template is absent.
    pub fn check_inputs(&self) -> Result<()> {
        for path in [&self.options.input, &self.options.template] {
            if !path.is_file() {
                return Err(Error::MissingInput(path.clone()));
            }
        }
        Ok(())
    }

    /// Run the whole pipeline.
    pub fn convert(&self) -> Result<ConvertReport> {
        self.convert_with_progress(|_| {})
    }

    /// Run the whole pipeline, calling `progress` as each step starts.
    pub fn convert_with_progress<F>(&self, mut progress: F) -> Result<ConvertReport>
    where
        F: FnMut(ConvertStep),
    {
        let options = &self.options;

        progress(ConvertStep::Prepare);
        self.check_dependencies()?;
        self.check_inputs()?;

        let work = tempfile::Builder::new().prefix("camready-").tempdir()?;
        fs::create_dir_all(&options.output_dir)?;
        log::debug!("Working in {}", work.path().display());

        progress(ConvertStep::ExtractMedia);
        let work_images = work.path().join(IMAGES_DIR);
        match extract_media(&options.input, &work_images) {
            Ok(count) => log::info!("Extracted {} embedded images", count),
            Err(e) => log::warn!("Cannot extract images from {}: {}", options.input.display(), e),
        }

        progress(ConvertStep::Convert);
        let converted_path = convert_document(
            &self.runner,
            &options.converter,
            &options.input,
            work.path(),
            options.convert_timeout,
        )?;
        match collect_extracted_media(work.path(), &work_images) {
            Ok(0) => {}
            Ok(count) => {
                log::info!("Collected {} images extracted by {}", count, options.converter)
            }
            Err(e) => log::warn!("Cannot collect extracted media: {}", e),
        }
        let converted = read_text(&converted_path, options.fallback_encodings.as_slice())?.text;

        progress(ConvertStep::Merge);
        let template = read_text(&options.template, options.fallback_encodings.as_slice())?.text;
        let preamble = extract_preamble(&template);
        let merged = merge_document(&preamble, &converted, options.required_packages.as_slice());

        progress(ConvertStep::Repair);
        let layout = options
            .repair
            .layout
            .unwrap_or_else(|| detect_layout(&options.template));
        let repaired = repair(&merged, layout, &options.repair);

        progress(ConvertStep::Write);
        let tex_path = options.tex_path();
        fs::write(&tex_path, &repaired.content)?;
        log::info!("Wrote {}", tex_path.display());

        let images_dir = options.output_dir.join(IMAGES_DIR);
        let images_copied = if has_entries(&work_images) {
            if images_dir.exists() {
                fs::remove_dir_all(&images_dir)?;
            }
            let copied = copy_dir(&work_images, &images_dir)?;
            log::info!("Copied {} images to {}", copied, images_dir.display());
            copied
        } else {
            0
        };

        let typeset = if options.compile_pdf {
            progress(ConvertStep::Typeset);
            Some(typeset(&self.runner, &tex_path, &options.typeset))
        } else {
            None
        };

        Ok(ConvertReport {
            tex_path,
            images_dir: (images_copied > 0).then_some(images_dir),
            images_copied,
            layout: repaired.layout,
            stats: repaired.stats,
            typeset,
        })
    }
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Recursively copy `src` into `dest`. Returns the number of files copied.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Other(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            count += 1;
        }
    }
    Ok(count)
}
