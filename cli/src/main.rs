//! camready CLI - camera-ready LaTeX from word-processor manuscripts

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use camready::{
    correct_tables, detect_layout_detailed, encoding, Camready, ConvertOptions, ConvertStep,
    Converter, GeminiCorrector, LayoutMode, LayoutSource, RepairOptions,
};

#[derive(Parser)]
#[command(name = "camready")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert DOCX manuscripts into camera-ready LaTeX papers", long_about = None)]
struct Cli {
    /// Input DOCX file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Publisher LaTeX template
    #[arg(short, long, value_name = "TEX")]
    template: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Skip PDF typesetting
    #[arg(long)]
    no_pdf: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a DOCX file into the template and typeset it
    Convert {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Publisher LaTeX template
        #[arg(short, long, value_name = "TEX")]
        template: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Skip PDF typesetting
        #[arg(long)]
        no_pdf: bool,

        /// Per-pass typesetting timeout in seconds
        #[arg(long, value_name = "SECS", default_value = "120")]
        timeout: u64,

        /// Path prefix written in front of image file names
        #[arg(long, value_name = "PREFIX", default_value = "images/")]
        image_prefix: String,

        /// Force a layout instead of detecting it
        #[arg(long, value_enum)]
        layout: Option<LayoutArg>,

        /// Write a JSON report of the run
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Encoding tried after UTF-8 when reading text (repeatable)
        #[arg(long = "encoding", value_name = "LABEL")]
        encodings: Vec<String>,
    },

    /// Repair tables and figures in an existing LaTeX file
    Repair {
        /// Input LaTeX file
        #[arg(value_name = "TEX")]
        input: PathBuf,

        /// Template used for layout detection
        #[arg(short, long, value_name = "TEX")]
        template: Option<PathBuf>,

        /// Force a layout instead of detecting it
        #[arg(long, value_enum)]
        layout: Option<LayoutArg>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Path prefix written in front of image file names
        #[arg(long, value_name = "PREFIX", default_value = "images/")]
        image_prefix: String,

        /// Only repair tables
        #[arg(long, conflicts_with = "images_only")]
        tables_only: bool,

        /// Only rewrite images
        #[arg(long)]
        images_only: bool,

        /// Encoding tried after UTF-8 when reading the input (repeatable)
        #[arg(long = "encoding", value_name = "LABEL")]
        encodings: Vec<String>,
    },

    /// Show the column layout detected for a template
    Layout {
        /// LaTeX template
        #[arg(value_name = "TEX")]
        template: PathBuf,
    },

    /// Rewrite every content table with Gemini
    AiFix {
        /// Input LaTeX file
        #[arg(value_name = "TEX")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Gemini model
        #[arg(long, default_value = camready::ai::DEFAULT_GEMINI_MODEL)]
        model: String,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    /// One text column
    Single,
    /// Two text columns
    Multi,
}

impl From<LayoutArg> for LayoutMode {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Single => LayoutMode::SingleColumn,
            LayoutArg::Multi => LayoutMode::MultiColumn,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            template,
            output,
            no_pdf,
            timeout,
            image_prefix,
            layout,
            report,
            encodings,
        }) => cmd_convert(
            &input,
            &template,
            output.as_deref(),
            !no_pdf,
            Duration::from_secs(timeout),
            &image_prefix,
            layout,
            report.as_deref(),
            &encodings,
        ),
        Some(Commands::Repair {
            input,
            template,
            layout,
            output,
            image_prefix,
            tables_only,
            images_only,
            encodings,
        }) => cmd_repair(
            &input,
            template.as_deref(),
            layout,
            output.as_deref(),
            &image_prefix,
            !images_only,
            !tables_only,
            &encodings,
        ),
        Some(Commands::Layout { template }) => cmd_layout(&template),
        Some(Commands::AiFix {
            input,
            output,
            api_key,
            model,
        }) => cmd_ai_fix(&input, output.as_deref(), api_key.as_deref(), &model),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => match (cli.input, cli.template) {
            // Default behavior: convert if input and template are provided
            (Some(input), Some(template)) => cmd_convert(
                &input,
                &template,
                cli.output.as_deref(),
                !cli.no_pdf,
                Duration::from_secs(120),
                "images/",
                None,
                None,
                &[],
            ),
            _ => {
                println!(
                    "{}",
                    "Usage: camready <FILE> --template <TEX> [-o DIR]".yellow()
                );
                println!("       camready --help for more information");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_convert(
    input: &Path,
    template: &Path,
    output: Option<&Path>,
    compile_pdf: bool,
    timeout: Duration,
    image_prefix: &str,
    layout: Option<LayoutArg>,
    report_path: Option<&Path>,
    encodings: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("output"));

    let mut repair = RepairOptions::new().with_image_prefix(image_prefix);
    if let Some(layout) = layout {
        repair = repair.with_layout(layout.into());
    }

    let mut options = ConvertOptions::new(input, template)
        .with_output_dir(&output_dir)
        .with_pdf(compile_pdf)
        .with_typeset_timeout(timeout)
        .with_repair(repair);
    if !encodings.is_empty() {
        options = options.with_fallback_encodings(fallback_labels(encodings)?);
    }
    log::debug!("{:?}", options);

    let steps = ConvertStep::ALL.len() as u64 - if compile_pdf { 0 } else { 1 };
    let pb = ProgressBar::new(steps);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut started = false;
    let report = Converter::new(options).convert_with_progress(|step| {
        if started {
            pb.inc(1);
        }
        started = true;
        pb.set_message(step.label());
    });
    let report = match report {
        Ok(report) => report,
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e.into());
        }
    };
    pb.inc(1);
    pb.finish_with_message("Done!");

    println!("\n{}", "Summary:".green().bold());
    println!("  {}: {}", "Layout".bold(), report.layout);
    println!(
        "  {}: {} found, {} cleaned, {} algorithm listings kept",
        "Tables".bold(),
        report.stats.tables_found,
        report.stats.tables_rewritten,
        report.stats.algorithms_skipped
    );
    println!(
        "  {}: {} resized, {} wrapped in figures",
        "Images".bold(),
        report.stats.images_rewritten,
        report.stats.images_wrapped
    );

    println!("\n{}", "Output files:".green().bold());
    let tex_name = report
        .tex_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut lines = vec![tex_name];
    if report.images_dir.is_some() {
        lines.push(format!("images/ ({} files)", report.images_copied));
    }
    if let Some(pdf) = report.pdf_path() {
        lines.push(
            pdf.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
    }
    for (i, line) in lines.iter().enumerate() {
        let branch = if i + 1 == lines.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), line);
    }

    if let Some(typeset) = &report.typeset {
        if !typeset.succeeded() {
            println!(
                "\n{} PDF was not produced; {} is kept for manual fixes",
                "Warning:".yellow().bold(),
                report.tex_path.display()
            );
            for line in &typeset.diagnostics {
                println!("  {}", line.dimmed());
            }
        }
    }

    if let Some(path) = report_path {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("{} {}", "Report saved to".green(), path.display());
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_repair(
    input: &Path,
    template: Option<&Path>,
    layout: Option<LayoutArg>,
    output: Option<&Path>,
    image_prefix: &str,
    tables: bool,
    images: bool,
    encodings: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Camready::new().with_image_prefix(image_prefix);
    if let Some(template) = template {
        builder = builder.with_template(template);
    }
    if let Some(layout) = layout {
        builder = builder.with_layout(layout.into());
    }
    if !tables {
        builder = builder.without_tables();
    }
    if !images {
        builder = builder.without_images();
    }
    if !encodings.is_empty() {
        builder = builder.with_fallback_encodings(fallback_labels(encodings)?);
    }

    let result = builder.repair_file(input)?;

    if let Some(path) = output {
        fs::write(path, &result.content)?;
        println!("{} {}", "Saved to".green(), path.display());
        println!(
            "  {} tables cleaned, {} images resized ({} layout)",
            result.stats.tables_rewritten, result.stats.images_rewritten, result.layout
        );
    } else {
        println!("{}", result.content);
    }

    Ok(())
}

/// Canonical names for user-supplied encoding labels.
fn fallback_labels(labels: &[String]) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut names = Vec::with_capacity(labels.len());
    for label in labels {
        names.push(encoding::validate_label(label)?.to_string());
    }
    Ok(names)
}

fn cmd_layout(template: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !template.is_file() {
        return Err(camready::Error::MissingInput(template.to_path_buf()).into());
    }

    let detection = detect_layout_detailed(template);

    println!("{}", "Template Layout".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Template".bold(), template.display());
    println!("{}: {}", "Layout".bold(), detection.layout);

    let source = match &detection.source {
        LayoutSource::DocumentClass => "\\documentclass options".to_string(),
        LayoutSource::ClassDefaults(path) => format!("\\ExecuteOptions in {}", path.display()),
        LayoutSource::Default => "default (no column option found)".to_string(),
    };
    println!("{}: {}", "Decided by".bold(), source);

    match &detection.class_file {
        Some(path) => println!("{}: {}", "Class file".bold(), path.display()),
        None => println!("{}: {}", "Class file".bold(), "none".dimmed()),
    }

    Ok(())
}

fn cmd_ai_fix(
    input: &Path,
    output: Option<&Path>,
    api_key: Option<&str>,
    model: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.is_file() {
        return Err(camready::Error::MissingInput(input.to_path_buf()).into());
    }

    let text = encoding::read_text(input, encoding::DEFAULT_FALLBACK_ENCODINGS)?.text;
    let corrector = GeminiCorrector::new(api_key.unwrap_or_default())?.with_model(model);
    if !corrector.has_credentials() {
        println!(
            "{} no Gemini API key set (use --api-key or GEMINI_API_KEY); tables are left unchanged",
            "Warning:".yellow().bold()
        );
    }

    let pb = ProgressBar::new_spinner();
    pb.set_message("Correcting tables...");
    pb.enable_steady_tick(Duration::from_millis(120));
    let (content, stats) = correct_tables(&text, &corrector);
    pb.finish_and_clear();

    if let Some(path) = output {
        fs::write(path, &content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }

    eprintln!(
        "{} {} corrected, {} algorithm listings kept, {} failed",
        "Tables:".bold(),
        stats.tables_corrected,
        stats.algorithms_skipped,
        stats.failures
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "camready".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Camera-ready LaTeX from word-processor manuscripts");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/camready".dimmed());
    println!("License: MIT");
}
