//! Page layout detection from a LaTeX template.
//!
//! The `\documentclass` options are consulted first. When they name no column
//! mode, the `\ExecuteOptions` defaults of a class file shipped next to the
//! template decide. Anything else is single-column.

use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::encoding::{read_text, DEFAULT_FALLBACK_ENCODINGS};
use crate::model::LayoutMode;

/// Where a detected layout came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSource {
    /// An explicit `\documentclass` option
    DocumentClass,
    /// `\ExecuteOptions` in a class file
    ClassDefaults(PathBuf),
    /// Nothing matched
    Default,
}

/// Result of layout detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDetection {
    /// Detected layout mode
    pub layout: LayoutMode,
    /// Which rule decided the layout
    pub source: LayoutSource,
    /// Class file found next to the template, if any
    pub class_file: Option<PathBuf>,
}

/// Remove LaTeX comments. A `%` preceded by an odd number of backslashes is
/// literal and kept.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut backslashes = 0usize;
        let mut cut = line.len();
        for (pos, ch) in line.char_indices() {
            if ch == '%' && backslashes % 2 == 0 {
                cut = pos;
                break;
            }
            if ch == '\\' {
                backslashes += 1;
            } else {
                backslashes = 0;
            }
        }
        out.push_str(&line[..cut]);
    }
    out
}

/// First column mode named in a comma-separated option list.
fn first_mode(options: &str) -> Option<LayoutMode> {
    options
        .split(',')
        .map(str::trim)
        .find_map(LayoutMode::from_option)
}

/// Layout named by the `\documentclass[...]` options of a template.
pub fn layout_from_document_class(template: &str) -> Option<LayoutMode> {
    let re = Regex::new(r"\\documentclass\s*\[([^\]]*)\]").unwrap();
    let source = strip_comments(template);
    let caps = re.captures(&source)?;
    first_mode(&caps[1])
}

/// Layout selected by the `\ExecuteOptions` directives of a class file.
///
/// The first directive that names a mode wins.
pub fn layout_from_class_defaults(class_source: &str) -> Option<LayoutMode> {
    let re = Regex::new(r"\\ExecuteOptions\s*\{([^}]*)\}").unwrap();
    let source = strip_comments(class_source);
    let mode = re.captures_iter(&source).find_map(|caps| first_mode(&caps[1]));
    mode
}

/// Detect the layout from template text and optional class-file text.
pub fn detect_layout_from_str(template: &str, class_source: Option<&str>) -> LayoutMode {
    layout_from_document_class(template)
        .or_else(|| class_source.and_then(layout_from_class_defaults))
        .unwrap_or_default()
}

/// Find the first `.cls` file in `dir`, then in its immediate subdirectories.
///
/// Entries are visited in file-name order.
pub fn find_class_file(dir: &Path) -> Option<PathBuf> {
    (1..=2).find_map(|depth| {
        WalkDir::new(dir)
            .min_depth(depth)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| entry.file_type().is_file() && is_class_file(entry.path()))
            .map(|entry| entry.into_path())
    })
}

fn is_class_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("cls"))
        .unwrap_or(false)
}

fn template_dir(template_path: &Path) -> PathBuf {
    match template_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Detect the layout of a template file and report how it was decided.
///
/// Unreadable files count as "no match"; this never fails.
pub fn detect_layout_detailed<P: AsRef<Path>>(template_path: P) -> LayoutDetection {
    let template_path = template_path.as_ref();

    match read_text(template_path, DEFAULT_FALLBACK_ENCODINGS) {
        Ok(decoded) => {
            if let Some(layout) = layout_from_document_class(&decoded.text) {
                log::info!("Layout {} from \\documentclass options", layout);
                return LayoutDetection {
                    layout,
                    source: LayoutSource::DocumentClass,
                    class_file: find_class_file(&template_dir(template_path)),
                };
            }
        }
        Err(e) => log::warn!("Cannot read template {}: {}", template_path.display(), e),
    }

    let class_file = find_class_file(&template_dir(template_path));
    if let Some(path) = &class_file {
        match read_text(path, DEFAULT_FALLBACK_ENCODINGS) {
            Ok(decoded) => {
                if let Some(layout) = layout_from_class_defaults(&decoded.text) {
                    log::info!("Layout {} from class defaults in {}", layout, path.display());
                    return LayoutDetection {
                        layout,
                        source: LayoutSource::ClassDefaults(path.clone()),
                        class_file,
                    };
                }
            }
            Err(e) => log::warn!("Cannot read class file {}: {}", path.display(), e),
        }
    }

    log::info!("No column option found, assuming {}", LayoutMode::default());
    LayoutDetection {
        layout: LayoutMode::default(),
        source: LayoutSource::Default,
        class_file,
    }
}

/// Detect the layout of a template file.
pub fn detect_layout<P: AsRef<Path>>(template_path: P) -> LayoutMode {
    detect_layout_detailed(template_path).layout
}
