//! PDF typesetting with pdflatex.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::process::{Invocation, ProcessRunner};

/// Markers of log lines worth showing from a failed pass, matched lowercase.
const KEY_MARKERS: &[&str] = &["error", "undefined", "missing", "emergency stop"];

/// Number of key lines reported per failed pass.
pub const MAX_KEY_LINES: usize = 5;

/// Characters of output shown after a failed final pass.
pub const OUTPUT_TAIL_CHARS: usize = 800;

/// Typesetting settings.
#[derive(Debug, Clone)]
pub struct TypesetOptions {
    /// Typesetter program
    pub program: String,
    /// Number of passes (cross references settle on the second)
    pub passes: u32,
    /// Per-pass timeout
    pub timeout: Duration,
}

impl Default for TypesetOptions {
    fn default() -> Self {
        Self {
            program: "pdflatex".to_string(),
            passes: 2,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Result of typesetting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypesetOutcome {
    /// Produced PDF, if it exists after the last pass
    pub pdf: Option<PathBuf>,
    /// Passes that ran to completion
    pub passes: u32,
    /// Key diagnostic lines from failed passes
    pub diagnostics: Vec<String>,
}

impl TypesetOutcome {
    /// Check if a PDF was produced.
    pub fn succeeded(&self) -> bool {
        self.pdf.is_some()
    }
}

/// Up to `limit` lines that look like LaTeX errors.
pub fn key_diagnostics(output: &str, limit: usize) -> Vec<String> {
    output
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            KEY_MARKERS.iter().any(|marker| lower.contains(marker))
        })
        .map(|line| line.trim().to_string())
        .take(limit)
        .collect()
}

/// The last `max_chars` characters of `text`.
pub fn output_tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((pos, _)) => &text[pos..],
        None => "",
    }
}

/// Typeset `tex_path` in its own directory.
///
/// Failures are logged, never returned. Success is judged only by the PDF
/// existing afterwards; pdflatex often exits non-zero on recoverable errors.
pub fn typeset<R: ProcessRunner>(
    runner: &R,
    tex_path: &Path,
    options: &TypesetOptions,
) -> TypesetOutcome {
    let dir = tex_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = tex_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut outcome = TypesetOutcome::default();

    for pass in 1..=options.passes {
        log::info!("Typesetting pass {}/{}", pass, options.passes);
        let invocation = Invocation::new(&options.program)
            .args(["-interaction=nonstopmode", "-file-line-error"])
            .arg(file_name.as_str())
            .current_dir(&dir)
            .timeout(options.timeout);

        let output = match runner.run(&invocation) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Cannot run {}: {}", options.program, e);
                outcome.diagnostics.push(e.to_string());
                break;
            }
        };

        if output.timed_out {
            log::warn!(
                "{} pass {} timed out after {:?}",
                options.program,
                pass,
                options.timeout
            );
            outcome
                .diagnostics
                .push(format!("pass {} timed out after {:?}", pass, options.timeout));
            break;
        }
        outcome.passes += 1;

        if !output.success() {
            log::warn!("{} pass {} reported errors", options.program, pass);
            let combined = format!("{}\n{}", output.stdout, output.stderr);
            for line in key_diagnostics(&combined, MAX_KEY_LINES) {
                log::warn!("  {}", line);
                outcome.diagnostics.push(line);
            }
            if pass == options.passes {
                log::warn!(
                    "Last output:\n{}",
                    output_tail(&output.stdout, OUTPUT_TAIL_CHARS)
                );
            }
        }
    }

    let pdf = tex_path.with_extension("pdf");
    if pdf.exists() {
        log::info!("PDF written to {}", pdf.display());
        outcome.pdf = Some(pdf);
    } else {
        log::warn!("No PDF produced; the LaTeX source is kept at {}", tex_path.display());
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::process::ProcessOutput;
    use crate::error::Result;
    use std::cell::RefCell;

    struct Scripted {
        outputs: RefCell<Vec<ProcessOutput>>,
        seen: RefCell<Vec<Invocation>>,
    }

    impl Scripted {
        fn new(outputs: Vec<ProcessOutput>) -> Self {
            Self {
                outputs: RefCell::new(outputs),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl ProcessRunner for Scripted {
        fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
            self.seen.borrow_mut().push(invocation.clone());
            let mut outputs = self.outputs.borrow_mut();
            Ok(if outputs.is_empty() {
                ProcessOutput::exited(0, "", "")
            } else {
                outputs.remove(0)
            })
        }
    }

    #[test]
    fn test_key_diagnostics() {
        let log = "This is pdfTeX\n./paper.tex:12: Undefined control sequence.\nok line\n! Missing $ inserted.\n! Emergency stop.\nLaTeX Error: File `x.sty' not found.\nerror 5\nerror 6";
        let lines = key_diagnostics(log, MAX_KEY_LINES);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "./paper.tex:12: Undefined control sequence.");
        assert_eq!(lines[2], "! Emergency stop.");
    }

    #[test]
    fn test_output_tail() {
        assert_eq!(output_tail("short", 800), "short");
        assert_eq!(output_tail("abcdef", 3), "def");
        assert_eq!(output_tail("ééé", 2), "éé");
    }

    #[test]
    fn test_two_passes_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("paper.tex");
        std::fs::write(&tex, "").unwrap();
        std::fs::write(dir.path().join("paper.pdf"), "%PDF").unwrap();

        let runner = Scripted::new(vec![]);
        let outcome = typeset(&runner, &tex, &TypesetOptions::default());

        assert_eq!(outcome.passes, 2);
        assert_eq!(outcome.pdf, Some(dir.path().join("paper.pdf")));
        let seen = runner.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0].args,
            vec!["-interaction=nonstopmode", "-file-line-error", "paper.tex"]
        );
        assert_eq!(seen[0].cwd.as_deref(), Some(dir.path()));
        assert_eq!(seen[0].timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_failed_exit_with_pdf_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("paper.tex");
        std::fs::write(dir.path().join("paper.pdf"), "%PDF").unwrap();

        let runner = Scripted::new(vec![
            ProcessOutput::exited(1, "! Undefined control sequence.", ""),
            ProcessOutput::exited(1, "! Undefined control sequence.", ""),
        ]);
        let outcome = typeset(&runner, &tex, &TypesetOptions::default());
        assert!(outcome.succeeded());
        assert_eq!(outcome.diagnostics.len(), 2);
    }

    #[test]
    fn test_timeout_stops_passes() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("paper.tex");

        let runner = Scripted::new(vec![ProcessOutput::timed_out("", "")]);
        let outcome = typeset(&runner, &tex, &TypesetOptions::default());

        assert_eq!(runner.seen.borrow().len(), 1);
        assert_eq!(outcome.passes, 0);
        assert!(!outcome.succeeded());
    }
}
