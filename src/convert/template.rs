//! Template preamble extraction and document merging.

use regex::Regex;

/// Marker separating a LaTeX preamble from the document body.
pub const BEGIN_DOCUMENT: &str = "\\begin{document}";

/// Marker closing the document body.
pub const END_DOCUMENT: &str = "\\end{document}";

/// Packages the repaired body relies on.
pub const DEFAULT_REQUIRED_PACKAGES: &[&str] = &["graphicx", "booktabs"];

/// The template text before `\begin{document}`, trimmed.
///
/// A template without the marker is used whole.
pub fn extract_preamble(template: &str) -> String {
    match template.find(BEGIN_DOCUMENT) {
        Some(pos) => template[..pos].trim().to_string(),
        None => {
            log::warn!("Template has no \\begin{{document}}; using it whole as preamble");
            template.trim().to_string()
        }
    }
}

/// The converted text from `\begin{document}` onward.
///
/// Text without the marker is wrapped in a document environment.
pub fn document_body(converted: &str) -> String {
    match converted.find(BEGIN_DOCUMENT) {
        Some(pos) => converted[pos..].to_string(),
        None => {
            log::warn!("Converted text has no \\begin{{document}}; wrapping it");
            format!("{}\n{}\n{}", BEGIN_DOCUMENT, converted.trim(), END_DOCUMENT)
        }
    }
}

/// Check if the preamble loads `package`, alone or in a package list.
pub fn has_package(preamble: &str, package: &str) -> bool {
    let pattern = format!(
        r"\\usepackage\s*(?:\[[^\]]*\])?\s*\{{[^}}]*\b{}\b[^}}]*\}}",
        regex::escape(package)
    );
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(preamble),
        Err(_) => preamble.contains(&format!("\\usepackage{{{}}}", package)),
    }
}

/// Append a `\usepackage` line for every package the preamble lacks.
pub fn ensure_packages<S: AsRef<str>>(preamble: &str, packages: &[S]) -> String {
    let mut result = preamble.to_string();
    for package in packages {
        let package = package.as_ref();
        if !has_package(&result, package) {
            log::debug!("Adding \\usepackage{{{}}} to preamble", package);
            result.push_str(&format!("\n\\usepackage{{{}}}", package));
        }
    }
    result
}

/// Join a template preamble and converted text into one document.
pub fn merge_document<S: AsRef<str>>(preamble: &str, converted: &str, packages: &[S]) -> String {
    let preamble = ensure_packages(preamble, packages);
    format!("{}\n\n{}", preamble, document_body(converted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_preamble() {
        let template = "\\documentclass{article}\n\\usepackage{amsmath}\n\n\\begin{document}\nTemplate body\n\\end{document}\n";
        assert_eq!(
            extract_preamble(template),
            "\\documentclass{article}\n\\usepackage{amsmath}"
        );
        assert_eq!(
            extract_preamble("  \\documentclass{article}\n"),
            "\\documentclass{article}"
        );
    }

    #[test]
    fn test_document_body() {
        let converted = "\\documentclass{article}\n\\begin{document}\nHi\n\\end{document}";
        assert_eq!(document_body(converted), "\\begin{document}\nHi\n\\end{document}");
        assert_eq!(
            document_body("\nJust text\n"),
            "\\begin{document}\nJust text\n\\end{document}"
        );
    }

    #[test]
    fn test_has_package() {
        assert!(has_package("\\usepackage{graphicx}", "graphicx"));
        assert!(has_package("\\usepackage[final]{graphicx}", "graphicx"));
        assert!(has_package("\\usepackage{amsmath, booktabs}", "booktabs"));
        assert!(!has_package("\\usepackage{graphics}", "graphicx"));
        assert!(!has_package("% nothing", "booktabs"));
    }

    #[test]
    fn test_merge_document() {
        let merged = merge_document(
            "\\documentclass{article}\n\\usepackage{graphicx}",
            "preamble junk\n\\begin{document}\nBody\n\\end{document}",
            DEFAULT_REQUIRED_PACKAGES,
        );
        assert_eq!(
            merged,
            "\\documentclass{article}\n\\usepackage{graphicx}\n\\usepackage{booktabs}\n\n\\begin{document}\nBody\n\\end{document}"
        );
    }
}
