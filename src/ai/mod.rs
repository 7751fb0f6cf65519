//! Model-assisted table correction.
//!
//! Content tables are handed one at a time to a [`TableCorrector`], which
//! returns a replacement `tabular`. Algorithm listings are never sent.

#[cfg(feature = "ai")]
mod gemini;

#[cfg(feature = "ai")]
pub use gemini::{GeminiCorrector, DEFAULT_GEMINI_MODEL, GEMINI_API_BASE};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{TableEnvironment, TableKind, TableRegion};
use crate::parser::{find_regions, PatternHeuristics, TableHeuristics};

/// Credential value shipped in sample configuration; treated as absent.
pub const PLACEHOLDER_API_KEY: &str = "<YOUR_GEMINI_API_KEY>";

/// Rewrites a single raw table into clean LaTeX.
pub trait TableCorrector {
    /// Return the corrected table for `raw_table`.
    fn correct(&self, raw_table: &str) -> Result<String>;
}

/// Counts from a correction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionStats {
    /// Table regions found
    pub tables_found: u32,
    /// Regions replaced with corrector output
    pub tables_corrected: u32,
    /// Algorithm listings left alone
    pub algorithms_skipped: u32,
    /// Regions kept because the corrector failed
    pub failures: u32,
}

/// Check if an API key is missing or still the sample placeholder.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key == PLACEHOLDER_API_KEY
}

/// The instruction text sent along with one raw table.
pub fn build_prompt(raw_table: &str) -> String {
    format!(
        "You are an expert LaTeX assistant. Your task is to correct and reformat the following raw LaTeX table code.

**Instructions:**
1. The final output must be a clean, syntactically correct LaTeX table.
2. Format the table using the 'booktabs' package style, which means using `\\toprule`, `\\midrule`, and `\\bottomrule`. Do not use vertical lines.
3. Remove any extraneous or problematic LaTeX commands, such as `\\begin{{longtable}}`, `\\begin{{minipage}}`, `\\endhead`, etc. The final table should be in a `tabular` environment.
4. Ensure all rows have a consistent number of columns, using '&' as a separator.
5. Do NOT include a `\\caption{{...}}` or `\\label{{...}}`. You must only output the table structure itself.
6. The final output must ONLY be the LaTeX code from `\\begin{{tabular}}` to `\\end{{tabular}}`. Do not add any explanations, surrounding text, or markdown code fences.

**Raw LaTeX table to correct:**
{}
",
        raw_table
    )
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();
    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(pos) => &text[pos + 1..],
            None => "",
        };
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped;
    }
    text.trim()
}

/// Extract the generated text from a `generateContent` response body.
pub fn parse_response(json: &serde_json::Value) -> Result<String> {
    let text = json["candidates"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|c| c["content"]["parts"].as_array())
        .and_then(|parts| parts.first())
        .and_then(|p| p["text"].as_str())
        .ok_or_else(|| Error::Ai("response has no candidate text".into()))?;

    let table = strip_code_fence(text);
    if table.is_empty() {
        return Err(Error::Ai("response text is empty".into()));
    }
    Ok(table.to_string())
}

/// Replace every content table in `text` with the corrector's version.
///
/// Regions of both environments are visited once each, in source order. A
/// region nested inside an earlier one is handled with its parent.
pub fn correct_tables<C: TableCorrector + ?Sized>(
    text: &str,
    corrector: &C,
) -> (String, CorrectionStats) {
    let heuristics = PatternHeuristics::new();
    let mut stats = CorrectionStats::default();

    let mut regions: Vec<TableRegion> = TableEnvironment::ALL
        .iter()
        .flat_map(|env| find_regions(text, *env))
        .collect();
    regions.sort_by_key(|r| r.span.start);

    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;

    for region in regions {
        if region.span.start < cursor {
            continue;
        }
        result.push_str(&text[cursor..region.span.start]);
        cursor = region.span.end;
        stats.tables_found += 1;

        if heuristics.classify(&region.text) == TableKind::Algorithm {
            log::debug!("Skipping algorithm listing at byte {}", region.span.start);
            stats.algorithms_skipped += 1;
            result.push_str(&region.text);
            continue;
        }

        log::info!(
            "Correcting table {} ({} bytes)",
            stats.tables_found,
            region.len()
        );
        match corrector.correct(&region.text) {
            Ok(corrected) => {
                stats.tables_corrected += 1;
                result.push_str(&corrected);
            }
            Err(e) => {
                log::warn!("Keeping table at byte {} unchanged: {}", region.span.start, e);
                stats.failures += 1;
                result.push_str(&region.text);
            }
        }
    }

    result.push_str(&text[cursor..]);
    (result, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Uppercase;

    impl TableCorrector for Uppercase {
        fn correct(&self, raw_table: &str) -> Result<String> {
            Ok(raw_table.to_uppercase())
        }
    }

    struct Failing;

    impl TableCorrector for Failing {
        fn correct(&self, _raw_table: &str) -> Result<String> {
            Err(Error::Ai("quota exceeded".into()))
        }
    }

    #[test]
    fn test_placeholder_key() {
        assert!(is_placeholder_key(""));
        assert!(is_placeholder_key("  "));
        assert!(is_placeholder_key("<YOUR_GEMINI_API_KEY>"));
        assert!(!is_placeholder_key("AIza-real"));
    }

    #[test]
    fn test_prompt_embeds_table() {
        let prompt = build_prompt("\\begin{longtable}{ll}\\end{longtable}");
        assert!(prompt.contains("booktabs"));
        assert!(prompt.contains("`\\begin{tabular}` to `\\end{tabular}`"));
        assert!(prompt.ends_with("\\begin{longtable}{ll}\\end{longtable}\n"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(
            strip_code_fence("```latex\n\\begin{tabular}{l}\n\\end{tabular}\n```\n"),
            "\\begin{tabular}{l}\n\\end{tabular}"
        );
        assert_eq!(strip_code_fence("  plain  "), "plain");
        assert_eq!(strip_code_fence("```\nx\n```"), "x");
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "```latex\n\\begin{tabular}{l}\nx\n\\end{tabular}\n```"}]},
                "finishReason": "STOP"
            }]
        });
        assert_eq!(
            parse_response(&body).unwrap(),
            "\\begin{tabular}{l}\nx\n\\end{tabular}"
        );
        assert!(matches!(
            parse_response(&json!({"candidates": []})),
            Err(Error::Ai(_))
        ));
    }

    #[test]
    fn test_correct_tables_in_order() {
        let text = "a\n\\begin{longtable}{l}\nx\n\\end{longtable}\nb\n\\begin{tabular}{l}\ny\n\\end{tabular}\nc";
        let (result, stats) = correct_tables(text, &Uppercase);
        assert_eq!(
            result,
            "a\n\\BEGIN{LONGTABLE}{L}\nX\n\\END{LONGTABLE}\nb\n\\BEGIN{TABULAR}{L}\nY\n\\END{TABULAR}\nc"
        );
        assert_eq!(stats.tables_found, 2);
        assert_eq!(stats.tables_corrected, 2);
    }

    #[test]
    fn test_nested_tabular_sent_with_parent() {
        let text = "\\begin{longtable}{l}\n\\begin{tabular}{l}\nx\n\\end{tabular}\n\\end{longtable}";
        let (_, stats) = correct_tables(text, &Uppercase);
        assert_eq!(stats.tables_found, 1);
    }

    #[test]
    fn test_algorithm_and_failure_kept() {
        let text = "\\begin{tabular}{l}\n\\State x\n\\end{tabular}\n\\begin{tabular}{l}\nz\n\\end{tabular}";
        let (result, stats) = correct_tables(text, &Failing);
        assert_eq!(result, text);
        assert_eq!(stats.algorithms_skipped, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.tables_corrected, 0);
    }
}
