//! Region classification and column-count inference.

use regex::RegexSet;

use super::colspec::find_column_spec;
use crate::model::TableKind;

/// Signatures of algorithm listings that pandoc or authors wrap in tables.
const ALGORITHM_SIGNATURES: &[&str] = &[
    r"\\begin\{algorithm\}",
    r"\\begin\{alg\w*\}",
    r"\\Procedure",
    r"\\Function",
    r"\\For\{",
    r"\\While\{",
    r"\\State",
    r"\\End",
    r"\\algorithmic",
];

/// Strategy used by the table normalizer to understand a region.
///
/// Implementations receive the raw, unmodified region text.
pub trait TableHeuristics {
    /// Decide whether a region is a content table or an algorithm listing.
    fn classify(&self, region: &str) -> TableKind;

    /// Infer the number of columns of a region. Always at least 1.
    fn infer_columns(&self, region: &str) -> usize;
}

/// Pattern-matching heuristics over raw LaTeX text.
#[derive(Debug, Clone)]
pub struct PatternHeuristics {
    algorithm_signatures: RegexSet,
}

impl PatternHeuristics {
    /// Create heuristics with the built-in algorithm signatures.
    pub fn new() -> Self {
        Self {
            algorithm_signatures: RegexSet::new(ALGORITHM_SIGNATURES)
                .expect("built-in algorithm signatures are valid"),
        }
    }

    /// Create heuristics with custom algorithm signatures (regex syntax).
    pub fn with_signatures<I, S>(signatures: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            algorithm_signatures: RegexSet::new(signatures)?,
        })
    }
}

impl Default for PatternHeuristics {
    fn default() -> Self {
        Self::new()
    }
}

impl TableHeuristics for PatternHeuristics {
    fn classify(&self, region: &str) -> TableKind {
        if self.algorithm_signatures.is_match(region) {
            TableKind::Algorithm
        } else {
            TableKind::Content
        }
    }

    fn infer_columns(&self, region: &str) -> usize {
        let from_clause = find_column_spec(region)
            .map(|spec| spec.column_count())
            .unwrap_or(0);

        let columns = if from_clause > 0 {
            from_clause
        } else {
            columns_from_separators(region)
        };

        columns.max(1)
    }
}

/// Number of unescaped `&` field separators in a line.
pub fn separator_count(line: &str) -> usize {
    let bytes = line.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'&' => count += 1,
            _ => {}
        }
        i += 1;
    }
    count
}

/// Fallback column count: one more than the largest separator count of any
/// line, or 1 when no line has a separator.
pub fn columns_from_separators(region: &str) -> usize {
    region
        .lines()
        .map(separator_count)
        .filter(|&count| count > 0)
        .max()
        .map(|max| max + 1)
        .unwrap_or(1)
}
