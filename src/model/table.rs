//! Table region types.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Table environment vocabulary recognized by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableEnvironment {
    /// `longtable` (what pandoc emits for DOCX tables)
    LongTable,
    /// Plain `tabular`
    Tabular,
}

impl TableEnvironment {
    /// Sweep order used by the normalizer.
    pub const ALL: [TableEnvironment; 2] = [TableEnvironment::LongTable, TableEnvironment::Tabular];

    /// Environment name as written in `\begin{...}`.
    pub fn name(&self) -> &'static str {
        match self {
            TableEnvironment::LongTable => "longtable",
            TableEnvironment::Tabular => "tabular",
        }
    }

    /// Begin marker, e.g. `\begin{longtable}`.
    pub fn begin_marker(&self) -> String {
        format!("\\begin{{{}}}", self.name())
    }

    /// End marker, e.g. `\end{longtable}`.
    pub fn end_marker(&self) -> String {
        format!("\\end{{{}}}", self.name())
    }
}

/// Classification of a table region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// A real data table, cleaned by the normalizer
    Content,
    /// An algorithm listing that was typeset as a table; left verbatim
    Algorithm,
}

/// A contiguous `\begin{env}` ... `\end{env}` span in the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegion {
    /// Environment that delimits the region
    pub environment: TableEnvironment,

    /// Byte span in the text the region was discovered in
    pub span: Range<usize>,

    /// Raw region text, markers included
    pub text: String,
}

impl TableRegion {
    /// Create a region from a span of `source`.
    pub fn from_source(source: &str, environment: TableEnvironment, span: Range<usize>) -> Self {
        Self {
            environment,
            text: source[span.clone()].to_string(),
            span,
        }
    }

    /// Length of the region in bytes.
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// Check if the region is empty.
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(TableEnvironment::LongTable.begin_marker(), "\\begin{longtable}");
        assert_eq!(TableEnvironment::Tabular.end_marker(), "\\end{tabular}");
    }

    #[test]
    fn test_region_from_source() {
        let source = "before \\begin{tabular}{l}x\\end{tabular} after";
        let start = source.find("\\begin").unwrap();
        let end = source.find(" after").unwrap();
        let region = TableRegion::from_source(source, TableEnvironment::Tabular, start..end);
        assert_eq!(region.text, "\\begin{tabular}{l}x\\end{tabular}");
        assert_eq!(region.len(), region.text.len());
        assert!(!region.is_empty());
    }
}
