//! Table normalizer.
//!
//! Pandoc turns word-processor tables into `longtable` environments full of
//! booktabs rules, `minipage` header cells and `\endhead` bookkeeping that
//! publisher templates rarely want. The normalizer finds every table region,
//! leaves algorithm listings alone and reduces content tables to their marker
//! lines plus data rows.

use regex::Regex;
use std::ops::Range;

use super::options::NormalizerOptions;
use super::result::RepairStats;
use crate::model::{TableEnvironment, TableKind, TableRegion};
use crate::parser::{
    find_column_spec, find_regions, replace_regions, separator_count, PatternHeuristics, TableHeuristics,
};

/// Cleans table regions in LaTeX text.
pub struct TableNormalizer<H: TableHeuristics = PatternHeuristics> {
    heuristics: H,
    options: NormalizerOptions,
    minipage_regex: Regex,
}

impl TableNormalizer<PatternHeuristics> {
    /// Create a normalizer with pattern heuristics and default options.
    pub fn new() -> Self {
        Self::with_heuristics(PatternHeuristics::new(), NormalizerOptions::default())
    }

    /// Create a normalizer with pattern heuristics and custom options.
    pub fn with_options(options: NormalizerOptions) -> Self {
        Self::with_heuristics(PatternHeuristics::new(), options)
    }
}

impl Default for TableNormalizer<PatternHeuristics> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: TableHeuristics> TableNormalizer<H> {
    /// Create a normalizer with custom heuristics.
    pub fn with_heuristics(heuristics: H, options: NormalizerOptions) -> Self {
        Self {
            heuristics,
            options,
            minipage_regex: Regex::new(r"(?s)\\begin\{minipage\}.*?\\end\{minipage\}").unwrap(),
        }
    }

    /// Normalize every table region in `text`.
    pub fn normalize(&self, text: &str) -> String {
        let mut stats = RepairStats::new();
        self.normalize_with_stats(text, &mut stats)
    }

    /// Normalize every table region in `text`, recording statistics.
    ///
    /// `longtable` regions are swept first, then `tabular` regions of the
    /// already-normalized text. Regions nested inside an algorithm listing of
    /// either environment are left alone.
    pub fn normalize_with_stats(&self, text: &str, stats: &mut RepairStats) -> String {
        let mut result = text.to_string();
        for environment in TableEnvironment::ALL {
            let listings = self.algorithm_spans(&result);
            result = replace_regions(&result, environment, |region| {
                if listings.iter().any(|span| encloses(span, &region.span)) {
                    return region.text.clone();
                }
                self.rewrite_region(region, stats)
            });
        }
        result
    }

    /// Spans of every algorithm listing in `text`, across both environments.
    fn algorithm_spans(&self, text: &str) -> Vec<Range<usize>> {
        TableEnvironment::ALL
            .into_iter()
            .flat_map(|environment| find_regions(text, environment))
            .filter(|region| self.heuristics.classify(&region.text) == TableKind::Algorithm)
            .map(|region| region.span)
            .collect()
    }

    /// Rewrite one region. Algorithm listings come back unchanged.
    pub fn rewrite_region(&self, region: &TableRegion, stats: &mut RepairStats) -> String {
        stats.tables_found += 1;

        if self.heuristics.classify(&region.text) == TableKind::Algorithm {
            log::debug!(
                "Skipping algorithm listing in {} at byte {}",
                region.environment.name(),
                region.span.start
            );
            stats.algorithms_skipped += 1;
            return region.text.clone();
        }

        // Column inference must see the region before any cleaning.
        let columns = self.heuristics.infer_columns(&region.text);
        log::debug!(
            "Cleaning {} at byte {} with {} columns",
            region.environment.name(),
            region.span.start,
            columns
        );

        let (cleaned, header_dropped) = self.clean_region(region, columns);
        stats.tables_rewritten += 1;
        if header_dropped {
            stats.headers_dropped += 1;
        }
        cleaned
    }

    /// Strip decorative lines and the header line from a content region.
    ///
    /// Returns the cleaned text and whether a header line was dropped.
    pub fn clean_region(&self, region: &TableRegion, columns: usize) -> (String, bool) {
        let text = region.text.as_str();
        let environment = region.environment;

        let head_end = find_column_spec(text)
            .map(|spec| spec.end)
            .unwrap_or_else(|| environment.begin_marker().len())
            .min(text.len());

        let body = &text[head_end..];
        let body = if self.options.remove_minipages {
            self.minipage_regex.replace_all(body, "")
        } else {
            body.into()
        };
        let working = format!("{}{}", &text[..head_end], body);

        let end_marker = environment.end_marker();
        let header_separators = columns.saturating_sub(1);
        let mut header_dropped = !self.options.drop_header;
        let mut dropped_any_header = false;
        let mut kept: Vec<&str> = Vec::new();
        let mut offset = 0;

        for line in working.split('\n') {
            let line_start = offset;
            offset += line.len() + 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // The begin line may carry a header after the column clause.
            if line_start < head_end {
                let split = head_end - line_start;
                if split <= line.len() {
                    let (head, rest) = line.split_at(split);
                    let rest = rest.trim();
                    let droppable = !rest.is_empty()
                        && !rest.contains(end_marker.as_str())
                        && (self.options.is_stripped(rest)
                            || (!header_dropped && separator_count(rest) == header_separators));
                    if droppable {
                        if !self.options.is_stripped(rest) {
                            header_dropped = true;
                            dropped_any_header = true;
                        }
                        kept.push(head.trim_end());
                        continue;
                    }
                }
                kept.push(line);
                continue;
            }

            if trimmed.starts_with(end_marker.as_str()) {
                kept.push(line);
                continue;
            }

            if self.options.is_stripped(trimmed) {
                continue;
            }

            if !header_dropped && separator_count(line) == header_separators {
                header_dropped = true;
                dropped_any_header = true;
                continue;
            }

            kept.push(line);
        }

        (kept.join("\n"), dropped_any_header)
    }
}

/// Whether `outer` strictly contains `inner`.
fn encloses(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    outer != inner && outer.start <= inner.start && inner.end <= outer.end
}
