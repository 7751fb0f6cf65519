//! Table region discovery.
//!
//! Regions are found by scanning for `\begin{env}` / `\end{env}` marker pairs
//! of one environment at a time. The scan is depth-aware: a nested begin
//! marker of the same environment must be balanced by its own end marker
//! before the outer region can close. A begin marker that is never balanced
//! does not produce a region.

use crate::model::{TableEnvironment, TableRegion};

/// Find all top-level, non-overlapping regions of `environment` in `text`.
pub fn find_regions(text: &str, environment: TableEnvironment) -> Vec<TableRegion> {
    let begin = environment.begin_marker();
    let end = environment.end_marker();

    let mut regions = Vec::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find(&begin) {
        let start = pos + rel;
        match closing_offset(text, start + begin.len(), &begin, &end) {
            Some(stop) => {
                regions.push(TableRegion::from_source(text, environment, start..stop));
                pos = stop;
            }
            None => {
                log::debug!(
                    "Unbalanced {} at byte {}, leaving it untouched",
                    begin,
                    start
                );
                pos = start + begin.len();
            }
        }
    }

    regions
}

/// Byte offset just past the end marker that balances a begin marker whose
/// text ends at `cursor`.
fn closing_offset(text: &str, mut cursor: usize, begin: &str, end: &str) -> Option<usize> {
    let mut depth = 1usize;

    loop {
        let next_end = text[cursor..].find(end).map(|i| cursor + i)?;
        let next_begin = text[cursor..].find(begin).map(|i| cursor + i);

        match next_begin {
            Some(b) if b < next_end => {
                depth += 1;
                cursor = b + begin.len();
            }
            _ => {
                depth -= 1;
                cursor = next_end + end.len();
                if depth == 0 {
                    return Some(cursor);
                }
            }
        }
    }
}

/// Replace every region of `environment` with the output of `rewrite`.
///
/// Text outside the regions is copied unchanged.
pub fn replace_regions<F>(text: &str, environment: TableEnvironment, mut rewrite: F) -> String
where
    F: FnMut(&TableRegion) -> String,
{
    let regions = find_regions(text, environment);
    if regions.is_empty() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for region in &regions {
        result.push_str(&text[last..region.span.start]);
        result.push_str(&rewrite(region));
        last = region.span.end;
    }
    result.push_str(&text[last..]);
    result
}
