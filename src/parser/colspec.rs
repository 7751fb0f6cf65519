//! Column-specification clause parsing.
//!
//! Handles the clause attached to `\begin{longtable}` and `\begin{tabular}`,
//! e.g. `{lccc}`, `{p{3cm}lr}` or pandoc's
//! `{@{}>{\raggedright\arraybackslash}p{(\columnwidth - 2\tabcolsep) * \real{0.5}}@{}}`.

/// A column-specification clause located in a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec<'a> {
    /// Clause content without the outer braces
    pub clause: &'a str,
    /// Byte offset just past the closing brace of the clause
    pub end: usize,
}

impl ColumnSpec<'_> {
    /// Number of columns the clause declares.
    pub fn column_count(&self) -> usize {
        count_columns(self.clause)
    }
}

const SPEC_ENVIRONMENTS: [&str; 2] = ["\\begin{longtable}", "\\begin{tabular}"];

/// Locate the column-specification clause attached to the first
/// `\begin{longtable}` or `\begin{tabular}` marker in `text`.
///
/// An optional `[...]` position argument between the marker and the clause
/// is skipped.
pub fn find_column_spec(text: &str) -> Option<ColumnSpec<'_>> {
    let marker_end = SPEC_ENVIRONMENTS
        .iter()
        .filter_map(|marker| text.find(marker).map(|pos| pos + marker.len()))
        .min()?;

    let bytes = text.as_bytes();
    let mut pos = skip_whitespace(bytes, marker_end);

    if bytes.get(pos) == Some(&b'[') {
        let close = text[pos..].find(']')?;
        pos = skip_whitespace(bytes, pos + close + 1);
    }

    if bytes.get(pos) != Some(&b'{') {
        return None;
    }

    let end = group_end(bytes, pos)?;
    Some(ColumnSpec {
        clause: &text[pos + 1..end - 1],
        end,
    })
}

/// Count the columns declared by a clause.
///
/// Fixed-width specifiers (`p{..}`, `m{..}`, `b{..}`) count once each and the
/// basic alignment letters `l`, `c`, `r` count once each. Decoration groups
/// (`@{..}`, `!{..}`, `>{..}`, `<{..}`), rules (`|`) and stray commands are
/// ignored. `*{n}{spec}` counts `spec` n times.
pub fn count_columns(clause: &str) -> usize {
    let bytes = clause.as_bytes();
    let mut fixed = 0;
    let mut basic = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'@' | b'!' | b'>' | b'<' => {
                i = skip_group_after(bytes, i + 1);
            }
            b'p' | b'm' | b'b' => {
                let next = skip_whitespace(bytes, i + 1);
                if bytes.get(next) == Some(&b'{') {
                    fixed += 1;
                    i = group_end(bytes, next).unwrap_or(bytes.len());
                } else {
                    i += 1;
                }
            }
            b'l' | b'c' | b'r' => {
                basic += 1;
                i += 1;
            }
            b'*' => {
                let (count, next) = repeated_columns(clause, i + 1);
                basic += count;
                i = next;
            }
            b'{' => {
                i = group_end(bytes, i).unwrap_or(bytes.len());
            }
            b'\\' => {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    fixed + basic
}

/// Expand `{n}{spec}` following a `*`. Returns the column count and the
/// offset after the construct.
fn repeated_columns(clause: &str, start: usize) -> (usize, usize) {
    let bytes = clause.as_bytes();
    let open = skip_whitespace(bytes, start);
    if bytes.get(open) != Some(&b'{') {
        return (0, start);
    }
    let Some(times_end) = group_end(bytes, open) else {
        return (0, bytes.len());
    };
    let times = clause[open + 1..times_end - 1]
        .trim()
        .parse::<usize>()
        .unwrap_or(0);

    let spec_open = skip_whitespace(bytes, times_end);
    if bytes.get(spec_open) != Some(&b'{') {
        return (0, times_end);
    }
    let Some(spec_end) = group_end(bytes, spec_open) else {
        return (0, bytes.len());
    };

    let inner = count_columns(&clause[spec_open + 1..spec_end - 1]);
    (times.saturating_mul(inner), spec_end)
}

/// Skip an optional brace group starting at or after `pos`.
fn skip_group_after(bytes: &[u8], pos: usize) -> usize {
    let next = skip_whitespace(bytes, pos);
    if bytes.get(next) == Some(&b'{') {
        group_end(bytes, next).unwrap_or(bytes.len())
    } else {
        pos
    }
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Offset just past the brace that closes the group opened at `open`.
/// Escaped braces (`\{`, `\}`) do not count.
fn group_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
