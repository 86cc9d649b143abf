//! Bracketed reference segments of a formula.
//!
//! Used by [`crate::MatchMode::Reference`]. Inside a segment `]]` is an escaped `]`. String
//! literals (`"..."`, `'...'`, doubled quote as escape) and `//` line comments are skipped, so
//! brackets inside them are not references. Two segments joined by `.` (`[ds].[field]`) also
//! yield the qualified whole.

use std::collections::HashSet;

pub fn reference_segments(formula: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    let bytes = formula.as_bytes();
    let mut i = 0usize;
    // Byte range of the segment that ended right before a `.`, for qualified references.
    let mut previous: Option<(usize, usize)> = None;

    while i < bytes.len() {
        match bytes[i] {
            b'[' => {
                let start = i;
                let Some(end) = segment_end(bytes, start) else {
                    break;
                };
                out.insert(formula[start..end].to_string());
                if let Some((prev_start, prev_end)) = previous {
                    if prev_end + 1 == start {
                        out.insert(formula[prev_start..end].to_string());
                    }
                }
                previous = if bytes.get(end) == Some(&b'.') {
                    Some((start, end))
                } else {
                    None
                };
                i = end;
            }
            quote @ (b'"' | b'\'') => {
                i = literal_end(bytes, i, quote);
                previous = None;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                previous = None;
            }
            b'.' => i += 1,
            _ => {
                i += 1;
                previous = None;
            }
        }
    }

    out
}

/// Index one past the closing `]` of the segment opened at `start`, or `None` when unclosed.
fn segment_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b']' {
            if bytes.get(i + 1) == Some(&b']') {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

fn literal_end(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}
