//! Fast mode: split by newline then by delimiter, no quote
//! handling at all. Selected when `fastMode` is explicitly set, or left
//! unset and the buffer contains no `quoteChar`.

use crate::config::Newline;

use super::slow::SlowRow;

pub fn scan(input: &[u8], start: usize, delimiter: u8, newline: Newline) -> Vec<SlowRow> {
    let nl = newline.as_bytes();
    let mut rows = Vec::new();
    let mut pos = start;
    let mut row_start = start;

    while pos < input.len() {
        if let Some(rel) = find(&input[pos..], nl) {
            let content_end = pos + rel;
            let end_pos = content_end + nl.len();
            rows.push(build_row(input, row_start, content_end, end_pos, delimiter, true));
            pos = end_pos;
            row_start = pos;
        } else {
            break;
        }
    }

    if row_start < input.len() {
        rows.push(build_row(input, row_start, input.len(), input.len(), delimiter, false));
    }

    rows
}

fn build_row(
    input: &[u8],
    start: usize,
    content_end: usize,
    end_pos: usize,
    delimiter: u8,
    terminated: bool,
) -> SlowRow {
    let line = &input[start..content_end];
    let fields = line
        .split(|&b| b == delimiter)
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .collect();
    SlowRow {
        fields,
        content_range: (start, content_end),
        end_pos,
        terminated,
        errors: Vec::new(),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
