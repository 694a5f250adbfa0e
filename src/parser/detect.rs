//! Delimiter and newline auto-detection.
//!
//! Delimiter detection scores each candidate by the variance of its
//! per-line field count (lower is better) and, as a tiebreaker, the total
//! field count (higher is better). Newline detection counts raw occurrences
//! of `\r\n`, `\r`, and `\n` in a leading window and picks the most frequent.

use crate::config::Newline;
use crate::error::ParseError;

const MAX_DETECT_LINES: usize = 10;
const NEWLINE_SCAN_WINDOW: usize = 1024;

/// Split `input` into up to `MAX_DETECT_LINES` lines on bare `\n` (CR is
/// left attached to the preceding field; detection only cares about
/// delimiter counts so this crude split is sufficient and newline-scheme
/// agnostic).
fn leading_lines(input: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::with_capacity(MAX_DETECT_LINES);
    let mut start = 0;
    for (i, &b) in input.iter().enumerate() {
        if b == b'\n' {
            lines.push(&input[start..i]);
            start = i + 1;
            if lines.len() == MAX_DETECT_LINES {
                return lines;
            }
        }
    }
    if start < input.len() {
        lines.push(&input[start..]);
    }
    lines
}

fn field_count(line: &[u8], delimiter: u8, quote: u8) -> usize {
    let mut count = 1;
    let mut in_quotes = false;
    let mut i = 0;
    while i < line.len() {
        let b = line[i];
        if in_quotes {
            if b == quote {
                in_quotes = false;
            }
        } else if b == quote {
            in_quotes = true;
        } else if b == delimiter {
            count += 1;
        }
        i += 1;
    }
    count
}

fn variance(counts: &[usize]) -> f64 {
    if counts.is_empty() {
        return f64::INFINITY;
    }
    let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    let sq_diff_sum: f64 = counts
        .iter()
        .map(|&c| {
            let diff = c as f64 - mean;
            diff * diff
        })
        .sum();
    sq_diff_sum / counts.len() as f64
}

/// Result of delimiter auto-detection: the chosen byte, plus a
/// `UndetectableDelimiter` error when every candidate failed to split any
/// line into 2+ fields.
pub struct DelimiterDetection {
    pub delimiter: u8,
    pub error: Option<ParseError>,
}

pub fn detect_delimiter(input: &[u8], candidates: &[u8], quote: u8) -> DelimiterDetection {
    let lines = leading_lines(input);
    if lines.is_empty() {
        return DelimiterDetection {
            delimiter: b',',
            error: None,
        };
    }

    let mut best: Option<(u8, f64, usize)> = None;
    let mut any_multi_field = false;

    for &candidate in candidates {
        let counts: Vec<usize> = lines.iter().map(|l| field_count(l, candidate, quote)).collect();
        let total: usize = counts.iter().sum();
        let max_fields = counts.iter().copied().max().unwrap_or(1);
        if max_fields >= 2 {
            any_multi_field = true;
        }
        let var = variance(&counts);
        let better = match &best {
            None => true,
            Some((_, best_var, best_total)) => {
                var < *best_var || (var == *best_var && total > *best_total)
            }
        };
        if better {
            best = Some((candidate, var, total));
        }
    }

    if !any_multi_field {
        log::warn!("could not auto-detect a delimiter among {candidates:?}; falling back to ','");
        return DelimiterDetection {
            delimiter: b',',
            error: Some(ParseError::undetectable_delimiter()),
        };
    }

    let chosen = best.map(|(c, _, _)| c).unwrap_or(b',');
    log::debug!("auto-detected delimiter {:?}", chosen as char);
    DelimiterDetection {
        delimiter: chosen,
        error: None,
    }
}

pub fn detect_newline(input: &[u8]) -> Newline {
    let window = &input[..input.len().min(NEWLINE_SCAN_WINDOW)];
    let mut crlf = 0usize;
    let mut cr = 0usize;
    let mut lf = 0usize;
    let mut i = 0;
    while i < window.len() {
        match window[i] {
            b'\r' => {
                if i + 1 < window.len() && window[i + 1] == b'\n' {
                    crlf += 1;
                    i += 2;
                    continue;
                }
                cr += 1;
            }
            b'\n' => lf += 1,
            _ => {}
        }
        i += 1;
    }

    // Ties broken in the order \r\n, \r, \n.
    if crlf >= cr && crlf >= lf && crlf > 0 {
        Newline::CrLf
    } else if cr >= lf && cr > 0 {
        Newline::Cr
    } else if lf > 0 {
        Newline::Lf
    } else {
        Newline::Lf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_tab_delimiter() {
        let result = detect_delimiter(b"a\tb\n1\t2", &crate::config::default_delimiters_to_guess(), b'"');
        assert_eq!(result.delimiter, b'\t');
        assert!(result.error.is_none());
    }

    #[test]
    fn falls_back_to_comma_when_undetectable() {
        let result = detect_delimiter(b"abcdef\nghijkl", &[b'\t', b'|', b';'], b'"');
        assert_eq!(result.delimiter, b',');
        assert!(result.error.is_some());
    }

    #[test]
    fn detects_crlf() {
        assert_eq!(detect_newline(b"a,b\r\n1,2\r\n"), Newline::CrLf);
    }

    #[test]
    fn detects_lf() {
        assert_eq!(detect_newline(b"a,b\n1,2\n"), Newline::Lf);
    }

    #[test]
    fn detects_bare_cr() {
        assert_eq!(detect_newline(b"a,b\r1,2\r"), Newline::Cr);
    }
}
