//! Character-by-character tokenizer state machine (the slow, quote-aware mode).
//!
//! States: `FieldStart`, `Unquoted`, `Quoted`, `QuotedEscape`. Each field is
//! assembled directly into an output buffer as the machine walks the input,
//! rather than sliced-and-unescaped afterwards — this is what lets a
//! quoted field spanning a CRLF, or containing doubled quotes, come out
//! right without a second pass.

use crate::config::Newline;
use crate::error::{ParseError, ParseErrorCode, ParseErrorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    QuotedEscape,
}

/// One tokenized row plus the byte range it spans in the input, so the
/// caller can independently apply comment/empty-line filtering against the
/// raw text.
pub struct SlowRow {
    pub fields: Vec<String>,
    /// Byte range of row content, excluding the terminator.
    pub content_range: (usize, usize),
    /// Absolute end position including the terminator (or, for a row
    /// completed only by reaching end-of-buffer, equal to content end).
    pub end_pos: usize,
    /// True when the row ended on an actual newline match (or the very
    /// last input byte was consumed as part of a real terminator); false
    /// when it was flushed only because the buffer ran out.
    pub terminated: bool,
    /// Row-local parse errors (quote malformations) raised while building
    /// this row.
    pub errors: Vec<ParseErrorCode>,
}

pub struct SlowOutcome {
    pub rows: Vec<SlowRow>,
}

/// Run the state machine over `input`, starting at `start`. `newline`
/// selects which terminator(s) end a row — for `Newline::CrLf` a bare `\r`
/// not followed by `\n` is treated as data, matching common real-world CSV
/// leniency toward stray carriage returns in otherwise CRLF-terminated files.
pub fn scan(input: &[u8], start: usize, delimiter: u8, quote: u8, escape: u8, newline: Newline) -> SlowOutcome {
    let mut rows = Vec::new();
    let mut state = State::FieldStart;
    let mut pos = start;
    let mut row_start = start;
    let mut field = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut row_errors: Vec<ParseErrorCode> = Vec::new();
    let mut any_field_started = false;

    macro_rules! push_field {
        () => {{
            fields.push(String::from_utf8_lossy(&field).into_owned());
            field.clear();
        }};
    }

    macro_rules! end_row {
        ($end_pos:expr, $terminated:expr) => {{
            rows.push(SlowRow {
                fields: std::mem::take(&mut fields),
                content_range: (row_start, pos),
                end_pos: $end_pos,
                terminated: $terminated,
                errors: std::mem::take(&mut row_errors),
            });
            row_start = $end_pos;
            any_field_started = false;
        }};
    }

    while pos < input.len() {
        let byte = input[pos];
        let is_newline_start = matches_newline(input, pos, newline);

        match state {
            State::FieldStart => {
                if byte == quote {
                    state = State::Quoted;
                    any_field_started = true;
                    pos += 1;
                } else if byte == delimiter {
                    push_field!();
                    any_field_started = true;
                    pos += 1;
                } else if let Some(nl_len) = is_newline_start {
                    push_field!();
                    pos += nl_len;
                    end_row!(pos, true);
                } else {
                    field.push(byte);
                    any_field_started = true;
                    state = State::Unquoted;
                    pos += 1;
                }
            }
            State::Unquoted => {
                if byte == delimiter {
                    push_field!();
                    state = State::FieldStart;
                    pos += 1;
                } else if let Some(nl_len) = is_newline_start {
                    push_field!();
                    pos += nl_len;
                    state = State::FieldStart;
                    end_row!(pos, true);
                } else if byte == quote {
                    field.push(byte);
                    row_errors.push(ParseErrorCode::InvalidQuotes);
                    pos += 1;
                } else {
                    field.push(byte);
                    pos += 1;
                }
            }
            State::Quoted => {
                if byte == escape && escape == quote {
                    state = State::QuotedEscape;
                    pos += 1;
                } else if byte == escape && escape != quote {
                    // Non-quote escape char: next byte (if any) is appended literally.
                    pos += 1;
                    if pos < input.len() {
                        field.push(input[pos]);
                        pos += 1;
                    }
                } else {
                    field.push(byte);
                    pos += 1;
                }
            }
            State::QuotedEscape => {
                if byte == quote {
                    field.push(quote);
                    state = State::Quoted;
                    pos += 1;
                } else if byte == delimiter {
                    push_field!();
                    state = State::FieldStart;
                    pos += 1;
                } else if let Some(nl_len) = is_newline_start {
                    push_field!();
                    pos += nl_len;
                    state = State::FieldStart;
                    end_row!(pos, true);
                } else {
                    field.push(byte);
                    row_errors.push(ParseErrorCode::InvalidQuotes);
                    state = State::Unquoted;
                    pos += 1;
                }
            }
        }
    }

    // End of buffer. Flush whatever's pending as an unterminated row.
    match state {
        State::FieldStart => {
            if any_field_started {
                push_field!();
                end_row!(pos, false);
            }
        }
        State::Unquoted => {
            push_field!();
            end_row!(pos, false);
        }
        State::Quoted => {
            row_errors.push(ParseErrorCode::MissingQuotes);
            push_field!();
            end_row!(pos, false);
        }
        State::QuotedEscape => {
            push_field!();
            end_row!(pos, false);
        }
    }

    SlowOutcome { rows }
}

/// Returns the matched newline length at `pos`, or `None`. A bare `\r` not
/// followed by `\n` is only a terminator when the configured newline is
/// `Cr`; otherwise it's left as data, tolerating stray `\r` bytes in
/// CRLF-configured input.
fn matches_newline(input: &[u8], pos: usize, newline: Newline) -> Option<usize> {
    match newline {
        Newline::Lf => (input[pos] == b'\n').then_some(1),
        Newline::Cr => (input[pos] == b'\r').then_some(1),
        Newline::CrLf => {
            if input[pos] == b'\r' && pos + 1 < input.len() && input[pos + 1] == b'\n' {
                Some(2)
            } else {
                None
            }
        }
    }
}

/// Convert row-local error codes into tagged [`ParseError`]s, given the
/// data-row index they'll be attributed to.
pub fn tag_errors(codes: &[ParseErrorCode], row: usize) -> Vec<ParseError> {
    codes
        .iter()
        .map(|&code| {
            let kind = ParseErrorType::Quotes;
            let message = match code {
                ParseErrorCode::MissingQuotes => "Quoted field unterminated",
                ParseErrorCode::InvalidQuotes => {
                    "Quote character found in unquoted field, or after closing quote"
                }
                _ => "quote error",
            };
            ParseError::new(kind, code, message).with_row(row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_as_strings(outcome: &SlowOutcome) -> Vec<Vec<String>> {
        outcome.rows.iter().map(|r| r.fields.clone()).collect()
    }

    #[test]
    fn simple_unquoted() {
        let out = scan(b"a,b,c\n1,2,3\n", 0, b',', b'"', b'"', Newline::Lf);
        assert_eq!(
            rows_as_strings(&out),
            vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]
        );
        assert!(out.rows.iter().all(|r| r.terminated));
    }

    #[test]
    fn quoted_with_comma_and_doubled_quote() {
        let out = scan(b"\"a,b\",c\n\"x\"\"y\",z", 0, b',', b'"', b'"', Newline::Lf);
        assert_eq!(
            rows_as_strings(&out),
            vec![vec!["a,b", "c"], vec!["x\"y", "z"]]
        );
        assert!(!out.rows[1].terminated);
    }

    #[test]
    fn unterminated_quote_flags_missing_quotes() {
        let out = scan(b"a,b\n\"unterminated", 0, b',', b'"', b'"', Newline::Lf);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[1].fields, vec!["unterminated"]);
        assert_eq!(out.rows[1].errors, vec![ParseErrorCode::MissingQuotes]);
    }

    #[test]
    fn quote_in_unquoted_field_flags_invalid_quotes() {
        let out = scan(b"a\"b,c\n", 0, b',', b'"', b'"', Newline::Lf);
        assert_eq!(out.rows[0].fields, vec!["a\"b", "c"]);
        assert_eq!(out.rows[0].errors, vec![ParseErrorCode::InvalidQuotes]);
    }

    #[test]
    fn quoted_field_preserves_embedded_crlf() {
        let out = scan(b"\"a\r\nb\",c\n", 0, b',', b'"', b'"', Newline::CrLf);
        assert_eq!(out.rows[0].fields, vec!["a\r\nb", "c"]);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        let out = scan(b"", 0, b',', b'"', b'"', Newline::Lf);
        assert!(out.rows.is_empty());
    }

    #[test]
    fn trailing_newline_does_not_produce_phantom_row() {
        let out = scan(b"a,b\n1,2\n", 0, b',', b'"', b'"', Newline::Lf);
        assert_eq!(out.rows.len(), 2);
    }
}
