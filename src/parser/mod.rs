//! The tokenizer: a pure function of `(input, delimiter, newline, quoteChar,
//! escapeChar, preview, fastMode, skipEmptyLines, comments)`.
//! Knows nothing about headers, transforms, or chunk seams — that's
//! [`crate::handle::ParserHandle`] and [`crate::streamer::ChunkStreamer`].

mod detect;
mod fast;
mod slow;

pub use detect::{detect_delimiter, detect_newline};

use crate::config::{CommentsConfig, Newline, ParserConfig, SkipEmptyLines};
use crate::error::ParseError;

/// A tokenized row before any header/typing semantics are applied.
pub type RawRow = Vec<String>;

/// Per-call resolution inputs: delimiter/newline are auto-detected once
/// (by [`crate::handle::ParserHandle`]) and then pinned for the lifetime of
/// a stream, so repeat calls pass the already-resolved values back in.
pub struct ParseRequest<'a> {
    pub input: &'a [u8],
    pub base_index: usize,
    pub ignore_last_row: bool,
    pub resolved_delimiter: Option<u8>,
    pub resolved_newline: Option<Newline>,
    /// Number of data rows already emitted before this call, for `preview`
    /// accounting and error row numbering.
    pub rows_so_far: usize,
}

pub struct ParseOutcome {
    pub data: Vec<RawRow>,
    pub errors: Vec<ParseError>,
    pub resolved_delimiter: u8,
    pub resolved_newline: Newline,
    pub truncated: bool,
    /// Set when the sink asked to stop (a `step` callback called `pause()`
    /// or the caller otherwise returned `false`) before all rows in this
    /// buffer were processed. Distinct from `truncated`, which marks a
    /// `preview` cutoff.
    pub paused: bool,
    /// Absolute byte offset of the last fully-committed row's terminator
    /// (or `base_index` if nothing was committed this call).
    pub cursor: usize,
}

/// Per-row sink used by [`crate::handle::ParserHandle`] for the
/// constant-memory `step` fast path: when set, rows are handed
/// to the sink as they complete instead of being buffered into
/// `ParseOutcome::data`. Returns `false` to stop processing the rest of
/// this buffer immediately — a step callback calling `pause()`.
pub type RowSink<'a> = dyn FnMut(RawRow, Vec<ParseError>) -> bool + 'a;

#[derive(Default, Clone)]
pub struct Parser {
    pub config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Parser { config }
    }

    pub fn parse(&self, req: ParseRequest<'_>) -> ParseOutcome {
        self.parse_with_sink(req, None)
    }

    pub fn parse_with_sink(
        &self,
        req: ParseRequest<'_>,
        mut sink: Option<&mut RowSink<'_>>,
    ) -> ParseOutcome {
        let input = req.input;

        let (delimiter, delimiter_detect_error) = match req.resolved_delimiter {
            Some(d) => (d, None),
            None => self.resolve_delimiter(input),
        };
        let newline = req
            .resolved_newline
            .unwrap_or_else(|| self.resolve_newline(input));

        let use_fast = match self.config.fast_mode {
            Some(b) => b,
            None => !input.contains(&self.config.quote_char),
        };

        let raw_rows = if use_fast {
            fast::scan(input, 0, delimiter, newline)
        } else {
            slow::scan(
                input,
                0,
                delimiter,
                self.config.quote_char,
                self.config.escape_char,
                newline,
            )
            .rows
        };

        // Drop a trailing unterminated row when more input may still arrive.
        let mut usable_rows = raw_rows;
        if req.ignore_last_row {
            if let Some(last) = usable_rows.last() {
                if !last.terminated {
                    usable_rows.pop();
                }
            }
        }

        let mut data = Vec::new();
        let mut errors = Vec::new();
        if let Some(e) = delimiter_detect_error {
            errors.push(e);
        }

        let mut rows_emitted = req.rows_so_far;
        let mut truncated = false;
        let mut paused = false;
        let mut cursor = req.base_index;

        for row in usable_rows {
            cursor = req.base_index + row.end_pos;

            if self.is_comment(input, row.content_range) {
                log::trace!("discarding comment line at offset {}", row.content_range.0);
                continue;
            }
            if self.is_skipped_empty(&row.fields) {
                log::trace!("discarding empty line at offset {}", row.content_range.0);
                continue;
            }

            let row_errors = slow::tag_errors(&row.errors, rows_emitted);

            if let Some(limit) = self.config.preview {
                if rows_emitted >= limit {
                    truncated = true;
                    break;
                }
            }

            if let Some(sink) = sink.as_deref_mut() {
                let keep_going = sink(row.fields, row_errors);
                rows_emitted += 1;
                if !keep_going {
                    paused = true;
                    break;
                }
            } else {
                data.push(row.fields);
                errors.extend(row_errors);
                rows_emitted += 1;
            }

            if let Some(limit) = self.config.preview {
                if rows_emitted == limit {
                    truncated = true;
                    break;
                }
            }
        }

        ParseOutcome {
            data,
            errors,
            resolved_delimiter: delimiter,
            resolved_newline: newline,
            truncated,
            paused,
            cursor,
        }
    }

    fn resolve_delimiter(&self, input: &[u8]) -> (u8, Option<ParseError>) {
        match &self.config.delimiter {
            crate::config::DelimiterConfig::Char(c) => (*c, None),
            crate::config::DelimiterConfig::Auto => {
                let d = detect::detect_delimiter(input, &self.config.delimiters_to_guess, self.config.quote_char);
                (d.delimiter, d.error)
            }
            crate::config::DelimiterConfig::Predicate(f) => (f(input), None),
        }
    }

    fn resolve_newline(&self, input: &[u8]) -> Newline {
        match self.config.newline {
            crate::config::NewlineConfig::Fixed(n) => n,
            crate::config::NewlineConfig::Auto => detect::detect_newline(input),
        }
    }

    fn is_comment(&self, input: &[u8], range: (usize, usize)) -> bool {
        match &self.config.comments {
            CommentsConfig::Off => false,
            CommentsConfig::Prefix(prefix) => {
                let line = &input[range.0..range.1];
                let trimmed_start = line.iter().position(|b| !b.is_ascii_whitespace());
                match trimmed_start {
                    Some(i) => line[i..].starts_with(prefix.as_bytes()),
                    None => false,
                }
            }
        }
    }

    fn is_skipped_empty(&self, fields: &[String]) -> bool {
        match self.config.skip_empty_lines {
            SkipEmptyLines::Off => false,
            SkipEmptyLines::On => fields.len() == 1 && fields[0].is_empty(),
            SkipEmptyLines::Greedy => fields.iter().all(|f| f.trim().is_empty()),
        }
    }
}
