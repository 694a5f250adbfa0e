//! The semantic layer above the tokenizer: header capture,
//! per-field transform, dynamic typing, and row-shape reconciliation
//! against the header.

use std::sync::Arc;

use crate::config::{DynamicTyping, Newline, ParserConfig};
use crate::error::ParseError;
use crate::parser::{ParseRequest, Parser, RawRow};
use crate::value::{FieldValue, Record, RecordMap};

/// Either a column index or, once headers are known, its name — passed to
/// `transform` so it can key off either.
#[derive(Debug, Clone)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

pub type TransformHeaderFn = dyn Fn(&str, usize) -> Option<String> + Send + Sync;
pub type TransformFn = dyn Fn(&str, &ColumnRef) -> String + Send + Sync;

#[derive(Clone, Default)]
pub struct HandleConfig {
    pub parser: ParserConfig,
    pub header: bool,
    pub transform_header: Option<Arc<TransformHeaderFn>>,
    pub transform: Option<Arc<TransformFn>>,
    pub dynamic_typing: DynamicTyping,
}

/// A row after transform/typing/header reconciliation, the shape the
/// `step(row, handle)` callback receives.
#[derive(Debug, Clone, PartialEq)]
pub enum RowData {
    Positional(Record),
    Mapped(RecordMap),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub data: RowData,
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, Default)]
pub struct HandleMeta {
    pub delimiter: u8,
    pub newline: Option<Newline>,
    pub truncated: bool,
    /// Set when a `step` sink asked to stop before the whole buffer was
    /// processed (see [`crate::parser::ParseOutcome::paused`]).
    pub paused: bool,
    pub cursor: usize,
    /// Set once, the first time a header row is consumed, and never
    /// mutated thereafter (spec invariant 3). A `None` entry marks a
    /// column whose transformed header name was empty — it keeps its
    /// position (so field counts stay meaningful) but is dropped when
    /// building a [`RecordMap`] (see DESIGN.md, Open Question).
    pub fields: Option<Vec<Option<String>>>,
}

pub struct HandleOutcome {
    pub rows: Vec<Row>,
    pub meta: HandleMeta,
}

pub struct ParserHandle {
    config: HandleConfig,
    parser: Parser,
    resolved_delimiter: Option<u8>,
    resolved_newline: Option<Newline>,
    fields: Option<Vec<Option<String>>>,
    rows_emitted: usize,
}

impl ParserHandle {
    pub fn new(config: HandleConfig) -> Self {
        let parser = Parser::new(config.parser.clone());
        ParserHandle {
            config,
            parser,
            resolved_delimiter: None,
            resolved_newline: None,
            fields: None,
            rows_emitted: 0,
        }
    }

    pub fn fields(&self) -> Option<&[Option<String>]> {
        self.fields.as_deref()
    }

    pub fn rows_emitted(&self) -> usize {
        self.rows_emitted
    }

    pub fn resolved_delimiter(&self) -> Option<u8> {
        self.resolved_delimiter
    }

    pub fn resolved_newline(&self) -> Option<Newline> {
        self.resolved_newline
    }

    /// Parse `buffer` (the streamer's `partialLine + chunk` concatenation).
    /// `on_row`, when set, streams rows out immediately (constant memory)
    /// instead of returning them in `HandleOutcome::rows`.
    pub fn parse(
        &mut self,
        buffer: &[u8],
        base_index: usize,
        ignore_last_row: bool,
        mut on_row: Option<&mut dyn FnMut(Row) -> bool>,
    ) -> HandleOutcome {
        let mut local_offset = 0usize;
        let mut cursor = base_index;

        if self.config.header && self.fields.is_none() {
            let mut header_only = self.parser.config.clone();
            header_only.preview = Some(1);
            let header_parser = Parser::new(header_only);

            let header_req = ParseRequest {
                input: buffer,
                base_index,
                ignore_last_row,
                resolved_delimiter: self.resolved_delimiter,
                resolved_newline: self.resolved_newline,
                rows_so_far: 0,
            };
            let header_out = header_parser.parse(header_req);

            if header_out_is_incomplete(&header_out) {
                // Not enough input yet to see a full header row: wait for
                // more data before pinning delimiter/newline or committing
                // anything, since a guess from a partial line can be wrong.
                return HandleOutcome {
                    rows: Vec::new(),
                    meta: HandleMeta {
                        delimiter: header_out.resolved_delimiter,
                        newline: Some(header_out.resolved_newline),
                        truncated: false,
                        paused: false,
                        cursor: base_index,
                        fields: None,
                    },
                };
            }

            self.resolved_delimiter = Some(header_out.resolved_delimiter);
            self.resolved_newline = Some(header_out.resolved_newline);

            let raw_header = &header_out.data[0];
            let transformed: Vec<Option<String>> = raw_header
                .iter()
                .enumerate()
                .map(|(i, name)| match &self.config.transform_header {
                    Some(f) => f(name, i),
                    None => Some(name.clone()),
                })
                .collect();
            log::debug!("captured header row: {transformed:?}");
            self.fields = Some(transformed);
            cursor = header_out.cursor;
            local_offset = header_out.cursor - base_index;
        }

        let mut rows = Vec::new();
        let mut truncated = false;
        let mut paused = false;
        let remaining = &buffer[local_offset..];

        if !remaining.is_empty() || !ignore_last_row {
            let data_req = ParseRequest {
                input: remaining,
                base_index: base_index + local_offset,
                ignore_last_row,
                resolved_delimiter: self.resolved_delimiter,
                resolved_newline: self.resolved_newline,
                rows_so_far: self.rows_emitted,
            };

            let fields = self.fields.clone();
            let config = &self.config;
            let mut row_index = self.rows_emitted;
            let mut sink_count = 0usize;
            let mut emit = |raw: RawRow, errors: Vec<ParseError>| -> bool {
                let row = build_row(raw, errors, row_index, fields.as_deref(), config);
                row_index += 1;
                sink_count += 1;
                match on_row.as_deref_mut() {
                    Some(sink) => sink(row),
                    None => {
                        rows.push(row);
                        true
                    }
                }
            };

            let data_out = self.parser.parse_with_sink(data_req, Some(&mut emit));

            self.resolved_delimiter = Some(data_out.resolved_delimiter);
            self.resolved_newline = Some(data_out.resolved_newline);
            self.rows_emitted += sink_count;
            cursor = data_out.cursor;
            truncated = data_out.truncated;
            paused = data_out.paused;
        }

        HandleOutcome {
            rows,
            meta: HandleMeta {
                delimiter: self.resolved_delimiter.unwrap_or(b','),
                newline: self.resolved_newline,
                truncated,
                paused,
                cursor,
                fields: self.fields.clone(),
            },
        }
    }
}

fn header_out_is_incomplete(header_out: &crate::parser::ParseOutcome) -> bool {
    header_out.data.is_empty()
}

fn build_row(
    raw: RawRow,
    mut errors: Vec<ParseError>,
    row_index: usize,
    fields: Option<&[Option<String>]>,
    config: &HandleConfig,
) -> Row {
    let transformed: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let col = match fields.and_then(|f| f.get(i)).and_then(|n| n.clone()) {
                Some(name) => ColumnRef::Name(name),
                None => ColumnRef::Index(i),
            };
            match &config.transform {
                Some(f) => f(&value, &col),
                None => value,
            }
        })
        .collect();

    let typed: Vec<FieldValue> = transformed
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let col_name = fields.and_then(|f| f.get(i)).and_then(|n| n.as_deref());
            if config.dynamic_typing.applies(col_name, i) {
                FieldValue::coerce(value)
            } else {
                FieldValue::Str(value)
            }
        })
        .collect();

    let data = match fields {
        None => RowData::Positional(typed),
        Some(header_fields) => {
            let header_len = header_fields.len();
            if typed.len() < header_len {
                log::warn!("row {row_index} has {} fields, expected {header_len}", typed.len());
                errors.push(ParseError::too_few_fields(row_index));
            } else if typed.len() > header_len {
                log::warn!("row {row_index} has {} fields, expected {header_len}", typed.len());
                errors.push(ParseError::too_many_fields(row_index));
            }
            RowData::Mapped(build_record_map(typed, header_fields))
        }
    };

    Row { data, errors }
}

// On the too-few-fields path (`values.len() < header_fields.len()`), a
// header name past the row's last value simply has no entry in
// `map.fields` at all, rather than an explicit absent/null marker.
fn build_record_map(mut values: Vec<FieldValue>, header_fields: &[Option<String>]) -> RecordMap {
    let mut map = RecordMap::default();
    let mut seen = std::collections::HashSet::new();
    let width = header_fields.len().min(values.len());

    for (i, name_slot) in header_fields.iter().enumerate().take(width) {
        if let Some(name) = name_slot {
            if seen.insert(name.clone()) {
                map.fields.push((name.clone(), values[i].clone()));
            }
            // Duplicate header name: position still consumed above, but
            // the first occurrence keeps the mapping slot.
        }
        // name_slot == None: column kept at its position, dropped from the map.
    }

    if values.len() > header_fields.len() {
        map.extra = values.split_off(header_fields.len());
    }

    map
}
