//! Record collection → CSV text. The inverse of
//! [`crate::handle::ParserHandle`] for the common case (no dynamic typing,
//! all-string fields), but also accepts arbitrary [`FieldValue`]s.

mod quote;

use crate::config::{EscapeFormulae, Newline, QuotesConfig, SkipEmptyLines, FORMULA_LEAD_CHARS};
use crate::value::{FieldValue, Record, RecordMap};

/// The three input shapes the unparser accepts.
pub enum UnparseInput {
    /// Array of header-mapped rows; header is the union of keys in
    /// first-occurrence order unless `columns` is set.
    Objects(Vec<RecordMap>),
    /// Array of arrays; no header is derived unless `columns` is set.
    Arrays(Vec<Record>),
    /// Explicit `{fields, data}` envelope.
    Envelope { fields: Vec<String>, data: Vec<Record> },
}

#[derive(Clone)]
pub struct UnparserConfig {
    pub delimiter: u8,
    pub quote_char: u8,
    pub escape_char: u8,
    pub newline: Newline,
    pub header: bool,
    pub quotes: QuotesConfig,
    pub columns: Option<Vec<String>>,
    pub skip_empty_lines: SkipEmptyLines,
    pub escape_formulae: EscapeFormulae,
}

impl Default for UnparserConfig {
    fn default() -> Self {
        UnparserConfig {
            delimiter: b',',
            quote_char: b'"',
            escape_char: b'"',
            newline: Newline::CrLf,
            header: true,
            quotes: QuotesConfig::default(),
            columns: None,
            skip_empty_lines: SkipEmptyLines::default(),
            escape_formulae: EscapeFormulae::default(),
        }
    }
}

#[derive(Default, Clone)]
pub struct Unparser {
    pub config: UnparserConfig,
}

impl Unparser {
    pub fn new(config: UnparserConfig) -> Self {
        Unparser { config }
    }

    /// Buffer the whole output into a `String`. For constant-memory export
    /// of large collections, use [`Self::unparse_to`].
    pub fn unparse(&self, input: UnparseInput) -> String {
        let mut out = Vec::new();
        self.unparse_to(input, &mut |bytes| out.extend_from_slice(bytes));
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Stream output a line at a time into `sink`.
    pub fn unparse_to(&self, input: UnparseInput, sink: &mut dyn FnMut(&[u8])) {
        let (header, rows) = self.resolve(input);
        let newline = self.config.newline.as_bytes();
        let mut first_line = true;

        if self.config.header {
            if let Some(columns) = &header {
                let values: Vec<FieldValue> =
                    columns.iter().map(|c| FieldValue::Str(c.clone())).collect();
                self.write_row(&values, sink);
                first_line = false;
            }
        }

        for row in &rows {
            if self.is_skipped_empty(row) {
                continue;
            }
            if !first_line {
                sink(newline);
            }
            self.write_row(row, sink);
            first_line = false;
        }
    }

    fn resolve(&self, input: UnparseInput) -> (Option<Vec<String>>, Vec<Record>) {
        match input {
            UnparseInput::Envelope { fields, data } => (Some(fields), data),
            UnparseInput::Arrays(rows) => (self.config.columns.clone(), rows),
            UnparseInput::Objects(maps) => {
                let columns = match &self.config.columns {
                    Some(c) => c.clone(),
                    None => union_of_keys(&maps),
                };
                let rows = maps
                    .iter()
                    .map(|m| {
                        columns
                            .iter()
                            .map(|c| m.get(c).cloned().unwrap_or_else(|| FieldValue::Str(String::new())))
                            .collect()
                    })
                    .collect();
                (Some(columns), rows)
            }
        }
    }

    fn write_row(&self, row: &[FieldValue], sink: &mut dyn FnMut(&[u8])) {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                sink(&[self.config.delimiter]);
            }
            self.write_field(value, i, sink);
        }
    }

    fn write_field(&self, value: &FieldValue, column: usize, sink: &mut dyn FnMut(&[u8])) {
        let rendered = value.to_string();
        let bytes = self.apply_formula_escape(rendered.into_bytes());

        let force_quote = match &self.config.quotes {
            QuotesConfig::Always => true,
            QuotesConfig::Never => false,
            QuotesConfig::PerColumn(flags) => flags.get(column).copied().unwrap_or(false),
            QuotesConfig::Predicate(f) => f(value, column),
        };

        if force_quote || quote::field_needs_quoting(&bytes, self.config.delimiter, self.config.quote_char) {
            let mut out = Vec::with_capacity(bytes.len() + 2);
            quote::write_quoted_field(&mut out, &bytes, self.config.quote_char, self.config.escape_char);
            sink(&out);
        } else {
            sink(&bytes);
        }
    }

    fn apply_formula_escape(&self, bytes: Vec<u8>) -> Vec<u8> {
        if matches!(self.config.escape_formulae, EscapeFormulae::Off) {
            return bytes;
        }
        match bytes.first() {
            Some(b) if FORMULA_LEAD_CHARS.contains(b) => {
                let mut prefixed = Vec::with_capacity(bytes.len() + 1);
                prefixed.push(b'\'');
                prefixed.extend_from_slice(&bytes);
                prefixed
            }
            _ => bytes,
        }
    }

    fn is_skipped_empty(&self, row: &[FieldValue]) -> bool {
        match self.config.skip_empty_lines {
            SkipEmptyLines::Off => false,
            SkipEmptyLines::On => row.len() == 1 && row[0].is_empty_str(),
            SkipEmptyLines::Greedy => row.iter().all(|f| f.to_string().trim().is_empty()),
        }
    }
}

fn union_of_keys(maps: &[RecordMap]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut columns = Vec::new();
    for map in maps {
        for (key, _) in &map.fields {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}
