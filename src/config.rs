//! Tagged-union configuration types.
//!
//! Per the Design Notes, every option that can vary in shape (a flag, a
//! per-column map, or a predicate) is represented as an enum resolved once
//! per parse/unparse call rather than re-matched per character or per row.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CsvError;
use crate::value::FieldValue;

/// Delimiter resolution: an explicit character, auto-detect, or a
/// predicate invoked once on the first chunk.
#[derive(Clone)]
pub enum DelimiterConfig {
    Char(u8),
    Auto,
    Predicate(Arc<dyn Fn(&[u8]) -> u8 + Send + Sync>),
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        DelimiterConfig::Auto
    }
}

impl std::fmt::Debug for DelimiterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelimiterConfig::Char(c) => write!(f, "DelimiterConfig::Char({})", *c as char),
            DelimiterConfig::Auto => write!(f, "DelimiterConfig::Auto"),
            DelimiterConfig::Predicate(_) => write!(f, "DelimiterConfig::Predicate(..)"),
        }
    }
}

/// Newline resolution: an explicit sequence, or auto-detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Cr,
    Lf,
    CrLf,
}

impl Newline {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Newline::Cr => b"\r",
            Newline::Lf => b"\n",
            Newline::CrLf => b"\r\n",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub enum NewlineConfig {
    #[default]
    Auto,
    Fixed(Newline),
}

/// Whether dynamic typing applies, and to which columns.
#[derive(Clone, Default)]
pub enum DynamicTyping {
    #[default]
    AllOff,
    AllOn,
    PerColumn(HashMap<String, bool>),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl DynamicTyping {
    pub fn applies(&self, column_name: Option<&str>, column_index: usize) -> bool {
        match self {
            DynamicTyping::AllOff => false,
            DynamicTyping::AllOn => true,
            DynamicTyping::PerColumn(map) => {
                let key = column_name
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| column_index.to_string());
                map.get(&key).copied().unwrap_or(false)
            }
            DynamicTyping::Predicate(f) => {
                let key = column_name
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| column_index.to_string());
                f(&key)
            }
        }
    }
}

impl std::fmt::Debug for DynamicTyping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DynamicTyping::AllOff => write!(f, "DynamicTyping::AllOff"),
            DynamicTyping::AllOn => write!(f, "DynamicTyping::AllOn"),
            DynamicTyping::PerColumn(m) => write!(f, "DynamicTyping::PerColumn({m:?})"),
            DynamicTyping::Predicate(_) => write!(f, "DynamicTyping::Predicate(..)"),
        }
    }
}

/// `skipEmptyLines`: off, on (wholly empty after CR/LF strip), or greedy
/// (also skip lines whose fields are all empty/whitespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipEmptyLines {
    #[default]
    Off,
    On,
    Greedy,
}

/// `comments`: off, or a non-empty prefix string.
#[derive(Debug, Clone, Default)]
pub enum CommentsConfig {
    #[default]
    Off,
    Prefix(String),
}

/// `quotes` unparse option: always/never, per-column, or a predicate.
#[derive(Clone)]
pub enum QuotesConfig {
    Always,
    Never,
    PerColumn(Vec<bool>),
    Predicate(Arc<dyn Fn(&FieldValue, usize) -> bool + Send + Sync>),
}

impl Default for QuotesConfig {
    fn default() -> Self {
        QuotesConfig::Never
    }
}

impl std::fmt::Debug for QuotesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotesConfig::Always => write!(f, "QuotesConfig::Always"),
            QuotesConfig::Never => write!(f, "QuotesConfig::Never"),
            QuotesConfig::PerColumn(v) => write!(f, "QuotesConfig::PerColumn({v:?})"),
            QuotesConfig::Predicate(_) => write!(f, "QuotesConfig::Predicate(..)"),
        }
    }
}

/// `escapeFormulae`: off, or on using the default leading-character set.
#[derive(Debug, Clone, Copy, Default)]
pub enum EscapeFormulae {
    #[default]
    Off,
    On,
}

pub const FORMULA_LEAD_CHARS: &[u8] = b"=+-@\t\r";

/// Default ordered list of delimiter candidates tried during auto-detect.
pub fn default_delimiters_to_guess() -> Vec<u8> {
    vec![b',', b'\t', b'|', b';', 0x1e, 0x1f]
}

/// Parser-facing configuration (everything the tokenizer state machine
/// itself consults). Cloned once per parse: see [`crate::handle::HandleConfig`]
/// for the semantic layer above it.
#[derive(Clone)]
pub struct ParserConfig {
    pub delimiter: DelimiterConfig,
    pub newline: NewlineConfig,
    pub quote_char: u8,
    pub escape_char: u8,
    pub preview: Option<usize>,
    pub fast_mode: Option<bool>,
    pub skip_empty_lines: SkipEmptyLines,
    pub comments: CommentsConfig,
    pub delimiters_to_guess: Vec<u8>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            delimiter: DelimiterConfig::default(),
            newline: NewlineConfig::default(),
            quote_char: b'"',
            escape_char: b'"',
            preview: None,
            fast_mode: None,
            skip_empty_lines: SkipEmptyLines::default(),
            comments: CommentsConfig::default(),
            delimiters_to_guess: default_delimiters_to_guess(),
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<(), CsvError> {
        if self.quote_char == 0 || self.escape_char == 0 {
            return Err(CsvError::InvalidQuoteOrEscape {
                quote: self.quote_char as char,
                escape: self.escape_char as char,
            });
        }
        Ok(())
    }
}
