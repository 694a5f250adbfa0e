//! Error types for parsing and unparsing.
//!
//! Most CSV malformations are non-fatal and accumulate as [`ParseError`]
//! values in a [`crate::parser::ParseResult`] or [`crate::handle::Row`].
//! [`CsvError`] is reserved for conditions that prevent a parse or unparse
//! from starting at all (bad configuration, a source-level I/O failure).

use std::fmt;

/// Broad category of a non-fatal parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorType {
    Quotes,
    FieldMismatch,
    Delimiter,
}

impl fmt::Display for ParseErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParseErrorType::Quotes => "Quotes",
            ParseErrorType::FieldMismatch => "FieldMismatch",
            ParseErrorType::Delimiter => "Delimiter",
        };
        f.write_str(s)
    }
}

/// Specific reason code within a [`ParseErrorType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorCode {
    MissingQuotes,
    InvalidQuotes,
    UndetectableDelimiter,
    TooFewFields,
    TooManyFields,
}

impl fmt::Display for ParseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParseErrorCode::MissingQuotes => "MissingQuotes",
            ParseErrorCode::InvalidQuotes => "InvalidQuotes",
            ParseErrorCode::UndetectableDelimiter => "UndetectableDelimiter",
            ParseErrorCode::TooFewFields => "TooFewFields",
            ParseErrorCode::TooManyFields => "TooManyFields",
        };
        f.write_str(s)
    }
}

/// A single non-fatal malformation encountered during a parse.
///
/// `row` is the 0-based index among emitted data rows, when applicable.
/// `index` is the byte offset within the buffer being parsed, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorType,
    pub code: ParseErrorCode,
    pub message: String,
    pub row: Option<usize>,
    pub index: Option<usize>,
}

impl ParseError {
    pub fn new(kind: ParseErrorType, code: ParseErrorCode, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            code,
            message: message.into(),
            row: None,
            index: None,
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn missing_quotes(row: Option<usize>) -> Self {
        let mut e = ParseError::new(
            ParseErrorType::Quotes,
            ParseErrorCode::MissingQuotes,
            "Quoted field unterminated",
        );
        e.row = row;
        e
    }

    pub fn invalid_quotes(row: Option<usize>) -> Self {
        let mut e = ParseError::new(
            ParseErrorType::Quotes,
            ParseErrorCode::InvalidQuotes,
            "Trailing quote on quoted field is malformed",
        );
        e.row = row;
        e
    }

    pub fn undetectable_delimiter() -> Self {
        ParseError::new(
            ParseErrorType::Delimiter,
            ParseErrorCode::UndetectableDelimiter,
            "Unable to auto-detect delimiter; falling back to ','",
        )
    }

    pub fn too_few_fields(row: usize) -> Self {
        ParseError::new(
            ParseErrorType::FieldMismatch,
            ParseErrorCode::TooFewFields,
            "Too few fields: expected header length",
        )
        .with_row(row)
    }

    pub fn too_many_fields(row: usize) -> Self {
        ParseError::new(
            ParseErrorType::FieldMismatch,
            ParseErrorCode::TooManyFields,
            "Too many fields: header length exceeded",
        )
        .with_row(row)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.kind, self.code, self.message)?;
        if let Some(row) = self.row {
            write!(f, " (row {row})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Fatal errors: bad configuration, or a source-level failure that the
/// embedding application surfaces through the `error()` callback contract.
/// Parse malformations never produce a `CsvError`.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("quoteChar and escapeChar must be single characters, got quote={quote:?} escape={escape:?}")]
    InvalidQuoteOrEscape { quote: char, escape: char },

    #[error("delimiter predicate did not return a usable single character")]
    InvalidDelimiterPredicate,

    #[error("source I/O failure: {0}")]
    Source(String),

    #[error("operation attempted on an aborted stream")]
    Aborted,
}
