//! Streaming CSV/delimited-text parser and unparser.
//!
//! Three layers, leaves first:
//!
//! - [`parser`] — the tokenizer: a pure `(bytes, config) -> rows` state
//!   machine, with delimiter/newline auto-detection and a fast path for
//!   quote-free input.
//! - [`handle`] — header capture, per-field transform, dynamic typing, and
//!   row-shape reconciliation against the header.
//! - [`streamer`] — chunked ingestion with seam preservation: feed
//!   arbitrarily-sized byte chunks and get rows back as soon as they
//!   complete, independent of how the input happened to be split.
//!
//! [`unparser`] runs the other direction: record collections to CSV text,
//! with the same quoting/newline/delimiter configuration.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod control;
pub mod error;
pub mod handle;
pub mod parser;
pub mod streamer;
pub mod unparser;
pub mod value;

pub use control::Control;
pub use error::{CsvError, ParseError, ParseErrorCode, ParseErrorType};
pub use handle::{ColumnRef, HandleConfig, ParserHandle, Row, RowData};
pub use parser::{ParseOutcome, ParseRequest, Parser};
pub use streamer::{ChunkResult, ChunkStreamer, CompleteResult, StreamerConfig, StreamerEvents};
pub use unparser::{Unparser, UnparserConfig, UnparseInput};
pub use value::{FieldValue, Record, RecordMap};
