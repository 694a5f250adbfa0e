//! Chunked feed with seam preservation: receives byte chunks of
//! arbitrary size, concatenates with whatever tail was carried from the
//! previous call, and drives the [`crate::handle::ParserHandle`] across the
//! growing buffer without ever re-scanning already-committed rows.

use std::sync::Arc;

use crate::config::Newline;
use crate::control::Control;
use crate::error::CsvError;
use crate::handle::{HandleConfig, HandleMeta, ParserHandle, Row};

const BOM: &[u8] = "\u{feff}".as_bytes();

pub type BeforeFirstChunkFn = dyn Fn(Vec<u8>) -> Option<Vec<u8>> + Send + Sync;

#[derive(Clone, Default)]
pub struct StreamerConfig {
    pub skip_first_n_lines: usize,
    pub before_first_chunk: Option<Arc<BeforeFirstChunkFn>>,
}

/// Per-chunk event payload, passed to a registered `chunk(results, handle)` callback.
pub struct ChunkResult {
    pub rows: Vec<Row>,
    pub meta: HandleMeta,
}

/// Terminal event payload, passed to a registered `complete(results)` callback. `rows` is empty
/// when a `step` or `chunk` callback was registered, since rows were
/// already delivered as they completed.
pub struct CompleteResult {
    pub rows: Vec<Row>,
    pub aborted: bool,
    pub truncated: bool,
    pub cursor: usize,
    pub fields: Option<Vec<Option<String>>>,
    pub delimiter: Option<u8>,
    pub newline: Option<Newline>,
}

#[derive(Default)]
pub struct StreamerEvents {
    pub on_step: Option<Box<dyn FnMut(Row, Control) + Send>>,
    pub on_chunk: Option<Box<dyn FnMut(ChunkResult, Control) + Send>>,
    pub on_complete: Option<Box<dyn FnMut(CompleteResult) + Send>>,
    pub on_error: Option<Box<dyn FnMut(CsvError) + Send>>,
}

pub struct ChunkStreamer {
    handle: ParserHandle,
    streamer_config: StreamerConfig,
    events: StreamerEvents,
    control: Control,

    partial_line: Vec<u8>,
    base_index: usize,
    first_chunk_seen: bool,
    lines_to_skip: usize,
    halted: bool,
    accumulated_rows: Vec<Row>,
    truncated: bool,
}

impl ChunkStreamer {
    pub fn new(handle_config: HandleConfig, streamer_config: StreamerConfig, events: StreamerEvents) -> Self {
        let lines_to_skip = streamer_config.skip_first_n_lines;
        ChunkStreamer {
            handle: ParserHandle::new(handle_config),
            streamer_config,
            events,
            control: Control::new(),
            partial_line: Vec::new(),
            base_index: 0,
            first_chunk_seen: false,
            lines_to_skip,
            halted: false,
            accumulated_rows: Vec::new(),
            truncated: false,
        }
    }

    pub fn control(&self) -> Control {
        self.control.clone()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn abort(&mut self) {
        self.control.abort();
    }

    /// Feed one chunk. `is_final` is true on the chunk that carries (or is
    /// immediately followed by) end-of-input; see [`Self::end`] for the
    /// common case of signaling EOF with no trailing bytes.
    pub fn write(&mut self, chunk: &[u8], is_final: bool) {
        if self.halted {
            return;
        }
        if self.control.is_aborted() {
            log::debug!("write() after abort(): dropping chunk");
            self.finish(true);
            return;
        }

        let mut chunk = chunk.to_vec();

        if !self.first_chunk_seen {
            if let Some(f) = self.streamer_config.before_first_chunk.clone() {
                if let Some(replacement) = f(chunk.clone()) {
                    chunk = replacement;
                }
            }
            if chunk.starts_with(BOM) {
                chunk.drain(0..BOM.len());
            }
            self.first_chunk_seen = true;
        }

        let mut buffer = std::mem::take(&mut self.partial_line);
        buffer.extend_from_slice(&chunk);

        if self.lines_to_skip > 0 {
            let (remaining, skipped, consumed_bytes) = strip_leading_lines(&buffer, self.lines_to_skip);
            self.lines_to_skip -= skipped;
            self.base_index += consumed_bytes;
            buffer = remaining;
        }

        let ignore_last_row = !is_final;
        let base_index = self.base_index;

        let outcome = if let Some(on_step) = self.events.on_step.as_mut() {
            let control = self.control.clone();
            let mut sink = |row: Row| -> bool {
                on_step(row, control.clone());
                !control.is_paused()
            };
            self.handle.parse(&buffer, base_index, ignore_last_row, Some(&mut sink))
        } else {
            self.handle.parse(&buffer, base_index, ignore_last_row, None)
        };

        let consumed = outcome.meta.cursor - base_index;
        self.partial_line = buffer[consumed..].to_vec();
        self.base_index = outcome.meta.cursor;
        log::debug!(
            "consumed {consumed} bytes this chunk, {} carried into next buffer",
            self.partial_line.len()
        );
        if outcome.meta.truncated {
            self.truncated = true;
        }

        if self.events.on_step.is_none() {
            if let Some(on_chunk) = self.events.on_chunk.as_mut() {
                on_chunk(
                    ChunkResult {
                        rows: outcome.rows,
                        meta: outcome.meta,
                    },
                    self.control.clone(),
                );
            } else {
                self.accumulated_rows.extend(outcome.rows);
            }
        }

        if self.truncated || self.control.is_aborted() {
            self.finish(self.control.is_aborted());
            return;
        }

        if outcome.meta.paused {
            // A step callback called pause() mid-buffer (spec suspension
            // point 2): stop here, keep the unconsumed tail in
            // partial_line, and wait. Resumption replays no input; the
            // source is responsible for not writing more until resume(),
            // and (if this was meant to be the final chunk) for calling
            // write()/end() again once resumed so complete() still fires.
            log::debug!("paused at cursor {}, {} bytes carried over", self.base_index, self.partial_line.len());
            return;
        }

        if is_final {
            self.finish(false);
        }
    }

    /// Signal end-of-input with no further bytes.
    pub fn end(&mut self) {
        if self.halted {
            return;
        }
        self.write(&[], true);
    }

    fn finish(&mut self, aborted: bool) {
        if self.halted {
            return;
        }
        self.halted = true;
        let rows = std::mem::take(&mut self.accumulated_rows);
        if let Some(on_complete) = self.events.on_complete.as_mut() {
            on_complete(CompleteResult {
                rows,
                aborted,
                truncated: self.truncated,
                cursor: self.base_index,
                fields: self.handle.fields().map(|f| f.to_vec()),
                delimiter: self.handle.resolved_delimiter(),
                newline: self.handle.resolved_newline(),
            });
        }
    }
}

/// Strip up to `n` complete lines from the front of `buffer`, respecting
/// `\n`-terminated lines (CRLF included, since `\r` immediately precedes
/// the `\n` it strips along with it). Returns the remaining bytes, how
/// many lines were actually removed, and how many bytes that consumed (so
/// the caller can keep its absolute cursor in sync).
///
/// Only splits on `\n`, so a stream configured for bare `Newline::Cr` line
/// endings won't have any lines stripped here.
fn strip_leading_lines(buffer: &[u8], n: usize) -> (Vec<u8>, usize, usize) {
    let mut pos = 0;
    let mut removed = 0;
    while removed < n {
        match buffer[pos..].iter().position(|&b| b == b'\n') {
            Some(rel) => {
                pos += rel + 1;
                removed += 1;
            }
            None => break,
        }
    }
    (buffer[pos..].to_vec(), removed, pos)
}
