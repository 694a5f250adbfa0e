//! The cooperative-suspension flags shared between a [`crate::streamer::ChunkStreamer`]
//! and the callbacks it invokes.
//!
//! Callbacks never get a live reference back into the
//! streamer or parser — only this thin, cloneable handle exposing
//! `pause`/`resume`/`abort` by flag, examined at well-defined safe points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Flags {
    paused: AtomicBool,
    aborted: AtomicBool,
}

/// Cloneable control handle. Cloning shares the same underlying flags —
/// a callback that clones its `Control` and stashes it still observes (and
/// can still trigger) pause/abort on the owning stream.
#[derive(Debug, Clone, Default)]
pub struct Control {
    flags: Arc<Flags>,
}

impl Control {
    pub fn new() -> Self {
        Control::default()
    }

    pub fn pause(&self) {
        self.flags.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.flags.paused.store(false, Ordering::SeqCst);
    }

    pub fn abort(&self) {
        self.flags.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::SeqCst)
    }

    pub fn is_aborted(&self) -> bool {
        self.flags.aborted.load(Ordering::SeqCst)
    }
}
