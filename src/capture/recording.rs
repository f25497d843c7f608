use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::composite::compositor::Compositor;
use crate::encode::stream::ContainerType;

/// Shared liveness flag for one recording loop.
///
/// Set while the loop may run; cleared by stop, finalize or an encoder abort. Clones observe
/// the same flag.
#[derive(Clone, Debug)]
pub struct LiveToken(Arc<AtomicBool>);

impl LiveToken {
    /// A live token.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Whether the loop may keep running.
    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// End the loop. Idempotent.
    pub fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for LiveToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Recording lifecycle as seen from outside the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    /// No session.
    #[default]
    Idle,
    /// Frames are being encoded.
    Recording,
}

/// The one in-flight recording: its surface, encoder chunks and loop token.
#[derive(Debug)]
pub(crate) struct CaptureSession {
    pub(crate) container: ContainerType,
    pub(crate) chunks: Vec<Vec<u8>>,
    pub(crate) compositor: Compositor,
    pub(crate) token: LiveToken,
    pub(crate) next_frame_at: Duration,
    pub(crate) last_flush: Duration,
    pub(crate) frames: u64,
}

impl CaptureSession {
    pub(crate) fn new(container: ContainerType, compositor: Compositor, now: Duration) -> Self {
        Self {
            container,
            chunks: Vec::new(),
            compositor,
            token: LiveToken::new(),
            next_frame_at: now,
            last_flush: now,
            frames: 0,
        }
    }

    /// Whether the next stream frame is due at `now`, within half a frame.
    pub(crate) fn frame_due(&self, now: Duration, frame: Duration) -> bool {
        now + frame / 2 >= self.next_frame_at
    }

    /// Book one encoded frame. A clock more than a frame behind `now` (after skipped ticks)
    /// restarts from `now` instead of replaying the missed slots.
    pub(crate) fn advance_frame_clock(&mut self, now: Duration, frame: Duration) {
        self.frames += 1;
        self.next_frame_at += frame;
        if self.next_frame_at <= now {
            self.next_frame_at = now + frame;
        }
    }

    /// Buffer a non-empty encoder chunk.
    pub(crate) fn push_chunk(&mut self, chunk: Vec<u8>) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    /// Whether a full timeslice elapsed since the last flush.
    pub(crate) fn flush_due(&self, now: Duration, timeslice: Duration) -> bool {
        now.saturating_sub(self.last_flush) >= timeslice
    }

    /// Chunks joined in arrival order.
    pub(crate) fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.chunks).concat()
    }
}
