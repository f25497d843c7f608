//! Recording encoders.
//!
//! The capture pipeline pushes composited frames into a [`stream::StreamEncoder`] and
//! collects muxed chunks from it on each timeslice.

/// `ffmpeg`-backed encoder (webm/mp4 via the system `ffmpeg`).
pub mod ffmpeg;
/// Encoder trait, container types and the in-memory encoder.
pub mod stream;
