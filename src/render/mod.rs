//! Frame buffers, the renderer contract and the 2-D sprite renderer.

/// Frame type and renderer trait.
pub mod backend;
/// PNG/JPEG/SVG decoding into frames.
pub mod decode;
/// Poster-per-character renderer.
pub mod sprite;
