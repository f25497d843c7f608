//! Still and video capture: artifacts, the recording session and share-then-download
//! disposition.

/// Capture results and capture errors.
pub mod artifact;
/// Share sheet and download collaborators.
pub mod disposition;
/// Still capture and the recording loop.
pub mod pipeline;
/// Recording session state and its liveness token.
pub mod recording;
