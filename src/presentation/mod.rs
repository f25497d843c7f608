//! Character presentation: zoom, clip selection, visibility and the controls over the surface.

/// Control hit regions and the UI snapshot.
pub mod controls;
/// Zoom factor, clip selection and per-entry visual state.
pub mod state;
