//! Camera + overlay compositing onto off-screen surfaces.

/// RGBA8 blend kernels.
pub mod blend;
/// The camera + overlay compositor.
pub mod compositor;
