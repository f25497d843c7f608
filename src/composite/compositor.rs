use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba};

use crate::composite::blend::{flatten_opaque, over_in_place};
use crate::foundation::core::SurfaceSize;
use crate::render::backend::FrameRGBA;

/// Which compositing input was missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingSource {
    /// No live camera frame yet.
    Camera,
    /// Renderer has no canvas yet.
    Renderer,
}

impl std::fmt::Display for MissingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera => f.write_str("camera frame"),
            Self::Renderer => f.write_str("renderer surface"),
        }
    }
}

/// Compositing failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositeError {
    /// A source is not ready yet. Not fatal; retry on the next tick.
    #[error("{0} is not available yet")]
    SurfaceUnavailable(MissingSource),
    /// A source buffer does not match its declared dimensions.
    #[error("{input} buffer is malformed: {reason}")]
    Malformed {
        /// Which input.
        input: MissingSource,
        /// What was wrong.
        reason: String,
    },
}

/// Counters for one compositor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositorStats {
    /// Successful composites.
    pub composites: u64,
    /// Surface (re)allocations.
    pub resizes: u64,
}

/// Merges the camera frame and the rendered overlay into an owned, opaque surface.
///
/// The surface tracks the renderer's pixel size; a size change between calls reallocates
/// it. The camera frame is stretched to the surface bounds, then the overlay drawn on top
/// with source-over blending.
#[derive(Debug, Default)]
pub struct Compositor {
    surface: Option<FrameRGBA>,
    stats: CompositorStats,
}

impl Compositor {
    /// A compositor with no surface allocated yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite one frame and borrow the result.
    pub fn composite(
        &mut self,
        camera: Option<&FrameRGBA>,
        rendered: Option<&FrameRGBA>,
    ) -> Result<&FrameRGBA, CompositeError> {
        let camera = ready(camera, MissingSource::Camera)?;
        let rendered = ready(rendered, MissingSource::Renderer)?;

        let size = rendered.size();
        let surface = ensure_size(&mut self.surface, &mut self.stats, size);

        if camera.size() == size {
            flatten_opaque(&mut surface.data, &camera.data, camera.premultiplied)
                .map_err(|e| malformed(MissingSource::Camera, e))?;
        } else {
            let view: ImageBuffer<Rgba<u8>, &[u8]> =
                ImageBuffer::from_raw(camera.width, camera.height, camera.data.as_slice())
                    .ok_or_else(|| CompositeError::Malformed {
                        input: MissingSource::Camera,
                        reason: "buffer does not match dimensions".to_string(),
                    })?;
            let stretched = imageops::resize(&view, size.width, size.height, FilterType::Triangle);
            flatten_opaque(&mut surface.data, stretched.as_raw(), camera.premultiplied)
                .map_err(|e| malformed(MissingSource::Camera, e))?;
        }

        over_in_place(&mut surface.data, &rendered.data, rendered.premultiplied)
            .map_err(|e| malformed(MissingSource::Renderer, e))?;

        self.stats.composites += 1;
        Ok(&*surface)
    }

    /// The last composited surface.
    pub fn surface(&self) -> Option<&FrameRGBA> {
        self.surface.as_ref()
    }

    /// Give up the surface, e.g. to hand it to an encoder.
    pub fn into_surface(self) -> Option<FrameRGBA> {
        self.surface
    }

    /// Current counters.
    pub fn stats(&self) -> CompositorStats {
        self.stats
    }
}

fn ensure_size<'a>(
    slot: &'a mut Option<FrameRGBA>,
    stats: &mut CompositorStats,
    size: SurfaceSize,
) -> &'a mut FrameRGBA {
    if slot.as_ref().is_none_or(|s| s.size() != size) {
        tracing::debug!(%size, "allocating composite surface");
        stats.resizes += 1;
        *slot = None;
    }
    slot.get_or_insert_with(|| FrameRGBA::transparent(size.width, size.height))
}

fn ready(frame: Option<&FrameRGBA>, which: MissingSource) -> Result<&FrameRGBA, CompositeError> {
    match frame {
        Some(f) if !f.is_empty() => Ok(f),
        _ => Err(CompositeError::SurfaceUnavailable(which)),
    }
}

fn malformed(input: MissingSource, e: crate::ArError) -> CompositeError {
    CompositeError::Malformed {
        input,
        reason: e.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/compositor.rs"]
mod tests;
