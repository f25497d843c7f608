use crate::foundation::core::SurfaceSize;
use crate::foundation::error::{ArError, ArResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};
use crate::presentation::state::VisualState;

/// A frame as RGBA8 pixels.
///
/// Camera frames are usually straight alpha and opaque; renderer surfaces are usually
/// premultiplied. The `premultiplied` flag makes this explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; SurfaceSize::new(width, height).rgba_len()],
            premultiplied: true,
        }
    }

    /// Frame filled with one straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(px * 4);
        for _ in 0..px {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
            premultiplied: false,
        }
    }

    /// Wrap straight-alpha bytes, checking the buffer length.
    pub fn from_straight_rgba(width: u32, height: u32, data: Vec<u8>) -> ArResult<Self> {
        let frame = Self {
            width,
            height,
            data,
            premultiplied: false,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Convert a decoded image into a straight-alpha frame.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
            premultiplied: false,
        }
    }

    /// Check `data.len() == width * height * 4`.
    pub fn validate(&self) -> ArResult<()> {
        if self.data.len() != self.size().rgba_len() {
            return Err(ArError::validation(format!(
                "frame data is {} bytes, expected {} for {}",
                self.data.len(),
                self.size().rgba_len(),
                self.size()
            )));
        }
        Ok(())
    }

    /// Pixel dimensions.
    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    /// Return `true` for a zero-area frame.
    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Pixel at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = self.data.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Convert to premultiplied alpha in place.
    pub fn premultiply(&mut self) {
        if !self.premultiplied {
            premultiply_rgba8_in_place(&mut self.data);
            self.premultiplied = true;
        }
    }

    /// Straight-alpha copy suitable for image encoders.
    pub fn to_rgba_image(&self) -> ArResult<image::RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| ArError::validation("frame buffer does not match its dimensions"))
    }
}

/// The 3-D scene renderer, consumed through its per-entry controls and drawable surface.
///
/// Each tick the session calls [`SceneRenderer::apply`] once per catalog entry, then
/// [`SceneRenderer::draw`], then reads [`SceneRenderer::surface`].
pub trait SceneRenderer {
    /// Update visibility, pose and clip for catalog entry `index`.
    fn apply(&mut self, index: usize, state: &VisualState);

    /// Draw the current frame into the surface.
    fn draw(&mut self) -> ArResult<()> {
        Ok(())
    }

    /// The drawable surface, once the renderer has a canvas.
    fn surface(&self) -> Option<&FrameRGBA>;
}
