use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba};
use tracing::{debug, warn};

use crate::catalog::character::Catalog;
use crate::composite::blend::over;
use crate::foundation::core::SurfaceSize;
use crate::foundation::error::ArResult;
use crate::presentation::state::{ClipDirective, VisualState};
use crate::render::backend::{FrameRGBA, SceneRenderer};
use crate::render::decode::load_image_file;

struct Entry {
    sprite: Option<FrameRGBA>,
    base_scale: f32,
    state: Option<VisualState>,
}

/// 2-D stand-in for the model renderer: draws one flat poster per catalog entry.
///
/// Posters are centred on the surface, offset by the entry's `position` (x/y in half-surface
/// units) and scaled by the user zoom, i.e. the ratio between the applied scale and the
/// entry's base scale. Rotation and clips are recorded but not drawn.
pub struct SpriteRenderer {
    size: SurfaceSize,
    entries: Vec<Entry>,
    frame: FrameRGBA,
    drawn: bool,
}

impl SpriteRenderer {
    /// A renderer of `size` with no posters; every frame is fully transparent.
    pub fn new(size: SurfaceSize, catalog: &Catalog) -> Self {
        let entries = catalog
            .iter()
            .map(|c| Entry {
                sprite: None,
                base_scale: c.scale.x,
                state: None,
            })
            .collect();
        Self {
            size,
            entries,
            frame: FrameRGBA::transparent(size.width, size.height),
            drawn: false,
        }
    }

    /// Load `<dir>/<id>.png` or `<dir>/<id>.svg` for every entry that has one.
    pub fn with_sprite_dir(mut self, dir: &Path, catalog: &Catalog) -> ArResult<Self> {
        for (i, c) in catalog.iter().enumerate() {
            let found = ["png", "svg"]
                .iter()
                .map(|ext| dir.join(format!("{}.{ext}", c.id)))
                .find(|p| p.is_file());
            match found {
                Some(path) => {
                    debug!(id = %c.id, path = %path.display(), "loading sprite");
                    self.set_sprite(i, load_image_file(&path)?);
                }
                None => warn!(id = %c.id, dir = %dir.display(), "no sprite for character"),
            }
        }
        Ok(self)
    }

    /// Set the poster for catalog entry `index`.
    pub fn set_sprite(&mut self, index: usize, mut sprite: FrameRGBA) {
        sprite.premultiply();
        if let Some(e) = self.entries.get_mut(index) {
            e.sprite = Some(sprite);
        }
    }

    /// Resize the canvas, as on device rotation.
    pub fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        self.frame = FrameRGBA::transparent(size.width, size.height);
    }

    /// Last state applied to `index`.
    pub fn state(&self, index: usize) -> Option<&VisualState> {
        self.entries.get(index)?.state.as_ref()
    }

    /// Clip last requested for `index`.
    pub fn clip(&self, index: usize) -> Option<&ClipDirective> {
        self.state(index)?.clip.as_ref()
    }
}

impl SceneRenderer for SpriteRenderer {
    fn apply(&mut self, index: usize, state: &VisualState) {
        if let Some(e) = self.entries.get_mut(index) {
            e.state = Some(state.clone());
        }
    }

    fn draw(&mut self) -> ArResult<()> {
        self.frame.data.fill(0);
        for e in &self.entries {
            let (Some(sprite), Some(state)) = (&e.sprite, &e.state) else {
                continue;
            };
            if !state.visible {
                continue;
            }
            let zoom = if e.base_scale.abs() > f32::EPSILON {
                state.scale.x / e.base_scale
            } else {
                1.0
            };
            blit(&mut self.frame, sprite, zoom, state);
        }
        self.drawn = true;
        Ok(())
    }

    fn surface(&self) -> Option<&FrameRGBA> {
        if self.drawn && !self.size.is_empty() {
            Some(&self.frame)
        } else {
            None
        }
    }
}

fn blit(frame: &mut FrameRGBA, sprite: &FrameRGBA, zoom: f32, state: &VisualState) {
    let tw = ((sprite.width as f32) * zoom).round().max(1.0) as u32;
    let th = ((sprite.height as f32) * zoom).round().max(1.0) as u32;

    let resized;
    let (src, sw, sh): (&[u8], u32, u32) = if (tw, th) == (sprite.width, sprite.height) {
        (&sprite.data, sprite.width, sprite.height)
    } else {
        let Some(view) = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(
            sprite.width,
            sprite.height,
            sprite.data.as_slice(),
        ) else {
            return;
        };
        resized = imageops::resize(&view, tw, th, FilterType::Triangle);
        (resized.as_raw(), tw, th)
    };

    let half_w = f64::from(frame.width) / 2.0;
    let half_h = f64::from(frame.height) / 2.0;
    let cx = half_w + f64::from(state.position.x) * half_w;
    let cy = half_h - f64::from(state.position.y) * half_h;
    let x0 = (cx - f64::from(sw) / 2.0).round() as i64;
    let y0 = (cy - f64::from(sh) / 2.0).round() as i64;

    let fw = i64::from(frame.width);
    let fh = i64::from(frame.height);
    for sy in 0..i64::from(sh) {
        let dy = y0 + sy;
        if dy < 0 || dy >= fh {
            continue;
        }
        for sx in 0..i64::from(sw) {
            let dx = x0 + sx;
            if dx < 0 || dx >= fw {
                continue;
            }
            let si = ((sy * i64::from(sw) + sx) * 4) as usize;
            let di = ((dy * fw + dx) * 4) as usize;
            let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            let d = &mut frame.data[di..di + 4];
            let out = over([d[0], d[1], d[2], d[3]], s);
            d.copy_from_slice(&out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/sprite.rs"]
mod tests;
