use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{ArError, ArResult};
use crate::render::backend::FrameRGBA;

// Avoid pathological allocations from hostile SVG sizes.
const MAX_SVG_DIM: u32 = 16_384;

/// Decode encoded image bytes into a premultiplied frame.
pub fn decode_image(bytes: &[u8]) -> ArResult<FrameRGBA> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let mut frame = FrameRGBA::from_rgba_image(dyn_img.to_rgba8());
    frame.premultiply();
    Ok(frame)
}

/// Parse SVG bytes and rasterize them at their intrinsic size into a premultiplied frame.
pub fn decode_svg(bytes: &[u8]) -> ArResult<FrameRGBA> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let size = tree.size();
    let to_px = |v: f32| -> ArResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(ArError::validation("svg has invalid width/height"));
        }
        let px = (v.ceil() as u32).max(1);
        if px > MAX_SVG_DIM {
            return Err(ArError::validation(format!(
                "svg raster size too large: {px} (max {MAX_SVG_DIM})"
            )));
        }
        Ok(px)
    };
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ArError::validation("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    Ok(FrameRGBA {
        width,
        height,
        data: pixmap.data().to_vec(),
        premultiplied: true,
    })
}

/// Load a PNG/JPEG/... or `.svg` file from disk.
pub fn load_image_file(path: &Path) -> ArResult<FrameRGBA> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        decode_svg(&bytes)
    } else {
        decode_image(&bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/decode.rs"]
mod tests;
