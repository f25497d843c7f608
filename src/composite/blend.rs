use crate::foundation::error::{ArError, ArResult};
use crate::foundation::math::{mul_div255_u16, mul_div255_u8};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Blend `src` over `dst` pixel by pixel. `src_premul` says whether `src` needs
/// premultiplying first; `dst` is always premultiplied.
pub fn over_in_place(dst: &mut [u8], src: &[u8], src_premul: bool) -> ArResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ArError::validation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let s = if src_premul {
            [s[0], s[1], s[2], s[3]]
        } else {
            premul_px([s[0], s[1], s[2], s[3]])
        };
        let out = over([d[0], d[1], d[2], d[3]], s);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Flatten `src` over black into opaque pixels in `dst`.
pub fn flatten_opaque(dst: &mut [u8], src: &[u8], src_premul: bool) -> ArResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ArError::validation(
            "flatten_opaque expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 || src_premul {
            d[..3].copy_from_slice(&s[..3]);
        } else {
            for i in 0..3 {
                d[i] = mul_div255_u16(u16::from(s[i]), a).min(255) as u8;
            }
        }
        d[3] = 255;
    }
    Ok(())
}

fn premul_px(p: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(p[3]);
    match p[3] {
        255 => p,
        0 => [0, 0, 0, 0],
        _ => [
            mul_div255_u8(u16::from(p[0]), a),
            mul_div255_u8(u16::from(p[1]), a),
            mul_div255_u8(u16::from(p[2]), a),
            p[3],
        ],
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/blend.rs"]
mod tests;
