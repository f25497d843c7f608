use std::io::Cursor;

use super::*;

fn png_bytes(img: &image::RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

#[test]
fn decode_png_premultiplies() {
    let mut img = image::RgbaImage::new(2, 1);
    img.put_pixel(0, 0, image::Rgba([255, 0, 0, 128]));
    img.put_pixel(1, 0, image::Rgba([10, 20, 30, 255]));

    let frame = decode_image(&png_bytes(&img)).unwrap();
    assert!(frame.premultiplied);
    assert_eq!(frame.pixel(0, 0), Some([128, 0, 0, 128]));
    assert_eq!(frame.pixel(1, 0), Some([10, 20, 30, 255]));
}

#[test]
fn decode_garbage_fails() {
    assert!(decode_image(b"not an image").is_err());
    assert!(decode_svg(b"<not-svg").is_err());
}

#[test]
fn decode_svg_rasterizes_at_intrinsic_size() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="4">
        <rect x="0" y="0" width="8" height="4" fill="#ff0000"/>
    </svg>"##;
    let frame = decode_svg(svg).unwrap();
    assert_eq!((frame.width, frame.height), (8, 4));
    assert_eq!(frame.pixel(4, 2), Some([255, 0, 0, 255]));
}
