use super::*;

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 255];
    assert_eq!(over(dst, [0, 0, 0, 0]), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255]), [255, 0, 0, 255]);
}

#[test]
fn over_half_alpha_on_opaque_stays_opaque() {
    // Premultiplied red @ 50% over opaque blue.
    let out = over([0, 0, 255, 255], [128, 0, 0, 128]);
    assert_eq!(out, [128, 0, 127, 255]);
}

#[test]
fn over_in_place_premultiplies_straight_sources() {
    let mut dst = vec![0u8, 0, 255, 255];
    over_in_place(&mut dst, &[255, 0, 0, 128], false).unwrap();
    assert_eq!(dst, vec![128, 0, 127, 255]);
}

#[test]
fn length_mismatch_is_error() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], true).is_err());
    assert!(flatten_opaque(&mut dst, &[0u8; 4], true).is_err());
}

#[test]
fn flatten_straight_over_black() {
    let mut dst = vec![0u8; 4];
    flatten_opaque(&mut dst, &[255, 0, 0, 128], false).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);

    flatten_opaque(&mut dst, &[128, 0, 0, 128], true).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}
