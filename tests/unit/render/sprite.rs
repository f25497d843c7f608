use super::*;
use crate::catalog::character::Character;
use crate::foundation::core::Vec3;
use crate::presentation::state::{PresentationState, ScaleFactor};

fn catalog() -> Catalog {
    Catalog::new(vec![
        Character::new("a", "A", "a.glb").with_scale(Vec3::splat(2.0)),
        Character::new("b", "B", "b.glb"),
    ])
    .unwrap()
}

#[test]
fn no_surface_until_first_draw() {
    let cat = catalog();
    let mut r = SpriteRenderer::new(SurfaceSize::new(8, 8), &cat);
    assert!(r.surface().is_none());
    r.draw().unwrap();
    let s = r.surface().unwrap();
    assert!(s.premultiplied);
    assert!(s.data.iter().all(|b| *b == 0));
}

#[test]
fn visible_sprite_is_drawn_centred_and_zoomed() {
    let cat = catalog();
    let mut r = SpriteRenderer::new(SurfaceSize::new(10, 10), &cat);
    r.set_sprite(0, FrameRGBA::solid(2, 2, [0, 255, 0, 255]));

    let mut p = PresentationState::new(ScaleFactor::default());
    r.apply(0, &p.visual_state(cat.get(0).unwrap(), true));
    r.apply(1, &p.visual_state(cat.get(1).unwrap(), false));
    r.draw().unwrap();
    let s = r.surface().unwrap();
    assert_eq!(s.pixel(4, 4), Some([0, 255, 0, 255]));
    assert_eq!(s.pixel(5, 5), Some([0, 255, 0, 255]));
    assert_eq!(s.pixel(3, 3), Some([0, 0, 0, 0]));

    p.set_scale(2.0).unwrap();
    r.apply(0, &p.visual_state(cat.get(0).unwrap(), true));
    r.draw().unwrap();
    let s = r.surface().unwrap();
    assert_eq!(s.pixel(3, 3), Some([0, 255, 0, 255]));
    assert_eq!(s.pixel(6, 6), Some([0, 255, 0, 255]));
    assert_eq!(s.pixel(2, 2), Some([0, 0, 0, 0]));
}

#[test]
fn hidden_sprite_is_not_drawn_and_clip_is_recorded() {
    let cat = Catalog::builtin();
    let mut r = SpriteRenderer::new(SurfaceSize::new(4, 4), &cat);
    r.set_sprite(0, FrameRGBA::solid(4, 4, [255, 255, 255, 255]));
    let p = PresentationState::default();
    r.apply(0, &p.visual_state(cat.get(0).unwrap(), false));
    r.draw().unwrap();
    assert!(r.surface().unwrap().data.iter().all(|b| *b == 0));
    assert_eq!(r.clip(0).unwrap().name, "Idle");
}
