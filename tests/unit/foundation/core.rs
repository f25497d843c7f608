use super::*;

#[test]
fn vec3_serializes_as_array() {
    let v = Vec3::new(1.0, 2.5, -3.0);
    let json = serde_json::to_string(&v).unwrap();
    assert_eq!(json, "[1.0,2.5,-3.0]");
    let back: Vec3 = serde_json::from_str("[30, 30, 30]").unwrap();
    assert_eq!(back, Vec3::splat(30.0));
}

#[test]
fn vec3_scaled_is_componentwise() {
    assert_eq!(Vec3::new(1.0, 2.0, 3.0).scaled(2.0), Vec3::new(2.0, 4.0, 6.0));
    assert!(!Vec3::new(f32::NAN, 0.0, 0.0).is_finite());
}

#[test]
fn surface_size_empty_and_len() {
    assert!(SurfaceSize::new(0, 10).is_empty());
    assert!(!SurfaceSize::new(2, 3).is_empty());
    assert_eq!(SurfaceSize::new(2, 3).rgba_len(), 24);
    assert_eq!(SurfaceSize::new(640, 480).to_string(), "640x480");
}

#[test]
fn fps_rejects_zero_and_reports_duration() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    let fps = Fps::new(30, 1).unwrap();
    assert!((fps.frame_duration_secs() - 1.0 / 30.0).abs() < 1e-12);
}

#[test]
fn unix_millis_now_is_after_2020() {
    assert!(UnixMillis::now().0 > 1_577_836_800_000);
}
