use super::*;

fn cfg(container: Option<ContainerType>) -> StreamConfig {
    StreamConfig {
        size: SurfaceSize::new(4, 2),
        fps: Fps::new(30, 1).unwrap(),
        container,
    }
}

#[test]
fn container_mime_parsing_ignores_codec_params() {
    assert_eq!(
        ContainerType::from_mime("video/webm;codecs=vp9"),
        Some(ContainerType::Webm)
    );
    assert_eq!(ContainerType::from_mime("VIDEO/MP4"), Some(ContainerType::Mp4));
    assert_eq!(ContainerType::from_mime("video/ogg"), None);
    assert_eq!(ContainerType::Mp4.extension(), "mp4");
}

#[test]
fn in_memory_encoder_emits_one_record_per_frame() {
    let mut enc = InMemoryEncoder::new();
    let log = enc.log();
    assert_eq!(enc.state(), EncoderState::Inactive);
    assert_eq!(enc.start(cfg(None)).unwrap(), Some(ContainerType::Webm));
    assert_eq!(enc.state(), EncoderState::Recording);

    enc.push_frame(&FrameRGBA::transparent(4, 2)).unwrap();
    assert_eq!(enc.request_data().unwrap(), vec![4, 0, 0, 0, 2, 0, 0, 0]);
    assert!(enc.request_data().unwrap().is_empty());

    enc.push_frame(&FrameRGBA::transparent(6, 2)).unwrap();
    assert_eq!(enc.stop().unwrap().len(), 8);
    assert_eq!(enc.state(), EncoderState::Inactive);
    assert_eq!(
        log.frames(),
        vec![SurfaceSize::new(4, 2), SurfaceSize::new(6, 2)]
    );
    assert_eq!(log.stops(), 1);
}

#[test]
fn unsupported_container_and_double_start_are_refused() {
    let mut enc = InMemoryEncoder::new().supporting(&[ContainerType::Mp4]);
    assert!(!enc.is_type_supported(ContainerType::Webm));
    assert!(enc.start(cfg(Some(ContainerType::Webm))).is_err());
    assert_eq!(
        enc.start(cfg(Some(ContainerType::Mp4))).unwrap(),
        Some(ContainerType::Mp4)
    );
    assert!(enc.start(cfg(Some(ContainerType::Mp4))).is_err());
}

#[test]
fn abort_after_fails_pushes_and_goes_inactive() {
    let mut enc = InMemoryEncoder::new().abort_after(1);
    enc.start(cfg(None)).unwrap();
    enc.push_frame(&FrameRGBA::transparent(4, 2)).unwrap();
    let err = enc.push_frame(&FrameRGBA::transparent(4, 2)).unwrap_err();
    assert!(matches!(err, ArError::Capture(CaptureError::Encoder(_))));
    assert_eq!(enc.state(), EncoderState::Inactive);
}

#[test]
fn silent_encoder_produces_no_bytes() {
    let mut enc = InMemoryEncoder::new()
        .silent()
        .with_default_container(None);
    assert_eq!(enc.start(cfg(None)).unwrap(), None);
    enc.push_frame(&FrameRGBA::transparent(4, 2)).unwrap();
    assert!(enc.stop().unwrap().is_empty());
}
