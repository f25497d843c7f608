use super::*;
use crate::capture::disposition::{
    InMemoryDownloads, NoShare, ScriptedShare, ShareOutcome, ShareRequest, ShareResponse,
};
use crate::encode::stream::{EncoderLog, InMemoryEncoder};
use crate::foundation::core::SurfaceSize;

const FRAME: Duration = Duration::from_millis(34);

fn pipeline(encoder: InMemoryEncoder) -> (CapturePipeline, InMemoryDownloads, EncoderLog) {
    let downloads = InMemoryDownloads::new();
    let log = encoder.log();
    let p = CapturePipeline::new(
        CaptureConfig::default(),
        Box::new(encoder),
        Box::new(NoShare),
        Box::new(downloads.clone()),
    )
    .unwrap();
    (p, downloads, log)
}

fn sharing_pipeline(share: ScriptedShare) -> (CapturePipeline, InMemoryDownloads) {
    let downloads = InMemoryDownloads::new();
    let p = CapturePipeline::new(
        CaptureConfig::default(),
        Box::new(InMemoryEncoder::new()),
        Box::new(share),
        Box::new(downloads.clone()),
    )
    .unwrap();
    (p, downloads)
}

fn record_briefly(p: &mut CapturePipeline) -> Artifact {
    let (c, o) = (camera(), overlay());
    let src = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    p.start_recording(src, Duration::ZERO).unwrap();
    for i in 1..=5u32 {
        p.tick_recording(src, FRAME * i).unwrap();
    }
    p.stop_recording().unwrap().unwrap()
}

fn camera() -> FrameRGBA {
    FrameRGBA::solid(4, 4, [0, 0, 255, 255])
}

fn overlay() -> FrameRGBA {
    FrameRGBA::transparent(4, 4)
}

#[test]
fn still_without_camera_is_source_not_ready() {
    let (mut p, downloads, _) = pipeline(InMemoryEncoder::new());
    let o = overlay();
    let err = p
        .capture_still(CaptureSources {
            camera: None,
            rendered: Some(&o),
        })
        .unwrap_err();
    assert_eq!(err, CaptureError::SourceNotReady);
    assert!(downloads.is_empty());
    assert_eq!(p.stats().stills, 0);
}

#[test]
fn still_is_png_and_downloaded_when_share_unsupported() {
    let (mut p, downloads, _) = pipeline(InMemoryEncoder::new());
    let (c, o) = (camera(), overlay());
    let a = p
        .capture_still(CaptureSources {
            camera: Some(&c),
            rendered: Some(&o),
        })
        .unwrap();
    assert_eq!(a.mime, "image/png");
    assert!(a.file_name.starts_with("screenshot-") && a.file_name.ends_with(".png"));
    let decoded = image::load_from_memory(&a.bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (4, 4));
    assert_eq!(decoded.get_pixel(1, 1).0, [0, 0, 255, 255]);

    assert_eq!(downloads.artifacts(), vec![a]);
    assert_eq!(
        p.last_disposition(),
        Some(&Disposition::Downloaded {
            share: ShareOutcome::Unsupported
        })
    );
}

#[test]
fn still_share_uses_configured_request() {
    let share = ScriptedShare::new(ShareResponse::Accept);
    let downloads = InMemoryDownloads::new();
    let mut p = CapturePipeline::new(
        CaptureConfig::default(),
        Box::new(InMemoryEncoder::new()),
        Box::new(share.clone()),
        Box::new(downloads.clone()),
    )
    .unwrap();
    let (c, o) = (camera(), overlay());
    p.capture_still(CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    })
    .unwrap();
    let requests = share.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1.title, "AR Screenshot");
    assert!(downloads.is_empty());
}

#[test]
fn recording_start_twice_yields_one_session() {
    let (mut p, _, log) = pipeline(InMemoryEncoder::new());
    let (c, o) = (camera(), overlay());
    let src = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    assert_eq!(
        p.start_recording(src, Duration::ZERO).unwrap(),
        RecordingStart::Started {
            container: ContainerType::Webm
        }
    );
    assert_eq!(
        p.start_recording(src, FRAME).unwrap(),
        RecordingStart::AlreadyActive
    );
    assert_eq!(log.starts().len(), 1);
    assert_eq!(p.recording_status(), RecordingStatus::Recording);
}

#[test]
fn recording_loop_encodes_and_stop_yields_one_artifact() {
    let (mut p, downloads, log) = pipeline(InMemoryEncoder::new());
    let (c, o) = (camera(), overlay());
    let src = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    p.start_recording(src, Duration::ZERO).unwrap();
    for i in 1..=40u32 {
        let tick = p.tick_recording(src, FRAME * i).unwrap();
        assert!(matches!(tick, RecordingTick::Composited { .. }));
    }
    let a = p.stop_recording().unwrap().unwrap();
    assert_eq!(a.mime, "video/webm");
    assert!(a.file_name.starts_with("recording-") && a.file_name.ends_with(".webm"));
    assert_eq!(a.len(), log.frames().len() * 8);
    assert_eq!(log.stops(), 1);
    assert_eq!(downloads.len(), 1);

    assert_eq!(p.stop_recording().unwrap(), None);
    assert_eq!(downloads.len(), 1);
    assert_eq!(p.recording_status(), RecordingStatus::Idle);
    assert_eq!(p.stats().recordings, 1);
}

#[test]
fn frames_are_paced_to_the_stream_rate() {
    let (mut p, _, log) = pipeline(InMemoryEncoder::new());
    let (c, o) = (camera(), overlay());
    let src = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    p.start_recording(src, Duration::ZERO).unwrap();
    // 60 Hz ticks over one second.
    for i in 1..=60u32 {
        p.tick_recording(src, Duration::from_micros(16_667) * i)
            .unwrap();
    }
    let n = log.frames().len();
    assert!((30..=32).contains(&n), "encoded {n} frames");
    p.stop_recording().unwrap();
}

#[test]
fn container_probe_follows_priority_and_falls_back() {
    let (mut p, _, _) =
        pipeline(InMemoryEncoder::new().supporting(&[ContainerType::Mp4]));
    let (c, o) = (camera(), overlay());
    let src = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    assert_eq!(
        p.start_recording(src, Duration::ZERO).unwrap(),
        RecordingStart::Started {
            container: ContainerType::Mp4
        }
    );
    let a = p.stop_recording().unwrap().unwrap();
    assert!(a.file_name.ends_with(".mp4"));

    let (mut p, _, log) = pipeline(
        InMemoryEncoder::new()
            .supporting(&[])
            .with_default_container(None),
    );
    assert_eq!(
        p.start_recording(src, Duration::ZERO).unwrap(),
        RecordingStart::Started {
            container: ContainerType::Webm
        }
    );
    assert_eq!(log.starts()[0].container, None);
    p.stop_recording().unwrap();
}

#[test]
fn cleared_token_ends_the_loop_on_next_tick() {
    let (mut p, downloads, _) = pipeline(InMemoryEncoder::new());
    let (c, o) = (camera(), overlay());
    let src = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    p.start_recording(src, Duration::ZERO).unwrap();
    let token = p.recording_token().unwrap();
    token.cancel();
    assert!(matches!(
        p.tick_recording(src, FRAME).unwrap(),
        RecordingTick::Finished(_)
    ));
    assert!(!p.is_recording());
    assert_eq!(downloads.len(), 1);
    assert_eq!(p.tick_recording(src, FRAME * 2).unwrap(), RecordingTick::Idle);
}

#[test]
fn encoder_abort_finalizes_with_what_was_encoded() {
    let (mut p, downloads, _) = pipeline(InMemoryEncoder::new().abort_after(3));
    let (c, o) = (camera(), overlay());
    let src = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    p.start_recording(src, Duration::ZERO).unwrap();
    let token = p.recording_token().unwrap();
    let mut finished = None;
    for i in 1..=10u32 {
        if let RecordingTick::Finished(a) = p.tick_recording(src, FRAME * i).unwrap() {
            finished = Some(a);
            break;
        }
    }
    let a = finished.unwrap();
    assert_eq!(a.len(), 3 * 8);
    assert!(!token.is_live());
    assert_eq!(downloads.len(), 1);
}

#[test]
fn empty_recording_is_encode_failed() {
    let (mut p, downloads, _) = pipeline(InMemoryEncoder::new().silent());
    let (c, o) = (camera(), overlay());
    let src = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    p.start_recording(src, Duration::ZERO).unwrap();
    p.tick_recording(src, FRAME).unwrap();
    assert!(matches!(
        p.stop_recording(),
        Err(CaptureError::EncodeFailed(_))
    ));
    assert!(downloads.is_empty());
    assert!(!p.is_recording());
    assert_eq!(p.stats().failures, 1);
}

#[test]
fn recording_follows_renderer_resize_and_skips_missing_frames() {
    let (mut p, _, log) = pipeline(InMemoryEncoder::new());
    let c = camera();
    let small = overlay();
    let big = FrameRGBA::transparent(8, 6);
    p.start_recording(
        CaptureSources {
            camera: Some(&c),
            rendered: Some(&small),
        },
        Duration::ZERO,
    )
    .unwrap();
    assert_eq!(
        p.tick_recording(
            CaptureSources {
                camera: None,
                rendered: Some(&big),
            },
            FRAME,
        )
        .unwrap(),
        RecordingTick::NotReady
    );
    p.tick_recording(
        CaptureSources {
            camera: Some(&c),
            rendered: Some(&big),
        },
        FRAME * 2,
    )
    .unwrap();
    assert_eq!(
        log.frames(),
        vec![SurfaceSize::new(4, 4), SurfaceSize::new(8, 6)]
    );
    p.stop_recording().unwrap();
}

#[test]
fn recording_without_sources_does_not_start() {
    let (mut p, _, log) = pipeline(InMemoryEncoder::new());
    let o = overlay();
    assert_eq!(
        p.start_recording(
            CaptureSources {
                camera: None,
                rendered: Some(&o),
            },
            Duration::ZERO,
        )
        .unwrap_err(),
        CaptureError::SourceNotReady
    );
    assert!(log.starts().is_empty());
    assert!(!p.is_recording());
}

#[test]
fn recording_is_shared_with_the_recording_request() {
    let share = ScriptedShare::new(ShareResponse::Accept);
    let (mut p, downloads) = sharing_pipeline(share.clone());
    let a = record_briefly(&mut p);

    let requests = share.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, a.file_name);
    assert_eq!(requests[0].1, ShareRequest::titled("AR Recording"));
    assert_eq!(requests[0].1.text, None);
    assert_eq!(p.last_disposition(), Some(&Disposition::Shared));
    assert!(downloads.is_empty());
}

#[test]
fn recording_falls_back_to_download_when_share_does_not_happen() {
    let cases = [
        (ShareResponse::Cancel, ShareOutcome::Cancelled),
        (
            ShareResponse::Fail("no targets".to_string()),
            ShareOutcome::Failed("no targets".to_string()),
        ),
    ];
    for (response, outcome) in cases {
        let share = ScriptedShare::new(response);
        let (mut p, downloads) = sharing_pipeline(share.clone());
        let a = record_briefly(&mut p);
        assert_eq!(share.requests().len(), 1);
        assert_eq!(downloads.artifacts(), vec![a]);
        assert_eq!(
            p.last_disposition(),
            Some(&Disposition::Downloaded { share: outcome })
        );
    }

    let share = ScriptedShare::new(ShareResponse::Accept).only_mimes(&["image/png"]);
    let (mut p, downloads) = sharing_pipeline(share.clone());
    record_briefly(&mut p);
    assert!(share.requests().is_empty());
    assert_eq!(downloads.len(), 1);
    assert_eq!(
        p.last_disposition(),
        Some(&Disposition::Downloaded {
            share: ShareOutcome::Unsupported
        })
    );
}

#[test]
fn failed_encoder_stop_keeps_buffered_chunks() {
    let (mut p, downloads, log) = pipeline(InMemoryEncoder::new().failing_stop());
    let (c, o) = (camera(), overlay());
    let src = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    p.start_recording(src, Duration::ZERO).unwrap();
    // Chunks are requested at 1.02 s and 2.04 s; the frames after that are lost with the tail.
    for i in 1..=80u32 {
        p.tick_recording(src, FRAME * i).unwrap();
    }
    assert_eq!(log.frames().len(), 81);

    let a = p.stop_recording().unwrap().unwrap();
    assert_eq!(a.len(), 61 * 8);
    assert_eq!(downloads.artifacts(), vec![a]);
    assert_eq!(log.stops(), 1);
    assert_eq!(p.stats().recordings, 1);
    assert_eq!(p.stats().failures, 0);
}

#[test]
fn pacing_restarts_after_frames_were_skipped() {
    let (mut p, _, log) = pipeline(InMemoryEncoder::new());
    let (c, o) = (camera(), overlay());
    let ready = CaptureSources {
        camera: Some(&c),
        rendered: Some(&o),
    };
    let blind = CaptureSources {
        camera: None,
        rendered: Some(&o),
    };
    let at = |i: u32| Duration::from_micros(16_667) * i;
    p.start_recording(ready, Duration::ZERO).unwrap();
    // Two seconds of 60 Hz ticks without a camera frame.
    for i in 1..=120u32 {
        assert_eq!(p.tick_recording(blind, at(i)).unwrap(), RecordingTick::NotReady);
    }
    assert_eq!(log.frames().len(), 1);
    // Half a second with frames again stays at 30 fps.
    for i in 121..=150u32 {
        p.tick_recording(ready, at(i)).unwrap();
    }
    let after_gap = log.frames().len() - 1;
    assert!((14..=17).contains(&after_gap), "encoded {after_gap} frames");
    p.stop_recording().unwrap();
}

#[test]
fn malformed_recording_frame_is_skipped_and_counted() {
    let (mut p, _, log) = pipeline(InMemoryEncoder::new());
    let (c, o) = (camera(), overlay());
    p.start_recording(
        CaptureSources {
            camera: Some(&c),
            rendered: Some(&o),
        },
        Duration::ZERO,
    )
    .unwrap();
    let broken = FrameRGBA {
        width: 4,
        height: 4,
        data: vec![0; 10],
        premultiplied: false,
    };
    assert_eq!(
        p.tick_recording(
            CaptureSources {
                camera: Some(&broken),
                rendered: Some(&o),
            },
            FRAME,
        )
        .unwrap(),
        RecordingTick::NotReady
    );
    assert_eq!(p.stats().failures, 1);
    assert!(p.is_recording());
    assert_eq!(log.frames().len(), 1);
    p.stop_recording().unwrap();
}
