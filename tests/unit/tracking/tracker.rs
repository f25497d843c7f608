use super::*;

#[test]
fn signals_arrive_in_delivery_order() {
    let mut t = ScriptedTracker::new();
    let sub = t.subscribe(0);
    assert_eq!(t.found(0), 1);
    assert_eq!(t.lost(0), 1);
    assert_eq!(t.found(0), 1);

    assert_eq!(sub.try_next(), Some(TargetSignal::Found));
    assert_eq!(sub.try_next(), Some(TargetSignal::Lost));
    assert_eq!(sub.try_next(), Some(TargetSignal::Found));
    assert_eq!(sub.try_next(), None);
}

#[test]
fn signals_are_scoped_to_target() {
    let mut t = ScriptedTracker::new();
    let a = t.subscribe(0);
    let _b = t.subscribe(1);
    assert_eq!(t.found(1), 1);
    assert_eq!(a.try_next(), None);
}

#[test]
fn unsubscribe_and_dropped_receivers_stop_delivery() {
    let mut t = ScriptedTracker::new();
    let a = t.subscribe(0);
    let b = t.subscribe(0);
    assert_eq!(t.subscriber_count(), 2);

    t.unsubscribe(a);
    assert_eq!(t.subscriber_count(), 1);

    drop(b);
    assert_eq!(t.found(0), 0);
    assert_eq!(t.subscriber_count(), 0);
}

#[test]
fn stop_failure_is_one_shot() {
    let mut t = ScriptedTracker::new();
    t.fail_next_stop("engine busy");
    assert_eq!(
        t.stop(),
        Err(TrackerError::StopFailed("engine busy".to_string()))
    );
    assert!(t.is_scanning());
    assert!(t.stop().is_ok());
    assert!(!t.is_scanning());
    assert_eq!(t.stop_calls(), 2);
}

#[test]
fn camera_frame_can_be_withdrawn() {
    let mut t = ScriptedTracker::with_camera_frame(FrameRGBA::solid(2, 2, [1, 2, 3, 255]));
    assert!(t.camera_frame().is_some());
    t.set_camera_frame(None);
    assert!(t.camera_frame().is_none());
}
