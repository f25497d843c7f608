use crate::render::backend::FrameRGBA;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use tracing::debug;

/// The two signals a tracked target emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSignal {
    /// The marker entered the camera view.
    Found,
    /// The marker left the camera view.
    Lost,
}

/// Errors reported by a [`MarkerTracker`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The tracker could not stop scanning.
    #[error("tracker stop failed: {0}")]
    StopFailed(String),
}

/// Receiving end of a found/lost subscription for one target.
///
/// Signals are queued in delivery order until drained with [`TargetSubscription::try_next`].
#[derive(Debug)]
pub struct TargetSubscription {
    id: u64,
    target: usize,
    rx: Receiver<TargetSignal>,
}

impl TargetSubscription {
    /// Wrap a channel receiver. `id` must be unique per tracker.
    pub fn new(id: u64, target: usize, rx: Receiver<TargetSignal>) -> Self {
        Self { id, target, rx }
    }

    /// Tracker-assigned subscription id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Target index this subscription listens to.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Next queued signal, or `None` once the queue is empty or the tracker hung up.
    pub fn try_next(&self) -> Option<TargetSignal> {
        match self.rx.try_recv() {
            Ok(s) => Some(s),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Image-marker tracking engine, consumed through its event and frame contract only.
pub trait MarkerTracker {
    /// Start delivering found/lost signals for `target`.
    fn subscribe(&mut self, target: usize) -> TargetSubscription;
    /// Stop delivering signals to `subscription`.
    fn unsubscribe(&mut self, subscription: TargetSubscription);
    /// Stop scanning. Best effort.
    fn stop(&mut self) -> Result<(), TrackerError>;
    /// Latest live camera frame, if the camera is running.
    fn camera_frame(&self) -> Option<&FrameRGBA>;
}

/// Channel-backed tracker driven by explicit calls instead of a detection engine.
///
/// Used by the CLI to replay still camera images, and by tests to script found/lost
/// sequences.
#[derive(Debug, Default)]
pub struct ScriptedTracker {
    camera: Option<FrameRGBA>,
    subscribers: Vec<(u64, usize, Sender<TargetSignal>)>,
    next_id: u64,
    scanning: bool,
    stop_failure: Option<String>,
    stop_calls: usize,
}

impl ScriptedTracker {
    /// A scanning tracker with no camera frame yet.
    pub fn new() -> Self {
        Self {
            scanning: true,
            ..Self::default()
        }
    }

    /// A scanning tracker whose camera already produced `frame`.
    pub fn with_camera_frame(frame: FrameRGBA) -> Self {
        Self {
            camera: Some(frame),
            ..Self::new()
        }
    }

    /// Replace the live camera frame (`None` simulates a camera that is not ready).
    pub fn set_camera_frame(&mut self, frame: Option<FrameRGBA>) {
        self.camera = frame;
    }

    /// Deliver `signal` to every live subscriber of `target`. Returns the delivery count.
    pub fn emit(&mut self, target: usize, signal: TargetSignal) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|(_, t, tx)| {
            if *t != target {
                return true;
            }
            match tx.send(signal) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        debug!(target, ?signal, delivered, "tracker signal emitted");
        delivered
    }

    /// Shorthand for `emit(target, TargetSignal::Found)`.
    pub fn found(&mut self, target: usize) -> usize {
        self.emit(target, TargetSignal::Found)
    }

    /// Shorthand for `emit(target, TargetSignal::Lost)`.
    pub fn lost(&mut self, target: usize) -> usize {
        self.emit(target, TargetSignal::Lost)
    }

    /// Make the next `stop` call fail with `reason`.
    pub fn fail_next_stop(&mut self, reason: impl Into<String>) {
        self.stop_failure = Some(reason.into());
    }

    /// `false` once `stop` has succeeded.
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Number of `stop` calls, successful or not.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl MarkerTracker for ScriptedTracker {
    fn subscribe(&mut self, target: usize) -> TargetSubscription {
        let (tx, rx) = mpsc::channel();
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, target, tx));
        TargetSubscription::new(id, target, rx)
    }

    fn unsubscribe(&mut self, subscription: TargetSubscription) {
        self.subscribers.retain(|(id, _, _)| *id != subscription.id());
    }

    fn stop(&mut self) -> Result<(), TrackerError> {
        self.stop_calls += 1;
        if let Some(reason) = self.stop_failure.take() {
            return Err(TrackerError::StopFailed(reason));
        }
        self.scanning = false;
        Ok(())
    }

    fn camera_frame(&self) -> Option<&FrameRGBA> {
        self.camera.as_ref()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/tracker.rs"]
mod tests;
