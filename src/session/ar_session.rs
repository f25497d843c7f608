use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::capture::artifact::{Artifact, CaptureError};
use crate::capture::pipeline::{CapturePipeline, CaptureSources, RecordingStart, RecordingTick};
use crate::config::ViewerConfig;
use crate::encode::stream::ContainerType;
use crate::foundation::core::{Point, SurfaceSize};
use crate::foundation::error::ArResult;
use crate::presentation::controls::{ControlId, ControlLayout, ControlsView};
use crate::presentation::state::ScaleFactor;
use crate::render::backend::SceneRenderer;
use crate::tracking::controller::{SelectionError, TrackingController};
use crate::tracking::tracker::MarkerTracker;

/// Actions the session asks the host navigation to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    /// Leave the AR screen.
    Back,
}

/// What a tap on the surface did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TapOutcome {
    /// The tap landed on a live control; the caller activates it.
    Control(ControlId),
    /// The tap landed on the scene and flipped the idle/active clip.
    ToggledAnimation {
        /// New animation flag.
        animated: bool,
    },
}

/// Result of the single record/stop button.
#[derive(Debug, PartialEq, Eq)]
pub enum RecordToggle {
    /// A recording started.
    Started {
        /// Container of the eventual artifact.
        container: ContainerType,
    },
    /// The running recording was finalized.
    Stopped(Option<Artifact>),
}

/// Effect of activating a control.
#[derive(Debug, PartialEq)]
pub enum ControlEffect {
    /// Leave the AR screen.
    Action(SessionAction),
    /// A still was captured.
    Captured(Artifact),
    /// The record button toggled.
    Recording(RecordToggle),
    /// The selection moved; `None` when there was nothing to move.
    Selected(Option<usize>),
    /// The slider set a new zoom.
    Scaled(ScaleFactor),
}

/// Per-tick summary.
#[derive(Debug)]
pub struct TickReport {
    /// Tracker signals applied this tick.
    pub signals: usize,
    /// Renderer surface size after drawing.
    pub surface: Option<SurfaceSize>,
    /// Recording loop progress.
    pub recording: RecordingTick,
}

/// One AR viewing session: tracker, renderer, controller and capture pipeline wired
/// together and driven by [`ArSession::tick`].
///
/// Teardown runs once, on [`ArSession::back`], [`ArSession::teardown`] or drop.
pub struct ArSession<T: MarkerTracker, R: SceneRenderer> {
    tracker: T,
    renderer: R,
    controller: TrackingController,
    capture: CapturePipeline,
    layout: ControlLayout,
    auto_layout: Option<SurfaceSize>,
    custom_layout: bool,
    now: Duration,
    torn_down: bool,
}

impl<T: MarkerTracker, R: SceneRenderer> ArSession<T, R> {
    /// Validate `cfg`, build the catalog and subscribe to the configured target.
    pub fn new(
        cfg: &ViewerConfig,
        mut tracker: T,
        renderer: R,
        capture: CapturePipeline,
    ) -> ArResult<Self> {
        cfg.validate()?;
        let mut controller = TrackingController::new(cfg.build_catalog()?, cfg.initial_scale()?);
        controller.attach(&mut tracker, cfg.target_index);
        info!(
            characters = controller.catalog().len(),
            target = cfg.target_index,
            "ar session started"
        );
        Ok(Self {
            tracker,
            renderer,
            controller,
            capture,
            layout: ControlLayout::new(),
            auto_layout: None,
            custom_layout: false,
            now: Duration::ZERO,
            torn_down: false,
        })
    }

    /// Apply queued tracker signals, push visual state to the renderer, draw and advance
    /// any recording. `now` is a monotonic host timestamp.
    pub fn tick(&mut self, now: Duration) -> ArResult<TickReport> {
        self.now = now;
        if self.torn_down {
            return Ok(TickReport {
                signals: 0,
                surface: None,
                recording: RecordingTick::Idle,
            });
        }

        let signals = self.controller.pump();
        for (i, state) in self.controller.visual_states() {
            self.renderer.apply(i, &state);
        }
        self.renderer.draw()?;

        let surface = self.renderer.surface().map(|s| s.size());
        if let Some(size) = surface
            && !self.custom_layout
            && self.auto_layout != Some(size)
        {
            debug!(%size, "laying out controls");
            self.layout = ControlLayout::standard(size, self.controller.catalog().len());
            self.auto_layout = Some(size);
        }

        let recording = match self.capture.tick_recording(
            CaptureSources {
                camera: self.tracker.camera_frame(),
                rendered: self.renderer.surface(),
            },
            now,
        ) {
            Ok(tick) => tick,
            Err(e) => {
                error!(error = %e, "recording ended without an artifact");
                RecordingTick::Failed(e)
            }
        };
        Ok(TickReport {
            signals,
            surface,
            recording,
        })
    }

    /// Route a tap at `point` (surface pixels).
    pub fn handle_tap(&mut self, point: Point) -> TapOutcome {
        match self.layout.hit_test(point, self.controller.selection()) {
            Some(id) => {
                debug!(control = ?id, "tap on control");
                TapOutcome::Control(id)
            }
            None => TapOutcome::ToggledAnimation {
                animated: self.controller.toggle_animation(),
            },
        }
    }

    /// Perform what `control` does when pressed at `at`.
    pub fn activate(&mut self, control: ControlId, at: Point) -> ArResult<ControlEffect> {
        Ok(match control {
            ControlId::Back => ControlEffect::Action(self.back()),
            ControlId::Capture => ControlEffect::Captured(self.capture_still()?),
            ControlId::Record => ControlEffect::Recording(self.toggle_recording()?),
            ControlId::Previous => ControlEffect::Selected(self.select_previous()),
            ControlId::Next => ControlEffect::Selected(self.select_next()),
            ControlId::PickerEntry(i) => {
                self.select_by_index(i)?;
                ControlEffect::Selected(Some(i))
            }
            ControlId::ScaleSlider => {
                let raw = self
                    .layout
                    .slider_value(at)
                    .unwrap_or_else(|| self.controller.presentation().scale().get());
                ControlEffect::Scaled(self.set_scale(raw)?)
            }
        })
    }

    /// Next character, wrapping.
    pub fn select_next(&mut self) -> Option<usize> {
        self.controller.select_next()
    }

    /// Previous character, wrapping.
    pub fn select_previous(&mut self) -> Option<usize> {
        self.controller.select_previous()
    }

    /// Picker selection.
    pub fn select_by_index(&mut self, index: usize) -> Result<(), SelectionError> {
        self.controller.select_by_index(index)
    }

    /// Slider input.
    pub fn set_scale(&mut self, raw: f32) -> ArResult<ScaleFactor> {
        self.controller.set_scale(raw)
    }

    /// Flip idle/active clip.
    pub fn toggle_animation(&mut self) -> bool {
        self.controller.toggle_animation()
    }

    /// Capture the current camera frame and overlay as a PNG still.
    pub fn capture_still(&mut self) -> Result<Artifact, CaptureError> {
        self.capture.capture_still(CaptureSources {
            camera: self.tracker.camera_frame(),
            rendered: self.renderer.surface(),
        })
    }

    /// Start recording at the last tick time. A no-op while recording.
    pub fn start_recording(&mut self) -> Result<RecordingStart, CaptureError> {
        self.capture.start_recording(
            CaptureSources {
                camera: self.tracker.camera_frame(),
                rendered: self.renderer.surface(),
            },
            self.now,
        )
    }

    /// Stop and finalize the recording. `None` when not recording.
    pub fn stop_recording(&mut self) -> Result<Option<Artifact>, CaptureError> {
        self.capture.stop_recording()
    }

    /// Start when idle, stop when recording.
    pub fn toggle_recording(&mut self) -> Result<RecordToggle, CaptureError> {
        if self.capture.is_recording() {
            return Ok(RecordToggle::Stopped(self.stop_recording()?));
        }
        let container = match self.start_recording()? {
            RecordingStart::Started { container } => container,
            RecordingStart::AlreadyActive => self
                .capture
                .recording_container()
                .unwrap_or(ContainerType::Webm),
        };
        Ok(RecordToggle::Started { container })
    }

    /// Tear the session down and ask the host to navigate back.
    pub fn back(&mut self) -> SessionAction {
        self.teardown();
        SessionAction::Back
    }

    /// Stop tracking and finalize any recording. Runs once; later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if self.capture.is_recording() {
            match self.capture.stop_recording() {
                Ok(Some(a)) => info!(file = %a.file_name, "recording finalized on teardown"),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "recording lost on teardown"),
            }
        }
        self.controller.on_session_teardown(&mut self.tracker);
        info!("ar session torn down");
    }

    /// Whether teardown already ran.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Snapshot for the UI collaborator.
    pub fn controls_view(&self) -> ControlsView {
        let sel = self.controller.selection();
        let picker = if sel.target_found() && sel.picker_open() {
            self.controller
                .catalog()
                .iter()
                .map(|c| c.name.clone())
                .collect()
        } else {
            Vec::new()
        };
        ControlsView {
            scanning_hint: !sel.target_found(),
            picker,
            navigation: sel.target_found() && sel.selected_index().is_some(),
            selected: self.controller.selected_character().map(|c| c.name.clone()),
            scale: self.controller.presentation().scale().get(),
            animated: self.controller.presentation().animated(),
            recording: self.capture.is_recording(),
        }
    }

    /// Replace the control layout; automatic layout on resize stops.
    pub fn set_layout(&mut self, layout: ControlLayout) {
        self.layout = layout;
        self.custom_layout = true;
    }

    /// Current control layout.
    pub fn layout(&self) -> &ControlLayout {
        &self.layout
    }

    /// The tracker.
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// The tracker, for hosts that feed it signals and frames.
    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, for hosts that resize it.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Selection and presentation state.
    pub fn controller(&self) -> &TrackingController {
        &self.controller
    }

    /// The capture pipeline.
    pub fn capture(&self) -> &CapturePipeline {
        &self.capture
    }
}

impl<T: MarkerTracker, R: SceneRenderer> Drop for ArSession<T, R> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/ar_session.rs"]
mod tests;
