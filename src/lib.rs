//! arlens is the core of a marker-tracked AR viewer.
//!
//! A printed marker is tracked through the camera feed, a selectable animated character is
//! drawn over it, and the composited view can be captured as a PNG still or a video
//! recording that is shared or, failing that, downloaded.
//!
//! - Load and validate a [`ViewerConfig`]
//! - Create an [`ArSession`] over a [`MarkerTracker`], a [`SceneRenderer`] and a
//!   [`CapturePipeline`]
//! - Call [`ArSession::tick`] once per display refresh
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Still and video capture.
pub mod capture;
/// Character catalog.
pub mod catalog;
/// Camera + overlay compositing.
pub mod composite;
/// Viewer configuration.
pub mod config;
/// Recording encoders.
pub mod encode;
/// Zoom, clips and on-screen controls.
pub mod presentation;
/// Frame buffers and renderers.
pub mod render;
/// Session wiring.
pub mod session;
/// Marker tracker contract and selection controller.
pub mod tracking;

pub use crate::foundation::core::{Fps, Point, Rect, Size, SurfaceSize, UnixMillis, Vec3};
pub use crate::foundation::error::{ArError, ArResult};

pub use crate::capture::artifact::{Artifact, ArtifactKind, CaptureError};
pub use crate::capture::disposition::{
    DirectoryDownloader, Disposition, DownloadTarget, InMemoryDownloads, NoShare, ShareError,
    ShareOutcome, ShareRequest, ShareTarget,
};
pub use crate::capture::pipeline::{CapturePipeline, CaptureSources, RecordingStart, RecordingTick};
pub use crate::capture::recording::{LiveToken, RecordingStatus};
pub use crate::catalog::character::{Catalog, Character};
pub use crate::composite::compositor::{CompositeError, Compositor};
pub use crate::config::{CaptureConfig, ScaleConfig, ViewerConfig};
pub use crate::encode::ffmpeg::{FfmpegEncoder, is_ffmpeg_on_path};
pub use crate::encode::stream::{
    ContainerType, EncoderState, InMemoryEncoder, StreamConfig, StreamEncoder,
};
pub use crate::presentation::controls::{ControlId, ControlLayout, ControlsView};
pub use crate::presentation::state::{ScaleFactor, VisualState};
pub use crate::render::backend::{FrameRGBA, SceneRenderer};
pub use crate::render::sprite::SpriteRenderer;
pub use crate::session::ar_session::{
    ArSession, ControlEffect, RecordToggle, SessionAction, TapOutcome, TickReport,
};
pub use crate::tracking::controller::{SelectionError, SelectionState, TrackingController};
pub use crate::tracking::tracker::{MarkerTracker, ScriptedTracker, TargetSignal, TrackerError};
