use std::io::Cursor;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::capture::artifact::{Artifact, CaptureError};
use crate::capture::disposition::{Disposition, DownloadTarget, ShareTarget, dispose};
use crate::capture::recording::{CaptureSession, LiveToken, RecordingStatus};
use crate::composite::compositor::{CompositeError, Compositor};
use crate::config::CaptureConfig;
use crate::encode::stream::{ContainerType, EncoderState, StreamConfig, StreamEncoder};
use crate::foundation::core::{Fps, UnixMillis};
use crate::foundation::error::{ArError, ArResult};
use crate::render::backend::FrameRGBA;

/// The two inputs of a capture, borrowed for one call.
#[derive(Clone, Copy, Debug, Default)]
pub struct CaptureSources<'a> {
    /// Live camera frame.
    pub camera: Option<&'a FrameRGBA>,
    /// Renderer surface.
    pub rendered: Option<&'a FrameRGBA>,
}

/// Result of [`CapturePipeline::start_recording`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingStart {
    /// A new session is recording into `container`.
    Started {
        /// Container of the eventual artifact.
        container: ContainerType,
    },
    /// A session already existed; nothing changed.
    AlreadyActive,
}

/// What one recording tick did.
#[derive(Debug, PartialEq, Eq)]
pub enum RecordingTick {
    /// No session.
    Idle,
    /// A source was missing; the frame was skipped.
    NotReady,
    /// The dedicated surface was recomposited. `encoded` is false when the frame was held
    /// back to keep the stream at its frame rate.
    Composited {
        /// Whether the frame reached the encoder.
        encoded: bool,
    },
    /// The loop ended (token cleared or encoder aborted) and this artifact was produced.
    Finished(Artifact),
    /// The loop ended without an artifact. Reported by [`crate::ArSession::tick`], which
    /// logs capture failures instead of failing the whole tick.
    Failed(CaptureError),
}

/// Counters over the pipeline's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CaptureStats {
    /// Stills produced.
    pub stills: u64,
    /// Recordings finalized into an artifact.
    pub recordings: u64,
    /// Frames handed to the encoder.
    pub frames_encoded: u64,
    /// Captures that ended in an error.
    pub failures: u64,
}

/// Still and video capture over composited camera + overlay frames.
///
/// Owns the stream encoder, the share and download collaborators and at most one
/// [`CaptureSession`]. Every operation is synchronous; the host drives a recording by
/// calling [`CapturePipeline::tick_recording`] once per display refresh.
pub struct CapturePipeline {
    cfg: CaptureConfig,
    fps: Fps,
    frame: Duration,
    timeslice: Duration,
    priority: Vec<ContainerType>,
    encoder: Box<dyn StreamEncoder>,
    share: Box<dyn ShareTarget>,
    download: Box<dyn DownloadTarget>,
    session: Option<CaptureSession>,
    last_disposition: Option<Disposition>,
    stats: CaptureStats,
}

impl CapturePipeline {
    /// Validate `cfg` and assemble the pipeline.
    pub fn new(
        cfg: CaptureConfig,
        encoder: Box<dyn StreamEncoder>,
        share: Box<dyn ShareTarget>,
        download: Box<dyn DownloadTarget>,
    ) -> ArResult<Self> {
        let fps = cfg.fps()?;
        let timeslice = cfg.timeslice()?;
        let priority = cfg.containers()?;
        Ok(Self {
            cfg,
            fps,
            frame: Duration::from_secs_f64(fps.frame_duration_secs()),
            timeslice,
            priority,
            encoder,
            share,
            download,
            session: None,
            last_disposition: None,
            stats: CaptureStats::default(),
        })
    }

    /// Composite once into a fresh surface, encode PNG and share or download it.
    #[tracing::instrument(skip_all)]
    pub fn capture_still(&mut self, sources: CaptureSources<'_>) -> Result<Artifact, CaptureError> {
        let mut compositor = Compositor::new();
        let surface = compositor
            .composite(sources.camera, sources.rendered)
            .map_err(|e| self.composite_failed(e))?;

        let bytes = encode_png(surface).inspect_err(|e| {
            error!(error = %e, "still encode failed");
        });
        let bytes = match bytes {
            Ok(b) => b,
            Err(e) => {
                self.stats.failures += 1;
                return Err(e);
            }
        };

        let artifact = Artifact::still(bytes, UnixMillis::now());
        info!(file = %artifact.file_name, bytes = artifact.len(), "still captured");
        let disposition = dispose(
            &artifact,
            &self.cfg.still_share,
            self.share.as_mut(),
            self.download.as_mut(),
        )
        .inspect_err(|_| self.stats.failures += 1)?;
        self.last_disposition = Some(disposition);
        self.stats.stills += 1;
        Ok(artifact)
    }

    /// Open a recording session. A no-op while one exists.
    ///
    /// The first frame is composited and encoded immediately.
    #[tracing::instrument(skip_all)]
    pub fn start_recording(
        &mut self,
        sources: CaptureSources<'_>,
        now: Duration,
    ) -> Result<RecordingStart, CaptureError> {
        if self.session.is_some() {
            warn!("already recording");
            return Ok(RecordingStart::AlreadyActive);
        }

        let mut compositor = Compositor::new();
        let size = compositor
            .composite(sources.camera, sources.rendered)
            .map_err(|e| self.composite_failed(e))?
            .size();

        let requested = self.pick_container();
        if self.encoder.state() != EncoderState::Inactive {
            return Err(CaptureError::Encoder(
                "encoder is still busy with an earlier stream".to_string(),
            ));
        }
        let reported = self
            .encoder
            .start(StreamConfig {
                size,
                fps: self.fps,
                container: requested,
            })
            .map_err(|e| {
                self.stats.failures += 1;
                error!(error = %e, "encoder refused to start");
                into_capture_error(e)
            })?;
        let container = requested.or(reported).unwrap_or(ContainerType::Webm);

        info!(%size, %container, "recording started");
        self.session = Some(CaptureSession::new(container, compositor, now));
        if let Err(e) = self.encode_current(now) {
            self.session = None;
            self.stats.failures += 1;
            if let Err(stop) = self.encoder.stop() {
                warn!(error = %stop, "encoder stop after failed start");
            }
            error!(error = %e, "first recording frame failed");
            return Err(e);
        }
        Ok(RecordingStart::Started { container })
    }

    /// Advance the recording loop by one tick.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn tick_recording(
        &mut self,
        sources: CaptureSources<'_>,
        now: Duration,
    ) -> Result<RecordingTick, CaptureError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(RecordingTick::Idle);
        };
        if !session.token.is_live() {
            debug!("recording token cleared, finalizing");
            return Ok(match self.finalize()? {
                Some(a) => RecordingTick::Finished(a),
                None => RecordingTick::Idle,
            });
        }

        match session.compositor.composite(sources.camera, sources.rendered) {
            Ok(_) => {}
            Err(CompositeError::SurfaceUnavailable(missing)) => {
                debug!(%missing, "recording frame skipped");
                return Ok(RecordingTick::NotReady);
            }
            Err(e) => {
                self.stats.failures += 1;
                warn!(error = %e, "malformed recording frame skipped");
                return Ok(RecordingTick::NotReady);
            }
        }

        if !self.frame_due(now) {
            return Ok(RecordingTick::Composited { encoded: false });
        }
        match self.encode_current(now) {
            Ok(()) => Ok(RecordingTick::Composited { encoded: true }),
            Err(CaptureError::Encoder(reason)) => {
                error!(%reason, "encoder aborted, finalizing recording");
                match self.finalize()? {
                    Some(a) => Ok(RecordingTick::Finished(a)),
                    None => Ok(RecordingTick::Idle),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Clear the token and finalize. Returns `None` when not recording.
    #[tracing::instrument(skip_all)]
    pub fn stop_recording(&mut self) -> Result<Option<Artifact>, CaptureError> {
        if self.session.is_none() {
            debug!("stop requested while not recording");
            return Ok(None);
        }
        self.finalize()
    }

    /// Token of the running loop; cancelling it ends the recording on the next tick.
    pub fn recording_token(&self) -> Option<LiveToken> {
        self.session.as_ref().map(|s| s.token.clone())
    }

    /// Current recording status.
    pub fn recording_status(&self) -> RecordingStatus {
        if self.session.is_some() {
            RecordingStatus::Recording
        } else {
            RecordingStatus::Idle
        }
    }

    /// Whether a recording session exists.
    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Container of the running recording.
    pub fn recording_container(&self) -> Option<ContainerType> {
        self.session.as_ref().map(|s| s.container)
    }

    /// Where the last artifact went.
    pub fn last_disposition(&self) -> Option<&Disposition> {
        self.last_disposition.as_ref()
    }

    /// Capture settings in use.
    pub fn config(&self) -> &CaptureConfig {
        &self.cfg
    }

    /// Lifetime counters.
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    fn pick_container(&self) -> Option<ContainerType> {
        let picked = self
            .priority
            .iter()
            .copied()
            .find(|c| self.encoder.is_type_supported(*c));
        match picked {
            Some(c) => debug!(container = %c, "container selected"),
            None => debug!("no preferred container supported, using encoder default"),
        }
        picked
    }

    fn frame_due(&self, now: Duration) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.frame_due(now, self.frame))
    }

    fn encode_current(&mut self, now: Duration) -> Result<(), CaptureError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let Some(surface) = session.compositor.surface() else {
            return Ok(());
        };
        if let Err(e) = self.encoder.push_frame(surface) {
            session.token.cancel();
            return Err(into_capture_error(e));
        }
        session.advance_frame_clock(now, self.frame);
        self.stats.frames_encoded += 1;

        if session.flush_due(now, self.timeslice) {
            match self.encoder.request_data() {
                Ok(chunk) => {
                    debug!(bytes = chunk.len(), "recording chunk buffered");
                    session.push_chunk(chunk);
                }
                Err(e) => warn!(error = %e, "encoder data request failed"),
            }
            session.last_flush = now;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<Option<Artifact>, CaptureError> {
        let Some(mut session) = self.session.take() else {
            return Ok(None);
        };
        session.token.cancel();

        match self.encoder.stop() {
            Ok(tail) => session.push_chunk(tail),
            Err(e) => warn!(
                error = %e,
                chunks = session.chunks.len(),
                "encoder failed to finalize, keeping buffered chunks"
            ),
        }

        let frames = session.frames;
        let chunks = session.chunks.len();
        let bytes = session.take_bytes();
        if bytes.is_empty() {
            self.stats.failures += 1;
            error!(frames, "recording finalized with no data");
            return Err(CaptureError::EncodeFailed(
                "recording produced no data".to_string(),
            ));
        }

        let artifact = Artifact::recording(session.container, bytes, UnixMillis::now());
        info!(
            file = %artifact.file_name,
            bytes = artifact.len(),
            frames,
            chunks,
            "recording finalized"
        );
        let disposition = dispose(
            &artifact,
            &self.cfg.recording_share,
            self.share.as_mut(),
            self.download.as_mut(),
        )
        .inspect_err(|_| self.stats.failures += 1)?;
        self.last_disposition = Some(disposition);
        self.stats.recordings += 1;
        Ok(Some(artifact))
    }

    fn composite_failed(&mut self, e: CompositeError) -> CaptureError {
        match e {
            CompositeError::SurfaceUnavailable(missing) => {
                debug!(%missing, "capture sources not ready");
                CaptureError::SourceNotReady
            }
            other => {
                self.stats.failures += 1;
                error!(error = %other, "capture composite failed");
                CaptureError::EncodeFailed(other.to_string())
            }
        }
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("capture pipeline dropped mid-recording, finalizing");
            if let Err(e) = self.finalize() {
                warn!(error = %e, "recording lost on drop");
            }
        }
    }
}

fn encode_png(surface: &FrameRGBA) -> Result<Vec<u8>, CaptureError> {
    let img = surface
        .to_rgba_image()
        .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;
    let bytes = out.into_inner();
    if bytes.is_empty() {
        return Err(CaptureError::EncodeFailed("png encoder produced no data".to_string()));
    }
    Ok(bytes)
}

fn into_capture_error(e: ArError) -> CaptureError {
    match e {
        ArError::Capture(c) => c,
        other => CaptureError::Encoder(other.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/pipeline.rs"]
mod tests;
