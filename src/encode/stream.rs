use std::cell::RefCell;
use std::rc::Rc;

use crate::capture::artifact::CaptureError;
use crate::foundation::core::{Fps, SurfaceSize};
use crate::foundation::error::{ArError, ArResult};
use crate::render::backend::FrameRGBA;

/// Video container a recording can be muxed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ContainerType {
    /// `video/webm`.
    #[serde(rename = "video/webm")]
    Webm,
    /// `video/mp4`.
    #[serde(rename = "video/mp4")]
    Mp4,
}

impl ContainerType {
    /// Every known container, in default probing order.
    pub const ALL: [ContainerType; 2] = [ContainerType::Webm, ContainerType::Mp4];

    /// MIME type of the muxed stream.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }

    /// Parse a MIME type. Codec parameters after `;` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let base = mime.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|c| c.mime().eq_ignore_ascii_case(base))
    }
}

impl std::fmt::Display for ContainerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// Parameters for one recording stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// Frame size at start. Later frames of a different size are scaled to it.
    pub size: SurfaceSize,
    /// Capture rate.
    pub fps: Fps,
    /// Requested container; `None` lets the encoder use its platform default.
    pub container: Option<ContainerType>,
}

/// Lifecycle of a [`StreamEncoder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncoderState {
    /// Not started, or stopped.
    #[default]
    Inactive,
    /// Accepting frames.
    Recording,
}

/// Media-stream encoder: frames in, muxed container bytes out in chunks.
pub trait StreamEncoder {
    /// Whether `container` can be produced.
    fn is_type_supported(&self, container: ContainerType) -> bool;
    /// Open the stream. Returns the container actually chosen, when the encoder knows it.
    fn start(&mut self, cfg: StreamConfig) -> ArResult<Option<ContainerType>>;
    /// Append one frame.
    fn push_frame(&mut self, frame: &FrameRGBA) -> ArResult<()>;
    /// Take whatever muxed bytes are ready, possibly none.
    fn request_data(&mut self) -> ArResult<Vec<u8>>;
    /// Close the stream and return the final bytes.
    fn stop(&mut self) -> ArResult<Vec<u8>>;
    /// Current lifecycle state.
    fn state(&self) -> EncoderState;
}

pub(crate) fn encoder_error(msg: impl Into<String>) -> ArError {
    ArError::Capture(CaptureError::Encoder(msg.into()))
}

/// What an [`InMemoryEncoder`] has seen, shared with the test or caller that built it.
#[derive(Clone, Debug, Default)]
pub struct EncoderLog(Rc<RefCell<EncoderLogInner>>);

#[derive(Debug, Default)]
struct EncoderLogInner {
    starts: Vec<StreamConfig>,
    frames: Vec<SurfaceSize>,
    stops: usize,
}

impl EncoderLog {
    /// Configs passed to every `start`.
    pub fn starts(&self) -> Vec<StreamConfig> {
        self.0.borrow().starts.clone()
    }

    /// Size of every pushed frame, in order.
    pub fn frames(&self) -> Vec<SurfaceSize> {
        self.0.borrow().frames.clone()
    }

    /// Number of `stop` calls that closed a running stream.
    pub fn stops(&self) -> usize {
        self.0.borrow().stops
    }
}

/// Encoder that "muxes" each frame into an 8-byte record (`width`, `height` as LE u32).
///
/// It can be told to support only some containers, to produce no bytes, to abort after a
/// number of frames, or to fail when stopped.
#[derive(Debug)]
pub struct InMemoryEncoder {
    supported: Vec<ContainerType>,
    default_container: Option<ContainerType>,
    silent: bool,
    abort_after: Option<usize>,
    fail_stop: bool,
    state: EncoderState,
    pending: Vec<u8>,
    pushed: usize,
    log: EncoderLog,
}

impl Default for InMemoryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEncoder {
    /// Supports every container; the platform default is webm.
    pub fn new() -> Self {
        Self {
            supported: ContainerType::ALL.to_vec(),
            default_container: Some(ContainerType::Webm),
            silent: false,
            abort_after: None,
            fail_stop: false,
            state: EncoderState::Inactive,
            pending: Vec::new(),
            pushed: 0,
            log: EncoderLog::default(),
        }
    }

    /// Restrict the supported containers.
    pub fn supporting(mut self, containers: &[ContainerType]) -> Self {
        self.supported = containers.to_vec();
        self
    }

    /// Container reported when started without one.
    pub fn with_default_container(mut self, container: Option<ContainerType>) -> Self {
        self.default_container = container;
        self
    }

    /// Accept frames but never emit bytes.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Fail every push after the first `frames`.
    pub fn abort_after(mut self, frames: usize) -> Self {
        self.abort_after = Some(frames);
        self
    }

    /// Fail `stop` on a running stream, losing the bytes not yet requested.
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Handle onto the call log.
    pub fn log(&self) -> EncoderLog {
        self.log.clone()
    }
}

impl StreamEncoder for InMemoryEncoder {
    fn is_type_supported(&self, container: ContainerType) -> bool {
        self.supported.contains(&container)
    }

    fn start(&mut self, cfg: StreamConfig) -> ArResult<Option<ContainerType>> {
        if self.state == EncoderState::Recording {
            return Err(encoder_error("encoder already started"));
        }
        if let Some(c) = cfg.container
            && !self.is_type_supported(c)
        {
            return Err(encoder_error(format!("unsupported container {c}")));
        }
        self.log.0.borrow_mut().starts.push(cfg);
        self.state = EncoderState::Recording;
        self.pending.clear();
        self.pushed = 0;
        Ok(cfg.container.or(self.default_container))
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> ArResult<()> {
        if self.state != EncoderState::Recording {
            return Err(encoder_error("encoder not started"));
        }
        if self.abort_after.is_some_and(|n| self.pushed >= n) {
            self.state = EncoderState::Inactive;
            return Err(encoder_error("encoder aborted"));
        }
        frame.validate()?;
        self.pushed += 1;
        self.log.0.borrow_mut().frames.push(frame.size());
        if !self.silent {
            self.pending.extend_from_slice(&frame.width.to_le_bytes());
            self.pending.extend_from_slice(&frame.height.to_le_bytes());
        }
        Ok(())
    }

    fn request_data(&mut self) -> ArResult<Vec<u8>> {
        Ok(std::mem::take(&mut self.pending))
    }

    fn stop(&mut self) -> ArResult<Vec<u8>> {
        let was_running = self.state == EncoderState::Recording;
        if was_running {
            self.log.0.borrow_mut().stops += 1;
        }
        self.state = EncoderState::Inactive;
        let tail = std::mem::take(&mut self.pending);
        if was_running && self.fail_stop {
            return Err(encoder_error("encoder failed to finalize"));
        }
        Ok(tail)
    }

    fn state(&self) -> EncoderState {
        self.state
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/stream.rs"]
mod tests;
