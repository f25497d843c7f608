use std::io::{Read, Write as _};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba};
use tracing::{debug, info};

use crate::composite::blend::flatten_opaque;
use crate::encode::stream::{
    ContainerType, EncoderState, StreamConfig, StreamEncoder, encoder_error,
};
use crate::foundation::core::{Fps, SurfaceSize};
use crate::foundation::error::{ArError, ArResult};
use crate::render::backend::FrameRGBA;

/// Streams raw RGBA frames through the system `ffmpeg` and collects the muxed output.
///
/// Webm uses VP9 in realtime mode, mp4 uses H.264 with a fragmented moov so it can be
/// written to a pipe. The stream size is fixed at start and rounded down to even
/// dimensions; frames of any other size are rescaled. Stdout and stderr are drained on
/// helper threads while frames are written.
pub struct FfmpegEncoder {
    supported: Vec<ContainerType>,
    running: Option<Running>,
}

struct Running {
    size: SurfaceSize,
    child: Child,
    stdin: Option<ChildStdin>,
    output: Arc<Mutex<Vec<u8>>>,
    stdout_drain: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    /// Probe the installed `ffmpeg` for the codecs each container needs.
    pub fn probe() -> Self {
        let supported = match probe_encoders() {
            Some(list) => ContainerType::ALL
                .into_iter()
                .filter(|c| list.contains(codec_for(*c)))
                .collect(),
            None => Vec::new(),
        };
        debug!(?supported, "probed ffmpeg containers");
        Self::with_supported(supported)
    }

    /// Trust the caller about which containers work.
    pub fn with_supported(supported: Vec<ContainerType>) -> Self {
        Self {
            supported,
            running: None,
        }
    }

    /// Containers this encoder will accept.
    pub fn supported(&self) -> &[ContainerType] {
        &self.supported
    }
}

impl StreamEncoder for FfmpegEncoder {
    fn is_type_supported(&self, container: ContainerType) -> bool {
        self.supported.contains(&container)
    }

    fn start(&mut self, cfg: StreamConfig) -> ArResult<Option<ContainerType>> {
        if self.running.is_some() {
            return Err(encoder_error("ffmpeg encoder already started"));
        }
        let container = match cfg.container {
            Some(c) => c,
            None => *self
                .supported
                .first()
                .ok_or_else(|| encoder_error("ffmpeg supports none of the known containers"))?,
        };
        if !self.is_type_supported(container) {
            return Err(encoder_error(format!(
                "ffmpeg cannot produce {container}"
            )));
        }
        let size = even_size(cfg.size)?;
        if !is_ffmpeg_on_path() {
            return Err(encoder_error(
                "ffmpeg is required for recording, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &size.to_string(),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an"]);
        match container {
            ContainerType::Webm => cmd.args([
                "-c:v",
                "libvpx-vp9",
                "-deadline",
                "realtime",
                "-pix_fmt",
                "yuv420p",
                "-f",
                "webm",
                "pipe:1",
            ]),
            ContainerType::Mp4 => cmd.args([
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "frag_keyframe+empty_moov+default_base_moof",
                "-f",
                "mp4",
                "pipe:1",
            ]),
        };

        let mut child = cmd.spawn().map_err(|e| {
            encoder_error(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| encoder_error("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| encoder_error("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| encoder_error("failed to open ffmpeg stderr (unexpected)"))?;

        let output = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&output);
        let stdout_drain = std::thread::spawn(move || -> std::io::Result<()> {
            let mut buf = [0u8; 64 * 1024];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                match sink.lock() {
                    Ok(mut out) => out.extend_from_slice(&buf[..n]),
                    Err(_) => return Ok(()),
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        info!(%size, %container, fps = cfg.fps.as_f64(), "ffmpeg recording started");
        self.running = Some(Running {
            size,
            child,
            stdin: Some(stdin),
            output,
            stdout_drain: Some(stdout_drain),
            stderr_drain: Some(stderr_drain),
            scratch: vec![0u8; size.rgba_len()],
        });
        Ok(Some(container))
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> ArResult<()> {
        let run = self
            .running
            .as_mut()
            .ok_or_else(|| encoder_error("ffmpeg encoder not started"))?;
        frame.validate()?;

        if frame.size() == run.size {
            flatten_opaque(&mut run.scratch, &frame.data, frame.premultiplied)?;
        } else {
            let view: ImageBuffer<Rgba<u8>, &[u8]> =
                ImageBuffer::from_raw(frame.width, frame.height, frame.data.as_slice())
                    .ok_or_else(|| ArError::validation("frame buffer does not match its size"))?;
            let scaled = imageops::resize(&view, run.size.width, run.size.height, FilterType::Triangle);
            flatten_opaque(&mut run.scratch, scaled.as_raw(), frame.premultiplied)?;
        }

        let Some(stdin) = run.stdin.as_mut() else {
            return Err(encoder_error("ffmpeg encoder is already finalized"));
        };
        stdin.write_all(&run.scratch).map_err(|e| {
            encoder_error(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn request_data(&mut self) -> ArResult<Vec<u8>> {
        match self.running.as_ref() {
            Some(run) => take_output(&run.output),
            None => Ok(Vec::new()),
        }
    }

    fn stop(&mut self) -> ArResult<Vec<u8>> {
        let Some(mut run) = self.running.take() else {
            return Ok(Vec::new());
        };
        drop(run.stdin.take());

        let status = run.child.wait().map_err(|e| {
            encoder_error(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if let Some(handle) = run.stdout_drain.take() {
            handle
                .join()
                .map_err(|_| encoder_error("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| encoder_error(format!("ffmpeg stdout read failed: {e}")))?;
        }
        let stderr_bytes = match run.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| encoder_error("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| encoder_error(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(encoder_error(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let bytes = take_output(&run.output)?;
        info!(bytes = bytes.len(), "ffmpeg recording finished");
        Ok(bytes)
    }

    fn state(&self) -> EncoderState {
        if self.running.is_some() {
            EncoderState::Recording
        } else {
            EncoderState::Inactive
        }
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if let Some(mut run) = self.running.take() {
            drop(run.stdin.take());
            let _ = run.child.wait();
        }
    }
}

fn codec_for(container: ContainerType) -> &'static str {
    match container {
        ContainerType::Webm => "libvpx-vp9",
        ContainerType::Mp4 => "libx264",
    }
}

fn probe_encoders() -> Option<String> {
    let out = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).into_owned())
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // `-r` must precede `-i` to set the rawvideo input rate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// yuv420p needs even dimensions; odd sizes lose their last row/column.
pub(crate) fn even_size(size: SurfaceSize) -> ArResult<SurfaceSize> {
    let even = SurfaceSize::new(size.width & !1, size.height & !1);
    if even.is_empty() {
        return Err(ArError::validation(format!(
            "recording size {size} is too small to encode"
        )));
    }
    Ok(even)
}

fn take_output(output: &Mutex<Vec<u8>>) -> ArResult<Vec<u8>> {
    let mut out = output
        .lock()
        .map_err(|_| encoder_error("ffmpeg output buffer poisoned"))?;
    Ok(std::mem::take(&mut *out))
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ArResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
