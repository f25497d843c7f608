use crate::encode::stream::ContainerType;
use crate::foundation::core::UnixMillis;

/// MIME type of still captures.
pub const STILL_MIME: &str = "image/png";

/// Capture failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Renderer surface or camera frame missing. Callers treat this as "not yet".
    #[error("capture sources are not ready (renderer surface or camera frame missing)")]
    SourceNotReady,
    /// Encoding produced no usable output.
    #[error("encode failed: {0}")]
    EncodeFailed(String),
    /// The stream encoder refused to start or aborted.
    #[error("encoder error: {0}")]
    Encoder(String),
    /// The download fallback could not save the artifact.
    #[error("download failed: {0}")]
    Download(String),
}

/// What produced an [`Artifact`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// PNG still.
    Still,
    /// Video recording in the given container.
    Recording(ContainerType),
}

/// A named, typed capture result ready to share or save.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Capture kind.
    pub kind: ArtifactKind,
    /// Suggested file name, e.g. `screenshot-1700000000000.png`.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime: &'static str,
    /// Encoded payload.
    pub bytes: Vec<u8>,
    /// Creation timestamp.
    pub created: UnixMillis,
}

impl Artifact {
    /// A PNG still created at `created`.
    pub fn still(bytes: Vec<u8>, created: UnixMillis) -> Self {
        Self {
            kind: ArtifactKind::Still,
            file_name: format!("screenshot-{created}.png"),
            mime: STILL_MIME,
            bytes,
            created,
        }
    }

    /// A recording muxed as `container`, created at `created`.
    pub fn recording(container: ContainerType, bytes: Vec<u8>, created: UnixMillis) -> Self {
        Self {
            kind: ArtifactKind::Recording(container),
            file_name: format!("recording-{created}.{}", container.extension()),
            mime: container.mime(),
            bytes,
            created,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("kind", &self.kind)
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .field("created", &self.created)
            .finish()
    }
}
