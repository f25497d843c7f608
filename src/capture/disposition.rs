use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{info, warn};

use crate::capture::artifact::{Artifact, CaptureError};
use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::error::ArResult;

/// Title and optional text handed to the share sheet.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ShareRequest {
    /// Share sheet title.
    pub title: String,
    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ShareRequest {
    /// A request with a title and no text.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: None,
        }
    }

    /// Attach message text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Why a share did not complete.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// The user dismissed the share sheet.
    #[error("share cancelled by user")]
    UserCancelled,
    /// The platform share failed.
    #[error("share failed: {0}")]
    Failed(String),
}

/// Platform share sheet.
pub trait ShareTarget {
    /// Whether this artifact can be offered for sharing at all.
    fn can_share(&self, artifact: &Artifact) -> bool;
    /// Offer the artifact. Blocks until the user completes or dismisses the sheet.
    fn share(&mut self, artifact: &Artifact, request: &ShareRequest) -> Result<(), ShareError>;
}

/// Save-to-device fallback.
pub trait DownloadTarget {
    /// Persist the artifact under its suggested file name.
    fn download(&mut self, artifact: &Artifact) -> ArResult<()>;
}

/// Why an artifact was downloaded instead of shared.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareOutcome {
    /// The share target cannot take this artifact.
    Unsupported,
    /// The user dismissed the share sheet.
    Cancelled,
    /// The share failed for another reason.
    Failed(String),
}

/// Where an artifact ended up.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Handed to the share target.
    Shared,
    /// Saved through the download target after the share did not happen.
    Downloaded {
        /// What happened to the share attempt.
        share: ShareOutcome,
    },
}

/// Share when possible, otherwise download.
///
/// Cancellation and non-support fall through quietly; other share failures are logged at
/// warn level. Only a failing download is an error.
pub fn dispose(
    artifact: &Artifact,
    request: &ShareRequest,
    share: &mut dyn ShareTarget,
    download: &mut dyn DownloadTarget,
) -> Result<Disposition, CaptureError> {
    let outcome = if share.can_share(artifact) {
        match share.share(artifact, request) {
            Ok(()) => {
                info!(file = %artifact.file_name, "artifact shared");
                return Ok(Disposition::Shared);
            }
            Err(ShareError::UserCancelled) => {
                info!(file = %artifact.file_name, "share cancelled, downloading");
                ShareOutcome::Cancelled
            }
            Err(ShareError::Failed(reason)) => {
                warn!(file = %artifact.file_name, %reason, "share failed, downloading");
                ShareOutcome::Failed(reason)
            }
        }
    } else {
        info!(file = %artifact.file_name, "share unsupported, downloading");
        ShareOutcome::Unsupported
    };

    download
        .download(artifact)
        .map_err(|e| CaptureError::Download(e.to_string()))?;
    Ok(Disposition::Downloaded { share: outcome })
}

/// A platform without a share sheet.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoShare;

impl ShareTarget for NoShare {
    fn can_share(&self, _artifact: &Artifact) -> bool {
        false
    }

    fn share(&mut self, _artifact: &Artifact, _request: &ShareRequest) -> Result<(), ShareError> {
        Err(ShareError::Failed("sharing is not supported".to_string()))
    }
}

/// Scripted share sheet answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareResponse {
    /// Accept every share.
    Accept,
    /// Report the user dismissed the sheet.
    Cancel,
    /// Fail with the given reason.
    Fail(String),
}

/// Share target with a fixed answer that records every request it sees.
#[derive(Clone, Debug)]
pub struct ScriptedShare {
    response: ShareResponse,
    mimes: Option<Vec<&'static str>>,
    requests: Rc<RefCell<Vec<(String, ShareRequest)>>>,
}

impl ScriptedShare {
    /// Answer every share with `response`.
    pub fn new(response: ShareResponse) -> Self {
        Self {
            response,
            mimes: None,
            requests: Rc::default(),
        }
    }

    /// Only report `can_share` for these MIME types.
    pub fn only_mimes(mut self, mimes: &[&'static str]) -> Self {
        self.mimes = Some(mimes.to_vec());
        self
    }

    /// `(file_name, request)` of every share attempt so far. Clones share one log.
    pub fn requests(&self) -> Vec<(String, ShareRequest)> {
        self.requests.borrow().clone()
    }
}

impl ShareTarget for ScriptedShare {
    fn can_share(&self, artifact: &Artifact) -> bool {
        self.mimes
            .as_ref()
            .is_none_or(|m| m.contains(&artifact.mime))
    }

    fn share(&mut self, artifact: &Artifact, request: &ShareRequest) -> Result<(), ShareError> {
        self.requests
            .borrow_mut()
            .push((artifact.file_name.clone(), request.clone()));
        match &self.response {
            ShareResponse::Accept => Ok(()),
            ShareResponse::Cancel => Err(ShareError::UserCancelled),
            ShareResponse::Fail(reason) => Err(ShareError::Failed(reason.clone())),
        }
    }
}

/// Writes artifacts into a directory under their suggested names.
#[derive(Clone, Debug)]
pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    /// Save into `dir`, creating it on first download.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadTarget for DirectoryDownloader {
    fn download(&mut self, artifact: &Artifact) -> ArResult<()> {
        use anyhow::Context as _;
        let path = self.dir.join(&artifact.file_name);
        ensure_parent_dir(&path)?;
        std::fs::write(&path, &artifact.bytes)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        info!(path = %path.display(), bytes = artifact.len(), "artifact saved");
        Ok(())
    }
}

/// Keeps downloaded artifacts in memory. Clones share one list.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDownloads {
    saved: Rc<RefCell<Vec<Artifact>>>,
}

impl InMemoryDownloads {
    /// Empty download list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every artifact saved so far.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.saved.borrow().clone()
    }

    /// Number of artifacts saved so far.
    pub fn len(&self) -> usize {
        self.saved.borrow().len()
    }

    /// Whether nothing was saved yet.
    pub fn is_empty(&self) -> bool {
        self.saved.borrow().is_empty()
    }
}

impl DownloadTarget for InMemoryDownloads {
    fn download(&mut self, artifact: &Artifact) -> ArResult<()> {
        self.saved.borrow_mut().push(artifact.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/disposition.rs"]
mod tests;
