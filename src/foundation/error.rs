use crate::capture::artifact::CaptureError;
use crate::composite::compositor::CompositeError;
use crate::tracking::controller::SelectionError;
use crate::tracking::tracker::TrackerError;

/// Convenience result type used across arlens.
pub type ArResult<T> = Result<T, ArError>;

/// Top-level error taxonomy used by session and capture APIs.
#[derive(thiserror::Error, Debug)]
pub enum ArError {
    /// Invalid user-provided input (scale values, catalog entries, frame buffers).
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid or unreadable viewer configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A selection request that the current tracking state does not allow.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Errors reported by the marker tracker.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Compositing could not produce a surface.
    #[error(transparent)]
    Composite(#[from] CompositeError),

    /// Still or recording capture failed.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArError {
    /// Build an [`ArError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`ArError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
