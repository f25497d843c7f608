//! Viewer configuration loaded from JSON.
//!
//! Every section is optional; an empty object `{}` yields the built-in five-animal catalog
//! with default capture settings.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::capture::disposition::ShareRequest;
use crate::catalog::character::{Catalog, Character, builtin_characters};
use crate::encode::stream::ContainerType;
use crate::foundation::core::Fps;
use crate::foundation::error::{ArError, ArResult};
use crate::presentation::state::{SCALE_MAX, SCALE_MIN, ScaleFactor};

/// Top-level viewer settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Selectable characters, in navigation order.
    pub catalog: Vec<Character>,
    /// Marker target index inside the tracker's target set.
    pub target_index: usize,
    /// Zoom settings.
    pub scale: ScaleConfig,
    /// Still and recording settings.
    pub capture: CaptureConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            catalog: builtin_characters(),
            target_index: 0,
            scale: ScaleConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

/// Zoom settings. Bounds are fixed at `SCALE_MIN..=SCALE_MAX`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleConfig {
    /// Zoom at session start.
    pub initial: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { initial: 1.0 }
    }
}

/// Still and recording settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Recording frame rate.
    pub fps: u32,
    /// Interval between encoder chunk requests.
    pub timeslice_ms: u64,
    /// Containers to try, most preferred first, as MIME types.
    pub container_priority: Vec<String>,
    /// Share sheet contents for stills.
    pub still_share: ShareRequest,
    /// Share sheet contents for recordings.
    pub recording_share: ShareRequest,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            timeslice_ms: 1000,
            container_priority: ContainerType::ALL
                .iter()
                .map(|c| c.mime().to_string())
                .collect(),
            still_share: ShareRequest::titled("AR Screenshot")
                .with_text("Check out this cool AR experience!"),
            recording_share: ShareRequest::titled("AR Recording"),
        }
    }
}

impl CaptureConfig {
    /// Recording rate as a validated [`Fps`].
    pub fn fps(&self) -> ArResult<Fps> {
        Fps::new(self.fps, 1)
            .map_err(|_| ArError::config("capture.fps must be greater than zero"))
    }

    /// Chunk interval.
    pub fn timeslice(&self) -> ArResult<Duration> {
        if self.timeslice_ms == 0 {
            return Err(ArError::config("capture.timeslice_ms must be greater than zero"));
        }
        Ok(Duration::from_millis(self.timeslice_ms))
    }

    /// Parsed container priority list, duplicates dropped.
    pub fn containers(&self) -> ArResult<Vec<ContainerType>> {
        let mut out = Vec::with_capacity(self.container_priority.len());
        for mime in &self.container_priority {
            let c = ContainerType::from_mime(mime).ok_or_else(|| {
                ArError::config(format!("unknown container type '{mime}'"))
            })?;
            if !out.contains(&c) {
                out.push(c);
            }
        }
        Ok(out)
    }
}

impl ViewerConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ArResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ArError::config(format!("parse viewer config JSON: {e}")))
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ArResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ArError::config(format!("open viewer config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check every section. Loading does not validate on its own.
    pub fn validate(&self) -> ArResult<()> {
        self.build_catalog()?;
        self.initial_scale()?;
        self.capture.fps()?;
        self.capture.timeslice()?;
        self.capture.containers()?;
        if self.capture.still_share.title.trim().is_empty()
            || self.capture.recording_share.title.trim().is_empty()
        {
            return Err(ArError::config("share titles must not be empty"));
        }
        Ok(())
    }

    /// The configured catalog.
    pub fn build_catalog(&self) -> ArResult<Catalog> {
        Catalog::new(self.catalog.clone()).map_err(|e| ArError::config(format!("catalog: {e}")))
    }

    /// Starting zoom. Values outside the slider range are rejected rather than clamped.
    pub fn initial_scale(&self) -> ArResult<ScaleFactor> {
        let v = self.scale.initial;
        if !(SCALE_MIN..=SCALE_MAX).contains(&v) {
            return Err(ArError::config(format!(
                "scale.initial must be within {SCALE_MIN}..={SCALE_MAX}, got {v}"
            )));
        }
        ScaleFactor::from_input(v)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/viewer.rs"]
mod tests;
