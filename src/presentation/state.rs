use crate::catalog::character::Character;
use crate::foundation::core::Vec3;
use crate::foundation::error::{ArError, ArResult};

/// Lowest accepted user scale factor.
pub const SCALE_MIN: f32 = 0.5;
/// Highest accepted user scale factor.
pub const SCALE_MAX: f32 = 3.0;
/// Slider step granularity.
pub const SCALE_STEP: f32 = 0.1;

/// User-controlled zoom applied on top of each character's base scale.
///
/// Always inside `[SCALE_MIN, SCALE_MAX]` and on the `SCALE_STEP` grid.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize)]
pub struct ScaleFactor(f32);

impl ScaleFactor {
    /// Clamp and quantize raw slider input. Non-finite input is rejected.
    pub fn from_input(v: f32) -> ArResult<Self> {
        if !v.is_finite() {
            return Err(ArError::validation(format!(
                "scale factor must be finite, got {v}"
            )));
        }
        let clamped = v.clamp(SCALE_MIN, SCALE_MAX);
        // Divide by the integral steps-per-unit so grid values land on the nearest f32.
        let per_unit = SCALE_STEP.recip().round();
        let steps = (clamped * per_unit).round();
        Ok(Self((steps / per_unit).clamp(SCALE_MIN, SCALE_MAX)))
    }

    /// The factor as a float.
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

/// How the renderer should loop a clip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Restart from the beginning when the clip ends.
    #[default]
    Repeat,
    /// Play once and hold the last pose.
    Once,
    /// Alternate forward and backward playback.
    PingPong,
}

/// Animation directive handed to the renderer for one catalog entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ClipDirective {
    /// Clip name inside the model.
    pub name: String,
    /// Loop behavior.
    pub loop_mode: LoopMode,
    /// Playback speed multiplier.
    pub time_scale: f32,
}

/// Per-entry render state computed once per tick.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VisualState {
    /// Whether the entry should be drawn at all.
    pub visible: bool,
    /// Position relative to the marker anchor.
    pub position: Vec3,
    /// Rotation in degrees.
    pub rotation: Vec3,
    /// Base scale multiplied by the user scale factor.
    pub scale: Vec3,
    /// Clip to play; `None` is a static pose.
    pub clip: Option<ClipDirective>,
}

/// Zoom and idle/active animation state shared by every catalog entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct PresentationState {
    scale: ScaleFactor,
    animated: bool,
}

impl PresentationState {
    /// Start idle at the given zoom.
    pub fn new(scale: ScaleFactor) -> Self {
        Self {
            scale,
            animated: false,
        }
    }

    /// Current zoom.
    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    /// `true` while the active clip is selected.
    pub fn animated(&self) -> bool {
        self.animated
    }

    /// Apply slider input through the clamping boundary.
    pub fn set_scale(&mut self, raw: f32) -> ArResult<ScaleFactor> {
        self.scale = ScaleFactor::from_input(raw)?;
        Ok(self.scale)
    }

    /// Flip between idle and active clip. Returns the new value.
    pub fn toggle_animation(&mut self) -> bool {
        self.animated = !self.animated;
        self.animated
    }

    pub(crate) fn reset_animation(&mut self) {
        self.animated = false;
    }

    /// Render state for `character`, which is drawn only when `visible`.
    pub fn visual_state(&self, character: &Character, visible: bool) -> VisualState {
        VisualState {
            visible,
            position: character.position,
            rotation: character.rotation,
            scale: character.scale.scaled(self.scale.get()),
            clip: self.clip_for(character),
        }
    }

    fn clip_for(&self, character: &Character) -> Option<ClipDirective> {
        let name = match (&character.active_clip, self.animated) {
            (Some(active), true) => Some(active),
            _ => character.idle_clip.as_ref(),
        }?;
        Some(ClipDirective {
            name: name.clone(),
            loop_mode: character.clip_loop,
            time_scale: 1.0,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/state.rs"]
mod tests;
