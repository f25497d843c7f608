use crate::foundation::core::Vec3;
use crate::foundation::error::{ArError, ArResult};
use crate::presentation::state::LoopMode;
use std::collections::BTreeSet;

/// One selectable character in the catalog.
///
/// Entries are immutable after the catalog is built. `active_clip` being absent means the
/// character has no idle/active distinction and always plays `idle_clip`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Character {
    /// Stable identifier, unique within a catalog.
    pub id: String,
    /// Display name used by the picker.
    pub name: String,
    /// Model asset reference handed to the renderer.
    pub asset: String,
    /// Base scale applied before the user scale factor.
    #[serde(default = "one")]
    pub scale: Vec3,
    /// Base position relative to the marker anchor.
    #[serde(default = "zero")]
    pub position: Vec3,
    /// Base rotation in degrees.
    #[serde(default = "zero")]
    pub rotation: Vec3,
    /// Clip played while not animated.
    #[serde(default)]
    pub idle_clip: Option<String>,
    /// Clip played while animated.
    #[serde(default)]
    pub active_clip: Option<String>,
    /// Loop mode for whichever clip is playing.
    #[serde(default)]
    pub clip_loop: LoopMode,
}

fn one() -> Vec3 {
    Vec3::ONE
}

fn zero() -> Vec3 {
    Vec3::ZERO
}

impl Character {
    /// Create an entry with unit scale, no offset and no clips.
    pub fn new(id: impl Into<String>, name: impl Into<String>, asset: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            asset: asset.into(),
            scale: Vec3::ONE,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            idle_clip: None,
            active_clip: None,
            clip_loop: LoopMode::Repeat,
        }
    }

    /// Set the base scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Set the base rotation (degrees).
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the idle and active clip names.
    pub fn with_clips(mut self, idle: Option<&str>, active: Option<&str>) -> Self {
        self.idle_clip = idle.map(str::to_owned);
        self.active_clip = active.map(str::to_owned);
        self
    }

    fn validate(&self) -> ArResult<()> {
        if self.id.trim().is_empty() {
            return Err(ArError::validation("character id must be non-empty"));
        }
        if !self.scale.is_finite() || !self.position.is_finite() || !self.rotation.is_finite() {
            return Err(ArError::validation(format!(
                "character '{}' has non-finite base vectors",
                self.id
            )));
        }
        Ok(())
    }
}

/// Ordered, non-empty list of selectable characters.
///
/// Catalog order is the navigation order; navigation wraps around at both ends.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    entries: Vec<Character>,
}

impl Catalog {
    /// Build a validated catalog. Ids must be unique and the list must be non-empty.
    pub fn new(entries: Vec<Character>) -> ArResult<Self> {
        if entries.is_empty() {
            return Err(ArError::validation("catalog must contain at least one character"));
        }
        let mut seen = BTreeSet::new();
        for c in &entries {
            c.validate()?;
            if !seen.insert(c.id.as_str()) {
                return Err(ArError::validation(format!(
                    "duplicate character id '{}'",
                    c.id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The five-animal catalog the viewer ships with.
    pub fn builtin() -> Self {
        Self {
            entries: builtin_characters(),
        }
    }

    /// Number of entries (always at least one).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&Character> {
        self.entries.get(index)
    }

    /// Iterate entries in navigation order.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.entries.iter()
    }

    /// Borrow entries as a slice.
    pub fn entries(&self) -> &[Character] {
        &self.entries
    }

    /// Index following `index`, wrapping to the first entry.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.entries.len()
    }

    /// Index preceding `index`, wrapping to the last entry.
    pub fn previous_index(&self, index: usize) -> usize {
        let n = self.entries.len();
        (index % n + n - 1) % n
    }
}

pub(crate) fn builtin_characters() -> Vec<Character> {
    vec![
        Character::new("lion", "Lion", "assets/Lion.glb").with_clips(Some("Idle"), Some("Roar")),
        Character::new("tiger", "Tiger", "assets/TigerLP.glb")
            .with_clips(Some("Idle"), Some("Run")),
        Character::new("hippo", "Hippopotamus", "assets/Hippo.glb")
            .with_clips(Some("Idle"), Some("Walk")),
        Character::new("goldfinch", "Goldfinch", "assets/Goldfinch.glb")
            .with_scale(Vec3::splat(30.0))
            .with_rotation(Vec3::new(0.0, 180.0, 0.0))
            .with_clips(Some("Idle"), Some("Fly")),
        Character::new("eagle", "Eagle", "assets/Eagle.glb")
            .with_scale(Vec3::splat(2.0))
            .with_clips(Some("Idle"), Some("Fly")),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/character.rs"]
mod tests;
