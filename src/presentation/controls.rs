use crate::foundation::core::{Point, Rect, SurfaceSize};
use crate::presentation::state::{SCALE_MAX, SCALE_MIN};
use crate::tracking::controller::SelectionState;

/// Interactive controls drawn over the live surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    /// Leave the experience.
    Back,
    /// Take a still.
    Capture,
    /// Start or stop a recording.
    Record,
    /// Previous character arrow.
    Previous,
    /// Next character arrow.
    Next,
    /// Zoom slider.
    ScaleSlider,
    /// Picker entry for the catalog index.
    PickerEntry(usize),
}

impl ControlId {
    /// Whether the control is on screen for the given selection state.
    pub fn is_live(self, selection: &SelectionState) -> bool {
        match self {
            Self::Back | Self::Capture | Self::Record => true,
            Self::PickerEntry(_) => selection.target_found() && selection.picker_open(),
            Self::Previous | Self::Next | Self::ScaleSlider => {
                selection.target_found() && selection.selected_index().is_some()
            }
        }
    }
}

/// Hit regions for every control, in surface pixel coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlLayout {
    regions: Vec<(ControlId, Rect)>,
}

const BACK_SIZE: f64 = 48.0;
const MARGIN: f64 = 16.0;
const ACTION_SIZE: f64 = 64.0;
const ACTION_GAP: f64 = 32.0;
const ARROW_SIZE: f64 = 56.0;
const SLIDER_WIDTH: f64 = 40.0;
const PICKER_WIDTH: f64 = 220.0;
const PICKER_ROW: f64 = 52.0;

impl ControlLayout {
    /// An empty layout; every tap lands on the surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// The viewer's standard arrangement for a surface of `size` and a picker of
    /// `picker_entries` rows.
    ///
    /// Back top-left, capture/record centred along the bottom, arrows at mid-height on both
    /// edges, the slider up the right side and the picker as a centred vertical list.
    pub fn standard(size: SurfaceSize, picker_entries: usize) -> Self {
        let s = size.to_kurbo();
        let mut layout = Self::new();

        layout.set(
            ControlId::Back,
            Rect::new(MARGIN, MARGIN, MARGIN + BACK_SIZE, MARGIN + BACK_SIZE),
        );

        let bar_y1 = s.height - MARGIN;
        let bar_y0 = bar_y1 - ACTION_SIZE;
        let cx = s.width / 2.0;
        layout.set(
            ControlId::Capture,
            Rect::new(cx - ACTION_GAP / 2.0 - ACTION_SIZE, bar_y0, cx - ACTION_GAP / 2.0, bar_y1),
        );
        layout.set(
            ControlId::Record,
            Rect::new(cx + ACTION_GAP / 2.0, bar_y0, cx + ACTION_GAP / 2.0 + ACTION_SIZE, bar_y1),
        );

        let cy = s.height / 2.0;
        layout.set(
            ControlId::Previous,
            Rect::new(MARGIN, cy - ARROW_SIZE / 2.0, MARGIN + ARROW_SIZE, cy + ARROW_SIZE / 2.0),
        );
        layout.set(
            ControlId::Next,
            Rect::new(
                s.width - MARGIN - ARROW_SIZE,
                cy - ARROW_SIZE / 2.0,
                s.width - MARGIN,
                cy + ARROW_SIZE / 2.0,
            ),
        );

        let slider_h = (s.height * 0.4).max(ARROW_SIZE);
        let slider_y0 = cy + ARROW_SIZE;
        layout.set(
            ControlId::ScaleSlider,
            Rect::new(
                s.width - MARGIN - SLIDER_WIDTH,
                slider_y0,
                s.width - MARGIN,
                (slider_y0 + slider_h).min(bar_y0),
            ),
        );

        let list_h = PICKER_ROW * picker_entries as f64;
        let list_y0 = cy - list_h / 2.0;
        for i in 0..picker_entries {
            let y0 = list_y0 + PICKER_ROW * i as f64;
            layout.set(
                ControlId::PickerEntry(i),
                Rect::new(cx - PICKER_WIDTH / 2.0, y0, cx + PICKER_WIDTH / 2.0, y0 + PICKER_ROW),
            );
        }
        layout
    }

    /// Add or replace the region for `id`.
    pub fn set(&mut self, id: ControlId, rect: Rect) {
        match self.regions.iter_mut().find(|(c, _)| *c == id) {
            Some(slot) => slot.1 = rect,
            None => self.regions.push((id, rect)),
        }
    }

    /// Region for `id`, if laid out.
    pub fn region(&self, id: ControlId) -> Option<Rect> {
        self.regions.iter().find(|(c, _)| *c == id).map(|(_, r)| *r)
    }

    /// Raw slider input for a touch at `point`: `SCALE_MAX` at the top edge of the slider,
    /// `SCALE_MIN` at the bottom. `None` outside the slider.
    pub fn slider_value(&self, point: Point) -> Option<f32> {
        let r = self.region(ControlId::ScaleSlider)?;
        if !r.contains(point) || r.height() <= 0.0 {
            return None;
        }
        let t = ((r.y1 - point.y) / r.height()).clamp(0.0, 1.0) as f32;
        Some(SCALE_MIN + t * (SCALE_MAX - SCALE_MIN))
    }

    /// The live control under `point`, if any. Later entries win on overlap.
    pub fn hit_test(&self, point: Point, selection: &SelectionState) -> Option<ControlId> {
        self.regions
            .iter()
            .rev()
            .find(|(id, rect)| id.is_live(selection) && rect.contains(point))
            .map(|(id, _)| *id)
    }
}

/// What the UI collaborator should currently show.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ControlsView {
    /// "Scan the marker" hint.
    pub scanning_hint: bool,
    /// Picker rows (display names in catalog order); empty when the picker is closed.
    pub picker: Vec<String>,
    /// Arrows and slider.
    pub navigation: bool,
    /// Name of the character on screen.
    pub selected: Option<String>,
    /// Slider value.
    pub scale: f32,
    /// Idle/active clip flag.
    pub animated: bool,
    /// Record button shows "stop".
    pub recording: bool,
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/controls.rs"]
mod tests;
