use crate::catalog::character::{Catalog, Character};
use crate::presentation::state::{PresentationState, ScaleFactor, VisualState};
use crate::tracking::tracker::{MarkerTracker, TargetSignal, TargetSubscription};
use tracing::{debug, info, warn};

/// Which character is on screen and whether the picker is open.
///
/// Invariants: `picker_open` and `selected_index.is_some()` both imply `target_found`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SelectionState {
    target_found: bool,
    selected_index: Option<usize>,
    picker_open: bool,
}

impl SelectionState {
    /// Marker currently in view.
    pub fn target_found(&self) -> bool {
        self.target_found
    }

    /// Catalog index of the character on screen.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    /// Character picker on screen.
    pub fn picker_open(&self) -> bool {
        self.picker_open
    }
}

/// Selection requests rejected by the controller. State is left unchanged.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// Selection requires the marker to be in view.
    #[error("cannot select a character while the marker is not in view")]
    TargetNotFound,
    /// Index past the end of the catalog.
    #[error("character index {index} out of range (catalog has {len})")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Catalog length.
        len: usize,
    },
}

/// Single owner of selection and presentation state.
///
/// Every transition goes through a method on this type; tracker signals are queued on a
/// subscription and applied in order by [`TrackingController::pump`].
#[derive(Debug)]
pub struct TrackingController {
    catalog: Catalog,
    selection: SelectionState,
    presentation: PresentationState,
    subscription: Option<TargetSubscription>,
    torn_down: bool,
}

impl TrackingController {
    /// Fresh session state over `catalog`, idle at zoom `scale`.
    pub fn new(catalog: Catalog, scale: ScaleFactor) -> Self {
        Self {
            catalog,
            selection: SelectionState::default(),
            presentation: PresentationState::new(scale),
            subscription: None,
            torn_down: false,
        }
    }

    /// Subscribe to found/lost signals of `target`. Replaces an earlier subscription.
    pub fn attach(&mut self, tracker: &mut dyn MarkerTracker, target: usize) {
        if let Some(old) = self.subscription.take() {
            tracker.unsubscribe(old);
        }
        self.subscription = Some(tracker.subscribe(target));
        self.torn_down = false;
        debug!(target, "tracking controller attached");
    }

    /// `true` while subscribed to a tracker.
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Apply every queued tracker signal in delivery order. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(signal) = self.subscription.as_ref().and_then(|s| s.try_next()) {
            self.apply_signal(signal);
            applied += 1;
        }
        applied
    }

    /// Apply one signal directly.
    pub fn apply_signal(&mut self, signal: TargetSignal) {
        match signal {
            TargetSignal::Found => self.on_marker_found(),
            TargetSignal::Lost => self.on_marker_lost(),
        }
    }

    /// Marker entered view. Opens the picker when nothing is selected yet; otherwise the
    /// previous character resumes.
    pub fn on_marker_found(&mut self) {
        self.selection.target_found = true;
        if self.selection.selected_index.is_none() {
            self.selection.picker_open = true;
            info!("marker found with no selection, opening picker");
        } else {
            debug!(
                selected = ?self.selection.selected_index,
                "marker found again, resuming selection"
            );
        }
    }

    /// Marker left view. The selection is cleared so reacquisition goes through the picker.
    pub fn on_marker_lost(&mut self) {
        self.selection = SelectionState::default();
        info!("marker lost, selection cleared");
    }

    /// Unsubscribe and stop the tracker. Stop failures are logged and swallowed; calling
    /// this again has no effect.
    pub fn on_session_teardown(&mut self, tracker: &mut dyn MarkerTracker) {
        if self.torn_down {
            return;
        }
        if let Some(sub) = self.subscription.take() {
            tracker.unsubscribe(sub);
        }
        if let Err(e) = tracker.stop() {
            warn!(error = %e, "tracker stop failed during teardown");
        }
        self.torn_down = true;
        info!("tracking session torn down");
    }

    /// Advance to the next character, wrapping. No-op without a selection.
    pub fn select_next(&mut self) -> Option<usize> {
        let cur = self.selection.selected_index?;
        self.set_selected(self.catalog.next_index(cur));
        self.selection.selected_index
    }

    /// Go back to the previous character, wrapping. No-op without a selection.
    pub fn select_previous(&mut self) -> Option<usize> {
        let cur = self.selection.selected_index?;
        self.set_selected(self.catalog.previous_index(cur));
        self.selection.selected_index
    }

    /// Pick a character from the picker. Closes the picker and starts idle.
    pub fn select_by_index(&mut self, index: usize) -> Result<(), SelectionError> {
        if !self.selection.target_found {
            return Err(SelectionError::TargetNotFound);
        }
        if index >= self.catalog.len() {
            return Err(SelectionError::OutOfRange {
                index,
                len: self.catalog.len(),
            });
        }
        self.set_selected(index);
        self.selection.picker_open = false;
        Ok(())
    }

    fn set_selected(&mut self, index: usize) {
        self.selection.selected_index = Some(index);
        self.presentation.reset_animation();
        debug!(index, name = %self.catalog.entries()[index].name, "character selected");
    }

    /// Flip idle/active clip for whichever character is selected.
    pub fn toggle_animation(&mut self) -> bool {
        let animated = self.presentation.toggle_animation();
        debug!(animated, "animation toggled");
        animated
    }

    /// Apply slider input; clamped to the supported range.
    pub fn set_scale(&mut self, raw: f32) -> crate::ArResult<ScaleFactor> {
        self.presentation.set_scale(raw)
    }

    /// Render state for catalog entry `index`.
    pub fn visual_state(&self, index: usize) -> Option<VisualState> {
        let character = self.catalog.get(index)?;
        let visible =
            self.selection.target_found && self.selection.selected_index == Some(index);
        Some(self.presentation.visual_state(character, visible))
    }

    /// Render state for every catalog entry, in catalog order.
    pub fn visual_states(&self) -> impl Iterator<Item = (usize, VisualState)> + '_ {
        (0..self.catalog.len()).filter_map(|i| self.visual_state(i).map(|v| (i, v)))
    }

    /// Current selection.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Current zoom and animation flag.
    pub fn presentation(&self) -> &PresentationState {
        &self.presentation
    }

    /// The catalog being navigated.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Character on screen, if any.
    pub fn selected_character(&self) -> Option<&Character> {
        self.selection
            .selected_index
            .and_then(|i| self.catalog.get(i))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/controller.rs"]
mod tests;
