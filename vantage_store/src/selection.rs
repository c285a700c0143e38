// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Which saved view the UI considers selected, plus the ghost-view
/// memory.
///
/// When the live pose drifts away from a selected view, the selection is
/// cleared but the previously active index is kept so "update view" can
/// still target it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewSelection {
    active: Option<usize>,
    last_active: Option<usize>,
    /// Set while selection widgets are being updated programmatically so
    /// change notifications are not treated as user actions.
    pub suppress_sync: bool,
}

impl ViewSelection {
    /// No selection, no ghost.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected view index.
    #[must_use]
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// The view the live pose most recently diverged from.
    #[must_use]
    pub fn last_active(&self) -> Option<usize> {
        self.last_active
    }

    /// Select a view (or clear with `None`). A real selection also
    /// becomes the ghost fallback.
    pub fn select(&mut self, index: Option<usize>) {
        if index.is_some() {
            self.last_active = index;
        }
        self.active = index;
    }

    /// The target "update view" should use: the live selection, else the
    /// ghost.
    #[must_use]
    pub fn update_target(&self) -> Option<usize> {
        self.active.or(self.last_active)
    }

    /// Movement away from the selected view: remember it as the ghost and
    /// clear the selection.
    pub fn drift_to_ghost(&mut self) {
        if let Some(active) = self.active.take() {
            self.last_active = Some(active);
        }
    }

    /// Drop selection and ghost (e.g., after deleting a view).
    pub fn clear(&mut self) {
        self.active = None;
        self.last_active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_remembers_ghost() {
        let mut selection = ViewSelection::new();
        selection.select(Some(2));
        selection.drift_to_ghost();
        assert_eq!(selection.active(), None);
        assert_eq!(selection.update_target(), Some(2));
    }

    #[test]
    fn reselect_overwrites_ghost() {
        let mut selection = ViewSelection::new();
        selection.select(Some(2));
        selection.drift_to_ghost();
        selection.select(Some(0));
        assert_eq!(selection.update_target(), Some(0));
    }

    #[test]
    fn clear_drops_everything() {
        let mut selection = ViewSelection::new();
        selection.select(Some(1));
        selection.clear();
        assert_eq!(selection.update_target(), None);
    }
}
