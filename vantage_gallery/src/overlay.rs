// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Size};
use tracing::debug;
use vantage_host::{Host, ViewportId};

use crate::layout::{GalleryHit, GalleryLayout, HEADER_HEIGHT, LayoutKey, THUMB_SIDE_MAX};

/// A pointer button the gallery reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    /// Activates thumbnails and header buttons.
    Left,
    /// Requests the per-view context menu.
    Right,
    /// Held to show an enlarged preview.
    Middle,
}

/// An input event forwarded to the gallery while it is open.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GalleryEvent {
    /// The pointer moved (global viewport coordinates).
    PointerMove(Point),
    /// A button went down at a position.
    Press {
        /// Which button.
        button: PointerButton,
        /// Where, in viewport coordinates.
        position: Point,
    },
    /// A button came up at a position.
    Release {
        /// Which button.
        button: PointerButton,
        /// Where, in viewport coordinates.
        position: Point,
    },
    /// One scroll notch; positive scrolls toward higher indexes.
    Scroll(i32),
    /// The escape key. Closes the gallery only while the pointer is over
    /// the strip.
    Escape,
}

/// What the session should do in response to a gallery event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GalleryAction {
    /// Nothing; the event was absorbed or ignored.
    None,
    /// The strip changed visually and needs a redraw.
    Redraw,
    /// Load the saved view at this index.
    LoadView(usize),
    /// Save the current viewport as a new view.
    AddView,
    /// Regenerate every thumbnail.
    RefreshAll,
    /// Move a view from one index to another (reorder mode).
    MoveView {
        /// Index being moved.
        from: usize,
        /// Index it lands on.
        to: usize,
    },
    /// Open the per-view context menu for this index.
    ContextMenu(usize),
    /// Close the gallery.
    Close,
}

/// The single gallery overlay instance.
///
/// The overlay is pure interaction state: it owns no view data and issues
/// [`GalleryAction`]s for the session to execute. It is bound to one
/// `primary` viewport; when that viewport disappears the session either
/// promotes another viewport or closes the overlay, via
/// [`GalleryOverlay::validate_primary`].
#[derive(Debug)]
pub struct GalleryOverlay {
    primary: ViewportId,
    pointer: Point,
    item_count: usize,
    scroll_offset: usize,
    flip_to_top: bool,
    header_at_bottom: bool,
    thumb_size_max: f64,
    reorder_mode: bool,
    reorder_source: Option<usize>,
    preview_index: Option<usize>,
    cache: Option<(LayoutKey, GalleryLayout)>,
}

impl GalleryOverlay {
    /// An overlay bound to a primary viewport.
    #[must_use]
    pub fn new(primary: ViewportId) -> Self {
        Self {
            primary,
            pointer: Point::ZERO,
            item_count: 0,
            scroll_offset: 0,
            flip_to_top: false,
            header_at_bottom: false,
            thumb_size_max: THUMB_SIDE_MAX,
            reorder_mode: false,
            reorder_source: None,
            preview_index: None,
            cache: None,
        }
    }

    /// The viewport the strip is drawn into.
    #[must_use]
    pub fn primary(&self) -> ViewportId {
        self.primary
    }

    /// The index previewed while the middle button is held, if any.
    #[must_use]
    pub fn preview_index(&self) -> Option<usize> {
        self.preview_index
    }

    /// Whether reorder mode is armed.
    #[must_use]
    pub fn reorder_mode(&self) -> bool {
        self.reorder_mode
    }

    /// Tell the overlay how many views exist. Clamps the scroll position
    /// and drops stale reorder/preview indexes.
    pub fn set_item_count(&mut self, count: usize) {
        self.item_count = count;
        let visible = self
            .cache
            .as_ref()
            .map_or(1, |(_, layout)| layout.visible_items.max(1));
        let max_scroll = count.saturating_sub(visible);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
        if self.reorder_source.is_some_and(|i| i >= count) {
            self.reorder_source = None;
        }
        if self.preview_index.is_some_and(|i| i >= count) {
            self.preview_index = None;
        }
    }

    /// Check the primary viewport still exists, promoting the focused (or
    /// first) viewport when it does not. Returns false when no viewport is
    /// left to draw into and the session should close the overlay.
    pub fn validate_primary(&mut self, host: &dyn Host) -> bool {
        let viewports = host.viewports();
        if viewports.contains(&self.primary) {
            return true;
        }
        let Some(next) = host.focused_viewport().or_else(|| viewports.first().copied()) else {
            return false;
        };
        debug!(?next, "gallery primary viewport gone, promoting");
        self.primary = next;
        self.cache = None;
        true
    }

    /// The strip layout for the current state, recomputed only when the
    /// layout key changed.
    pub fn layout(&mut self, viewport_size: Size) -> &GalleryLayout {
        let key = LayoutKey {
            viewport_size,
            item_count: self.item_count,
            scroll_offset: self.scroll_offset,
            flip_to_top: self.flip_to_top,
            header_height: HEADER_HEIGHT,
            header_at_bottom: self.header_at_bottom,
            thumb_size_max: self.thumb_size_max,
        };
        let cache = self
            .cache
            .get_or_insert_with(|| (key, GalleryLayout::compute(&key)));
        if cache.0 != key {
            *cache = (key, GalleryLayout::compute(&key));
        }
        &cache.1
    }

    /// Handle one input event against the strip laid out for
    /// `viewport_size`.
    pub fn handle_event(&mut self, viewport_size: Size, event: GalleryEvent) -> GalleryAction {
        match event {
            GalleryEvent::PointerMove(position) => {
                self.pointer = position;
                GalleryAction::None
            }
            GalleryEvent::Scroll(notches) => self.scroll_by(notches),
            GalleryEvent::Escape => {
                let over = self.hit_at(viewport_size, self.pointer) != GalleryHit::Outside;
                if over { GalleryAction::Close } else { GalleryAction::None }
            }
            GalleryEvent::Press { button, position } => {
                self.pointer = position;
                let hit = self.hit_at(viewport_size, position);
                self.handle_press(button, hit)
            }
            GalleryEvent::Release { button, .. } => {
                if button == PointerButton::Middle && self.preview_index.take().is_some() {
                    GalleryAction::Redraw
                } else {
                    GalleryAction::None
                }
            }
        }
    }

    fn hit_at(&mut self, viewport_size: Size, position: Point) -> GalleryHit {
        self.layout(viewport_size).hit(position)
    }

    fn scroll_by(&mut self, notches: i32) -> GalleryAction {
        let visible = self
            .cache
            .as_ref()
            .map_or(1, |(_, layout)| layout.visible_items.max(1));
        let max_scroll = self.item_count.saturating_sub(visible);
        let current = self.scroll_offset.min(max_scroll);
        let step = usize::try_from(notches.unsigned_abs()).unwrap_or(usize::MAX);
        let next = if notches >= 0 {
            current.saturating_add(step).min(max_scroll)
        } else {
            current.saturating_sub(step)
        };
        if next == self.scroll_offset {
            return GalleryAction::None;
        }
        self.scroll_offset = next;
        self.cache = None;
        GalleryAction::Redraw
    }

    fn handle_press(&mut self, button: PointerButton, hit: GalleryHit) -> GalleryAction {
        match (button, hit) {
            (PointerButton::Middle, GalleryHit::Thumb(index)) => {
                self.preview_index = Some(index);
                GalleryAction::Redraw
            }
            (PointerButton::Right, GalleryHit::Thumb(index)) => GalleryAction::ContextMenu(index),
            (PointerButton::Left, GalleryHit::Thumb(index)) => self.left_press_thumb(index),
            (PointerButton::Left, GalleryHit::Add) => GalleryAction::AddView,
            (PointerButton::Left, GalleryHit::Refresh) => GalleryAction::RefreshAll,
            (PointerButton::Left, GalleryHit::Close) => GalleryAction::Close,
            (PointerButton::Left, GalleryHit::Reorder) => {
                if self.item_count < 2 {
                    return GalleryAction::None;
                }
                self.reorder_mode = !self.reorder_mode;
                self.reorder_source = None;
                GalleryAction::Redraw
            }
            _ => GalleryAction::None,
        }
    }

    fn left_press_thumb(&mut self, index: usize) -> GalleryAction {
        if !self.reorder_mode {
            return GalleryAction::LoadView(index);
        }
        match self.reorder_source.take() {
            None => {
                self.reorder_source = Some(index);
                GalleryAction::Redraw
            }
            Some(from) if from == index => GalleryAction::Redraw,
            Some(from) => GalleryAction::MoveView { from, to: index },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Size = Size::new(800.0, 600.0);

    fn overlay(items: usize) -> GalleryOverlay {
        let mut overlay = GalleryOverlay::new(ViewportId(1));
        overlay.set_item_count(items);
        overlay
    }

    fn thumb_center(overlay: &mut GalleryOverlay, index: usize) -> Point {
        overlay
            .layout(SIZE)
            .thumbs
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, rect)| rect.center())
            .unwrap()
    }

    fn press(overlay: &mut GalleryOverlay, button: PointerButton, position: Point) -> GalleryAction {
        overlay.handle_event(SIZE, GalleryEvent::Press { button, position })
    }

    #[test]
    fn left_press_loads_the_view_under_the_pointer() {
        let mut overlay = overlay(3);
        let position = thumb_center(&mut overlay, 2);
        assert_eq!(
            press(&mut overlay, PointerButton::Left, position),
            GalleryAction::LoadView(2)
        );
    }

    #[test]
    fn header_buttons_resolve_actions() {
        let mut overlay = overlay(3);
        let add = overlay.layout(SIZE).add_button.center();
        let refresh = overlay.layout(SIZE).refresh_button.center();
        let close = overlay.layout(SIZE).close_button.center();
        assert_eq!(press(&mut overlay, PointerButton::Left, add), GalleryAction::AddView);
        assert_eq!(
            press(&mut overlay, PointerButton::Left, refresh),
            GalleryAction::RefreshAll
        );
        assert_eq!(press(&mut overlay, PointerButton::Left, close), GalleryAction::Close);
    }

    #[test]
    fn reorder_needs_two_views_then_two_presses() {
        let mut overlay = overlay(1);
        let button = overlay.layout(SIZE).reorder_button.center();
        assert_eq!(press(&mut overlay, PointerButton::Left, button), GalleryAction::None);
        assert!(!overlay.reorder_mode());

        overlay.set_item_count(3);
        let button = overlay.layout(SIZE).reorder_button.center();
        assert_eq!(press(&mut overlay, PointerButton::Left, button), GalleryAction::Redraw);
        assert!(overlay.reorder_mode());

        let first = thumb_center(&mut overlay, 0);
        let third = thumb_center(&mut overlay, 2);
        assert_eq!(press(&mut overlay, PointerButton::Left, first), GalleryAction::Redraw);
        assert_eq!(
            press(&mut overlay, PointerButton::Left, third),
            GalleryAction::MoveView { from: 0, to: 2 }
        );
    }

    #[test]
    fn middle_button_holds_a_preview() {
        let mut overlay = overlay(3);
        let position = thumb_center(&mut overlay, 1);
        assert_eq!(
            press(&mut overlay, PointerButton::Middle, position),
            GalleryAction::Redraw
        );
        assert_eq!(overlay.preview_index(), Some(1));
        assert_eq!(
            overlay.handle_event(
                SIZE,
                GalleryEvent::Release {
                    button: PointerButton::Middle,
                    position
                }
            ),
            GalleryAction::Redraw
        );
        assert_eq!(overlay.preview_index(), None);
    }

    #[test]
    fn right_press_requests_a_context_menu() {
        let mut overlay = overlay(3);
        let position = thumb_center(&mut overlay, 0);
        assert_eq!(
            press(&mut overlay, PointerButton::Right, position),
            GalleryAction::ContextMenu(0)
        );
    }

    #[test]
    fn escape_closes_only_over_the_strip() {
        let mut overlay = overlay(3);
        overlay.handle_event(SIZE, GalleryEvent::PointerMove(Point::new(400.0, 10.0)));
        assert_eq!(overlay.handle_event(SIZE, GalleryEvent::Escape), GalleryAction::None);

        let over = thumb_center(&mut overlay, 0);
        overlay.handle_event(SIZE, GalleryEvent::PointerMove(over));
        assert_eq!(overlay.handle_event(SIZE, GalleryEvent::Escape), GalleryAction::Close);
    }

    #[test]
    fn scroll_clamps_to_the_item_range() {
        let mut overlay = overlay(30);
        // Prime the layout cache so the visible count is known.
        let visible = overlay.layout(SIZE).visible_items;
        assert!(visible < 30);

        assert_eq!(overlay.handle_event(SIZE, GalleryEvent::Scroll(-1)), GalleryAction::None);
        for _ in 0..100 {
            overlay.handle_event(SIZE, GalleryEvent::Scroll(1));
        }
        let first = overlay.layout(SIZE).thumbs.first().map(|(i, _)| *i);
        assert_eq!(first, Some(30 - visible));
    }

    #[test]
    fn shrinking_the_item_count_clamps_scroll_immediately() {
        let mut overlay = overlay(30);
        let visible = overlay.layout(SIZE).visible_items;
        for _ in 0..100 {
            overlay.handle_event(SIZE, GalleryEvent::Scroll(1));
        }

        // After a mass delete the strip must still start within the
        // remaining items, not one window past them.
        overlay.set_item_count(visible + 5);
        let first = overlay.layout(SIZE).thumbs.first().map(|(i, _)| *i);
        assert_eq!(first, Some(5));
    }

    #[test]
    fn primary_promotes_or_reports_closure() {
        use vantage_host::MockHost;

        let mut host = MockHost::new();
        let a = host.add_viewport();
        let b = host.add_viewport();
        let mut overlay = GalleryOverlay::new(a);
        assert!(overlay.validate_primary(&host));
        assert_eq!(overlay.primary(), a);

        host.remove_viewport(a);
        host.set_focused_viewport(Some(b));
        assert!(overlay.validate_primary(&host));
        assert_eq!(overlay.primary(), b);

        host.remove_viewport(b);
        assert!(!overlay.validate_primary(&host));
    }
}
