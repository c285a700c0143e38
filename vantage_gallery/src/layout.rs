// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Rect, Size};

/// Gap between thumbnails, and between the strip and the viewport edges.
pub const GALLERY_PADDING: f64 = 10.0;

/// Smallest useful thumbnail side.
pub const THUMB_SIDE_MIN: f64 = 40.0;

/// Default upper bound for the thumbnail side, overridable per overlay.
pub const THUMB_SIDE_MAX: f64 = 200.0;

/// Height of the button header above (or below) the thumbnail row.
pub const HEADER_HEIGHT: f64 = 26.0;

/// Square side of the header buttons.
const BUTTON_SIDE: f64 = 20.0;

/// Everything the strip layout depends on. The computed [`GalleryLayout`]
/// is cached against this key; an unchanged key means an unchanged layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutKey {
    /// Size of the viewport region the gallery is drawn into.
    pub viewport_size: Size,
    /// Number of saved views.
    pub item_count: usize,
    /// Index of the first thumbnail shown.
    pub scroll_offset: usize,
    /// Draw the strip along the top edge instead of the bottom.
    pub flip_to_top: bool,
    /// Height reserved for the button header.
    pub header_height: f64,
    /// Place the button header along the strip's bottom edge instead of
    /// its top edge.
    pub header_at_bottom: bool,
    /// Upper clamp for the thumbnail side.
    pub thumb_size_max: f64,
}

/// What a point over the gallery corresponds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GalleryHit {
    /// A saved-view thumbnail, by absolute view index.
    Thumb(usize),
    /// The reserved save-new-view slot.
    Add,
    /// The regenerate-all-thumbnails header button.
    Refresh,
    /// The reorder-mode header button.
    Reorder,
    /// The close header button.
    Close,
    /// Inside the strip but over no interactive element.
    Background,
    /// Not over the gallery at all.
    Outside,
}

/// Computed strip geometry for one [`LayoutKey`].
#[derive(Clone, Debug)]
pub struct GalleryLayout {
    /// Full strip bounds, header included.
    pub bounds: Rect,
    /// Rects of the visible thumbnails, absolute index plus rect.
    pub thumbs: Vec<(usize, Rect)>,
    /// The save-new-view slot.
    pub add_button: Rect,
    /// Header button: regenerate all thumbnails.
    pub refresh_button: Rect,
    /// Header button: toggle reorder mode.
    pub reorder_button: Rect,
    /// Header button: close the gallery.
    pub close_button: Rect,
    /// Side length of one thumbnail.
    pub thumb_side: f64,
    /// Number of thumbnail slots that fit beside the add slot.
    pub visible_items: usize,
}

impl GalleryLayout {
    /// Lay the strip out for a key. The thumbnail side shrinks with the
    /// item count until it hits the clamp, after which scrolling takes
    /// over; one slot is always reserved for the add button.
    #[must_use]
    pub fn compute(key: &LayoutKey) -> Self {
        let width = key.viewport_size.width;
        let n = key.item_count as f64;
        let raw_side = (width - GALLERY_PADDING * (n + 2.0)) / (n + 1.0);
        let thumb_side = raw_side.clamp(THUMB_SIDE_MIN, key.thumb_size_max);

        let slot = thumb_side + GALLERY_PADDING;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "slot counts are tiny positive integers"
        )]
        let slots = (((width - GALLERY_PADDING) / slot).floor() as usize).max(2);
        let visible_items = slots - 1;
        let shown = visible_items.min(key.item_count.saturating_sub(key.scroll_offset));

        let strip_height = thumb_side + 2.0 * GALLERY_PADDING + key.header_height;
        let y0 = if key.flip_to_top {
            0.0
        } else {
            key.viewport_size.height - strip_height
        };
        let bounds = Rect::new(0.0, y0, width, y0 + strip_height);

        let header_top = if key.header_at_bottom {
            y0 + strip_height - key.header_height
        } else {
            y0
        };
        let row_top = if key.header_at_bottom {
            y0 + GALLERY_PADDING
        } else {
            y0 + key.header_height + GALLERY_PADDING
        };

        let mut thumbs = Vec::with_capacity(shown);
        let mut x = GALLERY_PADDING;
        for offset in 0..shown {
            let rect = Rect::new(x, row_top, x + thumb_side, row_top + thumb_side);
            thumbs.push((key.scroll_offset + offset, rect));
            x += slot;
        }
        let add_button = Rect::new(x, row_top, x + thumb_side, row_top + thumb_side);

        let button_y = header_top + (key.header_height - BUTTON_SIDE) * 0.5;
        let mut button_x = width - GALLERY_PADDING - BUTTON_SIDE;
        let mut button = || {
            let rect = Rect::new(button_x, button_y, button_x + BUTTON_SIDE, button_y + BUTTON_SIDE);
            button_x -= BUTTON_SIDE + GALLERY_PADDING;
            rect
        };
        let close_button = button();
        let reorder_button = button();
        let refresh_button = button();

        Self {
            bounds,
            thumbs,
            add_button,
            refresh_button,
            reorder_button,
            close_button,
            thumb_side,
            visible_items,
        }
    }

    /// Classify a point against the layout.
    #[must_use]
    pub fn hit(&self, point: Point) -> GalleryHit {
        if !self.bounds.contains(point) {
            return GalleryHit::Outside;
        }
        for (index, rect) in &self.thumbs {
            if rect.contains(point) {
                return GalleryHit::Thumb(*index);
            }
        }
        if self.add_button.contains(point) {
            return GalleryHit::Add;
        }
        if self.refresh_button.contains(point) {
            return GalleryHit::Refresh;
        }
        if self.reorder_button.contains(point) {
            return GalleryHit::Reorder;
        }
        if self.close_button.contains(point) {
            return GalleryHit::Close;
        }
        GalleryHit::Background
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(width: f64, items: usize, scroll: usize) -> LayoutKey {
        LayoutKey {
            viewport_size: Size::new(width, 600.0),
            item_count: items,
            scroll_offset: scroll,
            flip_to_top: false,
            header_height: HEADER_HEIGHT,
            header_at_bottom: false,
            thumb_size_max: THUMB_SIDE_MAX,
        }
    }

    #[test]
    fn side_shrinks_with_item_count_until_clamped() {
        let few = GalleryLayout::compute(&key(800.0, 2, 0));
        let many = GalleryLayout::compute(&key(800.0, 30, 0));
        assert!(few.thumb_side > many.thumb_side);
        assert_eq!(many.thumb_side, THUMB_SIDE_MIN);
        let two = GalleryLayout::compute(&key(4000.0, 2, 0));
        assert_eq!(two.thumb_side, THUMB_SIDE_MAX);
    }

    #[test]
    fn add_slot_is_always_reserved() {
        let layout = GalleryLayout::compute(&key(800.0, 30, 0));
        assert!(layout.thumbs.len() <= layout.visible_items);
        let last = layout.thumbs.last().map(|(_, r)| r.x1).unwrap_or(0.0);
        assert!(layout.add_button.x0 >= last);
        assert!(layout.add_button.x1 <= 800.0);
    }

    #[test]
    fn scroll_offsets_visible_indexes() {
        let layout = GalleryLayout::compute(&key(800.0, 30, 7));
        assert_eq!(layout.thumbs.first().map(|(i, _)| *i), Some(7));
    }

    #[test]
    fn strip_sits_on_the_chosen_edge() {
        let bottom = GalleryLayout::compute(&key(800.0, 3, 0));
        assert_eq!(bottom.bounds.y1, 600.0);
        let mut k = key(800.0, 3, 0);
        k.flip_to_top = true;
        let top = GalleryLayout::compute(&k);
        assert_eq!(top.bounds.y0, 0.0);
    }

    #[test]
    fn hits_resolve_thumbs_buttons_and_outside() {
        let layout = GalleryLayout::compute(&key(800.0, 3, 0));
        let (index, rect) = layout.thumbs[1];
        assert_eq!(layout.hit(rect.center()), GalleryHit::Thumb(index));
        assert_eq!(layout.hit(layout.add_button.center()), GalleryHit::Add);
        assert_eq!(layout.hit(layout.close_button.center()), GalleryHit::Close);
        assert_eq!(layout.hit(Point::new(400.0, 10.0)), GalleryHit::Outside);
    }
}
