// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage Gallery: the thumbnail strip overlay.
//!
//! The gallery is a single overlay instance drawn into one *primary*
//! viewport. It owns only interaction state; saved-view data stays in
//! [`vantage_store`] and every user gesture is reported back to the
//! session as a [`GalleryAction`] to execute:
//!
//! ```
//! use kurbo::Size;
//! use vantage_gallery::{GalleryAction, GalleryEvent, GalleryOverlay, PointerButton};
//! use vantage_host::ViewportId;
//!
//! let mut gallery = GalleryOverlay::new(ViewportId(1));
//! gallery.set_item_count(4);
//!
//! let size = Size::new(800.0, 600.0);
//! let first = gallery.layout(size).thumbs[0].1.center();
//! let action = gallery.handle_event(
//!     size,
//!     GalleryEvent::Press { button: PointerButton::Left, position: first },
//! );
//! assert_eq!(action, GalleryAction::LoadView(0));
//! ```
//!
//! Layout is cached against a [`LayoutKey`] and recomputed only when the
//! key changes; the strip shrinks thumbnails as views accumulate and
//! scrolls once the side length hits its clamp, always keeping one slot
//! for the save-new-view button.
//!
//! [`regenerate_all_thumbnails`] is the one heavyweight operation here:
//! it walks every saved view through the live viewport under a critical
//! transaction and restores the starting state afterwards.

mod layout;
mod overlay;
mod regen;

pub use layout::{
    GALLERY_PADDING, GalleryHit, GalleryLayout, HEADER_HEIGHT, LayoutKey, THUMB_SIDE_MAX,
    THUMB_SIDE_MIN,
};
pub use overlay::{GalleryAction, GalleryEvent, GalleryOverlay, PointerButton};
pub use regen::{RegenerateError, RegenerateReport, regenerate_all_thumbnails};
