// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage Store: the persisted saved-view document.
//!
//! Saved views live in a single JSON document embedded as a named text
//! blob in the host document (so they survive save/reload without any
//! side files). This crate provides:
//! - [`ViewRecord`]: a typed record with explicit optional display-style
//!   fields, per-field defaults applied at the deserialization boundary,
//!   and verbatim preservation of unknown keys;
//! - [`ViewStore`]: CRUD, reorder, and the monotonic naming counter, each
//!   implemented as whole-document load → mutate → save;
//! - corruption handling: an unparsable blob degrades reads to an empty
//!   document while mutations surface [`StorageError::Corrupted`] until
//!   the caller performs the explicit destructive recovery;
//! - mirror sync for UI-widget compatibility, with a re-entrancy flag
//!   suppressing per-field write-back storms during mass resync;
//! - one-shot migration from the legacy per-scene record format.
//!
//! The store is the single source of truth; [`ViewMirror`] collections
//! are derived, rebuildable caches.

mod document;
mod mirror;
mod record;
mod selection;
mod store;

pub use document::{DATA_BLOCK_NAME, SCHEMA_VERSION, StoreDocument};
pub use mirror::{MirrorEntry, ViewMirror};
pub use record::{RecordField, ViewRecord};
pub use selection::ViewSelection;
pub use store::{StorageError, ViewStore};
