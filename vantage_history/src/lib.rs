// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage History: a bounded ring of recent viewpoints.
//!
//! [`HistoryRing`] stores pose snapshots the way browser history stores
//! pages:
//! - recording while navigated back **discards the abandoned branch**
//!   (everything after the cursor) before appending;
//! - consecutive entries must differ by more than the pose similarity
//!   threshold, otherwise the new snapshot is dropped;
//! - the ring is bounded (default 20 entries) and evicts from the front;
//! - the cursor is distinct from "live": `None` means "at the newest
//!   state, no navigation in progress".
//!
//! The ring itself never touches the viewport or the transaction
//! controller; the caller restores the returned snapshot and tags the
//! restore with a history-navigation grace period so the resulting pose
//! change is not re-recorded.
//!
//! ## Example
//!
//! ```rust
//! use vantage_history::{ForwardStep, HistoryRing};
//! use vantage_pose::ViewPose;
//!
//! let mut history = HistoryRing::new(20);
//! for x in 0..3 {
//!     let mut pose = ViewPose::default();
//!     pose.location.x = f64::from(x);
//!     assert!(history.record(pose));
//! }
//!
//! // Step back from live, then return forward to live.
//! assert!(history.go_back().is_some());
//! assert!(matches!(history.go_forward(), ForwardStep::ReturnedToLive));
//! ```

mod ring;

pub use ring::{DEFAULT_CAPACITY, ForwardStep, HistoryEntry, HistoryRing};
