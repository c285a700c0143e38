// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage Poller: the fixed-tick viewport monitor.
//!
//! [`ViewportMonitor::tick`] runs on a fixed interval (the host timer,
//! typically 100 ms) and drives everything that reacts to the viewport
//! changing *outside* of Vantage's own handlers:
//! - **drift detection**: comparing the sampled pose to the last known
//!   one with the history similarity predicate, and distinguishing real
//!   user movement from restores Vantage itself caused (grace periods,
//!   history-cursor matches);
//! - **settle commits**: once movement stops for the configured delay and
//!   the transaction controller allows it, the pose is recorded into
//!   history;
//! - **ghost views**: movement away from a selected saved view clears the
//!   selection but remembers the view for "update";
//! - **orbit auto-disable**: untracked external movement or a selection
//!   change invalidates orbit's fixed pivot;
//! - **low-frequency maintenance**: duplicate-identity repair when
//!   container counts change, and camera-list resync signaling, on a
//!   shorter cadence while the user is active.
//!
//! A fast path exits the tick without touching the transaction controller
//! when nothing relevant changed; the tick runs continuously, so this is
//! an invariant of the design, not an optimization nicety.

mod monitor;

pub use monitor::{MonitorConfig, TickOutcome, ViewportMonitor};
