// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage Transform: the interactive transform state machine.
//!
//! Four representations of the same underlying viewport/camera pose must
//! stay consistent while remaining individually editable:
//! - absolute world location and rotation,
//! - screen-space pan (U/V) and roll,
//! - zoom/dolly along the view axis,
//! - selection-orbit trackball (pitch/yaw, sharing the roll axis).
//!
//! Every edit funnels through [`TransformState::apply_edit`], which
//! acquires the update transaction, branches on camera-object vs viewport
//! drive mode, applies the edit, and then **rebases** or resets the other
//! representations so their displayed slider values still reproduce the
//! new absolute pose. The rules:
//!
//! | edit | pan | zoom | orbit |
//! |---|---|---|---|
//! | absolute | reset | reset | disabled |
//! | pan | drives | rebased | disabled |
//! | roll | offsets reset | — | may be the orbit roll axis |
//! | zoom | rebased | drives | rebased, sliders preserved |
//! | orbit | — | rebased, sliders preserved | drives |
//!
//! Orbit activation is two-phase: [`TransformState::enable_orbit`]
//! captures the pivot and (in viewport mode) requests the host's
//! asynchronous selection framing; the caller polls
//! [`TransformState::poll_orbit_init`] each tick until the base offset
//! and rotation are derived from the settled pose.

mod edit;
mod state;

pub use edit::{Axis3, RelativeAxis, TransformEdit};
pub use state::{TransformError, TransformState};
