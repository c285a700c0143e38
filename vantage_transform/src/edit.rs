// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use glam::{DQuat, DVec3, EulerRot};
use vantage_host::{Host, ViewportId};
use vantage_txn::{TransactionController, UpdateSource};

use crate::state::{DRAG_GRACE, DriveMode, Frame, OrbitAxis, TransformError, TransformState};

/// World axis selector for absolute edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis3 {
    /// X component.
    X,
    /// Y component.
    Y,
    /// Z component.
    Z,
}

impl Axis3 {
    fn set(self, target: &mut DVec3, value: f64) {
        match self {
            Self::X => target.x = value,
            Self::Y => target.y = value,
            Self::Z => target.z = value,
        }
    }
}

/// One interactive edit, routed through the exclusivity rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformEdit {
    /// Absolute world location component.
    Location(Axis3, f64),
    /// Absolute world rotation component (XYZ Euler, radians).
    Rotation(Axis3, f64),
    /// Screen-space pan along the view right vector.
    PanU(f64),
    /// Screen-space pan along the view up vector.
    PanV(f64),
    /// Roll about the view axis; doubles as the orbit roll axis.
    Roll(f64),
    /// Dolly along the view forward vector.
    Zoom(f64),
    /// Orbit pitch about the base-local X axis.
    OrbitPitch(f64),
    /// Orbit yaw about the base-local Y axis.
    OrbitYaw(f64),
    /// Focal length / orthographic lens.
    Lens(f64),
    /// Near clip distance.
    ClipStart(f64),
    /// Far clip distance.
    ClipEnd(f64),
}

/// A relative slider that can be reset to neutral.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelativeAxis {
    /// Pan U.
    PanU,
    /// Pan V.
    PanV,
    /// Roll.
    Roll,
    /// Zoom.
    Zoom,
    /// Orbit pitch.
    OrbitPitch,
    /// Orbit yaw.
    OrbitYaw,
}

impl TransformState {
    /// Apply one interactive edit.
    ///
    /// Returns `Ok(false)` without touching anything when the machine is
    /// uninitialized, the update transaction is refused (contention is
    /// not an error; the edit is abandoned for this tick), or the target
    /// has disappeared.
    pub fn apply_edit(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        txn: &TransactionController,
        edit: TransformEdit,
    ) -> Result<bool, TransformError> {
        if !self.initialized {
            return Ok(false);
        }
        let source = UpdateSource::UserDrag;
        let Some(_guard) = txn.transaction(source, source.default_priority()) else {
            return Ok(false);
        };
        let mode = Self::drive_mode(host, viewport);
        if Self::read_frame(host, viewport, mode).is_none() {
            return Ok(false);
        }
        // A pan edit outside screen-space mode is rejected before the
        // grace period starts; a refused edit changes no pose and must
        // not suppress history recording.
        if matches!(edit, TransformEdit::PanU(_) | TransformEdit::PanV(_))
            && !self.screen_space_enabled
        {
            return Ok(false);
        }
        txn.start_grace_period(DRAG_GRACE, Some(source));

        match edit {
            TransformEdit::Location(axis, value) => {
                self.edit_absolute_location(host, viewport, mode, axis, value)?;
            }
            TransformEdit::Rotation(axis, value) => {
                self.edit_absolute_rotation(host, viewport, mode, axis, value)?;
            }
            TransformEdit::PanU(value) => {
                self.pan_u = value;
                self.edit_pan(host, viewport, mode)?;
            }
            TransformEdit::PanV(value) => {
                self.pan_v = value;
                self.edit_pan(host, viewport, mode)?;
            }
            TransformEdit::Roll(value) => {
                // Roll is shared between screen-space mode and orbit mode.
                if self.orbit_enabled && self.orbit_initialized {
                    self.edit_orbit(host, viewport, mode, OrbitAxis::Roll, value)?;
                } else {
                    self.edit_roll(host, viewport, mode, value)?;
                }
            }
            TransformEdit::Zoom(value) => {
                self.zoom_delta = value;
                self.edit_zoom(host, viewport, mode)?;
            }
            TransformEdit::OrbitPitch(value) => {
                self.edit_orbit(host, viewport, mode, OrbitAxis::Pitch, value)?;
            }
            TransformEdit::OrbitYaw(value) => {
                self.edit_orbit(host, viewport, mode, OrbitAxis::Yaw, value)?;
            }
            TransformEdit::Lens(value) => {
                self.edit_lens(host, viewport, mode, value)?;
            }
            TransformEdit::ClipStart(value) => {
                self.edit_clip(host, viewport, mode, value, true)?;
            }
            TransformEdit::ClipEnd(value) => {
                self.edit_clip(host, viewport, mode, value, false)?;
            }
        }
        Ok(true)
    }

    /// Reset one relative slider to neutral through the normal dispatch
    /// path, so the usual rebasing applies.
    pub fn reset_axis(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        txn: &TransactionController,
        axis: RelativeAxis,
    ) -> Result<bool, TransformError> {
        let edit = match axis {
            RelativeAxis::PanU => TransformEdit::PanU(0.0),
            RelativeAxis::PanV => TransformEdit::PanV(0.0),
            RelativeAxis::Roll => TransformEdit::Roll(0.0),
            RelativeAxis::Zoom => TransformEdit::Zoom(0.0),
            RelativeAxis::OrbitPitch => TransformEdit::OrbitPitch(0.0),
            RelativeAxis::OrbitYaw => TransformEdit::OrbitYaw(0.0),
        };
        self.apply_edit(host, viewport, txn, edit)
    }

    fn edit_absolute_location(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
        axis: Axis3,
        value: f64,
    ) -> Result<(), TransformError> {
        axis.set(&mut self.published_location, value);
        Self::write_position(host, viewport, mode, self.published_location)?;
        self.after_absolute_edit(host, viewport, mode);
        Ok(())
    }

    fn edit_absolute_rotation(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
        axis: Axis3,
        value: f64,
    ) -> Result<(), TransformError> {
        axis.set(&mut self.published_euler, value);
        let e = self.published_euler;
        let rotation = DQuat::from_euler(EulerRot::XYZ, e.x, e.y, e.z);
        Self::write_rotation(host, viewport, mode, rotation)?;
        self.after_absolute_edit(host, viewport, mode);
        Ok(())
    }

    /// Direct edits are incompatible with orbit's fixed pivot and reset
    /// both relative representations to the new pose.
    fn after_absolute_edit(&mut self, host: &dyn Host, viewport: ViewportId, mode: DriveMode) {
        if let Some(frame) = Self::read_frame(host, viewport, mode) {
            self.invalidate_all_relative_state(&frame);
            self.invalidate_orbit_state(&frame, false, true);
            self.sync_published(&frame);
        }
    }

    fn edit_pan(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
    ) -> Result<(), TransformError> {
        let right = self.pan_base_rotation * DVec3::X;
        let up = self.pan_base_rotation * DVec3::Y;
        let position = self.pan_base_position + right * self.pan_u + up * self.pan_v;
        Self::write_position(host, viewport, mode, position)?;
        if let Some(frame) = Self::read_frame(host, viewport, mode) {
            // Keep the zoom slider honest against the moved position.
            self.invalidate_zoom_state(&frame, true);
            self.invalidate_orbit_state(&frame, false, true);
            self.sync_published(&frame);
        }
        Ok(())
    }

    fn edit_roll(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
        value: f64,
    ) -> Result<(), TransformError> {
        self.screen_roll = value;
        let rotation =
            self.pan_base_rotation * DQuat::from_axis_angle(DVec3::Z, self.screen_roll);
        Self::write_rotation(host, viewport, mode, rotation)?;
        if let Some(frame) = Self::read_frame(host, viewport, mode) {
            // Rotating invalidates the screen-space basis pan was
            // computed against; keep the roll base.
            self.invalidate_pan_state(&frame, false, false);
            self.sync_published(&frame);
        }
        Ok(())
    }

    fn edit_zoom(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
    ) -> Result<(), TransformError> {
        let forward = self.pan_base_rotation * DVec3::NEG_Z;
        let position = self.zoom_base_position + forward * self.zoom_delta;
        Self::write_position(host, viewport, mode, position)?;
        if let Some(frame) = Self::read_frame(host, viewport, mode) {
            self.rebase_pan_preserving(&frame);
            // Zoom is orthogonal motion; orbit sliders must not snap.
            self.invalidate_orbit_state(&frame, true, false);
            self.sync_published(&frame);
        }
        Ok(())
    }

    /// Move the pan base so the current slider values reproduce the
    /// current position.
    fn rebase_pan_preserving(&mut self, frame: &Frame) {
        let right = self.pan_base_rotation * DVec3::X;
        let up = self.pan_base_rotation * DVec3::Y;
        self.pan_base_position = frame.position - right * self.pan_u - up * self.pan_v;
    }

    fn edit_orbit(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
        axis: OrbitAxis,
        value: f64,
    ) -> Result<(), TransformError> {
        if !self.orbit_enabled || !self.orbit_initialized {
            return Ok(());
        }
        if self.orbit_active_axis != Some(axis) {
            self.commit_active_orbit_axis();
        }
        match axis {
            OrbitAxis::Pitch => self.orbit_pitch = value,
            OrbitAxis::Yaw => self.orbit_yaw = value,
            OrbitAxis::Roll => self.screen_roll = value,
        }
        self.orbit_active_axis = Some(axis);

        let delta = self.orbit_delta();
        let eye = self.orbit_center + delta * self.orbit_base_offset;
        let rotation = (delta * self.orbit_base_rotation)
            * DQuat::from_axis_angle(DVec3::Z, self.screen_roll);
        Self::write_eye_transform(host, viewport, mode, eye, rotation)?;
        if let Some(frame) = Self::read_frame(host, viewport, mode) {
            self.invalidate_zoom_state(&frame, true);
            self.sync_published(&frame);
        }
        Ok(())
    }

    /// Fold the outgoing axis's rotation into the orbit base and zero all
    /// sliders, so the incoming axis starts from a fresh base.
    fn commit_active_orbit_axis(&mut self) {
        let delta = self.orbit_delta();
        match self.orbit_active_axis {
            Some(OrbitAxis::Pitch | OrbitAxis::Yaw) => {
                self.orbit_base_offset = delta * self.orbit_base_offset;
                self.orbit_base_rotation = delta * self.orbit_base_rotation;
            }
            Some(OrbitAxis::Roll) => {
                self.orbit_base_rotation = self.orbit_base_rotation
                    * DQuat::from_axis_angle(DVec3::Z, self.screen_roll);
            }
            None => {}
        }
        self.orbit_pitch = 0.0;
        self.orbit_yaw = 0.0;
        self.screen_roll = 0.0;
        self.orbit_active_axis = None;
    }

    fn edit_lens(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
        value: f64,
    ) -> Result<(), TransformError> {
        match mode {
            DriveMode::Viewport => {
                if let Some(mut pose) = host.viewport_pose(viewport) {
                    pose.lens = value;
                    host.set_viewport_pose(viewport, &pose)?;
                }
            }
            DriveMode::Camera(camera) => {
                if let Some(mut state) = host.camera_state(camera) {
                    state.lens = value;
                    host.set_camera_state(camera, &state)?;
                }
            }
        }
        Ok(())
    }

    fn edit_clip(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
        value: f64,
        near: bool,
    ) -> Result<(), TransformError> {
        match mode {
            DriveMode::Viewport => {
                if let Some(mut pose) = host.viewport_pose(viewport) {
                    if near {
                        pose.clip_start = value;
                    } else {
                        pose.clip_end = value;
                    }
                    host.set_viewport_pose(viewport, &pose)?;
                }
            }
            DriveMode::Camera(camera) => {
                if let Some(mut state) = host.camera_state(camera) {
                    if near {
                        state.clip_start = value;
                    } else {
                        state.clip_end = value;
                    }
                    host.set_camera_state(camera, &state)?;
                }
            }
        }
        Ok(())
    }
}
