// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use glam::{DQuat, DVec3, EulerRot};
use thiserror::Error;
use tracing::debug;
use vantage_host::{CameraId, FrameRequest, Host, HostError, ViewportId};
use vantage_txn::TransactionController;

/// Grace period started by every interactive edit.
pub(crate) const DRAG_GRACE: Duration = Duration::from_millis(200);

/// Grace period covering the orbit-toggle framing animation.
const ORBIT_TOGGLE_GRACE: Duration = Duration::from_millis(500);

/// Zoom deltas below this are treated as neutral.
pub(crate) const ZOOM_EPSILON: f64 = 1e-3;

/// Orbit pivot placed this far ahead of the camera when nothing is
/// selected in camera mode.
const CAMERA_PIVOT_AHEAD: f64 = 10.0;

/// Errors from pushing state into the host.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The host rejected a write.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// What the transform handlers are currently driving. Checked on every
/// handler entry, never cached, since the user can enter or leave camera
/// view externally at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DriveMode {
    /// The viewport's own pivot/distance/rotation fields.
    Viewport,
    /// The active camera object's transform.
    Camera(CameraId),
}

/// Snapshot of the driven transform in a mode-independent shape.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame {
    /// The controlled position: viewport pivot or camera eye.
    pub(crate) position: DVec3,
    /// Current orientation.
    pub(crate) rotation: DQuat,
    /// Eye position (equals `position` in camera mode).
    pub(crate) eye: DVec3,
}

/// Which orbit slider is currently non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OrbitAxis {
    Pitch,
    Yaw,
    Roll,
}

#[derive(Clone, Copy, Debug)]
struct PendingOrbitInit {
    request: Option<FrameRequest>,
}

/// The transform state machine: published absolute fields plus the
/// hidden bases of the relative representations.
#[derive(Debug)]
pub struct TransformState {
    pub(crate) initialized: bool,
    reinitializing: bool,

    // Published absolute fields.
    pub(crate) published_location: DVec3,
    pub(crate) published_euler: DVec3,

    // Screen-space pan/roll, relative to a hidden base.
    pub(crate) screen_space_enabled: bool,
    pub(crate) pan_base_position: DVec3,
    pub(crate) pan_base_rotation: DQuat,
    pub(crate) pan_u: f64,
    pub(crate) pan_v: f64,
    pub(crate) screen_roll: f64,

    // Zoom/dolly.
    pub(crate) zoom_base_position: DVec3,
    pub(crate) zoom_delta: f64,

    // Selection orbit.
    pub(crate) orbit_enabled: bool,
    pub(crate) orbit_initialized: bool,
    pub(crate) orbit_center: DVec3,
    pub(crate) orbit_base_offset: DVec3,
    pub(crate) orbit_base_rotation: DQuat,
    pub(crate) orbit_pitch: f64,
    pub(crate) orbit_yaw: f64,
    pub(crate) orbit_active_axis: Option<OrbitAxis>,
    pending_orbit: Option<PendingOrbitInit>,
}

impl Default for TransformState {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformState {
    /// An uninitialized state machine; edits no-op until
    /// [`Self::reinitialize_from`] seeds it from a live pose.
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: false,
            reinitializing: false,
            published_location: DVec3::ZERO,
            published_euler: DVec3::ZERO,
            screen_space_enabled: false,
            pan_base_position: DVec3::ZERO,
            pan_base_rotation: DQuat::IDENTITY,
            pan_u: 0.0,
            pan_v: 0.0,
            screen_roll: 0.0,
            zoom_base_position: DVec3::ZERO,
            zoom_delta: 0.0,
            orbit_enabled: false,
            orbit_initialized: false,
            orbit_center: DVec3::ZERO,
            orbit_base_offset: DVec3::ZERO,
            orbit_base_rotation: DQuat::IDENTITY,
            orbit_pitch: 0.0,
            orbit_yaw: 0.0,
            orbit_active_axis: None,
            pending_orbit: None,
        }
    }

    /// Whether the machine has been seeded from a live pose.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Published absolute location.
    #[must_use]
    pub fn location(&self) -> DVec3 {
        self.published_location
    }

    /// Published absolute rotation as XYZ Euler angles.
    #[must_use]
    pub fn rotation_euler(&self) -> DVec3 {
        self.published_euler
    }

    /// Current pan slider values (U, V).
    #[must_use]
    pub fn pan(&self) -> (f64, f64) {
        (self.pan_u, self.pan_v)
    }

    /// Current roll slider value.
    #[must_use]
    pub fn screen_roll(&self) -> f64 {
        self.screen_roll
    }

    /// Current zoom slider value.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom_delta
    }

    /// Whether screen-space pan mode is on.
    #[must_use]
    pub fn screen_space_enabled(&self) -> bool {
        self.screen_space_enabled
    }

    /// Whether orbit mode is on.
    #[must_use]
    pub fn orbit_enabled(&self) -> bool {
        self.orbit_enabled
    }

    /// Whether orbit mode has finished its deferred initialization.
    #[must_use]
    pub fn orbit_initialized(&self) -> bool {
        self.orbit_initialized
    }

    /// Current orbit slider values (pitch, yaw).
    #[must_use]
    pub fn orbit_angles(&self) -> (f64, f64) {
        (self.orbit_pitch, self.orbit_yaw)
    }

    /// The fixed orbit pivot.
    #[must_use]
    pub fn orbit_center(&self) -> DVec3 {
        self.orbit_center
    }

    /// Whether an orbit activation is waiting for the host framing to
    /// settle.
    #[must_use]
    pub fn has_pending_orbit_init(&self) -> bool {
        self.pending_orbit.is_some()
    }

    pub(crate) fn drive_mode(host: &dyn Host, viewport: ViewportId) -> DriveMode {
        if host.viewport_in_camera_view(viewport)
            && let Some(camera) = host.active_camera()
        {
            return DriveMode::Camera(camera);
        }
        DriveMode::Viewport
    }

    pub(crate) fn read_frame(
        host: &dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
    ) -> Option<Frame> {
        match mode {
            DriveMode::Viewport => {
                let pose = host.viewport_pose(viewport)?;
                Some(Frame {
                    position: pose.location,
                    rotation: pose.rotation,
                    eye: pose.eye_position(),
                })
            }
            DriveMode::Camera(camera) => {
                let state = host.camera_state(camera)?;
                Some(Frame {
                    position: state.location,
                    rotation: state.rotation,
                    eye: state.location,
                })
            }
        }
    }

    /// Write a new position, keeping the current rotation.
    pub(crate) fn write_position(
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
        position: DVec3,
    ) -> Result<(), TransformError> {
        match mode {
            DriveMode::Viewport => {
                if let Some(mut pose) = host.viewport_pose(viewport) {
                    pose.location = position;
                    host.set_viewport_pose(viewport, &pose)?;
                }
            }
            DriveMode::Camera(camera) => {
                if let Some(mut state) = host.camera_state(camera) {
                    state.location = position;
                    host.set_camera_state(camera, &state)?;
                }
            }
        }
        Ok(())
    }

    /// Write a new rotation, keeping the current position.
    pub(crate) fn write_rotation(
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
        rotation: DQuat,
    ) -> Result<(), TransformError> {
        match mode {
            DriveMode::Viewport => {
                if let Some(mut pose) = host.viewport_pose(viewport) {
                    pose.rotation = rotation;
                    host.set_viewport_pose(viewport, &pose)?;
                }
            }
            DriveMode::Camera(camera) => {
                if let Some(mut state) = host.camera_state(camera) {
                    state.rotation = rotation;
                    host.set_camera_state(camera, &state)?;
                }
            }
        }
        Ok(())
    }

    /// Write an eye position and rotation together. In viewport mode the
    /// eye is converted back to a pivot at the current distance.
    pub(crate) fn write_eye_transform(
        host: &mut dyn Host,
        viewport: ViewportId,
        mode: DriveMode,
        eye: DVec3,
        rotation: DQuat,
    ) -> Result<(), TransformError> {
        match mode {
            DriveMode::Viewport => {
                if let Some(mut pose) = host.viewport_pose(viewport) {
                    pose.location = vantage_pose::ViewPose::location_for_eye(
                        eye,
                        rotation,
                        pose.distance,
                    );
                    pose.rotation = rotation;
                    host.set_viewport_pose(viewport, &pose)?;
                }
            }
            DriveMode::Camera(camera) => {
                if let Some(mut state) = host.camera_state(camera) {
                    state.location = eye;
                    state.rotation = rotation;
                    host.set_camera_state(camera, &state)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn sync_published(&mut self, frame: &Frame) {
        self.published_location = frame.position;
        let (x, y, z) = frame.rotation.to_euler(EulerRot::XYZ);
        self.published_euler = DVec3::new(x, y, z);
    }

    /// Reset pan offsets against a new base. `reset_rotation` also
    /// rebases the roll axis; `disable_mode` additionally turns
    /// screen-space mode off.
    pub(crate) fn invalidate_pan_state(
        &mut self,
        frame: &Frame,
        reset_rotation: bool,
        disable_mode: bool,
    ) {
        self.pan_base_position = frame.position;
        self.pan_u = 0.0;
        self.pan_v = 0.0;
        if reset_rotation {
            self.pan_base_rotation = frame.rotation;
            self.screen_roll = 0.0;
        }
        if disable_mode {
            self.screen_space_enabled = false;
        }
    }

    /// Rebase zoom so the displayed slider value reproduces the current
    /// position. Without `preserve` the slider snaps to zero.
    pub(crate) fn invalidate_zoom_state(&mut self, frame: &Frame, preserve: bool) {
        if preserve && self.zoom_delta.abs() > ZOOM_EPSILON {
            let forward = self.pan_base_rotation * DVec3::NEG_Z;
            self.zoom_base_position = frame.position - forward * self.zoom_delta;
        } else {
            self.zoom_base_position = frame.position;
            self.zoom_delta = 0.0;
        }
    }

    /// Rebase or reset the orbit representation against the current
    /// frame. With `preserve`, the hidden base is back-solved so the
    /// current slider values still yield the current pose; otherwise the
    /// sliders reset and the base is taken directly from the frame.
    pub(crate) fn invalidate_orbit_state(&mut self, frame: &Frame, preserve: bool, disable: bool) {
        if disable {
            self.disable_orbit();
            return;
        }
        if !self.orbit_enabled || !self.orbit_initialized {
            return;
        }
        if preserve {
            let delta = self.orbit_delta();
            let roll = DQuat::from_axis_angle(DVec3::Z, self.screen_roll);
            let inverse = delta.inverse();
            self.orbit_base_offset = inverse * (frame.eye - self.orbit_center);
            self.orbit_base_rotation = inverse * (frame.rotation * roll.inverse());
        } else {
            self.orbit_pitch = 0.0;
            self.orbit_yaw = 0.0;
            self.orbit_active_axis = None;
            self.orbit_base_offset = frame.eye - self.orbit_center;
            self.orbit_base_rotation = frame.rotation;
        }
    }

    /// Reset every relative representation to neutral against the frame.
    pub(crate) fn invalidate_all_relative_state(&mut self, frame: &Frame) {
        self.invalidate_pan_state(frame, true, false);
        self.invalidate_zoom_state(frame, false);
    }

    /// The rotation currently applied by the active orbit axis.
    pub(crate) fn orbit_delta(&self) -> DQuat {
        match self.orbit_active_axis {
            Some(OrbitAxis::Pitch) if self.orbit_pitch != 0.0 => {
                let axis = self.orbit_base_rotation * DVec3::X;
                DQuat::from_axis_angle(axis, -self.orbit_pitch)
            }
            Some(OrbitAxis::Yaw) if self.orbit_yaw != 0.0 => {
                let axis = self.orbit_base_rotation * DVec3::Y;
                DQuat::from_axis_angle(axis, -self.orbit_yaw)
            }
            _ => DQuat::IDENTITY,
        }
    }

    /// Seed all published fields and hidden bases from the live pose.
    ///
    /// Used after initialization, view restores, history navigation, and
    /// externally detected movement. Re-entrant calls short-circuit.
    pub fn reinitialize_from(&mut self, host: &dyn Host, viewport: ViewportId) -> bool {
        if self.reinitializing {
            return false;
        }
        self.reinitializing = true;
        let mode = Self::drive_mode(host, viewport);
        let Some(frame) = Self::read_frame(host, viewport, mode) else {
            self.reinitializing = false;
            return false;
        };
        self.sync_published(&frame);
        self.invalidate_all_relative_state(&frame);
        if self.orbit_enabled && self.orbit_initialized {
            // Restore paths keep orbit mode on but zero the sliders and
            // rebuild the base from the restored pose.
            self.invalidate_orbit_state(&frame, false, false);
        }
        self.initialized = true;
        self.reinitializing = false;
        true
    }

    /// Turn orbit mode on: capture the pivot and start the deferred base
    /// derivation. In viewport mode with a selection this requests the
    /// host's asynchronous framing; completion is driven by
    /// [`Self::poll_orbit_init`].
    pub fn enable_orbit(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        txn: &TransactionController,
    ) -> Result<(), TransformError> {
        let mode = Self::drive_mode(host, viewport);
        let Some(frame) = Self::read_frame(host, viewport, mode) else {
            return Ok(());
        };
        let center = match host.selection_bounds() {
            Some((min, max)) => (min + max) * 0.5,
            None => match mode {
                DriveMode::Camera(_) => frame.eye + (frame.rotation * DVec3::NEG_Z) * CAMERA_PIVOT_AHEAD,
                DriveMode::Viewport => DVec3::ZERO,
            },
        };

        txn.start_grace_period(ORBIT_TOGGLE_GRACE, None);
        self.orbit_enabled = true;
        self.orbit_initialized = false;
        self.orbit_center = center;
        self.orbit_pitch = 0.0;
        self.orbit_yaw = 0.0;
        self.orbit_active_axis = None;

        let request = if mode == DriveMode::Viewport && host.selection_bounds().is_some() {
            Some(host.request_frame_selection(viewport)?)
        } else {
            None
        };
        self.pending_orbit = Some(PendingOrbitInit { request });
        debug!(?center, "orbit mode enabled, awaiting base derivation");
        Ok(())
    }

    /// Drive a pending orbit initialization forward. Returns true when
    /// orbit is fully initialized (or nothing was pending).
    pub fn poll_orbit_init(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
    ) -> Result<bool, TransformError> {
        let Some(pending) = self.pending_orbit else {
            return Ok(true);
        };
        if !self.orbit_enabled {
            self.pending_orbit = None;
            return Ok(true);
        }
        if let Some(request) = pending.request
            && !host.poll_frame(&request)
        {
            return Ok(false);
        }
        let mode = Self::drive_mode(host, viewport);
        let Some(frame) = Self::read_frame(host, viewport, mode) else {
            self.pending_orbit = None;
            return Ok(true);
        };
        self.orbit_base_offset = frame.eye - self.orbit_center;
        self.orbit_base_rotation = frame.rotation;
        self.orbit_initialized = true;
        self.pending_orbit = None;
        // Pan is incompatible with the fixed pivot; zoom stays, rebased.
        self.invalidate_pan_state(&frame, true, true);
        self.invalidate_zoom_state(&frame, true);
        self.sync_published(&frame);
        debug!("orbit base derived");
        Ok(true)
    }

    /// Turn orbit mode off. The absolute pose is left untouched.
    pub fn disable_orbit(&mut self) {
        self.orbit_enabled = false;
        self.orbit_initialized = false;
        self.orbit_pitch = 0.0;
        self.orbit_yaw = 0.0;
        self.orbit_active_axis = None;
        self.pending_orbit = None;
    }

    /// Toggle screen-space pan mode, seeding the base from the live pose
    /// on enable. Returns the new state.
    pub fn toggle_screen_space(&mut self, host: &dyn Host, viewport: ViewportId) -> bool {
        self.screen_space_enabled = !self.screen_space_enabled;
        if self.screen_space_enabled {
            let mode = Self::drive_mode(host, viewport);
            if let Some(frame) = Self::read_frame(host, viewport, mode) {
                self.invalidate_pan_state(&frame, true, false);
            }
        } else {
            self.pan_u = 0.0;
            self.pan_v = 0.0;
            self.screen_roll = 0.0;
        }
        self.screen_space_enabled
    }

    /// Forget initialization, e.g. when the tracked viewport disappears.
    pub fn mark_uninitialized(&mut self) {
        self.initialized = false;
    }
}
