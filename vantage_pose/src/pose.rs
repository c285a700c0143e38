// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use glam::{DQuat, DVec3};

/// Squared positional distance below which two poses count as the same.
pub const POSITION_EPSILON_SQ: f64 = 1e-4;

/// Minimum absolute quaternion dot product for two rotations to count as
/// the same orientation.
pub const ROTATION_DOT_MIN: f64 = 0.9999;

/// Pivot-distance delta below which two poses count as the same.
pub const DISTANCE_EPSILON: f64 = 1e-4;

/// Lens delta below which two poses count as the same. Coarser than the
/// positional thresholds because lens edits are chunky slider moves.
pub const LENS_EPSILON: f64 = 0.1;

/// Sensor width (mm) the host viewport assumes when relating a lens value
/// to an orthographic scale. Host-specific calibration; a different host
/// needs its own constant.
pub const VIEWPORT_SENSOR_WIDTH: f64 = 72.0;

/// Sensor width (mm) the host camera model assumes when converting between
/// field of view and focal length.
pub const CAMERA_SENSOR_WIDTH: f64 = 36.0;

/// A pivot-based viewport pose.
///
/// `location` is the point the viewport orbits around, not the eye. The
/// eye position is derived: the camera sits `distance` units behind the
/// pivot along the rotated local +Z axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewPose {
    /// Pivot point the view orbits around.
    pub location: DVec3,
    /// View orientation (unit quaternion).
    pub rotation: DQuat,
    /// Distance from the pivot to the eye.
    pub distance: f64,
    /// Perspective (true) or orthographic (false) projection.
    pub perspective: bool,
    /// Focal length in perspective mode; reinterpreted via
    /// [`VIEWPORT_SENSOR_WIDTH`] for orthographic scale.
    pub lens: f64,
    /// Near clip distance.
    pub clip_start: f64,
    /// Far clip distance.
    pub clip_end: f64,
}

impl Default for ViewPose {
    fn default() -> Self {
        Self {
            location: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            distance: 10.0,
            perspective: true,
            lens: 50.0,
            clip_start: 0.1,
            clip_end: 1000.0,
        }
    }
}

impl ViewPose {
    /// The eye position implied by this pose.
    #[must_use]
    pub fn eye_position(&self) -> DVec3 {
        self.location + (self.rotation * DVec3::Z) * self.distance
    }

    /// The pivot location that places the eye at `eye` for the given
    /// rotation and distance.
    #[must_use]
    pub fn location_for_eye(eye: DVec3, rotation: DQuat, distance: f64) -> DVec3 {
        eye - (rotation * DVec3::Z) * distance
    }

    /// View-space right vector (local +X) in world space.
    #[must_use]
    pub fn right(&self) -> DVec3 {
        self.rotation * DVec3::X
    }

    /// View-space up vector (local +Y) in world space.
    #[must_use]
    pub fn up(&self) -> DVec3 {
        self.rotation * DVec3::Y
    }

    /// Viewing direction (local −Z) in world space.
    #[must_use]
    pub fn forward(&self) -> DVec3 {
        self.rotation * DVec3::NEG_Z
    }

    /// Orthographic scale equivalent to this pose's distance and lens.
    #[must_use]
    pub fn ortho_scale(&self) -> f64 {
        self.distance * (VIEWPORT_SENSOR_WIDTH / self.lens)
    }

    /// Pivot distance that reproduces `scale` at the given lens.
    #[must_use]
    pub fn distance_for_ortho_scale(scale: f64, lens: f64) -> f64 {
        scale * (lens / VIEWPORT_SENSOR_WIDTH)
    }

    /// Focal length for a full horizontal field of view, per
    /// [`CAMERA_SENSOR_WIDTH`].
    #[must_use]
    pub fn focal_for_fov(fov: f64) -> f64 {
        CAMERA_SENSOR_WIDTH / (2.0 * (fov / 2.0).tan())
    }

    /// Full horizontal field of view for a focal length, per
    /// [`CAMERA_SENSOR_WIDTH`].
    #[must_use]
    pub fn fov_for_focal(focal: f64) -> f64 {
        2.0 * (CAMERA_SENSOR_WIDTH / (2.0 * focal)).atan()
    }

    /// Whether two poses are close enough to count as the same viewpoint.
    ///
    /// Used for history deduplication and drift detection. Two poses
    /// differ when any of position, orientation, distance, projection
    /// kind, or lens exceeds its threshold.
    #[must_use]
    pub fn is_similar_to(&self, other: &Self) -> bool {
        if (self.location - other.location).length_squared() > POSITION_EPSILON_SQ {
            return false;
        }
        if self.rotation.dot(other.rotation).abs() < ROTATION_DOT_MIN {
            return false;
        }
        if (self.distance - other.distance).abs() > DISTANCE_EPSILON {
            return false;
        }
        if self.perspective != other.perspective {
            return false;
        }
        if (self.lens - other.lens).abs() > LENS_EPSILON {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_near(a: DVec3, b: DVec3) {
        assert!((a - b).length() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn eye_round_trip() {
        let rotation = DQuat::from_axis_angle(DVec3::X, 0.7);
        let pose = ViewPose {
            location: DVec3::new(1.0, -2.0, 3.0),
            rotation,
            distance: 8.5,
            ..ViewPose::default()
        };
        let eye = pose.eye_position();
        let pivot = ViewPose::location_for_eye(eye, rotation, 8.5);
        assert_vec_near(pivot, pose.location);
    }

    #[test]
    fn eye_sits_behind_pivot() {
        let pose = ViewPose {
            distance: 10.0,
            ..ViewPose::default()
        };
        assert_vec_near(pose.eye_position(), DVec3::new(0.0, 0.0, 10.0));
        assert_vec_near(pose.forward(), DVec3::NEG_Z);
    }

    #[test]
    fn basis_vectors_follow_rotation() {
        let rotation = DQuat::from_axis_angle(DVec3::Z, core::f64::consts::FRAC_PI_2);
        let pose = ViewPose {
            rotation,
            ..ViewPose::default()
        };
        assert_vec_near(pose.right(), DVec3::Y);
        assert_vec_near(pose.up(), DVec3::NEG_X);
    }

    #[test]
    fn ortho_scale_round_trip() {
        let pose = ViewPose {
            distance: 12.0,
            lens: 50.0,
            ..ViewPose::default()
        };
        let scale = pose.ortho_scale();
        let distance = ViewPose::distance_for_ortho_scale(scale, 50.0);
        assert!((distance - 12.0).abs() < 1e-9, "distance {distance}");
    }

    #[test]
    fn fov_focal_round_trip() {
        let focal = 50.0;
        let fov = ViewPose::fov_for_focal(focal);
        let back = ViewPose::focal_for_fov(fov);
        assert!((back - focal).abs() < 1e-9, "focal {back}");
    }

    #[test]
    fn similarity_thresholds() {
        let base = ViewPose::default();

        let mut near = base;
        near.location.x += 0.005;
        assert!(base.is_similar_to(&near));

        let mut far = base;
        far.location.x += 0.02;
        assert!(!base.is_similar_to(&far));

        let mut turned = base;
        turned.rotation = DQuat::from_axis_angle(DVec3::Y, 0.1);
        assert!(!base.is_similar_to(&turned));

        let mut flat = base;
        flat.perspective = false;
        assert!(!base.is_similar_to(&flat));

        let mut lensed = base;
        lensed.lens += 0.5;
        assert!(!base.is_similar_to(&lensed));

        let mut lens_noise = base;
        lens_noise.lens += 0.05;
        assert!(base.is_similar_to(&lens_noise));
    }

    #[test]
    fn negated_quaternion_is_same_orientation() {
        let base = ViewPose::default();
        let mut flipped = base;
        flipped.rotation = DQuat::from_xyzw(
            -base.rotation.x,
            -base.rotation.y,
            -base.rotation.z,
            -base.rotation.w,
        );
        assert!(base.is_similar_to(&flipped));
    }
}
