// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage Pose: viewport pose primitives.
//!
//! This crate provides the small, headless value types the rest of the
//! Vantage workspace reasons about:
//! - [`ViewPose`]: a pivot-based viewport pose (pivot location, rotation,
//!   distance, projection flag, lens, clip range).
//! - Pivot ↔ eye-position conversion.
//! - The similarity predicate used for history deduplication and drift
//!   detection.
//! - Host calibration constants for converting between a viewport lens
//!   value and an orthographic scale, and between field of view and focal
//!   length.
//!
//! It does **not** own any viewport or camera object. Callers read a pose
//! from the host, manipulate it here, and write it back.
//!
//! ## Example
//!
//! ```rust
//! use glam::{DQuat, DVec3};
//! use vantage_pose::ViewPose;
//!
//! let pose = ViewPose {
//!     location: DVec3::ZERO,
//!     rotation: DQuat::IDENTITY,
//!     distance: 10.0,
//!     ..ViewPose::default()
//! };
//!
//! // The eye sits behind the pivot along the rotated +Z axis.
//! let eye = pose.eye_position();
//! assert!((eye - DVec3::new(0.0, 0.0, 10.0)).length() < 1e-12);
//!
//! // A nudge below the positional threshold is still "similar".
//! let mut nudged = pose;
//! nudged.location.x += 1e-3;
//! assert!(pose.is_similar_to(&nudged));
//! ```

mod pose;

pub use pose::{
    CAMERA_SENSOR_WIDTH, DISTANCE_EPSILON, LENS_EPSILON, POSITION_EPSILON_SQ, ROTATION_DOT_MIN,
    VIEWPORT_SENSOR_WIDTH, ViewPose,
};
