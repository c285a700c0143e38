// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use glam::{DQuat, DVec3};
use serde_json::{Map, Value};
use thiserror::Error;
use vantage_pose::ViewPose;

use crate::ids::{CameraId, LayerId, SceneId, ThumbnailId, ViewportId};

/// Errors reported by host operations.
#[derive(Debug, Error)]
pub enum HostError {
    /// The referenced object no longer exists.
    #[error("host object not found")]
    NotFound,
    /// The target is linked/read-only and cannot be written.
    #[error("host object is read-only")]
    ReadOnly,
    /// The host refused or failed the operation.
    #[error("host operation failed: {0}")]
    Failed(String),
}

/// Whether a container is locally editable or referenced from a library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerOrigin {
    /// Locally owned; custom attributes can be written.
    Editable,
    /// Linked from an external file without a local override. Attribute
    /// writes are not possible; identity falls back to the origin path.
    Linked {
        /// Normalized path of the library file the container came from.
        path: String,
    },
}

impl ContainerOrigin {
    /// True when custom attributes can be written to the container.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Editable)
    }
}

/// Snapshot of a live viewport's state.
#[derive(Clone, Debug)]
pub struct ViewportState {
    /// Current pivot-based pose.
    pub pose: ViewPose,
    /// Whether the viewport is locked to the active camera object.
    pub camera_view: bool,
    /// Flat shading/overlay style bag keyed by field name.
    pub style: Map<String, Value>,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            pose: ViewPose::default(),
            camera_view: false,
            style: Map::new(),
        }
    }
}

/// Snapshot of a camera object's transform and optics.
#[derive(Clone, Copy, Debug)]
pub struct CameraState {
    /// World-space eye position of the camera object.
    pub location: DVec3,
    /// World-space orientation of the camera object.
    pub rotation: DQuat,
    /// Focal length in perspective mode.
    pub lens: f64,
    /// Orthographic scale when `orthographic` is set.
    pub ortho_scale: f64,
    /// Whether the camera projects orthographically.
    pub orthographic: bool,
    /// Near clip distance.
    pub clip_start: f64,
    /// Far clip distance.
    pub clip_end: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            location: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            lens: 50.0,
            ortho_scale: 7.0,
            orthographic: false,
            clip_start: 0.1,
            clip_end: 1000.0,
        }
    }
}

/// Handle for an in-flight "frame selection" request.
///
/// Framing is animated by the host over an unspecified number of ticks.
/// The requester keeps the handle and calls [`Host::poll_frame`] until it
/// reports completion before reading the resulting viewport pose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRequest {
    /// Viewport the framing was requested in.
    pub viewport: ViewportId,
    /// Host-assigned request token.
    pub token: u64,
}

/// Capabilities Vantage requires from the surrounding 3D editor.
///
/// All methods are cheap, synchronous state access; the one asynchronous
/// operation (selection framing) is modeled as a request handle that is
/// polled to completion. Read accessors return `None` when the referenced
/// object has disappeared; callers treat that as a recoverable miss, not
/// an error.
pub trait Host {
    // --- Viewports ---

    /// All open 3D viewport areas, in host window order.
    fn viewports(&self) -> Vec<ViewportId>;

    /// The viewport that last had input focus, if any.
    fn focused_viewport(&self) -> Option<ViewportId>;

    /// Current pose of a viewport.
    fn viewport_pose(&self, viewport: ViewportId) -> Option<ViewPose>;

    /// Push a pose into a viewport.
    fn set_viewport_pose(&mut self, viewport: ViewportId, pose: &ViewPose)
    -> Result<(), HostError>;

    /// Whether the viewport is locked to the active camera object.
    fn viewport_in_camera_view(&self, viewport: ViewportId) -> bool;

    /// Enter or leave camera view in a viewport.
    fn set_viewport_camera_view(
        &mut self,
        viewport: ViewportId,
        enabled: bool,
    ) -> Result<(), HostError>;

    /// Full state snapshot of a viewport (pose + camera flag + style bag).
    fn viewport_state(&self, viewport: ViewportId) -> Option<ViewportState>;

    /// Write one shading/overlay style field of a viewport.
    fn set_viewport_style_field(
        &mut self,
        viewport: ViewportId,
        key: &str,
        value: Value,
    ) -> Result<(), HostError>;

    // --- Camera objects ---

    /// All camera objects in the current scene.
    fn cameras(&self) -> Vec<CameraId>;

    /// Human-readable name of a camera object.
    fn camera_name(&self, camera: CameraId) -> Option<String>;

    /// Transform and optics of a camera object.
    fn camera_state(&self, camera: CameraId) -> Option<CameraState>;

    /// Write transform and optics of a camera object.
    fn set_camera_state(&mut self, camera: CameraId, state: &CameraState)
    -> Result<(), HostError>;

    /// The scene's active camera object, if any.
    fn active_camera(&self) -> Option<CameraId>;

    /// Make a camera object the scene's active camera.
    fn set_active_camera(&mut self, camera: CameraId) -> Result<(), HostError>;

    /// Whether the camera object is also the focused/active object in the
    /// editor (used by the keep-camera-active convenience mode).
    fn camera_is_focused_object(&self, camera: CameraId) -> bool;

    // --- Scenes and view layers ---

    /// All scene containers in the host document.
    fn scenes(&self) -> Vec<SceneId>;

    /// Human-readable name of a scene.
    fn scene_name(&self, scene: SceneId) -> Option<String>;

    /// Origin/writability of a scene.
    fn scene_origin(&self, scene: SceneId) -> Option<ContainerOrigin>;

    /// Read a custom string attribute of a scene.
    fn scene_attr(&self, scene: SceneId, key: &str) -> Option<String>;

    /// Write a custom string attribute of a scene.
    fn set_scene_attr(&mut self, scene: SceneId, key: &str, value: &str)
    -> Result<(), HostError>;

    /// View layers owned by a scene, in host order.
    fn layers(&self, scene: SceneId) -> Vec<LayerId>;

    /// Human-readable name of a view layer.
    fn layer_name(&self, layer: LayerId) -> Option<String>;

    /// Read a custom string attribute of a view layer.
    fn layer_attr(&self, layer: LayerId, key: &str) -> Option<String>;

    /// Write a custom string attribute of a view layer.
    fn set_layer_attr(&mut self, layer: LayerId, key: &str, value: &str)
    -> Result<(), HostError>;

    /// The currently displayed scene.
    fn current_scene(&self) -> SceneId;

    /// Switch the displayed scene.
    fn set_current_scene(&mut self, scene: SceneId) -> Result<(), HostError>;

    /// The currently displayed view layer.
    fn current_layer(&self) -> LayerId;

    /// Switch the displayed view layer (must belong to the current scene).
    fn set_current_layer(&mut self, layer: LayerId) -> Result<(), HostError>;

    // --- Selection ---

    /// Axis-aligned bounds of the focusable selected geometry, if any.
    fn selection_bounds(&self) -> Option<(DVec3, DVec3)>;

    /// Order-independent hash of the selected object set. Changes whenever
    /// the selection changes; exact value is host-defined.
    fn selection_fingerprint(&self) -> u64;

    // --- Persistence ---

    /// Read an embedded named text blob, if present.
    fn read_data_blob(&self, name: &str) -> Option<String>;

    /// Create or overwrite an embedded named text blob.
    fn write_data_blob(&mut self, name: &str, contents: &str) -> Result<(), HostError>;

    /// Records stored by the legacy per-scene format, as raw JSON objects.
    /// Empty once migration has run.
    fn legacy_view_payloads(&self) -> Vec<Value>;

    /// Drop all legacy per-scene records after migration.
    fn clear_legacy_views(&mut self);

    // --- Thumbnails ---

    /// Render a thumbnail of the viewport's current state, returning an
    /// opaque handle owned by the host.
    fn render_thumbnail(&mut self, viewport: ViewportId) -> Result<ThumbnailId, HostError>;

    /// Release a previously rendered thumbnail.
    fn discard_thumbnail(&mut self, thumbnail: ThumbnailId);

    // --- Framing ---

    /// Ask the host to frame the current selection in a viewport. The
    /// result pose is only valid once [`Host::poll_frame`] reports the
    /// request complete.
    fn request_frame_selection(&mut self, viewport: ViewportId) -> Result<FrameRequest, HostError>;

    /// Poll an in-flight framing request. Returns true once the framing
    /// animation has settled.
    fn poll_frame(&mut self, request: &FrameRequest) -> bool;
}
