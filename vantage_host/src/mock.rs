// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::BTreeMap;

use glam::DVec3;
use serde_json::Value;
use vantage_pose::ViewPose;

use crate::host::{CameraState, ContainerOrigin, FrameRequest, Host, HostError, ViewportState};
use crate::ids::{CameraId, LayerId, SceneId, ThumbnailId, ViewportId};

#[derive(Clone, Debug)]
struct MockScene {
    name: String,
    origin: ContainerOrigin,
    attrs: BTreeMap<String, String>,
    layers: Vec<LayerId>,
}

#[derive(Clone, Debug)]
struct MockLayer {
    name: String,
    attrs: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
struct MockCamera {
    name: String,
    state: CameraState,
    focused_object: bool,
}

/// Deterministic in-memory [`Host`] for tests and examples.
///
/// Starts with one editable scene ("Scene") containing one view layer
/// ("ViewLayer") and no viewports. Framing requests complete after
/// `frame_latency` polls and then move the viewport to frame the current
/// selection bounds.
#[derive(Debug)]
pub struct MockHost {
    next_id: u64,
    viewports: BTreeMap<ViewportId, ViewportState>,
    viewport_order: Vec<ViewportId>,
    focused: Option<ViewportId>,
    scenes: BTreeMap<SceneId, MockScene>,
    scene_order: Vec<SceneId>,
    layers: BTreeMap<LayerId, MockLayer>,
    cameras: BTreeMap<CameraId, MockCamera>,
    camera_order: Vec<CameraId>,
    active_camera: Option<CameraId>,
    current_scene: SceneId,
    current_layer: LayerId,
    selection_bounds: Option<(DVec3, DVec3)>,
    selection_fingerprint: u64,
    blobs: BTreeMap<String, String>,
    legacy_views: Vec<Value>,
    thumbnails_alive: Vec<ThumbnailId>,
    fail_next_thumbnail: bool,
    frames: BTreeMap<u64, u32>,
    frame_latency: u32,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// A fresh host with one scene and one view layer.
    #[must_use]
    pub fn new() -> Self {
        let mut host = Self {
            next_id: 1,
            viewports: BTreeMap::new(),
            viewport_order: Vec::new(),
            focused: None,
            scenes: BTreeMap::new(),
            scene_order: Vec::new(),
            layers: BTreeMap::new(),
            cameras: BTreeMap::new(),
            camera_order: Vec::new(),
            active_camera: None,
            current_scene: SceneId(0),
            current_layer: LayerId(0),
            selection_bounds: None,
            selection_fingerprint: 0,
            blobs: BTreeMap::new(),
            legacy_views: Vec::new(),
            thumbnails_alive: Vec::new(),
            fail_next_thumbnail: false,
            frames: BTreeMap::new(),
            frame_latency: 2,
        };
        let scene = host.add_scene("Scene", ContainerOrigin::Editable);
        let layer = host.add_layer(scene, "ViewLayer");
        host.current_scene = scene;
        host.current_layer = layer;
        host
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Open a new viewport with a default pose.
    pub fn add_viewport(&mut self) -> ViewportId {
        let id = ViewportId(self.alloc());
        self.viewports.insert(id, ViewportState::default());
        self.viewport_order.push(id);
        id
    }

    /// Close a viewport.
    pub fn remove_viewport(&mut self, viewport: ViewportId) {
        self.viewports.remove(&viewport);
        self.viewport_order.retain(|v| *v != viewport);
        if self.focused == Some(viewport) {
            self.focused = None;
        }
    }

    /// Set which viewport has input focus.
    pub fn set_focused_viewport(&mut self, viewport: Option<ViewportId>) {
        self.focused = viewport;
    }

    /// Add a scene container.
    pub fn add_scene(&mut self, name: &str, origin: ContainerOrigin) -> SceneId {
        let id = SceneId(self.alloc());
        self.scenes.insert(
            id,
            MockScene {
                name: name.to_owned(),
                origin,
                attrs: BTreeMap::new(),
                layers: Vec::new(),
            },
        );
        self.scene_order.push(id);
        id
    }

    /// Add a view layer to a scene.
    pub fn add_layer(&mut self, scene: SceneId, name: &str) -> LayerId {
        let id = LayerId(self.alloc());
        self.layers.insert(
            id,
            MockLayer {
                name: name.to_owned(),
                attrs: BTreeMap::new(),
            },
        );
        if let Some(s) = self.scenes.get_mut(&scene) {
            s.layers.push(id);
        }
        id
    }

    /// Copy a scene's attributes onto another scene, as host duplication
    /// would.
    pub fn copy_scene_attrs(&mut self, from: SceneId, to: SceneId) {
        if let Some(attrs) = self.scenes.get(&from).map(|s| s.attrs.clone())
            && let Some(target) = self.scenes.get_mut(&to)
        {
            target.attrs = attrs;
        }
    }

    /// Copy a layer's attributes onto another layer.
    pub fn copy_layer_attrs(&mut self, from: LayerId, to: LayerId) {
        if let Some(attrs) = self.layers.get(&from).map(|l| l.attrs.clone())
            && let Some(target) = self.layers.get_mut(&to)
        {
            target.attrs = attrs;
        }
    }

    /// Rename a scene.
    pub fn rename_scene(&mut self, scene: SceneId, name: &str) {
        if let Some(s) = self.scenes.get_mut(&scene) {
            s.name = name.to_owned();
        }
    }

    /// Add a camera object.
    pub fn add_camera(&mut self, name: &str) -> CameraId {
        let id = CameraId(self.alloc());
        self.cameras.insert(
            id,
            MockCamera {
                name: name.to_owned(),
                state: CameraState::default(),
                focused_object: false,
            },
        );
        self.camera_order.push(id);
        id
    }

    /// Mark whether a camera is the editor's focused object.
    pub fn set_camera_focused_object(&mut self, camera: CameraId, focused: bool) {
        if let Some(c) = self.cameras.get_mut(&camera) {
            c.focused_object = focused;
        }
    }

    /// Set the selection bounds reported to callers.
    pub fn set_selection_bounds(&mut self, bounds: Option<(DVec3, DVec3)>) {
        self.selection_bounds = bounds;
    }

    /// Set the selection fingerprint reported to callers.
    pub fn set_selection_fingerprint(&mut self, fingerprint: u64) {
        self.selection_fingerprint = fingerprint;
    }

    /// Seed a legacy-format record for migration tests.
    pub fn push_legacy_view(&mut self, payload: Value) {
        self.legacy_views.push(payload);
    }

    /// Make the next thumbnail render fail.
    pub fn fail_next_thumbnail(&mut self) {
        self.fail_next_thumbnail = true;
    }

    /// Number of thumbnails currently alive.
    #[must_use]
    pub fn thumbnail_count(&self) -> usize {
        self.thumbnails_alive.len()
    }

    /// Number of polls a framing request takes to complete.
    pub fn set_frame_latency(&mut self, polls: u32) {
        self.frame_latency = polls;
    }

    /// Overwrite a viewport's pose without going through `set_viewport_pose`
    /// (simulates external user navigation).
    pub fn nudge_viewport(&mut self, viewport: ViewportId, pose: ViewPose) {
        if let Some(state) = self.viewports.get_mut(&viewport) {
            state.pose = pose;
        }
    }

    fn frame_pose(&self, current: ViewPose) -> ViewPose {
        let mut pose = current;
        if let Some((min, max)) = self.selection_bounds {
            pose.location = (min + max) * 0.5;
            pose.distance = ((max - min).length() * 2.0).max(1.0);
        }
        pose
    }
}

impl Host for MockHost {
    fn viewports(&self) -> Vec<ViewportId> {
        self.viewport_order.clone()
    }

    fn focused_viewport(&self) -> Option<ViewportId> {
        self.focused
    }

    fn viewport_pose(&self, viewport: ViewportId) -> Option<ViewPose> {
        self.viewports.get(&viewport).map(|s| s.pose)
    }

    fn set_viewport_pose(
        &mut self,
        viewport: ViewportId,
        pose: &ViewPose,
    ) -> Result<(), HostError> {
        let state = self
            .viewports
            .get_mut(&viewport)
            .ok_or(HostError::NotFound)?;
        state.pose = *pose;
        Ok(())
    }

    fn viewport_in_camera_view(&self, viewport: ViewportId) -> bool {
        self.viewports
            .get(&viewport)
            .is_some_and(|s| s.camera_view)
    }

    fn set_viewport_camera_view(
        &mut self,
        viewport: ViewportId,
        enabled: bool,
    ) -> Result<(), HostError> {
        let state = self
            .viewports
            .get_mut(&viewport)
            .ok_or(HostError::NotFound)?;
        state.camera_view = enabled;
        Ok(())
    }

    fn viewport_state(&self, viewport: ViewportId) -> Option<ViewportState> {
        self.viewports.get(&viewport).cloned()
    }

    fn set_viewport_style_field(
        &mut self,
        viewport: ViewportId,
        key: &str,
        value: Value,
    ) -> Result<(), HostError> {
        let state = self
            .viewports
            .get_mut(&viewport)
            .ok_or(HostError::NotFound)?;
        state.style.insert(key.to_owned(), value);
        Ok(())
    }

    fn cameras(&self) -> Vec<CameraId> {
        self.camera_order.clone()
    }

    fn camera_name(&self, camera: CameraId) -> Option<String> {
        self.cameras.get(&camera).map(|c| c.name.clone())
    }

    fn camera_state(&self, camera: CameraId) -> Option<CameraState> {
        self.cameras.get(&camera).map(|c| c.state)
    }

    fn set_camera_state(&mut self, camera: CameraId, state: &CameraState) -> Result<(), HostError> {
        let cam = self.cameras.get_mut(&camera).ok_or(HostError::NotFound)?;
        cam.state = *state;
        Ok(())
    }

    fn active_camera(&self) -> Option<CameraId> {
        self.active_camera
    }

    fn set_active_camera(&mut self, camera: CameraId) -> Result<(), HostError> {
        if !self.cameras.contains_key(&camera) {
            return Err(HostError::NotFound);
        }
        self.active_camera = Some(camera);
        Ok(())
    }

    fn camera_is_focused_object(&self, camera: CameraId) -> bool {
        self.cameras
            .get(&camera)
            .is_some_and(|c| c.focused_object)
    }

    fn scenes(&self) -> Vec<SceneId> {
        self.scene_order.clone()
    }

    fn scene_name(&self, scene: SceneId) -> Option<String> {
        self.scenes.get(&scene).map(|s| s.name.clone())
    }

    fn scene_origin(&self, scene: SceneId) -> Option<ContainerOrigin> {
        self.scenes.get(&scene).map(|s| s.origin.clone())
    }

    fn scene_attr(&self, scene: SceneId, key: &str) -> Option<String> {
        self.scenes.get(&scene)?.attrs.get(key).cloned()
    }

    fn set_scene_attr(&mut self, scene: SceneId, key: &str, value: &str) -> Result<(), HostError> {
        let s = self.scenes.get_mut(&scene).ok_or(HostError::NotFound)?;
        if !s.origin.is_writable() {
            return Err(HostError::ReadOnly);
        }
        s.attrs.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn layers(&self, scene: SceneId) -> Vec<LayerId> {
        self.scenes
            .get(&scene)
            .map(|s| s.layers.clone())
            .unwrap_or_default()
    }

    fn layer_name(&self, layer: LayerId) -> Option<String> {
        self.layers.get(&layer).map(|l| l.name.clone())
    }

    fn layer_attr(&self, layer: LayerId, key: &str) -> Option<String> {
        self.layers.get(&layer)?.attrs.get(key).cloned()
    }

    fn set_layer_attr(&mut self, layer: LayerId, key: &str, value: &str) -> Result<(), HostError> {
        let owner_writable = self
            .scenes
            .values()
            .find(|s| s.layers.contains(&layer))
            .map(|s| s.origin.is_writable());
        match owner_writable {
            Some(true) => {}
            Some(false) => return Err(HostError::ReadOnly),
            None => return Err(HostError::NotFound),
        }
        let l = self.layers.get_mut(&layer).ok_or(HostError::NotFound)?;
        l.attrs.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn current_scene(&self) -> SceneId {
        self.current_scene
    }

    fn set_current_scene(&mut self, scene: SceneId) -> Result<(), HostError> {
        let s = self.scenes.get(&scene).ok_or(HostError::NotFound)?;
        self.current_scene = scene;
        if let Some(first) = s.layers.first() {
            self.current_layer = *first;
        }
        Ok(())
    }

    fn current_layer(&self) -> LayerId {
        self.current_layer
    }

    fn set_current_layer(&mut self, layer: LayerId) -> Result<(), HostError> {
        let owned = self
            .scenes
            .get(&self.current_scene)
            .is_some_and(|s| s.layers.contains(&layer));
        if !owned {
            return Err(HostError::NotFound);
        }
        self.current_layer = layer;
        Ok(())
    }

    fn selection_bounds(&self) -> Option<(DVec3, DVec3)> {
        self.selection_bounds
    }

    fn selection_fingerprint(&self) -> u64 {
        self.selection_fingerprint
    }

    fn read_data_blob(&self, name: &str) -> Option<String> {
        self.blobs.get(name).cloned()
    }

    fn write_data_blob(&mut self, name: &str, contents: &str) -> Result<(), HostError> {
        self.blobs.insert(name.to_owned(), contents.to_owned());
        Ok(())
    }

    fn legacy_view_payloads(&self) -> Vec<Value> {
        self.legacy_views.clone()
    }

    fn clear_legacy_views(&mut self) {
        self.legacy_views.clear();
    }

    fn render_thumbnail(&mut self, viewport: ViewportId) -> Result<ThumbnailId, HostError> {
        if self.fail_next_thumbnail {
            self.fail_next_thumbnail = false;
            return Err(HostError::Failed("thumbnail render failed".to_owned()));
        }
        if !self.viewports.contains_key(&viewport) {
            return Err(HostError::NotFound);
        }
        let id = ThumbnailId(self.alloc());
        self.thumbnails_alive.push(id);
        Ok(id)
    }

    fn discard_thumbnail(&mut self, thumbnail: ThumbnailId) {
        self.thumbnails_alive.retain(|t| *t != thumbnail);
    }

    fn request_frame_selection(&mut self, viewport: ViewportId) -> Result<FrameRequest, HostError> {
        if !self.viewports.contains_key(&viewport) {
            return Err(HostError::NotFound);
        }
        let token = self.alloc();
        self.frames.insert(token, self.frame_latency);
        Ok(FrameRequest { viewport, token })
    }

    fn poll_frame(&mut self, request: &FrameRequest) -> bool {
        let Some(remaining) = self.frames.get_mut(&request.token) else {
            // Unknown token: treat as already settled.
            return true;
        };
        if *remaining > 0 {
            *remaining -= 1;
            return false;
        }
        self.frames.remove(&request.token);
        if let Some(state) = self.viewports.get(&request.viewport) {
            let framed = self.frame_pose(state.pose);
            if let Some(state) = self.viewports.get_mut(&request.viewport) {
                state.pose = framed;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_one_scene_and_layer() {
        let host = MockHost::new();
        assert_eq!(host.scenes().len(), 1);
        let scene = host.current_scene();
        assert_eq!(host.layers(scene).len(), 1);
        assert_eq!(host.scene_name(scene).as_deref(), Some("Scene"));
    }

    #[test]
    fn linked_scene_attrs_are_read_only() {
        let mut host = MockHost::new();
        let linked = host.add_scene(
            "Props",
            ContainerOrigin::Linked {
                path: "/lib/props.blend".to_owned(),
            },
        );
        let err = host.set_scene_attr(linked, "k", "v");
        assert!(matches!(err, Err(HostError::ReadOnly)), "got {err:?}");
    }

    #[test]
    fn frame_request_completes_after_latency() {
        let mut host = MockHost::new();
        let vp = host.add_viewport();
        host.set_frame_latency(2);
        host.set_selection_bounds(Some((DVec3::splat(-1.0), DVec3::splat(1.0))));

        let request = host.request_frame_selection(vp).unwrap();
        assert!(!host.poll_frame(&request));
        assert!(!host.poll_frame(&request));
        assert!(host.poll_frame(&request));

        let pose = host.viewport_pose(vp).unwrap();
        assert!((pose.location - DVec3::ZERO).length() < 1e-12);
    }

    #[test]
    fn thumbnail_failure_is_one_shot() {
        let mut host = MockHost::new();
        let vp = host.add_viewport();
        host.fail_next_thumbnail();
        assert!(host.render_thumbnail(vp).is_err());
        assert!(host.render_thumbnail(vp).is_ok());
        assert_eq!(host.thumbnail_count(), 1);
    }
}
