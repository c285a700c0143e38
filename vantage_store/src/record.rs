// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vantage_host::{Host, HostError, ViewportId};
use vantage_identity::IdentityResolver;
use vantage_pose::ViewPose;

fn default_true() -> bool {
    true
}

fn default_distance() -> f64 {
    10.0
}

fn default_lens() -> f64 {
    50.0
}

fn default_clip_start() -> f64 {
    0.1
}

fn default_clip_end() -> f64 {
    1000.0
}

fn default_ordinal() -> u64 {
    1
}

/// One saved view.
///
/// Identity and pose fields always deserialize (with documented
/// defaults); every display-style field is optional and simply not
/// applied when absent, so records written by older versions keep
/// loading. Keys this version does not know are carried in `extra` and
/// written back verbatim.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewRecord {
    /// Display name.
    pub name: String,
    /// Ordinal used for the default name at creation time.
    #[serde(default = "default_ordinal")]
    pub ordinal: u64,

    // Pose.
    /// Pivot location.
    #[serde(default)]
    pub location: DVec3,
    /// View rotation.
    #[serde(default)]
    pub rotation: DQuat,
    /// Pivot distance.
    #[serde(default = "default_distance")]
    pub distance: f64,
    /// Perspective or orthographic.
    #[serde(default = "default_true")]
    pub is_perspective: bool,
    /// Focal length / orthographic lens.
    #[serde(default = "default_lens")]
    pub lens: f64,
    /// Near clip.
    #[serde(default = "default_clip_start")]
    pub clip_start: f64,
    /// Far clip.
    #[serde(default = "default_clip_end")]
    pub clip_end: f64,

    // Shading group.
    /// Viewport shading mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shading_mode: Option<String>,
    /// Lighting style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,
    /// Surface color source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<String>,
    /// Background source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_mode: Option<String>,
    /// Background color, RGB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<[f64; 3]>,
    /// Cavity shading toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_cavity: Option<bool>,
    /// Object outline toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_outline: Option<bool>,
    /// X-ray toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_xray: Option<bool>,
    /// X-ray opacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xray_alpha: Option<f64>,
    /// Shadow toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_shadows: Option<bool>,

    // Overlay group.
    /// Master overlay toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_overlays: Option<bool>,
    /// Floor grid toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_floor: Option<bool>,
    /// X axis guide toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_axis_x: Option<bool>,
    /// Y axis guide toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_axis_y: Option<bool>,

    // Composition target.
    /// Stable identity of the scene this view was saved in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_identity: Option<String>,
    /// Stable identity of the view layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_layer_identity: Option<String>,
    /// Scene name at save time, used as a resolution fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_name: Option<String>,
    /// View layer name at save time, used as a resolution fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_layer_name: Option<String>,

    // What to apply on load.
    /// Apply the pose on load.
    #[serde(default = "default_true")]
    pub remember_pose: bool,
    /// Apply the shading group on load.
    #[serde(default = "default_true")]
    pub remember_shading: bool,
    /// Apply the overlay group on load.
    #[serde(default = "default_true")]
    pub remember_overlays: bool,
    /// Switch scene/view layer on load.
    #[serde(default = "default_true")]
    pub remember_composition: bool,

    /// Opaque host thumbnail handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<u64>,

    /// Unrecognized keys, preserved verbatim across a load/save cycle.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ViewRecord {
    /// A record holding only a name and pose, with no style opinions.
    #[must_use]
    pub fn from_pose(name: &str, ordinal: u64, pose: &ViewPose) -> Self {
        let mut record = Self {
            name: name.to_owned(),
            ordinal,
            location: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            distance: default_distance(),
            is_perspective: true,
            lens: default_lens(),
            clip_start: default_clip_start(),
            clip_end: default_clip_end(),
            shading_mode: None,
            lighting: None,
            color_mode: None,
            background_mode: None,
            background_color: None,
            show_cavity: None,
            show_outline: None,
            show_xray: None,
            xray_alpha: None,
            show_shadows: None,
            show_overlays: None,
            show_floor: None,
            show_axis_x: None,
            show_axis_y: None,
            scene_identity: None,
            view_layer_identity: None,
            scene_name: None,
            view_layer_name: None,
            remember_pose: true,
            remember_shading: true,
            remember_overlays: true,
            remember_composition: true,
            thumbnail: None,
            extra: Map::new(),
        };
        record.set_pose(pose);
        record
    }

    /// The pose stored in this record.
    #[must_use]
    pub fn pose(&self) -> ViewPose {
        ViewPose {
            location: self.location,
            rotation: self.rotation,
            distance: self.distance,
            perspective: self.is_perspective,
            lens: self.lens,
            clip_start: self.clip_start,
            clip_end: self.clip_end,
        }
    }

    /// Overwrite the stored pose.
    pub fn set_pose(&mut self, pose: &ViewPose) {
        self.location = pose.location;
        self.rotation = pose.rotation;
        self.distance = pose.distance;
        self.is_perspective = pose.perspective;
        self.lens = pose.lens;
        self.clip_start = pose.clip_start;
        self.clip_end = pose.clip_end;
    }

    /// Capture the live viewport into a new record, including the
    /// current composition target's identities.
    pub fn capture(
        host: &mut dyn Host,
        resolver: &IdentityResolver,
        viewport: ViewportId,
        name: &str,
        ordinal: u64,
    ) -> Option<Self> {
        let state = host.viewport_state(viewport)?;
        let mut record = Self::from_pose(name, ordinal, &state.pose);

        let style = &state.style;
        record.shading_mode = get_str(style, "shading_mode");
        record.lighting = get_str(style, "lighting");
        record.color_mode = get_str(style, "color_mode");
        record.background_mode = get_str(style, "background_mode");
        record.background_color = get_rgb(style, "background_color");
        record.show_cavity = get_bool(style, "show_cavity");
        record.show_outline = get_bool(style, "show_outline");
        record.show_xray = get_bool(style, "show_xray");
        record.xray_alpha = get_f64(style, "xray_alpha");
        record.show_shadows = get_bool(style, "show_shadows");
        record.show_overlays = get_bool(style, "show_overlays");
        record.show_floor = get_bool(style, "show_floor");
        record.show_axis_x = get_bool(style, "show_axis_x");
        record.show_axis_y = get_bool(style, "show_axis_y");

        let scene = host.current_scene();
        let layer = host.current_layer();
        record.scene_identity = resolver
            .scene_identity(host, scene)
            .map(|t| t.to_string());
        record.view_layer_identity = resolver
            .layer_identity(host, scene, layer)
            .map(|t| t.to_string());
        record.scene_name = host.scene_name(scene);
        record.view_layer_name = host.layer_name(layer);

        Some(record)
    }

    /// Push the record's pose and style into a viewport, honoring the
    /// remember flags. Composition switching is the caller's job (it
    /// needs identity resolution against the whole document).
    pub fn apply_to_viewport(
        &self,
        host: &mut dyn Host,
        viewport: ViewportId,
    ) -> Result<(), HostError> {
        if self.remember_pose {
            host.set_viewport_pose(viewport, &self.pose())?;
        }
        if self.remember_shading {
            set_str(host, viewport, "shading_mode", self.shading_mode.as_deref())?;
            set_str(host, viewport, "lighting", self.lighting.as_deref())?;
            set_str(host, viewport, "color_mode", self.color_mode.as_deref())?;
            set_str(
                host,
                viewport,
                "background_mode",
                self.background_mode.as_deref(),
            )?;
            if let Some(rgb) = self.background_color {
                let value = Value::Array(rgb.iter().map(|c| json_f64(*c)).collect());
                host.set_viewport_style_field(viewport, "background_color", value)?;
            }
            set_bool(host, viewport, "show_cavity", self.show_cavity)?;
            set_bool(host, viewport, "show_outline", self.show_outline)?;
            set_bool(host, viewport, "show_xray", self.show_xray)?;
            if let Some(alpha) = self.xray_alpha {
                host.set_viewport_style_field(viewport, "xray_alpha", json_f64(alpha))?;
            }
            set_bool(host, viewport, "show_shadows", self.show_shadows)?;
        }
        if self.remember_overlays {
            set_bool(host, viewport, "show_overlays", self.show_overlays)?;
            set_bool(host, viewport, "show_floor", self.show_floor)?;
            set_bool(host, viewport, "show_axis_x", self.show_axis_x)?;
            set_bool(host, viewport, "show_axis_y", self.show_axis_y)?;
        }
        Ok(())
    }
}

/// A single UI-editable field of a record, for per-field sync.
#[derive(Clone, Debug)]
pub enum RecordField {
    /// Display name.
    Name(String),
    /// Apply-pose flag.
    RememberPose(bool),
    /// Apply-shading flag.
    RememberShading(bool),
    /// Apply-overlays flag.
    RememberOverlays(bool),
    /// Apply-composition flag.
    RememberComposition(bool),
}

impl RecordField {
    /// Write this field into a record.
    pub fn apply_to(&self, record: &mut ViewRecord) {
        match self {
            Self::Name(name) => record.name = name.clone(),
            Self::RememberPose(v) => record.remember_pose = *v,
            Self::RememberShading(v) => record.remember_shading = *v,
            Self::RememberOverlays(v) => record.remember_overlays = *v,
            Self::RememberComposition(v) => record.remember_composition = *v,
        }
    }
}

fn json_f64(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn get_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
    map.get(key)?.as_bool()
}

fn get_f64(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key)?.as_f64()
}

fn get_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    Some(map.get(key)?.as_str()?.to_owned())
}

fn get_rgb(map: &Map<String, Value>, key: &str) -> Option<[f64; 3]> {
    let arr = map.get(key)?.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    Some([arr[0].as_f64()?, arr[1].as_f64()?, arr[2].as_f64()?])
}

fn set_bool(
    host: &mut dyn Host,
    viewport: ViewportId,
    key: &str,
    value: Option<bool>,
) -> Result<(), HostError> {
    if let Some(v) = value {
        host.set_viewport_style_field(viewport, key, Value::Bool(v))?;
    }
    Ok(())
}

fn set_str(
    host: &mut dyn Host,
    viewport: ViewportId,
    key: &str,
    value: Option<&str>,
) -> Result<(), HostError> {
    if let Some(v) = value {
        host.set_viewport_style_field(viewport, key, Value::String(v.to_owned()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sparse_record_gets_defaults() {
        let record: ViewRecord = serde_json::from_value(json!({ "name": "Old" })).unwrap();
        assert_eq!(record.name, "Old");
        assert!((record.distance - 10.0).abs() < 1e-12);
        assert!((record.lens - 50.0).abs() < 1e-12);
        assert!(record.is_perspective);
        assert!(record.remember_pose && record.remember_composition);
        assert!(record.shading_mode.is_none());
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let record: ViewRecord = serde_json::from_value(json!({
            "name": "V",
            "future_field": {"nested": true},
        }))
        .unwrap();
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["future_field"], json!({"nested": true}));
    }

    #[test]
    fn pose_round_trip() {
        let mut pose = ViewPose::default();
        pose.location.y = 4.0;
        pose.distance = 3.5;
        pose.perspective = false;

        let record = ViewRecord::from_pose("V", 1, &pose);
        assert_eq!(record.pose(), pose);
    }

    #[test]
    fn apply_honors_remember_flags() {
        use vantage_host::{Host as _, MockHost};

        let mut host = MockHost::new();
        let vp = host.add_viewport();

        let mut pose = ViewPose::default();
        pose.location.x = 5.0;
        let mut record = ViewRecord::from_pose("V", 1, &pose);
        record.show_floor = Some(false);
        record.remember_pose = false;

        record.apply_to_viewport(&mut host, vp).unwrap();
        let state = host.viewport_state(vp).unwrap();
        // Pose skipped, overlays applied.
        assert!((state.pose.location.x - 0.0).abs() < 1e-12);
        assert_eq!(state.style.get("show_floor"), Some(&Value::Bool(false)));
    }
}
