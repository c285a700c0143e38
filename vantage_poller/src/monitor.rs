// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::debug;
use vantage_history::HistoryRing;
use vantage_host::{Host, SceneId, ViewportId};
use vantage_identity::IdentityResolver;
use vantage_pose::ViewPose;
use vantage_store::ViewSelection;
use vantage_transform::TransformState;
use vantage_txn::{TransactionController, UpdateSource};

/// Monitor cadence and thresholds.
#[derive(Clone, Copy, Debug)]
pub struct MonitorConfig {
    /// How long movement must pause before a history commit.
    pub settle_delay: Duration,
    /// Maintenance interval while the user is active (moving, in camera
    /// view, or in orbit/keep-camera mode).
    pub active_maintenance_interval: Duration,
    /// Maintenance interval while idle.
    pub idle_maintenance_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(300),
            active_maintenance_interval: Duration::from_millis(500),
            idle_maintenance_interval: Duration::from_secs(2),
        }
    }
}

/// What a tick did, for the caller's UI bookkeeping.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickOutcome {
    /// A settled pose was committed to history.
    pub recorded_history: bool,
    /// The camera-object count changed; any camera dropdown should
    /// resync.
    pub camera_list_changed: bool,
    /// Movement away from a selected view turned it into a ghost.
    pub ghost_created: bool,
}

/// Fixed-tick sampler of one viewport.
#[derive(Debug)]
pub struct ViewportMonitor {
    config: MonitorConfig,
    last_sample: Option<ViewPose>,
    last_camera_view: bool,
    moving: bool,
    last_change_at: Option<Instant>,
    last_selection_fingerprint: Option<u64>,
    last_maintenance: Option<Instant>,
    last_scene_count: usize,
    layer_counts: BTreeMap<SceneId, usize>,
    last_camera_count: Option<usize>,
}

impl Default for ViewportMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl ViewportMonitor {
    /// A monitor with no samples yet.
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            last_sample: None,
            last_camera_view: false,
            moving: false,
            last_change_at: None,
            last_selection_fingerprint: None,
            last_maintenance: None,
            last_scene_count: 0,
            layer_counts: BTreeMap::new(),
            last_camera_count: None,
        }
    }

    /// Whether movement is currently being tracked.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Forget all samples (e.g. after a file reload).
    pub fn reset(&mut self) {
        self.last_sample = None;
        self.last_camera_view = false;
        self.moving = false;
        self.last_change_at = None;
        self.last_selection_fingerprint = None;
        self.last_maintenance = None;
        self.last_scene_count = 0;
        self.layer_counts.clear();
        self.last_camera_count = None;
    }

    /// Accept the current pose as the baseline without treating it as
    /// movement (used right after a restore seeds the viewport).
    pub fn accept_baseline(&mut self, pose: ViewPose, camera_view: bool) {
        self.last_sample = Some(pose);
        self.last_camera_view = camera_view;
        self.moving = false;
    }

    /// One monitor tick.
    pub fn tick(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        txn: &TransactionController,
        transform: &mut TransformState,
        history: &mut HistoryRing,
        identity: &IdentityResolver,
        selection: &mut ViewSelection,
        keep_camera_active: &mut bool,
    ) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let now = Instant::now();

        let Some(pose) = host.viewport_pose(viewport) else {
            return outcome;
        };
        let camera_view = host.viewport_in_camera_view(viewport);

        // Keep-camera-active only makes sense while the camera is still
        // the focused object.
        if *keep_camera_active {
            let still_focused = host
                .active_camera()
                .is_some_and(|camera| host.camera_is_focused_object(camera));
            if !still_focused {
                *keep_camera_active = false;
            }
        }

        let active = self.moving || camera_view || transform.orbit_enabled() || *keep_camera_active;
        outcome.camera_list_changed = self.maybe_run_maintenance(host, identity, now, active);

        // Orbit's pivot was computed from the old selection.
        let fingerprint = host.selection_fingerprint();
        if let Some(previous) = self.last_selection_fingerprint
            && previous != fingerprint
            && transform.orbit_enabled()
        {
            debug!("selection changed, disabling orbit");
            transform.disable_orbit();
        }
        self.last_selection_fingerprint = Some(fingerprint);

        // Fast path: nothing relevant changed, leave without touching the
        // transaction controller.
        if let Some(last) = self.last_sample
            && !self.moving
            && !camera_view
            && !self.last_camera_view
            && !transform.orbit_enabled()
            && !*keep_camera_active
            && !txn.in_grace_period()
            && last.is_similar_to(&pose)
        {
            return outcome;
        }

        // Entering camera view (or having it switched externally) rebases
        // everything on the camera transform.
        if camera_view && !self.last_camera_view && !txn.in_grace_period() {
            transform.reinitialize_from(host, viewport);
        }

        let Some(last) = self.last_sample else {
            // First sample: seed history and the baseline.
            history.record(pose);
            self.accept_baseline(pose, camera_view);
            return outcome;
        };

        if !last.is_similar_to(&pose) {
            self.handle_movement(host, viewport, txn, transform, history, selection, &last, &pose, now, &mut outcome);
            self.last_sample = Some(pose);
        } else if self.moving
            && let Some(changed_at) = self.last_change_at
            && now.duration_since(changed_at) >= self.config.settle_delay
        {
            self.moving = false;
            if txn.should_record_history() {
                outcome.recorded_history = history.record(pose);
                debug!("settled pose committed to history");
            }
        }

        self.last_camera_view = camera_view;
        outcome
    }

    fn handle_movement(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        txn: &TransactionController,
        transform: &mut TransformState,
        history: &HistoryRing,
        selection: &mut ViewSelection,
        last: &ViewPose,
        pose: &ViewPose,
        now: Instant,
        outcome: &mut TickOutcome,
    ) {
        // A pose matching the history cursor, or any view-restore grace,
        // means the change is a restore we caused: accept it as the new
        // baseline without movement tracking.
        let matches_cursor = history
            .entry_at_cursor()
            .is_some_and(|entry| entry.pose.is_similar_to(pose));
        let grace_source = txn.grace_source();
        if matches_cursor || grace_source == Some(UpdateSource::ViewRestore) {
            self.moving = false;
            return;
        }

        self.moving = true;
        self.last_change_at = Some(now);

        if selection.active().is_some() {
            selection.drift_to_ghost();
            outcome.ghost_created = true;
        }

        // Genuine external movement (not a projection flip) invalidates
        // orbit's fixed pivot.
        if transform.orbit_enabled() && !txn.in_grace_period() {
            let moved = (last.location - pose.location).length_squared()
                > vantage_pose::POSITION_EPSILON_SQ
                || last.rotation.dot(pose.rotation).abs() < vantage_pose::ROTATION_DOT_MIN;
            if moved {
                debug!("external movement, disabling orbit");
                transform.disable_orbit();
            }
        }

        if grace_source == Some(UpdateSource::UserDrag) {
            // The user is mid-edit through our own sliders; reseeding the
            // bases now would fight the edit in progress.
            return;
        }
        if !txn.in_grace_period() {
            transform.reinitialize_from(host, viewport);
        }
    }

    fn maybe_run_maintenance(
        &mut self,
        host: &mut dyn Host,
        identity: &IdentityResolver,
        now: Instant,
        active: bool,
    ) -> bool {
        let interval = if active {
            self.config.active_maintenance_interval
        } else {
            self.config.idle_maintenance_interval
        };
        if let Some(last) = self.last_maintenance
            && now.duration_since(last) < interval
        {
            return false;
        }
        self.last_maintenance = Some(now);

        let scenes = host.scenes();
        if scenes.len() != self.last_scene_count {
            identity.repair_duplicate_scene_tokens(host);
            for scene in &scenes {
                let _ = identity.scene_identity(host, *scene);
            }
            self.last_scene_count = scenes.len();
        }
        for scene in scenes {
            let count = host.layers(scene).len();
            if self.layer_counts.get(&scene) != Some(&count) {
                identity.repair_duplicate_layer_tokens(host, scene);
                for layer in host.layers(scene) {
                    let _ = identity.layer_identity(host, scene, layer);
                }
                self.layer_counts.insert(scene, count);
            }
        }

        let camera_count = host.cameras().len();
        let changed = self.last_camera_count.is_some_and(|c| c != camera_count);
        self.last_camera_count = Some(camera_count);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use vantage_host::MockHost;
    use vantage_identity::IDENTITY_ATTR;
    use vantage_txn::LockPriority;

    struct Rig {
        host: MockHost,
        vp: ViewportId,
        txn: TransactionController,
        transform: TransformState,
        history: HistoryRing,
        identity: IdentityResolver,
        selection: ViewSelection,
        keep_camera: bool,
        monitor: ViewportMonitor,
    }

    fn rig() -> Rig {
        let mut host = MockHost::new();
        let vp = host.add_viewport();
        let mut transform = TransformState::new();
        transform.reinitialize_from(&host, vp);
        Rig {
            host,
            vp,
            txn: TransactionController::new(),
            transform,
            history: HistoryRing::new(20),
            identity: IdentityResolver::new(),
            selection: ViewSelection::new(),
            keep_camera: false,
            monitor: ViewportMonitor::new(MonitorConfig {
                settle_delay: Duration::ZERO,
                active_maintenance_interval: Duration::ZERO,
                idle_maintenance_interval: Duration::ZERO,
            }),
        }
    }

    impl Rig {
        fn tick(&mut self) -> TickOutcome {
            self.monitor.tick(
                &mut self.host,
                self.vp,
                &self.txn,
                &mut self.transform,
                &mut self.history,
                &self.identity,
                &mut self.selection,
                &mut self.keep_camera,
            )
        }

        fn move_viewport(&mut self, x: f64) {
            let mut pose = self.host.viewport_pose(self.vp).unwrap();
            pose.location = DVec3::new(x, 0.0, 0.0);
            self.host.nudge_viewport(self.vp, pose);
        }
    }

    #[test]
    fn seeds_then_commits_on_settle() {
        let mut r = rig();
        r.tick();
        assert_eq!(r.history.len(), 1);

        r.move_viewport(5.0);
        let outcome = r.tick();
        assert!(!outcome.recorded_history);
        assert!(r.monitor.is_moving());

        // No further change: settle delay (zero) elapsed, commit.
        let outcome = r.tick();
        assert!(outcome.recorded_history);
        assert_eq!(r.history.len(), 2);
        assert!(!r.monitor.is_moving());
    }

    #[test]
    fn history_navigation_is_not_rerecorded() {
        let mut r = rig();
        r.tick();
        r.move_viewport(5.0);
        r.tick();
        r.tick();
        assert_eq!(r.history.len(), 2);

        // Navigate back and restore the entry, as the session would.
        let pose = r.history.go_back().unwrap().pose;
        r.host.nudge_viewport(r.vp, pose);
        r.txn.start_grace_period(
            Duration::from_millis(500),
            Some(UpdateSource::HistoryNav),
        );

        let outcome = r.tick();
        assert!(!outcome.recorded_history);
        let outcome = r.tick();
        assert!(!outcome.recorded_history);
        assert_eq!(r.history.len(), 2, "restore must not append");
    }

    #[test]
    fn movement_creates_ghost_view() {
        let mut r = rig();
        r.tick();
        r.selection.select(Some(0));

        r.move_viewport(8.0);
        let outcome = r.tick();
        assert!(outcome.ghost_created);
        assert_eq!(r.selection.active(), None);
        assert_eq!(r.selection.update_target(), Some(0));
    }

    #[test]
    fn user_drag_grace_skips_reinitialize_but_still_ghosts() {
        let mut r = rig();
        r.tick();
        r.selection.select(Some(0));
        r.txn
            .start_grace_period(Duration::from_secs(5), Some(UpdateSource::UserDrag));

        r.move_viewport(8.0);
        let outcome = r.tick();
        assert!(outcome.ghost_created);
        assert_eq!(r.selection.active(), None);
    }

    #[test]
    fn external_movement_disables_orbit() {
        let mut r = rig();
        r.tick();
        r.transform.enable_orbit(&mut r.host, r.vp, &r.txn).unwrap();
        r.transform.poll_orbit_init(&mut r.host, r.vp).unwrap();
        assert!(r.transform.orbit_enabled());
        // Let the orbit-toggle grace lapse.
        r.txn.start_grace_period(Duration::ZERO, None);

        r.move_viewport(8.0);
        r.tick();
        assert!(!r.transform.orbit_enabled());
    }

    #[test]
    fn selection_change_disables_orbit() {
        let mut r = rig();
        r.host.set_selection_fingerprint(1);
        r.tick();
        r.transform.enable_orbit(&mut r.host, r.vp, &r.txn).unwrap();
        r.transform.poll_orbit_init(&mut r.host, r.vp).unwrap();

        r.host.set_selection_fingerprint(2);
        r.tick();
        assert!(!r.transform.orbit_enabled());
    }

    #[test]
    fn fast_path_skips_stable_ticks() {
        let mut r = rig();
        r.tick();
        r.tick();

        // Hold the transaction: a fast-path tick must not need it.
        assert!(r.txn.begin(UpdateSource::ViewRestore, LockPriority::Critical));
        let outcome = r.tick();
        assert!(!outcome.recorded_history);
        assert_eq!(r.history.len(), 1);
        r.txn.end();
    }

    #[test]
    fn maintenance_repairs_duplicated_scene_tokens() {
        let mut r = rig();
        r.tick();

        let a = r.host.current_scene();
        let _ = r.identity.scene_identity(&mut r.host, a);
        let b = r
            .host
            .add_scene("Scene.001", vantage_host::ContainerOrigin::Editable);
        r.host.copy_scene_attrs(a, b);

        r.tick();
        assert_ne!(
            r.host.scene_attr(a, IDENTITY_ATTR),
            r.host.scene_attr(b, IDENTITY_ATTR)
        );
    }

    #[test]
    fn camera_count_change_is_reported_once() {
        let mut r = rig();
        r.tick();
        r.host.add_camera("Cam");
        let outcome = r.tick();
        assert!(outcome.camera_list_changed);
        let outcome = r.tick();
        assert!(!outcome.camera_list_changed);
    }

    #[test]
    fn keep_camera_active_auto_disables() {
        let mut r = rig();
        let camera = r.host.add_camera("Cam");
        r.host.set_active_camera(camera).unwrap();
        r.host.set_camera_focused_object(camera, true);
        r.keep_camera = true;

        r.tick();
        assert!(r.keep_camera);

        r.host.set_camera_focused_object(camera, false);
        r.tick();
        assert!(!r.keep_camera);
    }
}
