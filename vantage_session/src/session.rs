// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use kurbo::Size;
use thiserror::Error;
use tracing::{info, warn};
use vantage_gallery::{GalleryAction, GalleryEvent, GalleryOverlay, RegenerateError, RegenerateReport};
use vantage_history::{ForwardStep, HistoryRing};
use vantage_host::{
    ActiveViewportProvider, CameraId, FallbackViewportProvider, Host, HostError, ThumbnailId,
    ViewportId,
};
use vantage_identity::IdentityResolver;
use vantage_poller::{MonitorConfig, TickOutcome, ViewportMonitor};
use vantage_pose::ViewPose;
use vantage_store::{
    RecordField, StorageError, ViewMirror, ViewRecord, ViewSelection, ViewStore,
};
use vantage_transform::{RelativeAxis, TransformEdit, TransformError, TransformState};
use vantage_txn::{TransactionController, UpdateSource};

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The persisted document is unparsable. Reads behave as empty;
    /// mutations fail until [`Session::recover_storage`] runs.
    #[error("view storage is corrupted; storage recovery will reset it")]
    StorageInvalid,
    /// The document could not be written back.
    #[error("failed to persist view storage: {0}")]
    StorageFailed(String),
    /// No viewport exists to operate on.
    #[error("no viewport is available")]
    NoViewport,
    /// A higher-or-equal priority update owns the viewport.
    #[error("a conflicting viewport update is in progress")]
    Busy,
    /// The view index does not exist.
    #[error("no saved view at index {0}")]
    UnknownView(usize),
    /// No view is selected (and none was left behind by drift).
    #[error("no view is selected")]
    NothingSelected,
    /// The document holds no views at all.
    #[error("no views are saved")]
    NoViews,
    /// No camera object carries the requested name.
    #[error("no camera object named {0:?}")]
    UnknownCamera(String),
    /// A host operation failed.
    #[error(transparent)]
    Host(#[from] HostError),
    /// A transform operation failed.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl From<StorageError> for SessionError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Corrupted => Self::StorageInvalid,
            StorageError::OutOfRange(index) => Self::UnknownView(index),
            StorageError::Host(host) => Self::Host(host),
            other => Self::StorageFailed(other.to_string()),
        }
    }
}

impl From<RegenerateError> for SessionError {
    fn from(error: RegenerateError) -> Self {
        match error {
            RegenerateError::Busy => Self::Busy,
            RegenerateError::ViewportGone => Self::NoViewport,
            RegenerateError::Storage(storage) => storage.into(),
        }
    }
}

/// Where a history navigation landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryMove {
    /// A stored pose was applied to the viewport.
    Applied,
    /// Navigation stepped forward past the newest entry, back to the live
    /// pose; nothing was applied.
    ReturnedToLive,
    /// Already at the end in that direction.
    AtEnd,
}

/// Tunable session behavior. All durations are wall-clock.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// History ring capacity.
    pub history_capacity: usize,
    /// How long movement must pause before a history commit.
    pub settle_delay: Duration,
    /// Grace period after a restore or history navigation.
    pub restore_grace: Duration,
    /// Grace period after toggling orbit mode off.
    pub orbit_toggle_grace: Duration,
    /// Default apply-pose flag for newly saved views.
    pub remember_pose: bool,
    /// Default apply-shading flag for newly saved views.
    pub remember_shading: bool,
    /// Default apply-overlays flag for newly saved views.
    pub remember_overlays: bool,
    /// Default switch-composition flag for newly saved views.
    pub remember_composition: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: vantage_history::DEFAULT_CAPACITY,
            settle_delay: Duration::from_millis(300),
            restore_grace: Duration::from_millis(500),
            orbit_toggle_grace: Duration::from_millis(500),
            remember_pose: true,
            remember_shading: true,
            remember_overlays: true,
            remember_composition: true,
        }
    }
}

/// The complete per-document viewport session.
///
/// Owns every stateful piece and wires them together: the persisted view
/// document, the history ring, the update transaction, the transform
/// state machine, the background monitor, and the (at most one) gallery
/// overlay. Each user-facing operation is one method; the embedding calls
/// [`Session::tick`] on its timer.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    store: ViewStore,
    history: HistoryRing,
    txn: TransactionController,
    transform: TransformState,
    monitor: ViewportMonitor,
    gallery: Option<GalleryOverlay>,
    mirrors: Vec<ViewMirror>,
    selection: ViewSelection,
    resolver: IdentityResolver,
    provider: FallbackViewportProvider,
    keep_camera_active: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// A fresh session.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            store: ViewStore::new(),
            history: HistoryRing::new(config.history_capacity),
            txn: TransactionController::new(),
            transform: TransformState::new(),
            monitor: ViewportMonitor::new(MonitorConfig {
                settle_delay: config.settle_delay,
                ..MonitorConfig::default()
            }),
            gallery: None,
            mirrors: Vec::new(),
            selection: ViewSelection::new(),
            resolver: IdentityResolver::new(),
            provider: FallbackViewportProvider::new(),
            keep_camera_active: false,
        }
    }

    /// Drop all runtime state and start over with the same configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// One-time setup after a document is opened: ensure identity tokens,
    /// migrate the legacy format, and seed the transform bases.
    pub fn initialize(&mut self, host: &mut dyn Host) {
        self.resolver.initialize_all(host);
        match self.store.migrate_legacy(host) {
            Ok(0) => {}
            Ok(count) => info!(count, "migrated legacy saved views"),
            Err(error) => warn!(%error, "legacy view migration failed"),
        }
        if let Some(viewport) = self.provider.current(host) {
            self.transform.reinitialize_from(host, viewport);
        }
        self.monitor.reset();
        self.sync_derived(host);
    }

    /// Pin all operations to one viewport, or `None` to follow focus.
    pub fn bind_viewport(&mut self, viewport: Option<ViewportId>) {
        self.provider.set_explicit(viewport);
    }

    /// The viewport operations currently target, if any.
    #[must_use]
    pub fn viewport(&self, host: &dyn Host) -> Option<ViewportId> {
        self.provider.current(host)
    }

    /// The persisted view document.
    #[must_use]
    pub fn store(&self) -> &ViewStore {
        &self.store
    }

    /// The pose history ring.
    #[must_use]
    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    /// The saved-view selection.
    #[must_use]
    pub fn selection(&self) -> &ViewSelection {
        &self.selection
    }

    /// The transform state machine, for slider display values.
    #[must_use]
    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    /// The gallery overlay, while open.
    #[must_use]
    pub fn gallery(&self) -> Option<&GalleryOverlay> {
        self.gallery.as_ref()
    }

    /// Mutable gallery access, for the embedding's draw pass (layout is
    /// computed lazily against the draw size).
    pub fn gallery_mut(&mut self) -> Option<&mut GalleryOverlay> {
        self.gallery.as_mut()
    }

    /// Register a UI mirror of the saved-view list. It is rebuilt after
    /// every mutation; read it back through [`Session::mirrors`].
    pub fn register_mirror(&mut self, host: &dyn Host) -> usize {
        self.mirrors.push(ViewMirror::new());
        let index = self.mirrors.len() - 1;
        self.store.sync_mirrors(host, &mut self.mirrors);
        index
    }

    /// The registered saved-view mirrors, in registration order.
    #[must_use]
    pub fn mirrors(&self) -> &[ViewMirror] {
        &self.mirrors
    }

    /// Whether the keep-camera-active convenience mode is on.
    #[must_use]
    pub fn keep_camera_active(&self) -> bool {
        self.keep_camera_active
    }

    /// Turn keep-camera-active on or off. The monitor turns it back off
    /// when the active camera loses editor focus.
    pub fn set_keep_camera_active(&mut self, enabled: bool) {
        self.keep_camera_active = enabled;
    }

    fn require_viewport(&self, host: &dyn Host) -> Result<ViewportId, SessionError> {
        self.provider.current(host).ok_or(SessionError::NoViewport)
    }

    // --- Saved-view operations ---

    /// Save the current viewport as a new view named `View {n}`. Returns
    /// the new view's index. A failed thumbnail render is tolerated.
    pub fn save_current_view(&mut self, host: &mut dyn Host) -> Result<usize, SessionError> {
        let viewport = self.require_viewport(host)?;
        let ordinal = self.store.next_ordinal(host)?;
        let name = format!("View {ordinal}");
        let mut record = ViewRecord::capture(host, &self.resolver, viewport, &name, ordinal)
            .ok_or(SessionError::NoViewport)?;
        record.remember_pose = self.config.remember_pose;
        record.remember_shading = self.config.remember_shading;
        record.remember_overlays = self.config.remember_overlays;
        record.remember_composition = self.config.remember_composition;
        match host.render_thumbnail(viewport) {
            Ok(thumbnail) => record.thumbnail = Some(thumbnail.0),
            Err(error) => warn!(%error, "thumbnail render failed; saving the view without one"),
        }
        let index = self.store.add(host, record)?;
        self.selection.select(Some(index));
        self.sync_derived(host);
        info!(index, name = %name, "saved view");
        Ok(index)
    }

    /// Restore a saved view into the viewport: composition first, then
    /// pose and style per the record's remember flags.
    pub fn load_view(&mut self, host: &mut dyn Host, index: usize) -> Result<(), SessionError> {
        let viewport = self.require_viewport(host)?;
        let record = self
            .store
            .get(host, index)
            .ok_or(SessionError::UnknownView(index))?;
        let source = UpdateSource::ViewRestore;
        if !self.txn.begin(source, source.default_priority()) {
            return Err(SessionError::Busy);
        }
        let result = self.restore_record(host, viewport, &record);
        self.txn
            .start_grace_period(self.config.restore_grace, Some(source));
        self.txn.end();
        result?;
        self.selection.select(Some(index));
        Ok(())
    }

    fn restore_record(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        record: &ViewRecord,
    ) -> Result<(), SessionError> {
        if record.remember_composition {
            self.apply_composition(host, record);
        }
        if host.viewport_in_camera_view(viewport) {
            host.set_viewport_camera_view(viewport, false)?;
        }
        record.apply_to_viewport(host, viewport)?;
        if record.remember_pose {
            self.history.record(record.pose());
        }
        self.transform.reinitialize_from(host, viewport);
        if let Some(pose) = host.viewport_pose(viewport) {
            self.monitor
                .accept_baseline(pose, host.viewport_in_camera_view(viewport));
        }
        Ok(())
    }

    /// Switch to the record's stored scene and view layer, resolving by
    /// identity token first and stored name second. Misses are logged and
    /// skipped; the pose still applies in the current composition.
    fn apply_composition(&self, host: &mut dyn Host, record: &ViewRecord) {
        let Some(identity) = &record.scene_identity else {
            return;
        };
        let Some(scene) = self
            .resolver
            .resolve_scene(host, identity, record.scene_name.as_deref())
        else {
            warn!(view = %record.name, "stored scene not found; staying in the current one");
            return;
        };
        if let Err(error) = host.set_current_scene(scene) {
            warn!(%error, "scene switch failed");
            return;
        }
        if let Some(layer_identity) = &record.view_layer_identity
            && let Some(layer) = self.resolver.resolve_layer(
                host,
                scene,
                layer_identity,
                record.view_layer_name.as_deref(),
            )
            && let Err(error) = host.set_current_layer(layer)
        {
            warn!(%error, "view layer switch failed");
        }
    }

    /// Delete a saved view.
    pub fn delete_view(&mut self, host: &mut dyn Host, index: usize) -> Result<(), SessionError> {
        self.selection.clear();
        self.store.delete(host, index)?;
        self.selection.clear();
        self.sync_derived(host);
        Ok(())
    }

    /// Overwrite the selected view (or, after drifting away from one, the
    /// view the drift started from) with the current viewport state. The
    /// name, ordinal, and remember flags are preserved.
    pub fn update_view(&mut self, host: &mut dyn Host) -> Result<usize, SessionError> {
        let viewport = self.require_viewport(host)?;
        let target = self
            .selection
            .update_target()
            .ok_or(SessionError::NothingSelected)?;
        let existing = self
            .store
            .get(host, target)
            .ok_or(SessionError::UnknownView(target))?;

        let mut record =
            ViewRecord::capture(host, &self.resolver, viewport, &existing.name, existing.ordinal)
                .ok_or(SessionError::NoViewport)?;
        record.remember_pose = existing.remember_pose;
        record.remember_shading = existing.remember_shading;
        record.remember_overlays = existing.remember_overlays;
        record.remember_composition = existing.remember_composition;
        record.thumbnail = existing.thumbnail;
        match host.render_thumbnail(viewport) {
            Ok(thumbnail) => {
                if let Some(old) = existing.thumbnail {
                    host.discard_thumbnail(ThumbnailId(old));
                }
                record.thumbnail = Some(thumbnail.0);
            }
            Err(error) => warn!(%error, "thumbnail refresh failed; keeping the old one"),
        }

        self.store.update(host, target, record)?;
        self.selection.select(Some(target));
        self.sync_derived(host);
        Ok(target)
    }

    /// Rename a saved view.
    pub fn rename_view(
        &mut self,
        host: &mut dyn Host,
        index: usize,
        name: &str,
    ) -> Result<(), SessionError> {
        self.store
            .set_field(host, index, &RecordField::Name(name.to_owned()))?;
        self.sync_derived(host);
        Ok(())
    }

    /// Swap two saved views (one UI reorder step).
    pub fn reorder_views(
        &mut self,
        host: &mut dyn Host,
        from: usize,
        to: usize,
    ) -> Result<(), SessionError> {
        self.store.reorder(host, from, to)?;
        self.sync_derived(host);
        Ok(())
    }

    /// Load the next saved view, wrapping; with no selection, the first.
    pub fn navigate_next(&mut self, host: &mut dyn Host) -> Result<usize, SessionError> {
        self.navigate(host, true)
    }

    /// Load the previous saved view, wrapping; with no selection, the
    /// last.
    pub fn navigate_prev(&mut self, host: &mut dyn Host) -> Result<usize, SessionError> {
        self.navigate(host, false)
    }

    fn navigate(&mut self, host: &mut dyn Host, forward: bool) -> Result<usize, SessionError> {
        let len = self.store.len(host);
        if len == 0 {
            return Err(SessionError::NoViews);
        }
        let next = match (self.selection.update_target(), forward) {
            (Some(current), true) => (current + 1) % len,
            (Some(current), false) => (current + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        self.load_view(host, next)?;
        Ok(next)
    }

    // --- History navigation ---

    /// Step back through the pose history.
    pub fn history_back(&mut self, host: &mut dyn Host) -> Result<HistoryMove, SessionError> {
        let viewport = self.require_viewport(host)?;
        let source = UpdateSource::HistoryNav;
        if !self.txn.begin(source, source.default_priority()) {
            return Err(SessionError::Busy);
        }
        let result = self.history_back_inner(host, viewport);
        self.txn.end();
        result
    }

    fn history_back_inner(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
    ) -> Result<HistoryMove, SessionError> {
        let Some(pose) = self.history.go_back().map(|entry| entry.pose) else {
            return Ok(HistoryMove::AtEnd);
        };
        self.apply_history_pose(host, viewport, pose)?;
        Ok(HistoryMove::Applied)
    }

    /// Step forward through the pose history. Stepping past the newest
    /// entry returns to the live pose without applying anything.
    pub fn history_forward(&mut self, host: &mut dyn Host) -> Result<HistoryMove, SessionError> {
        let viewport = self.require_viewport(host)?;
        let source = UpdateSource::HistoryNav;
        if !self.txn.begin(source, source.default_priority()) {
            return Err(SessionError::Busy);
        }
        let result = self.history_forward_inner(host, viewport);
        self.txn.end();
        result
    }

    fn history_forward_inner(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
    ) -> Result<HistoryMove, SessionError> {
        let pose = match self.history.go_forward() {
            ForwardStep::AtLive => return Ok(HistoryMove::AtEnd),
            ForwardStep::ReturnedToLive => return Ok(HistoryMove::ReturnedToLive),
            ForwardStep::Entry(entry) => entry.pose,
        };
        self.apply_history_pose(host, viewport, pose)?;
        Ok(HistoryMove::Applied)
    }

    fn apply_history_pose(
        &mut self,
        host: &mut dyn Host,
        viewport: ViewportId,
        pose: ViewPose,
    ) -> Result<(), SessionError> {
        // The grace period opens before the pose is written so the monitor
        // can never observe the restore as user movement.
        self.txn
            .start_grace_period(self.config.restore_grace, Some(UpdateSource::HistoryNav));
        if host.viewport_in_camera_view(viewport) {
            host.set_viewport_camera_view(viewport, false)?;
        }
        host.set_viewport_pose(viewport, &pose)?;
        self.transform.reinitialize_from(host, viewport);
        self.monitor.accept_baseline(pose, false);
        Ok(())
    }

    // --- Transform operations ---

    /// Apply one slider edit. Returns false when the edit was dropped
    /// (transform uninitialized, or the transaction was refused).
    pub fn apply_edit(
        &mut self,
        host: &mut dyn Host,
        edit: TransformEdit,
    ) -> Result<bool, SessionError> {
        let viewport = self.require_viewport(host)?;
        Ok(self.transform.apply_edit(host, viewport, &self.txn, edit)?)
    }

    /// Zero one relative axis, with the same rebasing as a slider edit.
    pub fn reset_axis(
        &mut self,
        host: &mut dyn Host,
        axis: RelativeAxis,
    ) -> Result<bool, SessionError> {
        let viewport = self.require_viewport(host)?;
        Ok(self.transform.reset_axis(host, viewport, &self.txn, axis)?)
    }

    /// Toggle selection-orbit mode. Returns the new state; enabling is
    /// asynchronous and completes over the next ticks.
    pub fn toggle_orbit_mode(&mut self, host: &mut dyn Host) -> Result<bool, SessionError> {
        let viewport = self.require_viewport(host)?;
        if self.transform.orbit_enabled() {
            self.transform.disable_orbit();
            self.txn
                .start_grace_period(self.config.orbit_toggle_grace, None);
            Ok(false)
        } else {
            self.transform.enable_orbit(host, viewport, &self.txn)?;
            Ok(true)
        }
    }

    /// Toggle screen-space pan/roll mode. Returns the new state.
    pub fn toggle_screen_space_mode(&mut self, host: &mut dyn Host) -> Result<bool, SessionError> {
        let viewport = self.require_viewport(host)?;
        Ok(self.transform.toggle_screen_space(host, viewport))
    }

    /// Make the named camera object the scene's active camera.
    pub fn switch_camera(
        &mut self,
        host: &mut dyn Host,
        name: &str,
    ) -> Result<CameraId, SessionError> {
        let viewport = self.require_viewport(host)?;
        let camera = host
            .cameras()
            .into_iter()
            .find(|camera| host.camera_name(*camera).as_deref() == Some(name))
            .ok_or_else(|| SessionError::UnknownCamera(name.to_owned()))?;
        let source = UpdateSource::CameraSwitch;
        if !self.txn.begin(source, source.default_priority()) {
            return Err(SessionError::Busy);
        }
        let result = host.set_active_camera(camera);
        if result.is_ok() && host.viewport_in_camera_view(viewport) {
            self.transform.reinitialize_from(host, viewport);
            if let Some(pose) = host.viewport_pose(viewport) {
                self.monitor.accept_baseline(pose, true);
            }
        }
        self.txn.end();
        result?;
        Ok(camera)
    }

    // --- Gallery ---

    /// Open the gallery bound to the current viewport, or close the open
    /// one. Returns whether the gallery is now open.
    pub fn toggle_gallery(&mut self, host: &mut dyn Host) -> Result<bool, SessionError> {
        if self.gallery.take().is_some() {
            return Ok(false);
        }
        let viewport = self.require_viewport(host)?;
        let mut overlay = GalleryOverlay::new(viewport);
        overlay.set_item_count(self.store.len(host));
        self.gallery = Some(overlay);
        Ok(true)
    }

    /// Forward an input event to the open gallery and execute the action
    /// it resolves to. The action is also returned for UI effects the
    /// session does not own (context menus, redraws).
    pub fn handle_gallery_event(
        &mut self,
        host: &mut dyn Host,
        viewport_size: Size,
        event: GalleryEvent,
    ) -> Result<GalleryAction, SessionError> {
        let Some(gallery) = self.gallery.as_mut() else {
            return Ok(GalleryAction::None);
        };
        let action = gallery.handle_event(viewport_size, event);
        match action {
            GalleryAction::LoadView(index) => self.load_view(host, index)?,
            GalleryAction::AddView => {
                self.save_current_view(host)?;
            }
            GalleryAction::RefreshAll => {
                self.regenerate_all_thumbnails(host)?;
            }
            GalleryAction::MoveView { from, to } => self.reorder_views(host, from, to)?,
            GalleryAction::Close => self.gallery = None,
            GalleryAction::ContextMenu(_) | GalleryAction::Redraw | GalleryAction::None => {}
        }
        Ok(action)
    }

    /// Re-render every saved view's thumbnail through the live viewport.
    pub fn regenerate_all_thumbnails(
        &mut self,
        host: &mut dyn Host,
    ) -> Result<RegenerateReport, SessionError> {
        let viewport = self
            .gallery
            .as_ref()
            .map(GalleryOverlay::primary)
            .or_else(|| self.provider.current(host))
            .ok_or(SessionError::NoViewport)?;
        let report = vantage_gallery::regenerate_all_thumbnails(
            host,
            viewport,
            &self.store,
            &self.txn,
            &self.resolver,
        )?;
        self.sync_derived(host);
        Ok(report)
    }

    // --- Storage ---

    /// Overwrite the persisted document with an empty one. Destructive;
    /// only call after explicit user confirmation.
    pub fn recover_storage(&mut self, host: &mut dyn Host) -> Result<(), SessionError> {
        self.store.reset_storage(host)?;
        self.selection.clear();
        self.history.clear();
        self.sync_derived(host);
        Ok(())
    }

    /// Rebuild everything derived from the saved-view list: registered
    /// mirrors (with per-field write-back suppressed) and the gallery's
    /// item count. Runs after every mutation of the list.
    fn sync_derived(&mut self, host: &dyn Host) {
        self.store.sync_mirrors(host, &mut self.mirrors);
        let count = self.store.len(host);
        if let Some(gallery) = self.gallery.as_mut() {
            gallery.set_item_count(count);
        }
    }

    // --- Tick ---

    /// One timer tick: drive pending orbit initialization, run the
    /// monitor, and validate the gallery's viewport binding.
    pub fn tick(&mut self, host: &mut dyn Host) -> TickOutcome {
        let Some(viewport) = self.provider.current(host) else {
            // No viewport left to draw into.
            self.gallery = None;
            return TickOutcome::default();
        };
        if let Err(error) = self.transform.poll_orbit_init(host, viewport) {
            warn!(%error, "orbit initialization failed; disabling orbit");
            self.transform.disable_orbit();
        }
        let outcome = self.monitor.tick(
            host,
            viewport,
            &self.txn,
            &mut self.transform,
            &mut self.history,
            &self.resolver,
            &mut self.selection,
            &mut self.keep_camera_active,
        );
        let count = self.store.len(host);
        let mut close_gallery = false;
        if let Some(gallery) = self.gallery.as_mut() {
            if gallery.validate_primary(host) {
                gallery.set_item_count(count);
            } else {
                close_gallery = true;
            }
        }
        if close_gallery {
            self.gallery = None;
        }
        outcome
    }
}
