// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use vantage_host::{Host, HostError, ThumbnailId, ViewportId};
use vantage_identity::IdentityResolver;
use vantage_store::{StorageError, ViewRecord, ViewStore};
use vantage_txn::{TransactionController, UpdateSource};

/// Bulk regeneration holds the viewport hostage for up to this long; the
/// grace period has to cover the whole run so the monitor never mistakes
/// the scene hopping for user movement.
const REGENERATE_GRACE: Duration = Duration::from_secs(60);

/// Errors from bulk thumbnail regeneration.
#[derive(Debug, Error)]
pub enum RegenerateError {
    /// A higher-or-equal priority update owns the viewport.
    #[error("viewport is busy; thumbnail regeneration aborted")]
    Busy,
    /// The target viewport disappeared before the run started.
    #[error("viewport is gone")]
    ViewportGone,
    /// The document could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Counts reported by a regeneration run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegenerateReport {
    /// Thumbnails rendered successfully.
    pub regenerated: usize,
    /// Views whose composition or render failed; their old thumbnail is
    /// kept.
    pub failed: usize,
}

/// Re-render the thumbnail of every saved view by walking the document in
/// the live viewport.
///
/// Each view's scene and layer are resolved (identity token first, stored
/// name second) and made current, the pose is applied, and the host
/// renders a thumbnail. A view that fails is skipped with a warning; the
/// run continues. All thumbnail handles are written back in one batched
/// save at the end.
///
/// The whole run executes inside a `(ViewRestore, Critical)` transaction
/// with a long tagged grace period, and the starting scene, layer, and
/// pose are restored before the transaction ends, whatever happened in
/// the loop.
pub fn regenerate_all_thumbnails(
    host: &mut dyn Host,
    viewport: ViewportId,
    store: &ViewStore,
    txn: &TransactionController,
    resolver: &IdentityResolver,
) -> Result<RegenerateReport, RegenerateError> {
    let source = UpdateSource::ViewRestore;
    if !txn.begin(source, source.default_priority()) {
        return Err(RegenerateError::Busy);
    }

    let Some(pose) = host.viewport_pose(viewport) else {
        txn.end();
        return Err(RegenerateError::ViewportGone);
    };
    let scene = host.current_scene();
    let layer = host.current_layer();
    txn.start_grace_period(REGENERATE_GRACE, Some(source));

    let result = regenerate_loop(host, viewport, store, resolver);

    // Restore the snapshot before releasing anything; failures here are
    // non-fatal because the host may have removed the containers mid-run.
    if let Err(error) = host.set_current_scene(scene) {
        warn!(%error, "could not restore the scene after regeneration");
    }
    if let Err(error) = host.set_current_layer(layer) {
        warn!(%error, "could not restore the view layer after regeneration");
    }
    if let Err(error) = host.set_viewport_pose(viewport, &pose) {
        warn!(%error, "could not restore the viewport pose after regeneration");
    }
    txn.start_grace_period(Duration::ZERO, None);
    txn.end();

    result
}

fn regenerate_loop(
    host: &mut dyn Host,
    viewport: ViewportId,
    store: &ViewStore,
    resolver: &IdentityResolver,
) -> Result<RegenerateReport, RegenerateError> {
    let records = store.list(host);
    let mut report = RegenerateReport::default();
    let mut updates: Vec<(usize, Option<u64>)> = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match regenerate_one(host, viewport, resolver, record) {
            Ok(thumbnail) => {
                if let Some(old) = record.thumbnail {
                    host.discard_thumbnail(ThumbnailId(old));
                }
                updates.push((index, Some(thumbnail.0)));
                report.regenerated += 1;
            }
            Err(error) => {
                warn!(%error, view = %record.name, "thumbnail regeneration failed, keeping the old one");
                report.failed += 1;
            }
        }
    }

    store.set_thumbnails(host, &updates)?;
    debug!(
        regenerated = report.regenerated,
        failed = report.failed,
        "thumbnail regeneration finished"
    );
    Ok(report)
}

fn regenerate_one(
    host: &mut dyn Host,
    viewport: ViewportId,
    resolver: &IdentityResolver,
    record: &ViewRecord,
) -> Result<ThumbnailId, HostError> {
    if let Some(identity) = &record.scene_identity
        && let Some(scene) = resolver.resolve_scene(host, identity, record.scene_name.as_deref())
    {
        host.set_current_scene(scene)?;
        if let Some(layer_identity) = &record.view_layer_identity
            && let Some(layer) = resolver.resolve_layer(
                host,
                scene,
                layer_identity,
                record.view_layer_name.as_deref(),
            )
        {
            host.set_current_layer(layer)?;
        }
    }
    host.set_viewport_pose(viewport, &record.pose())?;
    host.render_thumbnail(viewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_host::MockHost;
    use vantage_pose::ViewPose;
    use vantage_txn::LockPriority;

    fn seeded(count: usize) -> (MockHost, ViewportId, ViewStore) {
        let mut host = MockHost::new();
        let viewport = host.add_viewport();
        let store = ViewStore::new();
        for i in 0..count {
            let mut pose = ViewPose::default();
            pose.location.x = i as f64;
            let record = ViewRecord::from_pose(&format!("View {}", i + 1), i as u64 + 1, &pose);
            store.add(&mut host, record).unwrap();
        }
        (host, viewport, store)
    }

    #[test]
    fn regenerates_every_view_and_saves_once_per_run() {
        let (mut host, viewport, store) = seeded(3);
        let txn = TransactionController::new();
        let resolver = IdentityResolver::new();

        let report =
            regenerate_all_thumbnails(&mut host, viewport, &store, &txn, &resolver).unwrap();
        assert_eq!(report, RegenerateReport { regenerated: 3, failed: 0 });
        assert_eq!(host.thumbnail_count(), 3);
        for record in store.list(&host) {
            assert!(record.thumbnail.is_some());
        }
        assert!(!txn.is_update_in_progress());
        assert!(!txn.in_grace_period());
    }

    #[test]
    fn a_failing_view_is_skipped_not_fatal() {
        let (mut host, viewport, store) = seeded(3);
        let txn = TransactionController::new();
        let resolver = IdentityResolver::new();

        host.fail_next_thumbnail();
        let report =
            regenerate_all_thumbnails(&mut host, viewport, &store, &txn, &resolver).unwrap();
        assert_eq!(report, RegenerateReport { regenerated: 2, failed: 1 });

        let records = store.list(&host);
        assert!(records[0].thumbnail.is_none());
        assert!(records[1].thumbnail.is_some());
        assert!(records[2].thumbnail.is_some());
    }

    #[test]
    fn a_busy_viewport_aborts_before_touching_anything() {
        let (mut host, viewport, store) = seeded(2);
        let txn = TransactionController::new();
        let resolver = IdentityResolver::new();

        assert!(txn.begin(UpdateSource::UserDrag, LockPriority::Critical));
        let result = regenerate_all_thumbnails(&mut host, viewport, &store, &txn, &resolver);
        assert!(matches!(result, Err(RegenerateError::Busy)));
        assert_eq!(host.thumbnail_count(), 0);
        txn.end();
    }

    #[test]
    fn the_starting_state_is_restored() {
        let (mut host, viewport, store) = seeded(2);
        let txn = TransactionController::new();
        let resolver = IdentityResolver::new();

        let before = host.viewport_pose(viewport).unwrap();
        let scene = host.current_scene();
        regenerate_all_thumbnails(&mut host, viewport, &store, &txn, &resolver).unwrap();

        assert_eq!(host.current_scene(), scene);
        let after = host.viewport_pose(viewport).unwrap();
        assert!(before.is_similar_to(&after));
    }
}
