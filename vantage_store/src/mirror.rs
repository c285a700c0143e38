// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::record::ViewRecord;

/// UI-facing summary of one saved view.
#[derive(Clone, Debug, PartialEq)]
pub struct MirrorEntry {
    /// Display name.
    pub name: String,
    /// Thumbnail handle, if rendered.
    pub thumbnail: Option<u64>,
    /// Apply-pose flag.
    pub remember_pose: bool,
    /// Apply-shading flag.
    pub remember_shading: bool,
    /// Apply-overlays flag.
    pub remember_overlays: bool,
    /// Apply-composition flag.
    pub remember_composition: bool,
}

/// Derived, rebuildable cache of the saved-view list for one UI context.
///
/// Never the source of truth: only
/// [`ViewStore::sync_mirrors`](crate::ViewStore::sync_mirrors) writes it,
/// and it can be dropped and rebuilt at any time.
#[derive(Clone, Debug, Default)]
pub struct ViewMirror {
    entries: Vec<MirrorEntry>,
}

impl ViewMirror {
    /// An empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in store order.
    #[must_use]
    pub fn entries(&self) -> &[MirrorEntry] {
        &self.entries
    }

    /// Clear and repopulate from the canonical list.
    pub fn rebuild(&mut self, records: &[ViewRecord]) {
        self.entries.clear();
        self.entries.extend(records.iter().map(|record| MirrorEntry {
            name: record.name.clone(),
            thumbnail: record.thumbnail,
            remember_pose: record.remember_pose,
            remember_shading: record.remember_shading,
            remember_overlays: record.remember_overlays,
            remember_composition: record.remember_composition,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_pose::ViewPose;

    #[test]
    fn rebuild_replaces_contents() {
        let mut mirror = ViewMirror::new();
        let a = ViewRecord::from_pose("A", 1, &ViewPose::default());
        let mut b = ViewRecord::from_pose("B", 2, &ViewPose::default());
        b.remember_pose = false;

        mirror.rebuild(&[a.clone()]);
        assert_eq!(mirror.entries().len(), 1);

        mirror.rebuild(&[a, b]);
        assert_eq!(mirror.entries().len(), 2);
        assert_eq!(mirror.entries()[1].name, "B");
        assert!(!mirror.entries()[1].remember_pose);
    }
}
