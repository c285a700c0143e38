// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::VecDeque;
use std::time::Instant;

use vantage_pose::ViewPose;

/// Default maximum number of entries kept in the ring.
pub const DEFAULT_CAPACITY: usize = 20;

/// One recorded viewpoint.
#[derive(Clone, Copy, Debug)]
pub struct HistoryEntry {
    /// The recorded pose.
    pub pose: ViewPose,
    /// When the snapshot was recorded.
    pub recorded_at: Instant,
}

/// Result of a forward navigation step.
#[derive(Debug)]
pub enum ForwardStep<'a> {
    /// Moved forward onto this entry.
    Entry(&'a HistoryEntry),
    /// Stepped past the newest entry; the cursor is live again. Callers
    /// report this distinctly from being blocked at a boundary.
    ReturnedToLive,
    /// Already live; nothing to go forward to.
    AtLive,
}

/// Bounded, branch-discarding sequence of viewpoint snapshots.
#[derive(Debug)]
pub struct HistoryRing {
    entries: VecDeque<HistoryEntry>,
    /// `None` = live (at the newest state, no navigation in progress).
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryRing {
    /// An empty ring holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    /// Change the capacity. Enforced on the next record, not
    /// retroactively.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ring is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The navigation cursor; `None` means live.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// UI-facing cursor index where `-1` means live.
    #[must_use]
    pub fn index(&self) -> i64 {
        self.cursor
            .map_or(-1, |c| i64::try_from(c).unwrap_or(i64::MAX))
    }

    /// The entry under the cursor, when navigated.
    #[must_use]
    pub fn entry_at_cursor(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor?)
    }

    /// Entry at an absolute position.
    #[must_use]
    pub fn entry_at(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Iterate entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Record a snapshot.
    ///
    /// If the cursor sits behind the tail, the abandoned branch after it
    /// is discarded first. The snapshot is then dropped if it is similar
    /// to the (possibly new) tail; otherwise it is appended, the oldest
    /// entry is evicted once over capacity, and the cursor returns to
    /// live. Returns whether an entry was appended.
    pub fn record(&mut self, pose: ViewPose) -> bool {
        if let Some(cursor) = self.cursor
            && cursor + 1 < self.entries.len()
        {
            self.entries.truncate(cursor + 1);
        }
        if let Some(tail) = self.entries.back()
            && tail.pose.is_similar_to(&pose)
        {
            return false;
        }
        self.entries.push_back(HistoryEntry {
            pose,
            recorded_at: Instant::now(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = None;
        true
    }

    /// Step back one entry.
    ///
    /// From live the cursor first lands on the tail, then moves one entry
    /// older. Returns `None` when the ring is empty or the cursor is
    /// already at the oldest entry.
    pub fn go_back(&mut self) -> Option<&HistoryEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let landed = match self.cursor {
            None => {
                self.cursor = Some(self.entries.len() - 1);
                self.entries.len() - 1
            }
            Some(c) => c,
        };
        let target = landed.saturating_sub(1);
        if target == landed {
            return None;
        }
        self.cursor = Some(target);
        self.entries.get(target)
    }

    /// Step forward one entry, or back to live past the tail.
    pub fn go_forward(&mut self) -> ForwardStep<'_> {
        let Some(cursor) = self.cursor else {
            return ForwardStep::AtLive;
        };
        let next = cursor + 1;
        if next >= self.entries.len() {
            self.cursor = None;
            return ForwardStep::ReturnedToLive;
        }
        self.cursor = Some(next);
        match self.entries.get(next) {
            Some(entry) => ForwardStep::Entry(entry),
            None => ForwardStep::ReturnedToLive,
        }
    }

    /// Drop all entries and return to live.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_at(x: f64) -> ViewPose {
        let mut pose = ViewPose::default();
        pose.location.x = x;
        pose
    }

    #[test]
    fn dedups_similar_snapshots() {
        let mut history = HistoryRing::new(20);
        assert!(history.record(pose_at(0.0)));
        assert!(!history.record(pose_at(0.001)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn discards_branch_on_record() {
        let mut history = HistoryRing::new(20);
        for x in 0..4 {
            assert!(history.record(pose_at(f64::from(x))));
        }
        // Navigate back to index 1 (entry B).
        history.go_back();
        history.go_back();
        assert_eq!(history.cursor(), Some(1));

        assert!(history.record(pose_at(100.0)));
        assert_eq!(history.len(), 3);
        assert!((history.entry_at(0).unwrap().pose.location.x - 0.0).abs() < 1e-12);
        assert!((history.entry_at(1).unwrap().pose.location.x - 1.0).abs() < 1e-12);
        assert!((history.entry_at(2).unwrap().pose.location.x - 100.0).abs() < 1e-12);
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut history = HistoryRing::new(3);
        for x in 0..5 {
            assert!(history.record(pose_at(f64::from(x))));
        }
        assert_eq!(history.len(), 3);
        assert!((history.entry_at(0).unwrap().pose.location.x - 2.0).abs() < 1e-12);
        // Cursor arithmetic stays in range across a full back walk.
        while history.go_back().is_some() {}
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn back_from_live_skips_current_tail() {
        let mut history = HistoryRing::new(20);
        history.record(pose_at(0.0));
        history.record(pose_at(1.0));
        history.record(pose_at(2.0));

        let entry = history.go_back().unwrap();
        assert!((entry.pose.location.x - 1.0).abs() < 1e-12);
        assert_eq!(history.cursor(), Some(1));
    }

    #[test]
    fn back_with_single_entry_returns_none() {
        let mut history = HistoryRing::new(20);
        history.record(pose_at(0.0));
        assert!(history.go_back().is_none());
        // The cursor still landed on the tail.
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn forward_states_are_distinct() {
        let mut history = HistoryRing::new(20);
        history.record(pose_at(0.0));
        history.record(pose_at(1.0));

        assert!(matches!(history.go_forward(), ForwardStep::AtLive));

        history.go_back();
        assert_eq!(history.cursor(), Some(0));

        let step = history.go_forward();
        assert!(matches!(step, ForwardStep::Entry(_)), "got {step:?}");

        assert!(matches!(history.go_forward(), ForwardStep::ReturnedToLive));
        assert_eq!(history.index(), -1);
    }

    #[test]
    fn capacity_change_applies_on_next_record() {
        let mut history = HistoryRing::new(20);
        for x in 0..5 {
            history.record(pose_at(f64::from(x)));
        }
        history.set_capacity(3);
        assert_eq!(history.len(), 5);
        history.record(pose_at(10.0));
        assert_eq!(history.len(), 3);
    }
}
