// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// What kind of actor is mutating viewport state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateSource {
    /// Interactive slider/field edit by the user.
    UserDrag,
    /// Restoring a pose from the view history.
    HistoryNav,
    /// Restoring a saved view record.
    ViewRestore,
    /// Switching the active camera object.
    CameraSwitch,
    /// Internal re-synchronization of derived state.
    InternalSync,
    /// The background viewport poller.
    ViewportPoll,
}

impl UpdateSource {
    /// The canonical priority this source acquires with.
    #[must_use]
    pub fn default_priority(&self) -> LockPriority {
        match self {
            Self::ViewportPoll => LockPriority::Low,
            Self::UserDrag | Self::InternalSync => LockPriority::Normal,
            Self::CameraSwitch => LockPriority::High,
            Self::HistoryNav | Self::ViewRestore => LockPriority::Critical,
        }
    }
}

/// Arbitration priority for transaction acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LockPriority {
    /// Background polling.
    Low,
    /// User edits and internal sync.
    Normal,
    /// Camera switching.
    High,
    /// History navigation and view restoration.
    Critical,
}

#[derive(Clone, Copy, Debug)]
struct Holder {
    source: UpdateSource,
    priority: LockPriority,
    depth: u32,
}

#[derive(Debug, Default)]
struct Inner {
    holder: Option<Holder>,
    grace_deadline: Option<Instant>,
    grace_source: Option<UpdateSource>,
}

/// Source-tagged re-entrant transaction plus an independent grace-period
/// deadline.
///
/// Owned by the session and passed by reference; [`Self::reset`] restores
/// the initial state for reinitialization and test isolation. The inner
/// mutex exists because host timers can fire callbacks outside strictly
/// nested call frames; arbitration itself stays cooperative and
/// non-blocking.
#[derive(Debug, Default)]
pub struct TransactionController {
    inner: Mutex<Inner>,
}

impl TransactionController {
    /// A controller with no holder and no grace period.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Try to acquire the transaction.
    ///
    /// Granted when free, when `source` already holds it (re-entrant,
    /// depth increments), or when `priority` is strictly greater than the
    /// holder's (the requester becomes the new holder). Otherwise refused;
    /// the caller abandons the operation for this tick.
    pub fn begin(&self, source: UpdateSource, priority: LockPriority) -> bool {
        let mut inner = self.lock();
        match &mut inner.holder {
            None => {
                inner.holder = Some(Holder {
                    source,
                    priority,
                    depth: 1,
                });
                true
            }
            Some(holder) if holder.source == source => {
                holder.depth += 1;
                true
            }
            Some(holder) if priority > holder.priority => {
                debug!(?source, previous = ?holder.source, "transaction preempted");
                inner.holder = Some(Holder {
                    source,
                    priority,
                    depth: 1,
                });
                true
            }
            Some(holder) => {
                debug!(?source, held_by = ?holder.source, "transaction refused");
                false
            }
        }
    }

    /// Release one level of the transaction; fully releases at depth 0.
    /// A call without a matching `begin` is a no-op.
    pub fn end(&self) {
        let mut inner = self.lock();
        if let Some(holder) = &mut inner.holder {
            holder.depth = holder.depth.saturating_sub(1);
            if holder.depth == 0 {
                inner.holder = None;
            }
        }
    }

    /// RAII acquisition: the returned guard releases on drop. `None` when
    /// the acquisition was refused.
    #[must_use]
    pub fn transaction(
        &self,
        source: UpdateSource,
        priority: LockPriority,
    ) -> Option<TransactionGuard<'_>> {
        self.begin(source, priority)
            .then_some(TransactionGuard { controller: self })
    }

    /// Start (or overwrite) the grace period: a monotonic deadline during
    /// which pose changes are treated as self-inflicted. A zero duration
    /// clears any active grace period.
    pub fn start_grace_period(&self, duration: Duration, source: Option<UpdateSource>) {
        let mut inner = self.lock();
        inner.grace_deadline = Some(Instant::now() + duration);
        inner.grace_source = source;
        debug!(?duration, ?source, "grace period started");
    }

    /// Whether the grace-period deadline is still in the future.
    #[must_use]
    pub fn in_grace_period(&self) -> bool {
        let inner = self.lock();
        inner
            .grace_deadline
            .is_some_and(|deadline| Instant::now() < deadline)
    }

    /// The source that set the grace period, while it is active.
    #[must_use]
    pub fn grace_source(&self) -> Option<UpdateSource> {
        let inner = self.lock();
        let active = inner
            .grace_deadline
            .is_some_and(|deadline| Instant::now() < deadline);
        if active { inner.grace_source } else { None }
    }

    /// Whether a transaction is currently held.
    #[must_use]
    pub fn is_update_in_progress(&self) -> bool {
        self.lock().holder.is_some()
    }

    /// The holding source, if a transaction is in progress.
    #[must_use]
    pub fn active_source(&self) -> Option<UpdateSource> {
        self.lock().holder.map(|h| h.source)
    }

    /// Whether an observed pose change should be recorded into history.
    ///
    /// False during a grace period, and false while the held transaction's
    /// source is history navigation or view restoration, the two ways
    /// "this change was caused by us" is expressed.
    #[must_use]
    pub fn should_record_history(&self) -> bool {
        let inner = self.lock();
        let in_grace = inner
            .grace_deadline
            .is_some_and(|deadline| Instant::now() < deadline);
        if in_grace {
            return false;
        }
        !matches!(
            inner.holder.map(|h| h.source),
            Some(UpdateSource::HistoryNav | UpdateSource::ViewRestore)
        )
    }

    /// Drop any holder and grace period.
    pub fn reset(&self) {
        let mut inner = self.lock();
        *inner = Inner::default();
    }
}

/// Releases one transaction level on drop.
#[derive(Debug)]
#[must_use]
pub struct TransactionGuard<'a> {
    controller: &'a TransactionController,
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        self.controller.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_or_equal_priority_is_refused() {
        let txn = TransactionController::new();
        assert!(txn.begin(UpdateSource::UserDrag, LockPriority::Normal));

        assert!(!txn.begin(UpdateSource::ViewportPoll, LockPriority::Low));
        // Equal priority from a different source is refused too.
        assert!(!txn.begin(UpdateSource::InternalSync, LockPriority::Normal));

        txn.end();
        assert!(!txn.is_update_in_progress());
    }

    #[test]
    fn strictly_higher_priority_preempts() {
        let txn = TransactionController::new();
        assert!(txn.begin(UpdateSource::UserDrag, LockPriority::Normal));
        assert!(txn.begin(UpdateSource::ViewRestore, LockPriority::Critical));
        assert_eq!(txn.active_source(), Some(UpdateSource::ViewRestore));
    }

    #[test]
    fn reentrant_depth_balances() {
        let txn = TransactionController::new();
        for _ in 0..3 {
            assert!(txn.begin(UpdateSource::UserDrag, LockPriority::Normal));
        }
        txn.end();
        txn.end();
        assert!(txn.is_update_in_progress());
        txn.end();
        assert!(!txn.is_update_in_progress());
    }

    #[test]
    fn end_without_begin_is_noop() {
        let txn = TransactionController::new();
        txn.end();
        assert!(!txn.is_update_in_progress());
        assert!(txn.begin(UpdateSource::UserDrag, LockPriority::Normal));
    }

    #[test]
    fn guard_releases_on_drop() {
        let txn = TransactionController::new();
        {
            let _guard = txn
                .transaction(UpdateSource::UserDrag, LockPriority::Normal)
                .unwrap();
            assert!(txn.is_update_in_progress());
        }
        assert!(!txn.is_update_in_progress());
    }

    #[test]
    fn grace_period_suppresses_history() {
        let txn = TransactionController::new();
        assert!(txn.should_record_history());

        txn.start_grace_period(Duration::from_secs(5), Some(UpdateSource::HistoryNav));
        assert!(txn.in_grace_period());
        assert_eq!(txn.grace_source(), Some(UpdateSource::HistoryNav));
        assert!(!txn.should_record_history());

        // Zero duration clears it.
        txn.start_grace_period(Duration::ZERO, None);
        assert!(!txn.in_grace_period());
        assert!(txn.should_record_history());
    }

    #[test]
    fn restore_transaction_suppresses_history_without_grace() {
        let txn = TransactionController::new();
        assert!(txn.begin(UpdateSource::ViewRestore, LockPriority::Critical));
        assert!(!txn.should_record_history());
        txn.end();
        assert!(txn.should_record_history());
    }

    #[test]
    fn grace_outlives_its_transaction() {
        let txn = TransactionController::new();
        assert!(txn.begin(UpdateSource::ViewRestore, LockPriority::Critical));
        txn.start_grace_period(Duration::from_secs(5), Some(UpdateSource::ViewRestore));
        txn.end();
        assert!(!txn.is_update_in_progress());
        assert!(txn.in_grace_period());
        assert!(!txn.should_record_history());
    }

    #[test]
    fn reset_clears_everything() {
        let txn = TransactionController::new();
        assert!(txn.begin(UpdateSource::UserDrag, LockPriority::Normal));
        txn.start_grace_period(Duration::from_secs(5), Some(UpdateSource::UserDrag));
        txn.reset();
        assert!(!txn.is_update_in_progress());
        assert!(!txn.in_grace_period());
    }
}
