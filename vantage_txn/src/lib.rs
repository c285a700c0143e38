// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage Txn: cooperative update transactions for viewport state.
//!
//! Every mutation path in Vantage (user slider edits, background
//! polling, view restoration, history navigation, camera switching)
//! funnels through a single [`TransactionController`]. It provides:
//! - a source-tagged, re-entrant, priority-arbitrated transaction:
//!   acquisition is granted when the controller is free, when the
//!   requester already holds it (nesting), or when the requester's
//!   priority is strictly higher than the holder's (preemption); an
//!   acquisition that is refused means "abandon this tick", never "wait";
//! - an independent **grace period**: a monotonic deadline during which
//!   reactive work (history recording, state re-sync) is suppressed
//!   because the pose change in progress is self-inflicted.
//!
//! The two axes are deliberately independent: a grace period routinely
//! outlives the transaction that started it.
//!
//! ## Example
//!
//! ```rust
//! use vantage_txn::{LockPriority, TransactionController, UpdateSource};
//!
//! let txn = TransactionController::new();
//!
//! // A user drag holds the transaction...
//! let guard = txn
//!     .transaction(UpdateSource::UserDrag, LockPriority::Normal)
//!     .unwrap();
//!
//! // ...so the background poller is refused and abandons its tick.
//! assert!(txn
//!     .transaction(UpdateSource::ViewportPoll, LockPriority::Low)
//!     .is_none());
//!
//! // Once the drag ends, the poller gets its turn.
//! drop(guard);
//! assert!(txn
//!     .transaction(UpdateSource::ViewportPoll, LockPriority::Low)
//!     .is_some());
//! ```

mod controller;

pub use controller::{LockPriority, TransactionController, TransactionGuard, UpdateSource};
