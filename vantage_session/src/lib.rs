// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vantage Session: the full viewport-state manager, assembled.
//!
//! A [`Session`] owns one of everything: the persisted view document,
//! the pose history ring, the update transaction, the transform state
//! machine, the background monitor, and the gallery overlay slot. Each
//! user-facing operation is a method:
//!
//! ```
//! use vantage_host::MockHost;
//! use vantage_session::{Session, SessionConfig};
//!
//! let mut host = MockHost::new();
//! host.add_viewport();
//!
//! let mut session = Session::new(SessionConfig::default());
//! session.initialize(&mut host);
//!
//! let index = session.save_current_view(&mut host)?;
//! assert_eq!(session.store().list(&host)[index].name, "View 1");
//!
//! session.load_view(&mut host, index)?;
//! assert_eq!(session.selection().active(), Some(index));
//! # Ok::<(), vantage_session::SessionError>(())
//! ```
//!
//! The embedding drives [`Session::tick`] on a fixed timer (typically
//! 100 ms) and forwards pointer/key input to
//! [`Session::handle_gallery_event`] while the gallery is open. Every
//! mutation of the viewport runs under the session's transaction
//! controller, so concurrent UI handlers cannot interleave pose writes.

mod session;

pub use session::{HistoryMove, Session, SessionConfig, SessionError};
